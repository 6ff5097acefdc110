//! Multi-tenant session server for the voltrek grid game.
//!
//! `voltrek-core` is the pure engine; everything here is the ambient
//! stack around it: session storage, the command service, the
//! broadcast hub, background janitors, and the thin HTTP/WebSocket
//! transport. Grounded throughout on the teacher's `life_simulation`
//! crate, generalized from one global simulation to many independent
//! sessions.

pub mod command;
pub mod config;
pub mod http;
pub mod hub;
pub mod session;
pub mod snapshot;
pub mod tasks;
pub mod websocket;

pub use command::CommandService;
pub use config::ServerConfig;
pub use hub::BroadcastHub;
