//! Real-time per-session state streaming.

mod handler;

pub use handler::ws_handler;
