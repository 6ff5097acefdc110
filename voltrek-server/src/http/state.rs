//! Shared application state handed to every axum handler via
//! `State<AppState>`, mirroring the teacher's `(grid, tx)` tuple state —
//! generalized here to a named struct since voltrek has more to share.

use std::sync::Arc;
use std::time::Duration;

use voltrek_core::ConfigRegistry;

use crate::command::CommandService;
use crate::hub::BroadcastHub;

#[derive(Clone)]
pub struct AppState {
    pub commands: Arc<CommandService>,
    pub registry: Arc<ConfigRegistry>,
    pub hub: Arc<BroadcastHub>,
    /// How long a websocket connection may sit with no client frames
    /// before the read half is considered idle and the socket is closed.
    pub ws_idle_timeout: Duration,
}
