//! The `Session` envelope: identity, timestamps, and the owned `GameState`.

use serde::{Deserialize, Serialize};
use voltrek_core::GameState;

use super::id::SessionId;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub config_name: String,
    pub state: GameState,
    pub created_at: u64,
    pub last_accessed_at: u64,
}

impl Session {
    pub fn new(id: SessionId, config_name: String, state: GameState, now: u64) -> Self {
        Self {
            id,
            config_name,
            state,
            created_at: now,
            last_accessed_at: now,
        }
    }

    pub fn touch(&mut self, now: u64) {
        self.last_accessed_at = now;
    }
}
