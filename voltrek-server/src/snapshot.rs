//! The enriched, JSON-shaped state a client needs to render a session
//! without further calls — `GameState` plus the views the engine
//! derives on demand (spec §4.E, §6.4).

use serde::Serialize;
use voltrek_core::{BatteryRisk, Direction, GameState};

#[derive(Clone, Debug, Serialize)]
pub struct EnrichedState {
    #[serde(flatten)]
    pub state: GameState,
    pub local_view_3x3: [String; 3],
    pub possible_moves: Vec<Direction>,
    pub battery_risk: BatteryRisk,
    pub current_moves_count: usize,
}

impl EnrichedState {
    /// `local_view_3x3`, `possible_moves` and `battery_risk` are
    /// recomputed here, not stored on `GameState` — they depend only
    /// on `state` (spec §9 "deriving views cheaply").
    pub fn from_state(state: &GameState) -> Self {
        Self {
            local_view_3x3: state.local_view_3x3(),
            possible_moves: state.possible_moves(),
            battery_risk: state.battery_risk(),
            current_moves_count: state.current_moves_count(),
            state: state.clone(),
        }
    }
}

/// One message on a session's subscription channel (spec §6.4).
#[derive(Clone, Debug, Serialize)]
pub struct StateEnvelope {
    pub session_id: String,
    pub game_state: EnrichedState,
}
