//! Pure grid-game state machine: the deterministic core of a voltrek
//! session. No I/O, no clocks — callers supply timestamps and own all
//! persistence and networking.

mod cell;
mod config;
mod engine;
mod error;
mod messages;
mod position;
mod registry;
mod state;

pub use cell::{Cell, CellKind};
pub use config::GameConfig;
pub use engine::{apply, Step, StepFailureReason};
pub use error::EngineError;
pub use messages::Messages;
pub use position::{Direction, ParseDirectionError, Position};
pub use registry::{ConfigInfo, ConfigRegistry};
pub use state::{BatteryRisk, GameState, MoveEntry};

/// A compiled-in default 5x5 configuration, used when callers create a
/// session without naming one. Mirrors the literal scenario in the
/// testable-properties section: a small loop with one Home, one
/// Supercharger, and four Park cells.
pub fn default_config() -> GameConfig {
    use std::collections::HashMap;

    let legend: HashMap<char, String> = [
        ('R', "Road"),
        ('H', "Home"),
        ('P', "Park"),
        ('S', "Supercharger"),
        ('W', "Water"),
        ('B', "Building"),
    ]
    .into_iter()
    .map(|(c, n)| (c, n.to_string()))
    .collect();

    GameConfig::validated(GameConfig {
        name: "default".into(),
        description: "A small loop: one home, one supercharger, four parks.".into(),
        grid_size: 5,
        max_battery: 10,
        starting_battery: 8,
        layout: vec![
            "BBBBB".into(),
            "BRHPB".into(),
            "BRWSB".into(),
            "BPPPB".into(),
            "BBBBB".into(),
        ],
        legend,
        wall_crash_ends_game: false,
        messages: Messages {
            welcome: "Plug in and go. Find every park before you run flat.".into(),
            home_charge: "Home charger: battery topped up.".into(),
            supercharger_charge: "Supercharger: battery topped up.".into(),
            park_visited: "Park collected! Score: %d".into(),
            park_already_visited: "You've already been here.".into(),
            victory: "Every park visited. Final score: %d".into(),
            out_of_battery: "Battery empty. The trip ends here.".into(),
            stranded: "Stranded with an empty battery, far from a charger.".into(),
            cant_move: "Can't go that way.".into(),
            battery_status: "Battery: %d/%d".into(),
            hit_wall: "Crashed.".into(),
        },
    })
    .expect("the compiled-in default config must itself be valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let _ = default_config();
    }

    #[test]
    fn default_config_spawns_a_playable_state() {
        let config = default_config();
        let state = GameState::new(&config);
        assert!(!state.game_over);
        assert_eq!(state.battery, config.starting_battery);
    }
}
