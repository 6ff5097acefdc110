//! Game configurations: immutable templates a `GameState` is instantiated from.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cell::CellKind;
use crate::error::EngineError;
use crate::position::Position;

/// An immutable, validated game configuration.
///
/// Construct through [`GameConfig::validated`]; there is deliberately no
/// public constructor that skips validation, so every `GameConfig` in
/// circulation upholds (I7) by construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameConfig {
    pub name: String,
    pub description: String,
    pub grid_size: u32,
    pub max_battery: u32,
    pub starting_battery: u32,
    pub layout: Vec<String>,
    pub legend: HashMap<char, String>,
    pub wall_crash_ends_game: bool,
    pub messages: crate::messages::Messages,
}

impl GameConfig {
    /// Validate `raw` against every rule in the data model and return it
    /// wrapped if it passes. Rejects anything violating grid shape,
    /// required cells, legend exactness, message format slots, or the
    /// connectivity invariant (I7).
    pub fn validated(raw: GameConfig) -> Result<Self, EngineError> {
        if !(5..=50).contains(&raw.grid_size) {
            return Err(EngineError::InvalidConfig(format!(
                "grid_size must be in [5,50], got {}",
                raw.grid_size
            )));
        }
        if !(1..=100).contains(&raw.max_battery) {
            return Err(EngineError::InvalidConfig(format!(
                "max_battery must be in [1,100], got {}",
                raw.max_battery
            )));
        }
        if raw.starting_battery < 1 || raw.starting_battery > raw.max_battery {
            return Err(EngineError::InvalidConfig(format!(
                "starting_battery must be in [1,{}], got {}",
                raw.max_battery, raw.starting_battery
            )));
        }
        if raw.layout.len() != raw.grid_size as usize {
            return Err(EngineError::InvalidConfig(format!(
                "layout must have {} rows, got {}",
                raw.grid_size,
                raw.layout.len()
            )));
        }
        for (i, row) in raw.layout.iter().enumerate() {
            if row.chars().count() != raw.grid_size as usize {
                return Err(EngineError::InvalidConfig(format!(
                    "layout row {i} must have {} characters, got {}",
                    raw.grid_size,
                    row.chars().count()
                )));
            }
            for c in row.chars() {
                if CellKind::from_legend_char(c).is_none() {
                    return Err(EngineError::InvalidConfig(format!(
                        "layout row {i} contains unknown tile '{c}'"
                    )));
                }
            }
        }

        let legend_expected: HashMap<char, &str> = [
            ('R', "Road"),
            ('H', "Home"),
            ('P', "Park"),
            ('S', "Supercharger"),
            ('W', "Water"),
            ('B', "Building"),
        ]
        .into_iter()
        .collect();
        if raw.legend.len() != legend_expected.len() {
            return Err(EngineError::InvalidConfig(
                "legend must map exactly the six known tile characters".into(),
            ));
        }
        for (c, name) in &legend_expected {
            match raw.legend.get(c) {
                Some(v) if v == name => {}
                _ => {
                    return Err(EngineError::InvalidConfig(format!(
                        "legend entry for '{c}' must read \"{name}\""
                    )))
                }
            }
        }

        let home_count = count_char(&raw.layout, 'H');
        let park_count = count_char(&raw.layout, 'P');
        if home_count == 0 {
            return Err(EngineError::InvalidConfig("layout has no Home cell".into()));
        }
        if park_count == 0 {
            return Err(EngineError::InvalidConfig("layout has no Park cell".into()));
        }

        for (field, actual, expected) in raw.messages.slot_counts() {
            if actual != expected {
                return Err(EngineError::InvalidConfig(format!(
                    "message '{field}' must contain {expected} '%d' slot(s), found {actual}"
                )));
            }
        }

        validate_connectivity(&raw)?;

        Ok(raw)
    }

    /// Charger and park positions, used by connectivity validation and by
    /// the engine's battery-risk classification.
    pub fn charger_positions(&self) -> Vec<Position> {
        positions_of(&self.layout, |c| {
            matches!(CellKind::from_legend_char(c), Some(k) if k.is_charger())
        })
    }

    pub fn park_positions(&self) -> Vec<Position> {
        positions_of(&self.layout, |c| c == 'P')
    }

    pub fn tile_at(&self, pos: Position) -> Option<char> {
        if pos.y < 0 || pos.x < 0 {
            return None;
        }
        self.layout
            .get(pos.y as usize)
            .and_then(|row| row.chars().nth(pos.x as usize))
    }
}

fn count_char(layout: &[String], needle: char) -> usize {
    layout.iter().flat_map(|r| r.chars()).filter(|c| *c == needle).count()
}

fn positions_of(layout: &[String], pred: impl Fn(char) -> bool) -> Vec<Position> {
    let mut out = Vec::new();
    for (y, row) in layout.iter().enumerate() {
        for (x, c) in row.chars().enumerate() {
            if pred(c) {
                out.push(Position::new(x as i32, y as i32));
            }
        }
    }
    out
}

/// (I7 / connectivity invariant): every park must be within `max_battery`
/// Manhattan steps of some charger.
fn validate_connectivity(config: &GameConfig) -> Result<(), EngineError> {
    let chargers = config.charger_positions();
    for park in config.park_positions() {
        let reachable = chargers
            .iter()
            .any(|&c| park.manhattan_distance(c) <= config.max_battery as i32);
        if !reachable {
            return Err(EngineError::InvalidConfig(format!(
                "park at ({},{}) is farther than max_battery ({}) from every charger",
                park.x, park.y, config.max_battery
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Messages;

    fn sample_messages() -> Messages {
        Messages {
            welcome: "Welcome!".into(),
            home_charge: "Charged at home.".into(),
            supercharger_charge: "Charged at supercharger.".into(),
            park_visited: "Visited park, score %d".into(),
            park_already_visited: "Already visited.".into(),
            victory: "You won with score %d!".into(),
            out_of_battery: "Out of battery.".into(),
            stranded: "Stranded.".into(),
            cant_move: "Can't move there.".into(),
            battery_status: "Battery %d/%d".into(),
            hit_wall: "You hit a wall.".into(),
        }
    }

    fn legend() -> HashMap<char, String> {
        [
            ('R', "Road"),
            ('H', "Home"),
            ('P', "Park"),
            ('S', "Supercharger"),
            ('W', "Water"),
            ('B', "Building"),
        ]
        .into_iter()
        .map(|(c, n)| (c, n.to_string()))
        .collect()
    }

    fn sample_raw() -> GameConfig {
        GameConfig {
            name: "sample".into(),
            description: "5x5 sample".into(),
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
            legend: legend(),
            wall_crash_ends_game: false,
            messages: sample_messages(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(GameConfig::validated(sample_raw()).is_ok());
    }

    #[test]
    fn rejects_bad_row_length() {
        let mut raw = sample_raw();
        raw.layout[0] = "BBBB".into();
        assert!(GameConfig::validated(raw).is_err());
    }

    #[test]
    fn rejects_missing_home() {
        let mut raw = sample_raw();
        raw.layout = raw
            .layout
            .iter()
            .map(|r| r.replace('H', "R"))
            .collect();
        assert!(GameConfig::validated(raw).is_err());
    }

    #[test]
    fn rejects_unreachable_park() {
        let mut raw = sample_raw();
        raw.max_battery = 1;
        raw.starting_battery = 1;
        assert!(matches!(
            GameConfig::validated(raw),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_bad_message_slots() {
        let mut raw = sample_raw();
        raw.messages.park_visited = "No slot here".into();
        assert!(GameConfig::validated(raw).is_err());
    }

    #[test]
    fn rejects_wrong_legend_mapping() {
        let mut raw = sample_raw();
        raw.legend.insert('R', "Street".into());
        assert!(GameConfig::validated(raw).is_err());
    }
}
