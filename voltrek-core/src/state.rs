//! Mutable per-session game state and the views derived from it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellKind};
use crate::config::GameConfig;
use crate::position::{Direction, Position};

/// One entry in the append-only move log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveEntry {
    pub action: Direction,
    pub from: Position,
    pub to: Position,
    pub battery_after: u32,
    pub unix_ts: u64,
    pub success: bool,
    /// `total_moves` at the time this entry was appended.
    pub move_number: u64,
}

/// Battery-risk classification, by Manhattan distance to the nearest charger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatteryRisk {
    Critical,
    Warning,
    Danger,
    Caution,
    Low,
    Safe,
}

/// The mutable state of one session's grid game.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    pub grid: Vec<Vec<Cell>>,
    pub player_pos: Position,
    pub battery: u32,
    pub max_battery: u32,
    pub score: u32,
    pub visited_parks: HashSet<u32>,
    pub message: String,
    pub game_over: bool,
    pub victory: bool,
    pub config_name: String,
    /// Cumulative across resets.
    pub total_moves: u64,
    /// Append-only, cumulative across resets.
    pub move_history: Vec<MoveEntry>,
    /// Cleared on reset.
    pub current_moves: Vec<MoveEntry>,
}

impl GameState {
    /// Instantiate fresh state from `config`, with no history at all.
    /// Used by `SessionManager::create`.
    pub fn new(config: &GameConfig) -> Self {
        let mut state = Self {
            grid: Vec::new(),
            player_pos: Position::new(0, 0),
            battery: config.starting_battery,
            max_battery: config.max_battery,
            score: 0,
            visited_parks: HashSet::new(),
            message: config.messages.welcome.clone(),
            game_over: false,
            victory: false,
            config_name: config.name.clone(),
            total_moves: 0,
            move_history: Vec::new(),
            current_moves: Vec::new(),
        };
        state.reinstantiate_from(config);
        state
    }

    /// (I6) Re-derive grid/player/battery/score from `config`, preserving
    /// `move_history` and `total_moves`; clear `current_moves`.
    pub fn reset(&mut self, config: &GameConfig) {
        self.reinstantiate_from(config);
        self.current_moves.clear();
    }

    /// `current_moves_count` is deliberately not stored: spec.md leaves
    /// the intent of a separate counter undocumented and suggests
    /// implementations expose only one derived value.
    pub fn current_moves_count(&self) -> usize {
        self.current_moves.len()
    }

    fn reinstantiate_from(&mut self, config: &GameConfig) {
        let mut grid = Vec::with_capacity(config.layout.len());
        let mut next_park_id = 0u32;
        let mut home_pos = Position::new(0, 0);
        for (y, row) in config.layout.iter().enumerate() {
            let mut grid_row = Vec::with_capacity(row.chars().count());
            for (x, c) in row.chars().enumerate() {
                let kind = CellKind::from_legend_char(c)
                    .expect("config is validated before a GameState is built from it");
                let cell = if kind == CellKind::Park {
                    let cell = Cell::park(next_park_id);
                    next_park_id += 1;
                    cell
                } else {
                    Cell::new(kind)
                };
                if kind == CellKind::Home {
                    home_pos = Position::new(x as i32, y as i32);
                }
                grid_row.push(cell);
            }
            grid.push(grid_row);
        }

        self.grid = grid;
        self.player_pos = home_pos;
        self.battery = config.starting_battery;
        self.max_battery = config.max_battery;
        self.score = 0;
        self.visited_parks.clear();
        self.message = config.messages.welcome.clone();
        self.game_over = false;
        self.victory = false;
        self.config_name = config.name.clone();
    }

    pub fn total_parks(&self) -> u32 {
        self.grid
            .iter()
            .flatten()
            .filter(|c| c.kind == CellKind::Park)
            .count() as u32
    }

    pub fn cell_at(&self, pos: Position) -> Option<Cell> {
        if pos.y < 0 || pos.x < 0 {
            return None;
        }
        self.grid
            .get(pos.y as usize)
            .and_then(|row| row.get(pos.x as usize))
            .copied()
    }

    fn set_cell(&mut self, pos: Position, cell: Cell) {
        if let Some(row) = self.grid.get_mut(pos.y as usize) {
            if let Some(slot) = row.get_mut(pos.x as usize) {
                *slot = cell;
            }
        }
    }

    pub(crate) fn mark_park_visited(&mut self, pos: Position, park_id: u32) {
        if let Some(mut cell) = self.cell_at(pos) {
            cell.visited = true;
            self.set_cell(pos, cell);
        }
        self.visited_parks.insert(park_id);
    }

    /// The 3x3 tile-char view centered on the player, `T` at the center,
    /// off-grid neighbors rendered as `B` (impassable).
    pub fn local_view_3x3(&self) -> [String; 3] {
        let mut rows = [String::new(), String::new(), String::new()];
        for (ry, dy) in (-1..=1).enumerate() {
            let mut row = String::with_capacity(3);
            for dx in -1..=1 {
                let pos = Position::new(self.player_pos.x + dx, self.player_pos.y + dy);
                if dx == 0 && dy == 0 {
                    row.push('T');
                } else {
                    row.push(self.cell_at(pos).map(|c| c.kind.legend_char()).unwrap_or('B'));
                }
            }
            rows[ry] = row;
        }
        rows
    }

    /// Directions that lead to an in-bounds, passable cell, provided
    /// there is battery left to spend on the move.
    pub fn possible_moves(&self) -> Vec<Direction> {
        if self.battery == 0 {
            return Vec::new();
        }
        Direction::ALL
            .into_iter()
            .filter(|&dir| {
                self.cell_at(self.player_pos.stepped(dir))
                    .is_some_and(|c| c.kind.is_passable())
            })
            .collect()
    }

    /// Nearest Manhattan distance from the player to any charger, if one exists.
    pub fn nearest_charger_distance(&self) -> Option<i32> {
        let mut best: Option<i32> = None;
        for (y, row) in self.grid.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if cell.kind.is_charger() {
                    let d = self.player_pos.manhattan_distance(Position::new(x as i32, y as i32));
                    best = Some(best.map_or(d, |b| b.min(d)));
                }
            }
        }
        best
    }

    pub fn battery_risk(&self) -> BatteryRisk {
        if self.battery == 0 {
            return BatteryRisk::Critical;
        }
        let Some(d_star) = self.nearest_charger_distance() else {
            return BatteryRisk::Warning;
        };
        let battery = self.battery as i32;
        if battery <= d_star {
            BatteryRisk::Danger
        } else if battery <= d_star + 2 {
            BatteryRisk::Caution
        } else if battery <= (self.max_battery / 3) as i32 {
            BatteryRisk::Low
        } else {
            BatteryRisk::Safe
        }
    }
}
