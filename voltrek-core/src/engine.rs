//! The pure state transformer: `apply` and the facts it returns.
//!
//! No clocks, no I/O. Timestamps for the move log are supplied by the
//! caller (the command service), never read from the system clock here.

use serde::{Deserialize, Serialize};

use crate::cell::CellKind;
use crate::config::GameConfig;
use crate::position::{Direction, Position};
use crate::state::GameState;

/// Why a step did not commit a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepFailureReason {
    GameOver,
    WallCrash,
    Blocked,
    OutOfBattery,
}

/// Per-step facts produced by [`apply`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Step {
    pub dir: Direction,
    pub from: Position,
    pub to: Position,
    pub tile_char: char,
    pub tile_kind: CellKind,
    pub battery_before: u32,
    pub battery_after: u32,
    pub success: bool,
    pub charged: Option<bool>,
    pub park_id: Option<u32>,
    pub victory: bool,
    pub reason: Option<StepFailureReason>,
}

impl Step {
    fn unchanged(dir: Direction, state: &GameState, reason: StepFailureReason) -> Self {
        let here = state.cell_at(state.player_pos);
        Step {
            dir,
            from: state.player_pos,
            to: state.player_pos,
            tile_char: here.map(|c| c.kind.legend_char()).unwrap_or('B'),
            tile_kind: here.map(|c| c.kind).unwrap_or(CellKind::Building),
            battery_before: state.battery,
            battery_after: state.battery,
            success: false,
            charged: None,
            park_id: None,
            victory: false,
            reason: Some(reason),
        }
    }
}

/// Apply one directional move to `state` under `config`, producing the
/// resulting state and the `Step` describing what happened.
///
/// Ordering is part of the contract: game-over check, then the
/// collision check, then the battery check, then commit, then resolve
/// the entered cell, then the post-commit stranded check.
pub fn apply(state: &GameState, config: &GameConfig, dir: Direction) -> (GameState, Step) {
    let mut next = state.clone();

    if next.game_over {
        let step = Step::unchanged(dir, &next, StepFailureReason::GameOver);
        return (next, step);
    }

    let target = next.player_pos.stepped(dir);
    let target_char = config.tile_at(target).unwrap_or('B');
    let target_kind = CellKind::from_legend_char(target_char).unwrap_or(CellKind::Building);
    let battery_before = next.battery;

    if !target_kind.is_passable() {
        if config.wall_crash_ends_game {
            next.game_over = true;
            next.message = config.messages.render_hit_wall(kind_name(target_kind), target.x, target.y);
            let mut step = Step::unchanged(dir, &next, StepFailureReason::WallCrash);
            step.to = target;
            step.tile_char = target_char;
            step.tile_kind = target_kind;
            return (next, step);
        } else {
            next.message = config.messages.render_cant_move(kind_name(target_kind), target.x, target.y);
            let mut step = Step::unchanged(dir, &next, StepFailureReason::Blocked);
            step.to = target;
            step.tile_char = target_char;
            step.tile_kind = target_kind;
            return (next, step);
        }
    }

    if next.battery == 0 {
        next.game_over = true;
        next.message = config.messages.out_of_battery.clone();
        let mut step = Step::unchanged(dir, &next, StepFailureReason::OutOfBattery);
        step.to = target;
        step.tile_char = target_char;
        step.tile_kind = target_kind;
        return (next, step);
    }

    // Commit the move.
    let from = next.player_pos;
    next.player_pos = target;
    next.battery -= 1;

    let mut charged = None;
    let mut park_id = None;
    let mut victory = false;

    match target_kind {
        CellKind::Home => {
            next.battery = next.max_battery;
            charged = Some(true);
            next.message = config.messages.home_charge.clone();
        }
        CellKind::Supercharger => {
            next.battery = next.max_battery;
            charged = Some(true);
            next.message = config.messages.supercharger_charge.clone();
        }
        CellKind::Park => {
            let pid = next
                .cell_at(target)
                .and_then(|c| c.park_id)
                .expect("target is a Park cell and must carry a park_id");
            park_id = Some(pid);
            if !next.visited_parks.contains(&pid) {
                next.mark_park_visited(target, pid);
                next.score += 1;
                next.message = config.messages.render_park_visited(next.score);
                if next.score == next.total_parks() {
                    next.victory = true;
                    next.game_over = true;
                    next.message = config.messages.render_victory(next.score);
                    victory = true;
                }
            } else {
                next.message = config.messages.park_already_visited.clone();
            }
        }
        CellKind::Road => {
            next.message = config.messages.render_battery_status(next.battery, next.max_battery);
        }
        CellKind::Water | CellKind::Building => unreachable!("filtered by the passability check above"),
    }

    // Stranded check, post-commit: battery 0 and not standing on a charger.
    if next.battery == 0 && !target_kind.is_charger() {
        next.game_over = true;
        next.message = config.messages.stranded.clone();
    }

    let step = Step {
        dir,
        from,
        to: target,
        tile_char: target_char,
        tile_kind: target_kind,
        battery_before,
        battery_after: next.battery,
        success: true,
        charged,
        park_id,
        victory,
        reason: None,
    };

    (next, step)
}

fn kind_name(kind: CellKind) -> &'static str {
    match kind {
        CellKind::Road => "Road",
        CellKind::Home => "Home",
        CellKind::Park => "Park",
        CellKind::Supercharger => "Supercharger",
        CellKind::Water => "Water",
        CellKind::Building => "Building",
    }
}
