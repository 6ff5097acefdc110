//! The engine-level end-to-end scenarios from the testable-properties
//! section, run directly against `apply`/`GameState` (no session
//! manager or command service involved — those live in voltrek-server
//! and get their own scenario tests there, covering bulk-move
//! truncation (E5) and reset+history (E6)).

use std::collections::HashMap;

use voltrek_core::{Direction, GameConfig, GameState, Messages, Position};

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

fn scenario_config(wall_crash_ends_game: bool) -> GameConfig {
    GameConfig::validated(GameConfig {
        name: "e2e".into(),
        description: "literal end-to-end scenario layout".into(),
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
        wall_crash_ends_game,
        messages: Messages {
            welcome: "Welcome!".into(),
            home_charge: "Home charge.".into(),
            supercharger_charge: "Supercharger charge.".into(),
            park_visited: "Park visited, score %d".into(),
            park_already_visited: "Already visited.".into(),
            victory: "Victory with score %d".into(),
            out_of_battery: "Out of battery.".into(),
            stranded: "Stranded.".into(),
            cant_move: "Cant move.".into(),
            battery_status: "Battery %d/%d".into(),
            hit_wall: "Hit wall.".into(),
        },
    })
    .expect("scenario config must validate")
}

#[test]
fn e1_first_move_right_collects_a_park() {
    let config = scenario_config(false);
    let state = GameState::new(&config);
    assert_eq!(state.player_pos, Position::new(2, 1));

    let (next, step) = voltrek_core::apply(&state, &config, Direction::Right);

    assert_eq!(next.player_pos, Position::new(3, 1));
    assert_eq!(next.battery, 7);
    assert_eq!(next.score, 1);
    assert!(next.visited_parks.contains(&0));
    assert_eq!(next.message, "Park visited, score 1");
    assert!(step.success);
}

#[test]
fn e2_move_down_into_water_is_blocked() {
    let config = scenario_config(false);
    let state = GameState::new(&config);
    let (after_e1, _) = voltrek_core::apply(&state, &config, Direction::Right);

    let (after_e2, step) = voltrek_core::apply(&after_e1, &config, Direction::Down);

    assert!(!step.success);
    assert_eq!(
        step.reason,
        Some(voltrek_core::StepFailureReason::Blocked)
    );
    assert_eq!(after_e2.player_pos, after_e1.player_pos);
    assert_eq!(after_e2.battery, 7);
}

#[test]
fn e3_bulk_like_sequence_right_left_right() {
    let config = scenario_config(false);
    let state = GameState::new(&config);

    let (s1, step1) = voltrek_core::apply(&state, &config, Direction::Right);
    assert!(step1.success);
    let (s2, step2) = voltrek_core::apply(&s1, &config, Direction::Left);
    assert!(step2.success);
    assert_eq!(step2.charged, Some(true));
    let (s3, step3) = voltrek_core::apply(&s2, &config, Direction::Right);
    assert!(step3.success);

    assert_eq!(s3.player_pos, Position::new(3, 1));
    assert_eq!(s3.battery, 9);
    assert_eq!(s3.score, 1);
    assert_eq!(s3.message, "Already visited.");
}

#[test]
fn e4_forced_low_battery_strands_on_road() {
    let config = scenario_config(false);
    let mut state = GameState::new(&config);
    state.battery = 1;

    let (next, step) = voltrek_core::apply(&state, &config, Direction::Left);

    assert!(step.success);
    assert_eq!(next.battery, 0);
    assert!(next.game_over);
    assert_eq!(next.score, 0);
    assert_eq!(next.message, "Stranded.");
}
