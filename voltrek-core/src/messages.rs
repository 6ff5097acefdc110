//! Templated event messages rendered by the engine.

use serde::{Deserialize, Serialize};

/// The fixed set of message templates a config must supply.
///
/// `%d` slots are substituted positionally; `park_visited`, `victory`
/// and `battery_status` carry one or two slots respectively, checked
/// at validation time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Messages {
    pub welcome: String,
    pub home_charge: String,
    pub supercharger_charge: String,
    /// must contain exactly one `%d`
    pub park_visited: String,
    pub park_already_visited: String,
    /// must contain exactly one `%d`
    pub victory: String,
    pub out_of_battery: String,
    pub stranded: String,
    pub cant_move: String,
    /// must contain exactly two `%d`
    pub battery_status: String,
    pub hit_wall: String,
}

impl Messages {
    pub fn render_park_visited(&self, score: u32) -> String {
        render1(&self.park_visited, score)
    }

    pub fn render_victory(&self, score: u32) -> String {
        render1(&self.victory, score)
    }

    pub fn render_battery_status(&self, battery: u32, max_battery: u32) -> String {
        let once = render1(&self.battery_status, battery);
        render1(&once, max_battery)
    }

    pub fn render_hit_wall(&self, kind_name: &str, x: i32, y: i32) -> String {
        format!("{} ({} at {},{})", self.hit_wall, kind_name, x, y)
    }

    pub fn render_cant_move(&self, kind_name: &str, x: i32, y: i32) -> String {
        format!("{} ({} at {},{})", self.cant_move, kind_name, x, y)
    }

    /// Number of `%d` slots in each templated field, used by validation.
    pub(crate) fn slot_counts(&self) -> Vec<(&'static str, usize, usize)> {
        vec![
            ("park_visited", count_slots(&self.park_visited), 1),
            ("victory", count_slots(&self.victory), 1),
            ("battery_status", count_slots(&self.battery_status), 2),
        ]
    }
}

fn count_slots(s: &str) -> usize {
    s.matches("%d").count()
}

fn render1(template: &str, value: u32) -> String {
    template.replacen("%d", &value.to_string(), 1)
}
