//! Grid cell kinds and the per-cell state carried on the grid.

use serde::{Deserialize, Serialize};

/// The terrain a grid cell is made of.
///
/// Road, Home, Park and Supercharger are passable; Water and Building
/// are not. Home and Supercharger are chargers: entering one fills the
/// battery to `max_battery`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Road,
    Home,
    Park,
    Supercharger,
    Water,
    Building,
}

impl CellKind {
    /// The legend character this kind is addressed by in a layout row.
    pub fn legend_char(self) -> char {
        match self {
            CellKind::Road => 'R',
            CellKind::Home => 'H',
            CellKind::Park => 'P',
            CellKind::Supercharger => 'S',
            CellKind::Water => 'W',
            CellKind::Building => 'B',
        }
    }

    pub fn from_legend_char(c: char) -> Option<Self> {
        match c {
            'R' => Some(CellKind::Road),
            'H' => Some(CellKind::Home),
            'P' => Some(CellKind::Park),
            'S' => Some(CellKind::Supercharger),
            'W' => Some(CellKind::Water),
            'B' => Some(CellKind::Building),
            _ => None,
        }
    }

    pub fn is_passable(self) -> bool {
        !matches!(self, CellKind::Water | CellKind::Building)
    }

    pub fn is_charger(self) -> bool {
        matches!(self, CellKind::Home | CellKind::Supercharger)
    }
}

/// One grid cell: its terrain, and (for parks) identity and visited state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub kind: CellKind,
    /// Present only on `Park` cells, stable for the lifetime of the config.
    pub park_id: Option<u32>,
    /// Set only on `Park` cells, once entered.
    pub visited: bool,
}

impl Cell {
    pub fn new(kind: CellKind) -> Self {
        Self {
            kind,
            park_id: None,
            visited: false,
        }
    }

    pub fn park(park_id: u32) -> Self {
        Self {
            kind: CellKind::Park,
            park_id: Some(park_id),
            visited: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legend_roundtrip() {
        for kind in [
            CellKind::Road,
            CellKind::Home,
            CellKind::Park,
            CellKind::Supercharger,
            CellKind::Water,
            CellKind::Building,
        ] {
            assert_eq!(CellKind::from_legend_char(kind.legend_char()), Some(kind));
        }
    }

    #[test]
    fn passability() {
        assert!(CellKind::Road.is_passable());
        assert!(CellKind::Park.is_passable());
        assert!(!CellKind::Water.is_passable());
        assert!(!CellKind::Building.is_passable());
    }

    #[test]
    fn chargers() {
        assert!(CellKind::Home.is_charger());
        assert!(CellKind::Supercharger.is_charger());
        assert!(!CellKind::Park.is_charger());
    }
}
