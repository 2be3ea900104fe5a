//! State snapshots: named engine variables captured once per agent step.
//!
//! Tracked variables live in a fixed array indexed by a precomputed
//! [`VariableId`]; anything else is kept in a small side map. Lookups by name
//! never fail: unknown names resolve to `0.0`.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Variables captured from the engine on every step.
pub const TRACKED_VARIABLES: [&str; 38] = [
    "area",
    "coins",
    "enemy_drawn15",
    "enemy_drawn16",
    "enemy_drawn17",
    "enemy_drawn18",
    "enemy_drawn19",
    "enemy_kill30",
    "enemy_kill31",
    "enemy_kill32",
    "enemy_kill33",
    "enemy_kill34",
    "enemy_kill35",
    "fireball_counter",
    "jump_airborne",
    "levelHi",
    "levelLo",
    "level_layout",
    "lives",
    "moving_direction",
    "player_sprite",
    "player_state",
    "player_x_posHi",
    "player_x_posLo",
    "player_y_pos",
    "player_y_screen",
    "powerstate",
    "powerup_appear",
    "powerup_yes_no",
    "score",
    "scrolling",
    "stage",
    "star_timer",
    "time",
    "walk_animation",
    "world",
    "xscrollHi",
    "xscrollLo",
];

const TRACKED_COUNT: usize = TRACKED_VARIABLES.len();

static VARIABLE_IDS: LazyLock<HashMap<&'static str, VariableId>> = LazyLock::new(|| {
    TRACKED_VARIABLES
        .iter()
        .enumerate()
        .map(|(i, name)| (*name, VariableId(i as u16)))
        .collect()
});

/// Index of a tracked variable in [`TRACKED_VARIABLES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableId(u16);

impl VariableId {
    pub fn lookup(name: &str) -> Option<Self> {
        VARIABLE_IDS.get(name).copied()
    }

    pub fn name(self) -> &'static str {
        TRACKED_VARIABLES[self.0 as usize]
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One step's worth of engine variables. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(with = "tracked_values")]
    tracked: [f64; TRACKED_COUNT],
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    extra: BTreeMap<String, f64>,
}

impl StateSnapshot {
    /// All-zero snapshot, returned by an empty history.
    pub const fn zero() -> Self {
        Self {
            tracked: [0.0; TRACKED_COUNT],
            extra: BTreeMap::new(),
        }
    }

    /// Capture the tracked variables (plus `extra_names`) through `lookup`.
    pub fn capture<F>(lookup: F, extra_names: &[String]) -> Self
    where
        F: Fn(&str) -> f64,
    {
        let mut snapshot = Self::zero();
        for (slot, name) in snapshot.tracked.iter_mut().zip(TRACKED_VARIABLES) {
            *slot = lookup(name);
        }
        for name in extra_names {
            if VariableId::lookup(name).is_none() {
                snapshot.extra.insert(name.clone(), lookup(name));
            }
        }
        snapshot
    }

    /// Build a snapshot from explicit name/value pairs. Unlisted variables are zero.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut snapshot = Self::zero();
        for (name, value) in pairs {
            match VariableId::lookup(name) {
                Some(id) => snapshot.tracked[id.index()] = value,
                None => {
                    snapshot.extra.insert(name.to_string(), value);
                }
            }
        }
        snapshot
    }

    pub fn get(&self, name: &str) -> f64 {
        match VariableId::lookup(name) {
            Some(id) => self.tracked[id.index()],
            None => self.extra.get(name).copied().unwrap_or(0.0),
        }
    }

    pub fn get_id(&self, id: VariableId) -> f64 {
        self.tracked[id.index()]
    }

    /// Horizontal scroll position, `xscrollHi * 256 + xscrollLo`.
    pub fn x_position(&self) -> f64 {
        self.get("xscrollHi") * 256.0 + self.get("xscrollLo")
    }
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self::zero()
    }
}

// serde does not derive for arrays longer than 32.
mod tracked_values {
    use super::TRACKED_COUNT;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64; TRACKED_COUNT], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(values.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[f64; TRACKED_COUNT], D::Error> {
        let values = Vec::<f64>::deserialize(d)?;
        let len = values.len();
        values
            .try_into()
            .map_err(|_| D::Error::invalid_length(len, &"one value per tracked variable"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_resolve_to_zero() {
        let snapshot = StateSnapshot::from_pairs([("coins", 3.0)]);
        assert_eq!(snapshot.get("coins"), 3.0);
        assert_eq!(snapshot.get("definitely_not_a_variable"), 0.0);
    }

    #[test]
    fn variable_ids_match_names() {
        let id = VariableId::lookup("xscrollLo").expect("tracked");
        assert_eq!(id.name(), "xscrollLo");

        let snapshot = StateSnapshot::from_pairs([("xscrollLo", 17.0)]);
        assert_eq!(snapshot.get_id(id), 17.0);
    }

    #[test]
    fn capture_reads_tracked_and_extra_names() {
        let snapshot = StateSnapshot::capture(
            |name| match name {
                "score" => 500.0,
                "custom_counter" => 2.0,
                _ => 0.0,
            },
            &["custom_counter".to_string(), "score".to_string()],
        );
        assert_eq!(snapshot.get("score"), 500.0);
        assert_eq!(snapshot.get("custom_counter"), 2.0);
    }

    #[test]
    fn x_position_combines_hi_and_lo_bytes() {
        let snapshot = StateSnapshot::from_pairs([("xscrollHi", 2.0), ("xscrollLo", 10.0)]);
        assert_eq!(snapshot.x_position(), 522.0);
    }
}
