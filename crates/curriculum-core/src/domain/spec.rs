//! Input specs: scenarios, tasks and the static sequence table.
//!
//! A sequence is an ordered curriculum of tasks. The tables below are built
//! once per process and never mutated.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key into the scenario registry (e.g. `"world1"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScenarioId(String);

impl ScenarioId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The built-in scenarios: the eight worlds, four stages each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    World1,
    World2,
    World3,
    World4,
    World5,
    World6,
    World7,
    World8,
}

impl Scenario {
    pub const ALL: [Scenario; 8] = [
        Scenario::World1,
        Scenario::World2,
        Scenario::World3,
        Scenario::World4,
        Scenario::World5,
        Scenario::World6,
        Scenario::World7,
        Scenario::World8,
    ];

    pub fn world(self) -> u8 {
        match self {
            Scenario::World1 => 1,
            Scenario::World2 => 2,
            Scenario::World3 => 3,
            Scenario::World4 => 4,
            Scenario::World5 => 5,
            Scenario::World6 => 6,
            Scenario::World7 => 7,
            Scenario::World8 => 8,
        }
    }

    pub fn id(self) -> ScenarioId {
        ScenarioId::new(format!("world{}", self.world()))
    }
}

/// `Level{world}-{stage}`
pub fn level_name(world: u8, stage: u8) -> String {
    format!("Level{world}-{stage}")
}

/// A single task of a sequence.
///
/// `overrides` are per-task scenario parameters (e.g. `reward_position`);
/// they are validated by the scenario constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub scenario: ScenarioId,
    pub task_name: String,
    #[serde(default)]
    pub overrides: Map<String, Value>,
}

impl TaskSpec {
    pub fn new(scenario: ScenarioId, task_name: impl Into<String>) -> Self {
        Self {
            scenario,
            task_name: task_name.into(),
            overrides: Map::new(),
        }
    }

    pub fn with_override(mut self, key: impl Into<String>, value: Value) -> Self {
        self.overrides.insert(key.into(), value);
        self
    }
}

/// Named curricula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sequence {
    /// Worlds 1-4, first stage of each.
    WorldProgression4,
    /// Worlds 1-8, first stage of each.
    WorldProgression8,
    /// Stage types 1-1, 2-2, 3-3, 4-4.
    StageTypes4,
    /// Every stage of world 1 and world 4.
    WorldComplete,
    /// First stages ordered by difficulty.
    DifficultyCurve,
    /// Interleaved worlds and stage types.
    MixedWorlds,
}

impl Sequence {
    pub const ALL: [Sequence; 6] = [
        Sequence::WorldProgression4,
        Sequence::WorldProgression8,
        Sequence::StageTypes4,
        Sequence::WorldComplete,
        Sequence::DifficultyCurve,
        Sequence::MixedWorlds,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Sequence::WorldProgression4 => "WORLD_PROGRESSION_4",
            Sequence::WorldProgression8 => "WORLD_PROGRESSION_8",
            Sequence::StageTypes4 => "STAGE_TYPES_4",
            Sequence::WorldComplete => "WORLD_COMPLETE",
            Sequence::DifficultyCurve => "DIFFICULTY_CURVE",
            Sequence::MixedWorlds => "MIXED_WORLDS",
        }
    }

    /// Ordered task list of this sequence.
    pub fn tasks(self) -> &'static [TaskSpec] {
        SEQUENCE_TABLE
            .get(&self)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Sequence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|seq| seq.name() == upper)
            .ok_or_else(|| format!("unknown sequence '{s}'"))
    }
}

static SEQUENCE_TABLE: LazyLock<HashMap<Sequence, Vec<TaskSpec>>> = LazyLock::new(|| {
    use Scenario::*;

    let pairs = |entries: &[(Scenario, u8)]| -> Vec<TaskSpec> {
        entries
            .iter()
            .map(|&(scenario, stage)| TaskSpec::new(scenario.id(), level_name(scenario.world(), stage)))
            .collect()
    };

    let first_stages: Vec<(Scenario, u8)> = Scenario::ALL.iter().map(|&s| (s, 1)).collect();

    let mut table = HashMap::new();
    table.insert(
        Sequence::WorldProgression4,
        pairs(&[(World1, 1), (World2, 1), (World3, 1), (World4, 1)]),
    );
    table.insert(Sequence::WorldProgression8, pairs(&first_stages));
    table.insert(
        Sequence::StageTypes4,
        pairs(&[(World1, 1), (World2, 2), (World3, 3), (World4, 4)]),
    );
    table.insert(
        Sequence::WorldComplete,
        pairs(&[
            (World1, 1),
            (World1, 2),
            (World1, 3),
            (World1, 4),
            (World4, 1),
            (World4, 2),
            (World4, 3),
            (World4, 4),
        ]),
    );
    table.insert(Sequence::DifficultyCurve, pairs(&first_stages));
    table.insert(
        Sequence::MixedWorlds,
        pairs(&[
            (World1, 1),
            (World3, 2),
            (World5, 3),
            (World7, 4),
            (World2, 1),
            (World4, 2),
            (World6, 3),
            (World8, 4),
        ]),
    );
    table
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_sequence_has_tasks() {
        for seq in Sequence::ALL {
            assert!(!seq.tasks().is_empty(), "{seq} has no tasks");
        }
    }

    #[test]
    fn mixed_worlds_order_is_preserved() {
        let names: Vec<&str> = Sequence::MixedWorlds
            .tasks()
            .iter()
            .map(|t| t.task_name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "Level1-1", "Level3-2", "Level5-3", "Level7-4", "Level2-1", "Level4-2",
                "Level6-3", "Level8-4"
            ]
        );
        assert_eq!(Sequence::MixedWorlds.tasks()[3].scenario, ScenarioId::new("world7"));
    }

    #[test]
    fn sequence_parses_case_insensitively() {
        assert_eq!(
            "world_complete".parse::<Sequence>().unwrap(),
            Sequence::WorldComplete
        );
        assert!("nope".parse::<Sequence>().is_err());
    }

    #[test]
    fn task_spec_without_overrides_deserializes() {
        let json = r#"{ "scenario": "world2", "task_name": "Level2-3" }"#;
        let spec: TaskSpec = serde_json::from_str(json).expect("deserialize");
        assert_eq!(spec.scenario.as_str(), "world2");
        assert!(spec.overrides.is_empty());
    }
}
