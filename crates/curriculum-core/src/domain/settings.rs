//! Engine settings: default per-engine arguments merged with caller overrides.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::ConfigError;
use super::history::DEFAULT_HISTORY_CAPACITY;
use super::spec::TaskSpec;

/// NES controller state: `[B, None, Select, Start, Up, Down, Left, Right, A]`.
pub type Buttons = [u8; 9];

const B: usize = 0;
const LEFT: usize = 6;
const RIGHT: usize = 7;
const A: usize = 8;

/// Discrete action space builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSet {
    /// 3 movements x 2 jump x 2 run = 12 actions.
    #[default]
    Full,
    /// 7 essential actions.
    Simple,
}

impl ActionSet {
    pub fn buttons(self) -> Vec<Buttons> {
        match self {
            ActionSet::Full => {
                let mut actions = Vec::with_capacity(12);
                for movement in [None, Some(LEFT), Some(RIGHT)] {
                    for jump in [false, true] {
                        for run in [false, true] {
                            let mut b: Buttons = [0; 9];
                            if let Some(m) = movement {
                                b[m] = 1;
                            }
                            if jump {
                                b[A] = 1;
                            }
                            if run {
                                b[B] = 1;
                            }
                            actions.push(b);
                        }
                    }
                }
                actions
            }
            ActionSet::Simple => vec![
                [0, 0, 0, 0, 0, 0, 0, 0, 0], // noop
                [0, 0, 0, 0, 0, 0, 0, 1, 0], // right
                [0, 0, 0, 0, 0, 0, 0, 1, 1], // right + A
                [1, 0, 0, 0, 0, 0, 0, 1, 0], // right + B
                [1, 0, 0, 0, 0, 0, 0, 1, 1], // right + A + B
                [0, 0, 0, 0, 0, 0, 1, 0, 0], // left
                [0, 0, 0, 0, 0, 0, 0, 0, 1], // A
            ],
        }
    }
}

fn default_frame_skip() -> usize {
    4
}

fn default_record_every() -> u64 {
    100
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

/// Arguments handed to the engine launcher for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSettings {
    /// Level (engine state) to load, e.g. `Level1-1`.
    pub level: String,
    pub task_index: usize,
    pub num_tasks: usize,
    #[serde(default = "default_frame_skip")]
    pub frame_skip: usize,
    #[serde(default)]
    pub seed: u64,
    /// Record every n-th episode when the recording tap is enabled.
    #[serde(default = "default_record_every")]
    pub record_every: u64,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default)]
    pub action_set: ActionSet,
}

impl EngineSettings {
    /// Default arguments for `spec` merged with `overrides`; overrides win.
    pub fn resolve(
        spec: &TaskSpec,
        task_index: usize,
        num_tasks: usize,
        overrides: &Map<String, Value>,
    ) -> Result<Self, ConfigError> {
        let mut defaults = Map::new();
        defaults.insert("level".into(), Value::from(spec.task_name.clone()));
        defaults.insert("task_index".into(), Value::from(task_index));
        defaults.insert("num_tasks".into(), Value::from(num_tasks));
        defaults.insert(
            "action_set".into(),
            serde_json::to_value(ActionSet::default())
                .map_err(|e| ConfigError::InvalidSettings(e.to_string()))?,
        );

        let merged = merge_options(&defaults, overrides);
        let settings: EngineSettings = serde_json::from_value(Value::Object(merged))
            .map_err(|e| ConfigError::InvalidSettings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_skip == 0 {
            return Err(ConfigError::NonPositive {
                key: "frame_skip".into(),
            });
        }
        if self.record_every == 0 {
            return Err(ConfigError::NonPositive {
                key: "record_every".into(),
            });
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::NonPositive {
                key: "history_capacity".into(),
            });
        }
        Ok(())
    }
}

/// Shallow merge of two option maps; keys in `overrides` win.
pub fn merge_options(defaults: &Map<String, Value>, overrides: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = defaults.clone();
    for (k, v) in overrides {
        merged.insert(k.clone(), v.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::spec::ScenarioId;
    use serde_json::json;

    fn spec() -> TaskSpec {
        TaskSpec::new(ScenarioId::new("world1"), "Level1-2")
    }

    #[test]
    fn full_action_set_has_twelve_distinct_actions() {
        let actions = ActionSet::Full.buttons();
        assert_eq!(actions.len(), 12);
        let mut unique = actions.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 12);
        assert_eq!(actions[0], [0; 9]);
    }

    #[test]
    fn simple_action_set_has_seven_actions() {
        assert_eq!(ActionSet::Simple.buttons().len(), 7);
    }

    #[test]
    fn defaults_come_from_task_spec() {
        let settings = EngineSettings::resolve(&spec(), 2, 4, &Map::new()).unwrap();
        assert_eq!(settings.level, "Level1-2");
        assert_eq!(settings.task_index, 2);
        assert_eq!(settings.num_tasks, 4);
        assert_eq!(settings.frame_skip, 4);
        assert_eq!(settings.history_capacity, DEFAULT_HISTORY_CAPACITY);
        assert_eq!(settings.action_set, ActionSet::Full);
    }

    #[test]
    fn overrides_win_on_conflict() {
        let overrides = json!({ "task_index": 7, "frame_skip": 2, "action_set": "simple" });
        let settings =
            EngineSettings::resolve(&spec(), 0, 4, overrides.as_object().unwrap()).unwrap();
        assert_eq!(settings.task_index, 7);
        assert_eq!(settings.frame_skip, 2);
        assert_eq!(settings.action_set, ActionSet::Simple);
    }

    #[test]
    fn unknown_engine_arguments_are_rejected() {
        let overrides = json!({ "warp_speed": true });
        let err = EngineSettings::resolve(&spec(), 0, 1, overrides.as_object().unwrap())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSettings(_)));
    }

    #[test]
    fn zero_frame_skip_is_rejected() {
        let overrides = json!({ "frame_skip": 0 });
        let err = EngineSettings::resolve(&spec(), 0, 1, overrides.as_object().unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::NonPositive {
                key: "frame_skip".into()
            }
        );
    }
}
