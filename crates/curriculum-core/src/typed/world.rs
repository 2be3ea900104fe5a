//! WorldTask - World1..World8 共通のタスク
//!
//! - dense: 位置の前進報酬 → 定数の時間ペナルティ
//! - sparse: 位置の前進報酬のみ
//! - 成功指標: エピソード中の最大 x 位置（下限 100、上限 3200 / 城ステージは 3000）

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::errors::ConfigError;
use crate::domain::history::StateHistory;
use crate::domain::spec::{ScenarioId, TaskSpec};
use crate::domain::state::RewardProfile;
use crate::transform::reward::RewardTransformSpec;

use super::task::{Statistics, Task};

const LOWER_BOUND: f64 = 100.0;
const UPPER_BOUND: f64 = 3200.0;
const CASTLE_UPPER_BOUND: f64 = 3000.0;

fn default_reward_position() -> f64 {
    1.0
}

fn default_penalty_time() -> f64 {
    -0.01
}

fn default_reward_coin() -> f64 {
    10.0
}

/// Tunable reward parameters of a world task.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorldParams {
    #[serde(default = "default_reward_position")]
    pub reward_position: f64,
    #[serde(default = "default_penalty_time")]
    pub penalty_time: f64,
    /// Not part of either default profile; kept for custom transform lists.
    #[serde(default = "default_reward_coin")]
    pub reward_coin: f64,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            reward_position: default_reward_position(),
            penalty_time: default_penalty_time(),
            reward_coin: default_reward_coin(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct EpisodeStats {
    max_x_position: f64,
    coins: f64,
    score: f64,
    frames: u64,
}

#[derive(Debug, Clone)]
pub struct WorldTask {
    world: u8,
    scenario: ScenarioId,
    task_name: String,
    params: WorldParams,
    stats: EpisodeStats,
}

impl WorldTask {
    pub fn new(world: u8, spec: &TaskSpec, params: WorldParams) -> Self {
        Self {
            world,
            scenario: spec.scenario.clone(),
            task_name: spec.task_name.clone(),
            params,
            stats: EpisodeStats::default(),
        }
    }

    /// Build from a flat parameter map; unknown keys are rejected.
    pub fn from_params(
        world: u8,
        spec: &TaskSpec,
        params: &Map<String, Value>,
    ) -> Result<Self, ConfigError> {
        let parsed: WorldParams = serde_json::from_value(Value::Object(params.clone())).map_err(|e| {
            ConfigError::InvalidScenarioParameters {
                scenario: spec.scenario.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self::new(world, spec, parsed))
    }

    pub fn world(&self) -> u8 {
        self.world
    }

    pub fn params(&self) -> &WorldParams {
        &self.params
    }

    fn is_castle(&self) -> bool {
        self.task_name.ends_with("-4")
    }
}

impl Task for WorldTask {
    fn scenario(&self) -> &ScenarioId {
        &self.scenario
    }

    fn task_name(&self) -> &str {
        &self.task_name
    }

    fn reward_transforms(&self, profile: RewardProfile) -> Vec<RewardTransformSpec> {
        let position = RewardTransformSpec::position(self.params.reward_position);
        match profile {
            RewardProfile::Dense => vec![
                position,
                RewardTransformSpec::constant(self.params.penalty_time),
            ],
            RewardProfile::Sparse => vec![position],
        }
    }

    fn success_metric(&self) -> f64 {
        self.stats.max_x_position
    }

    fn performance_bounds(&self) -> (f64, f64) {
        let upper = if self.is_castle() {
            CASTLE_UPPER_BOUND
        } else {
            UPPER_BOUND
        };
        (LOWER_BOUND, upper)
    }

    fn observe(&mut self, history: &StateHistory) {
        self.stats.frames += 1;
        let Some(current) = history.at(0) else {
            return;
        };
        self.stats.max_x_position = self.stats.max_x_position.max(current.x_position());
        self.stats.coins = current.get("coins");
        self.stats.score = current.get("score");
    }

    fn clear_episode_statistics(&mut self) {
        self.stats = EpisodeStats::default();
    }

    fn extra_statistics(&self, mode: &str) -> Statistics {
        Statistics::from([
            (format!("{mode}/max_x_position"), self.stats.max_x_position),
            (format!("{mode}/coins"), self.stats.coins),
            (format!("{mode}/score"), self.stats.score),
            (format!("{mode}/frames"), self.stats.frames as f64),
        ])
    }
}
