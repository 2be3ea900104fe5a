//! Reward transforms - 報酬整形チェーン
//!
//! # 学習ポイント
//! - serde の internally tagged enum で宣言的な transform 記述
//! - trait object（`Box<dyn RewardTransform>`）による多態
//!
//! チェーンは宣言順に適用され、各 transform の出力が次の入力になる。
//! history が `min_history()` に満たない transform は報酬をそのまま返す。

use serde::{Deserialize, Serialize};

use crate::domain::errors::ConfigError;
use crate::domain::history::StateHistory;
use crate::domain::snapshot::VariableId;

fn default_position_scaler() -> f64 {
    0.1
}

fn default_score_scaler() -> f64 {
    0.001
}

fn default_coin_reward() -> f64 {
    1.0
}

fn default_time_penalty() -> f64 {
    -0.01
}

fn default_death_penalty() -> f64 {
    -10.0
}

fn default_location_scaler() -> f64 {
    0.1
}

fn default_height_variable() -> String {
    "player_y_pos".to_string()
}

/// Declarative description of one reward transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardTransformSpec {
    /// Add `reward` on every step.
    Constant { reward: f64 },
    /// Add `reward` while `var_name` is non-zero.
    BooleanVariable { reward: f64, var_name: String },
    /// Add `reward` when `var_name` increased (or decreased) since the last step.
    StateVariable {
        reward: f64,
        var_name: String,
        #[serde(default)]
        decrease: bool,
    },
    /// Growing bonus for consecutive changes of `var_name`.
    CumulativeVariable {
        reward: f64,
        var_name: String,
        #[serde(default)]
        decrease: bool,
        #[serde(default)]
        maintain: bool,
    },
    /// Replace the reward with `scaler * delta(var_name)`.
    ProportionalVariable {
        scaler: f64,
        var_name: String,
        #[serde(default)]
        keep_lb: bool,
    },
    /// Compare `var_name` against a value remembered from the previous step.
    UserVariable {
        reward: f64,
        var_name: String,
        #[serde(default)]
        decrease: bool,
    },
    /// Forward scroll progress, `max(0, dx) * scaler`.
    Position {
        #[serde(default = "default_position_scaler")]
        scaler: f64,
    },
    Score {
        #[serde(default = "default_score_scaler")]
        scaler: f64,
    },
    Coin {
        #[serde(default = "default_coin_reward")]
        reward: f64,
    },
    TimePenalty {
        #[serde(default = "default_time_penalty")]
        penalty: f64,
    },
    DeathPenalty {
        #[serde(default = "default_death_penalty")]
        penalty: f64,
    },
    /// Distance travelled away from a start point.
    LocationVariable {
        x_var_name: String,
        y_var_name: String,
        x_start: f64,
        y_start: f64,
        #[serde(default = "default_location_scaler")]
        scaler: f64,
    },
    /// Reward for standing higher than at any point in the held history.
    PlatformReached {
        reward: f64,
        #[serde(default = "default_height_variable")]
        z_var_name: String,
    },
    /// Reward while `var_name` is above `goal`.
    Goal {
        reward: f64,
        goal: f64,
        var_name: String,
    },
}

impl RewardTransformSpec {
    pub fn constant(reward: f64) -> Self {
        Self::Constant { reward }
    }

    pub fn position(scaler: f64) -> Self {
        Self::Position { scaler }
    }

    pub fn coin(reward: f64) -> Self {
        Self::Coin { reward }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Constant { .. } => "constant",
            Self::BooleanVariable { .. } => "boolean_variable",
            Self::StateVariable { .. } => "state_variable",
            Self::CumulativeVariable { .. } => "cumulative_variable",
            Self::ProportionalVariable { .. } => "proportional_variable",
            Self::UserVariable { .. } => "user_variable",
            Self::Position { .. } => "position",
            Self::Score { .. } => "score",
            Self::Coin { .. } => "coin",
            Self::TimePenalty { .. } => "time_penalty",
            Self::DeathPenalty { .. } => "death_penalty",
            Self::LocationVariable { .. } => "location_variable",
            Self::PlatformReached { .. } => "platform_reached",
            Self::Goal { .. } => "goal",
        }
    }

    /// Engine variables this transform reads by name.
    pub fn variable_names(&self) -> Vec<&str> {
        match self {
            Self::BooleanVariable { var_name, .. }
            | Self::StateVariable { var_name, .. }
            | Self::CumulativeVariable { var_name, .. }
            | Self::ProportionalVariable { var_name, .. }
            | Self::UserVariable { var_name, .. }
            | Self::Goal { var_name, .. } => vec![var_name.as_str()],
            Self::LocationVariable {
                x_var_name,
                y_var_name,
                ..
            } => vec![x_var_name.as_str(), y_var_name.as_str()],
            Self::PlatformReached { z_var_name, .. } => vec![z_var_name.as_str()],
            Self::Position { .. } => vec!["xscrollHi", "xscrollLo"],
            Self::Score { .. } => vec!["score"],
            Self::Coin { .. } => vec!["coins"],
            Self::DeathPenalty { .. } => vec!["lives"],
            Self::Constant { .. } | Self::TimePenalty { .. } => Vec::new(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for name in self.variable_names() {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidTransform {
                    transform: self.name(),
                    reason: "variable name must not be empty".to_string(),
                });
            }
        }
        let numbers: &[f64] = match self {
            Self::Constant { reward }
            | Self::BooleanVariable { reward, .. }
            | Self::StateVariable { reward, .. }
            | Self::CumulativeVariable { reward, .. }
            | Self::UserVariable { reward, .. }
            | Self::Coin { reward }
            | Self::PlatformReached { reward, .. } => std::slice::from_ref(reward),
            Self::ProportionalVariable { scaler, .. }
            | Self::Position { scaler }
            | Self::Score { scaler } => std::slice::from_ref(scaler),
            Self::TimePenalty { penalty } | Self::DeathPenalty { penalty } => {
                std::slice::from_ref(penalty)
            }
            Self::LocationVariable { scaler, .. } => std::slice::from_ref(scaler),
            Self::Goal { reward, .. } => std::slice::from_ref(reward),
        };
        if numbers.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::InvalidTransform {
                transform: self.name(),
                reason: "parameters must be finite".to_string(),
            });
        }
        Ok(())
    }

    /// Instantiate the transform described by this spec.
    pub fn build(&self) -> Result<Box<dyn RewardTransform>, ConfigError> {
        self.validate()?;
        let transform: Box<dyn RewardTransform> = match self.clone() {
            Self::Constant { reward } => Box::new(Constant {
                label: "constant",
                reward,
            }),
            Self::TimePenalty { penalty } => Box::new(Constant {
                label: "time_penalty",
                reward: penalty,
            }),
            Self::BooleanVariable { reward, var_name } => {
                Box::new(BooleanVariable { reward, var_name })
            }
            Self::StateVariable {
                reward,
                var_name,
                decrease,
            } => Box::new(StateVariable {
                label: "state_variable",
                reward,
                var_name,
                decrease,
            }),
            Self::CumulativeVariable {
                reward,
                var_name,
                decrease,
                maintain,
            } => Box::new(CumulativeVariable {
                reward,
                var_name,
                decrease,
                maintain,
                streak: 0.0,
            }),
            Self::ProportionalVariable {
                scaler,
                var_name,
                keep_lb,
            } => Box::new(ProportionalVariable {
                scaler,
                var_name,
                keep_lb,
                lower_bound: f64::NEG_INFINITY,
            }),
            Self::UserVariable {
                reward,
                var_name,
                decrease,
            } => Box::new(UserVariable {
                reward,
                var_name,
                decrease,
                remembered: 0.0,
            }),
            Self::Position { scaler } => Box::new(Position { scaler }),
            Self::Score { scaler } => Box::new(Score { scaler }),
            Self::Coin { reward } => Box::new(StateVariable {
                label: "coin",
                reward,
                var_name: "coins".to_string(),
                decrease: false,
            }),
            Self::DeathPenalty { penalty } => Box::new(DeathPenalty {
                penalty,
                previous_lives: None,
            }),
            Self::LocationVariable {
                x_var_name,
                y_var_name,
                x_start,
                y_start,
                scaler,
            } => Box::new(LocationVariable {
                x_var_name,
                y_var_name,
                start: (x_start, y_start),
                scaler,
            }),
            Self::PlatformReached { reward, z_var_name } => {
                Box::new(PlatformReached { reward, z_var_name })
            }
            Self::Goal {
                reward,
                goal,
                var_name,
            } => Box::new(Goal {
                reward,
                goal,
                var_name,
            }),
        };
        Ok(transform)
    }
}

/// RewardTransform は 1 つの報酬整形ステップ
pub trait RewardTransform: Send {
    fn name(&self) -> &'static str;

    /// Snapshots needed before the transform does anything.
    fn min_history(&self) -> usize {
        0
    }

    fn apply(&mut self, reward: f64, history: &StateHistory) -> f64;

    /// Drop per-episode state.
    fn reset(&mut self) {}
}

fn changed(current: f64, previous: f64, decrease: bool) -> bool {
    if decrease {
        current < previous
    } else {
        current > previous
    }
}

struct Constant {
    label: &'static str,
    reward: f64,
}

impl RewardTransform for Constant {
    fn name(&self) -> &'static str {
        self.label
    }

    fn apply(&mut self, reward: f64, _history: &StateHistory) -> f64 {
        reward + self.reward
    }
}

struct BooleanVariable {
    reward: f64,
    var_name: String,
}

impl RewardTransform for BooleanVariable {
    fn name(&self) -> &'static str {
        "boolean_variable"
    }

    fn apply(&mut self, reward: f64, history: &StateHistory) -> f64 {
        if history.latest().get(&self.var_name) != 0.0 {
            reward + self.reward
        } else {
            reward
        }
    }
}

struct StateVariable {
    label: &'static str,
    reward: f64,
    var_name: String,
    decrease: bool,
}

impl RewardTransform for StateVariable {
    fn name(&self) -> &'static str {
        self.label
    }

    fn min_history(&self) -> usize {
        2
    }

    fn apply(&mut self, reward: f64, history: &StateHistory) -> f64 {
        let current = history.value_at(0, &self.var_name);
        let previous = history.value_at(1, &self.var_name);
        if changed(current, previous, self.decrease) {
            reward + self.reward
        } else {
            reward
        }
    }
}

struct CumulativeVariable {
    reward: f64,
    var_name: String,
    decrease: bool,
    maintain: bool,
    streak: f64,
}

impl RewardTransform for CumulativeVariable {
    fn name(&self) -> &'static str {
        "cumulative_variable"
    }

    fn min_history(&self) -> usize {
        2
    }

    fn apply(&mut self, reward: f64, history: &StateHistory) -> f64 {
        let current = history.value_at(0, &self.var_name);
        let previous = history.value_at(1, &self.var_name);
        let kept = self.maintain && current == previous;
        if kept || changed(current, previous, self.decrease) {
            self.streak += self.reward;
            reward + self.streak
        } else {
            self.streak = 0.0;
            reward
        }
    }

    fn reset(&mut self) {
        self.streak = 0.0;
    }
}

struct ProportionalVariable {
    scaler: f64,
    var_name: String,
    keep_lb: bool,
    lower_bound: f64,
}

impl RewardTransform for ProportionalVariable {
    fn name(&self) -> &'static str {
        "proportional_variable"
    }

    fn min_history(&self) -> usize {
        2
    }

    fn apply(&mut self, reward: f64, history: &StateHistory) -> f64 {
        let current = history.value_at(0, &self.var_name);
        let previous = history.value_at(1, &self.var_name);
        let mut shaped = reward;
        if !self.keep_lb || current > self.lower_bound {
            shaped = self.scaler * (current - previous);
        }
        self.lower_bound = if self.keep_lb {
            current.max(self.lower_bound)
        } else {
            0.0
        };
        shaped
    }

    fn reset(&mut self) {
        self.lower_bound = f64::NEG_INFINITY;
    }
}

struct UserVariable {
    reward: f64,
    var_name: String,
    decrease: bool,
    remembered: f64,
}

impl RewardTransform for UserVariable {
    fn name(&self) -> &'static str {
        "user_variable"
    }

    fn apply(&mut self, reward: f64, history: &StateHistory) -> f64 {
        let current = history.latest().get(&self.var_name);
        let previous = std::mem::replace(&mut self.remembered, current);
        if changed(current, previous, self.decrease) {
            reward + self.reward
        } else {
            reward
        }
    }

    fn reset(&mut self) {
        self.remembered = 0.0;
    }
}

struct Position {
    scaler: f64,
}

impl RewardTransform for Position {
    fn name(&self) -> &'static str {
        "position"
    }

    fn min_history(&self) -> usize {
        2
    }

    fn apply(&mut self, reward: f64, history: &StateHistory) -> f64 {
        let (Some(current), Some(previous)) = (history.at(0), history.at(1)) else {
            return reward;
        };
        let delta = (current.x_position() - previous.x_position()).max(0.0);
        reward + delta * self.scaler
    }
}

struct Score {
    scaler: f64,
}

impl RewardTransform for Score {
    fn name(&self) -> &'static str {
        "score"
    }

    fn min_history(&self) -> usize {
        2
    }

    fn apply(&mut self, reward: f64, history: &StateHistory) -> f64 {
        let delta = (history.value_at(0, "score") - history.value_at(1, "score")).max(0.0);
        reward + delta * self.scaler
    }
}

struct DeathPenalty {
    penalty: f64,
    previous_lives: Option<f64>,
}

impl RewardTransform for DeathPenalty {
    fn name(&self) -> &'static str {
        "death_penalty"
    }

    fn min_history(&self) -> usize {
        1
    }

    fn apply(&mut self, reward: f64, history: &StateHistory) -> f64 {
        let lives = history.latest().get("lives");
        let lost = self.previous_lives.is_some_and(|prev| lives < prev);
        self.previous_lives = Some(lives);
        if lost {
            reward + self.penalty
        } else {
            reward
        }
    }

    fn reset(&mut self) {
        self.previous_lives = None;
    }
}

struct LocationVariable {
    x_var_name: String,
    y_var_name: String,
    start: (f64, f64),
    scaler: f64,
}

impl RewardTransform for LocationVariable {
    fn name(&self) -> &'static str {
        "location_variable"
    }

    fn min_history(&self) -> usize {
        2
    }

    fn apply(&mut self, reward: f64, history: &StateHistory) -> f64 {
        let (x0, y0) = self.start;
        let gain = |name: &str, origin: f64| {
            let current = (history.value_at(0, name) - origin).abs();
            let previous = (history.value_at(1, name) - origin).abs();
            (current - previous).max(0.0)
        };
        reward + self.scaler * (gain(&self.x_var_name, x0) + gain(&self.y_var_name, y0))
    }
}

struct PlatformReached {
    reward: f64,
    z_var_name: String,
}

impl RewardTransform for PlatformReached {
    fn name(&self) -> &'static str {
        "platform_reached"
    }

    fn min_history(&self) -> usize {
        2
    }

    fn apply(&mut self, reward: f64, history: &StateHistory) -> f64 {
        let current = history.latest().get(&self.z_var_name);
        let highest_before = history
            .iter()
            .take(history.len().saturating_sub(1))
            .map(|s| s.get(&self.z_var_name))
            .fold(f64::NEG_INFINITY, f64::max);
        if current > highest_before {
            reward + self.reward
        } else {
            reward
        }
    }
}

struct Goal {
    reward: f64,
    goal: f64,
    var_name: String,
}

impl RewardTransform for Goal {
    fn name(&self) -> &'static str {
        "goal"
    }

    fn min_history(&self) -> usize {
        1
    }

    fn apply(&mut self, reward: f64, history: &StateHistory) -> f64 {
        if history.latest().get(&self.var_name) > self.goal {
            reward + self.reward
        } else {
            reward
        }
    }
}

/// RewardChain は宣言順に並んだ reward transform の列
pub struct RewardChain {
    transforms: Vec<Box<dyn RewardTransform>>,
    extra_variables: Vec<String>,
}

impl std::fmt::Debug for RewardChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewardChain")
            .field("transforms", &self.names())
            .field("extra_variables", &self.extra_variables)
            .finish()
    }
}

impl RewardChain {
    pub fn from_specs(specs: &[RewardTransformSpec]) -> Result<Self, ConfigError> {
        let transforms = specs
            .iter()
            .map(RewardTransformSpec::build)
            .collect::<Result<Vec<_>, _>>()?;

        let mut extra_variables: Vec<String> = Vec::new();
        for name in specs.iter().flat_map(RewardTransformSpec::variable_names) {
            if VariableId::lookup(name).is_none() && !extra_variables.iter().any(|n| n == name) {
                extra_variables.push(name.to_string());
            }
        }

        Ok(Self {
            transforms,
            extra_variables,
        })
    }

    /// Run every transform in declared order.
    pub fn apply(&mut self, reward: f64, history: &StateHistory) -> f64 {
        self.transforms.iter_mut().fold(reward, |acc, t| {
            if history.len() < t.min_history() {
                acc
            } else {
                t.apply(acc, history)
            }
        })
    }

    pub fn reset(&mut self) {
        for t in &mut self.transforms {
            t.reset();
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    /// Variables read by the chain that are not tracked by default snapshots.
    pub fn extra_variables(&self) -> &[String] {
        &self.extra_variables
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::StateSnapshot;
    use rstest::rstest;
    use serde_json::json;

    fn history_of(xs: &[f64]) -> StateHistory {
        let mut h = StateHistory::default();
        for x in xs {
            h.push(StateSnapshot::from_pairs([
                ("xscrollHi", (x / 256.0).floor()),
                ("xscrollLo", x.rem_euclid(256.0)),
            ]));
        }
        h
    }

    fn history_with(name: &str, values: &[f64]) -> StateHistory {
        let mut h = StateHistory::default();
        for v in values {
            h.push(StateSnapshot::from_pairs([(name, *v)]));
        }
        h
    }

    #[rstest]
    #[case(&[], 0.0)]
    #[case(&[100.0], 0.0)]
    #[case(&[100.0, 110.0], 1.0)]
    #[case(&[250.0, 260.0], 1.0)]
    #[case(&[110.0, 100.0], 0.0)]
    fn position_rewards_forward_progress_only(#[case] xs: &[f64], #[case] expected: f64) {
        let mut chain = RewardChain::from_specs(&[RewardTransformSpec::position(0.1)]).unwrap();
        let reward = chain.apply(0.0, &history_of(xs));
        assert!((reward - expected).abs() < 1e-9, "got {reward}");
    }

    #[test]
    fn transforms_apply_in_declared_order() {
        // proportional replaces the reward, so its position in the chain matters
        let proportional = RewardTransformSpec::ProportionalVariable {
            scaler: 1.0,
            var_name: "score".into(),
            keep_lb: false,
        };
        let history = history_with("score", &[0.0, 5.0]);

        let mut first = RewardChain::from_specs(&[proportional.clone(), RewardTransformSpec::constant(1.0)])
            .unwrap();
        let mut last = RewardChain::from_specs(&[RewardTransformSpec::constant(1.0), proportional]).unwrap();

        assert_eq!(first.apply(0.0, &history), 6.0);
        assert_eq!(last.apply(0.0, &history), 5.0);
    }

    #[test]
    fn delta_transforms_are_noops_during_warm_up() {
        let specs = [
            RewardTransformSpec::StateVariable {
                reward: 1.0,
                var_name: "coins".into(),
                decrease: false,
            },
            RewardTransformSpec::Score { scaler: 1.0 },
            RewardTransformSpec::coin(1.0),
        ];
        let mut chain = RewardChain::from_specs(&specs).unwrap();
        assert_eq!(chain.names(), vec!["state_variable", "score", "coin"]);
        assert_eq!(chain.apply(3.5, &history_with("coins", &[7.0])), 3.5);
        assert_eq!(chain.apply(3.5, &StateHistory::default()), 3.5);
    }

    #[test]
    fn cumulative_streak_grows_and_resets() {
        let mut chain = RewardChain::from_specs(&[RewardTransformSpec::CumulativeVariable {
            reward: 1.0,
            var_name: "score".into(),
            decrease: false,
            maintain: false,
        }])
        .unwrap();

        assert_eq!(chain.apply(0.0, &history_with("score", &[0.0, 1.0])), 1.0);
        assert_eq!(chain.apply(0.0, &history_with("score", &[1.0, 2.0])), 2.0);
        assert_eq!(chain.apply(0.0, &history_with("score", &[2.0, 2.0])), 0.0);
        assert_eq!(chain.apply(0.0, &history_with("score", &[2.0, 3.0])), 1.0);

        chain.apply(0.0, &history_with("score", &[3.0, 4.0]));
        chain.reset();
        assert_eq!(chain.apply(0.0, &history_with("score", &[4.0, 5.0])), 1.0);
    }

    #[test]
    fn death_penalty_needs_a_previous_observation() {
        let mut chain = RewardChain::from_specs(&[RewardTransformSpec::DeathPenalty { penalty: -10.0 }])
            .unwrap();
        assert_eq!(chain.apply(0.0, &history_with("lives", &[2.0])), 0.0);
        assert_eq!(chain.apply(0.0, &history_with("lives", &[2.0, 1.0])), -10.0);
        assert_eq!(chain.apply(0.0, &history_with("lives", &[1.0, 1.0])), 0.0);
    }

    #[test]
    fn platform_reached_compares_against_whole_history() {
        let mut chain = RewardChain::from_specs(&[RewardTransformSpec::PlatformReached {
            reward: 2.0,
            z_var_name: "player_y_pos".into(),
        }])
        .unwrap();
        assert_eq!(chain.apply(0.0, &history_with("player_y_pos", &[5.0, 1.0, 4.0])), 0.0);
        assert_eq!(chain.apply(0.0, &history_with("player_y_pos", &[5.0, 1.0, 6.0])), 2.0);
    }

    #[test]
    fn user_variable_remembers_previous_value() {
        let mut chain = RewardChain::from_specs(&[RewardTransformSpec::UserVariable {
            reward: 1.0,
            var_name: "kills".into(),
            decrease: false,
        }])
        .unwrap();
        assert_eq!(chain.extra_variables(), ["kills".to_string()]);
        assert_eq!(chain.apply(0.0, &history_with("kills", &[1.0])), 1.0);
        assert_eq!(chain.apply(0.0, &history_with("kills", &[1.0])), 0.0);
    }

    #[test]
    fn location_rewards_moving_away_from_start() {
        let mut chain = RewardChain::from_specs(&[RewardTransformSpec::LocationVariable {
            x_var_name: "player_x_posLo".into(),
            y_var_name: "player_y_pos".into(),
            x_start: 0.0,
            y_start: 0.0,
            scaler: 1.0,
        }])
        .unwrap();
        let mut h = StateHistory::default();
        h.push(StateSnapshot::from_pairs([("player_x_posLo", 1.0), ("player_y_pos", 1.0)]));
        h.push(StateSnapshot::from_pairs([("player_x_posLo", 3.0), ("player_y_pos", 0.0)]));
        assert_eq!(chain.apply(0.0, &h), 2.0);
    }

    #[test]
    fn goal_and_boolean_read_latest_snapshot() {
        let mut chain = RewardChain::from_specs(&[
            RewardTransformSpec::Goal {
                reward: 5.0,
                goal: 10.0,
                var_name: "time".into(),
            },
            RewardTransformSpec::BooleanVariable {
                reward: 1.0,
                var_name: "star_timer".into(),
            },
        ])
        .unwrap();
        let mut h = StateHistory::default();
        h.push(StateSnapshot::from_pairs([("time", 11.0), ("star_timer", 1.0)]));
        assert_eq!(chain.apply(0.0, &h), 6.0);
        assert!(chain.extra_variables().is_empty());
    }

    #[test]
    fn specs_deserialize_with_defaults() {
        let spec: RewardTransformSpec = serde_json::from_value(json!({ "kind": "position" })).unwrap();
        assert_eq!(spec, RewardTransformSpec::Position { scaler: 0.1 });

        let spec: RewardTransformSpec = serde_json::from_value(json!({ "kind": "time_penalty" })).unwrap();
        assert_eq!(spec, RewardTransformSpec::TimePenalty { penalty: -0.01 });
    }

    #[test]
    fn empty_variable_name_is_rejected() {
        let err = RewardChain::from_specs(&[RewardTransformSpec::StateVariable {
            reward: 1.0,
            var_name: " ".into(),
            decrease: false,
        }])
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidTransform {
                transform: "state_variable",
                ..
            }
        ));
    }

    #[test]
    fn non_finite_parameters_are_rejected() {
        let err = RewardChain::from_specs(&[RewardTransformSpec::constant(f64::NAN)]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTransform { .. }));
    }
}
