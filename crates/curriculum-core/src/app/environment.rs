//! TaskEnvironment - 1 タスク分の環境
//!
//! エンジン 1 つ、StateHistory 1 つ、報酬チェーンと観測パイプラインを持つ。
//!
//! # step の流れ
//! 1. 行動 index をボタンに変換
//! 2. frame_skip 回エンジンを進める（報酬は合算、done / truncated で打ち切り）
//! 3. snapshot を取って history に積む
//! 4. タスクの統計を更新
//! 5. 報酬チェーン → 観測パイプライン
//!
//! `close()` でエンジン資源を解放する。2 回目以降は何もしない。

use serde_json::{Map, Value};

use crate::domain::errors::{EngineError, HarnessError};
use crate::domain::frame::{Frame, RenderMode};
use crate::domain::history::StateHistory;
use crate::domain::outcome::{Info, StepOutcome};
use crate::domain::settings::{Buttons, EngineSettings};
use crate::domain::snapshot::StateSnapshot;
use crate::domain::spec::TaskSpec;
use crate::domain::state::RewardProfile;
use crate::ports::Engine;
use crate::transform::observation::ObservationPipeline;
use crate::transform::reward::RewardChain;
use crate::typed::task::{Statistics, Task};

pub struct TaskEnvironment {
    spec: TaskSpec,
    settings: EngineSettings,
    task: Box<dyn Task>,
    engine: Option<Box<dyn Engine>>,
    actions: Vec<Buttons>,
    history: StateHistory,
    rewards: RewardChain,
    observations: ObservationPipeline,
    profile: RewardProfile,
}

impl std::fmt::Debug for TaskEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskEnvironment")
            .field("task_name", &self.spec.task_name)
            .field("task_index", &self.settings.task_index)
            .field("profile", &self.profile)
            .field("rewards", &self.rewards)
            .field("observations", &self.observations)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Everything a TaskEnvironment is assembled from.
pub(crate) struct EnvironmentParts {
    pub spec: TaskSpec,
    pub settings: EngineSettings,
    pub task: Box<dyn Task>,
    pub engine: Box<dyn Engine>,
    pub history: StateHistory,
    pub rewards: RewardChain,
    pub observations: ObservationPipeline,
    pub profile: RewardProfile,
}

impl TaskEnvironment {
    pub(crate) fn assemble(parts: EnvironmentParts) -> Self {
        let actions = parts.settings.action_set.buttons();
        Self {
            spec: parts.spec,
            settings: parts.settings,
            task: parts.task,
            engine: Some(parts.engine),
            actions,
            history: parts.history,
            rewards: parts.rewards,
            observations: parts.observations,
            profile: parts.profile,
        }
    }

    fn engine_mut(&mut self) -> Result<&mut Box<dyn Engine>, EngineError> {
        self.engine.as_mut().ok_or(EngineError::Closed)
    }

    pub fn step(&mut self, action: usize) -> Result<StepOutcome, HarnessError> {
        let buttons = *self.actions.get(action).ok_or(EngineError::InvalidAction {
            index: action,
            size: self.actions.len(),
        })?;
        let frame_skip = self.settings.frame_skip;
        let engine = self.engine.as_mut().ok_or(EngineError::Closed)?;

        let mut raw = engine.step(&buttons)?;
        let mut total_reward = raw.reward;
        for _ in 1..frame_skip {
            if raw.done || raw.truncated {
                break;
            }
            raw = engine.step(&buttons)?;
            total_reward += raw.reward;
        }

        let snapshot = StateSnapshot::capture(
            |name| engine.lookup_variable(name),
            self.rewards.extra_variables(),
        );
        self.history.push(snapshot);
        self.task.observe(&self.history);

        let reward = self.rewards.apply(total_reward, &self.history);
        let observation = self.observations.observe(raw.frame);
        Ok(StepOutcome {
            observation,
            reward,
            done: raw.done,
            truncated: raw.truncated,
            info: raw.info,
        })
    }

    /// Start a new episode: history, reward state and statistics are cleared.
    pub fn reset(
        &mut self,
        seed: Option<u64>,
        options: Option<&Map<String, Value>>,
    ) -> Result<(Frame, Info), HarnessError> {
        let (frame, info) = self.engine_mut()?.reset(seed, options)?;
        self.task.clear_episode_statistics();
        self.history.clear();
        self.rewards.reset();
        let observation = self.observations.reset(frame);
        tracing::debug!(task_name = %self.spec.task_name, task_index = self.settings.task_index, "episode reset");
        Ok((observation, info))
    }

    /// Release the engine. Later calls are no-ops.
    pub fn close(&mut self) -> Result<(), EngineError> {
        let Some(mut engine) = self.engine.take() else {
            return Ok(());
        };
        self.observations.close();
        engine.close()
    }

    pub fn is_closed(&self) -> bool {
        self.engine.is_none()
    }

    /// Raw engine screen, before the observation pipeline.
    pub fn render(&mut self, mode: RenderMode) -> Result<Frame, EngineError> {
        let engine = self.engine_mut()?;
        match mode {
            RenderMode::RgbArray => Ok(engine.render()),
        }
    }

    /// Current value of an engine variable; `0.0` when unknown or closed.
    pub fn lookup_variable(&self, name: &str) -> f64 {
        self.engine
            .as_ref()
            .map_or(0.0, |engine| engine.lookup_variable(name))
    }

    pub fn statistics(&self, mode: &str) -> Statistics {
        self.task.statistics(mode)
    }

    pub fn success(&self) -> f64 {
        self.task.success()
    }

    pub fn clear_episode_statistics(&mut self) {
        self.task.clear_episode_statistics();
    }

    pub fn task(&self) -> &dyn Task {
        self.task.as_ref()
    }

    pub fn spec(&self) -> &TaskSpec {
        &self.spec
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn task_name(&self) -> &str {
        &self.spec.task_name
    }

    pub fn task_index(&self) -> usize {
        self.settings.task_index
    }

    pub fn num_tasks(&self) -> usize {
        self.settings.num_tasks
    }

    pub fn profile(&self) -> RewardProfile {
        self.profile
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    pub fn reward_transform_names(&self) -> Vec<&'static str> {
        self.rewards.names()
    }

    pub fn observation_stage_names(&self) -> Vec<&'static str> {
        self.observations.names()
    }
}

impl Drop for TaskEnvironment {
    fn drop(&mut self) {
        if self.engine.is_some() {
            tracing::warn!(task_name = %self.spec.task_name, "task environment dropped while live; closing");
            if let Err(e) = self.close() {
                tracing::warn!(task_name = %self.spec.task_name, error = %e, "close on drop failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::builder::{TaskFactory, TaskOptions};
    use crate::domain::spec::ScenarioId;
    use crate::impls::{EngineSlot, ScriptedLauncher};
    use crate::transform::config::WrapperConfig;
    use std::sync::Arc;

    // Full action set: index 11 = right + jump + run, index 9 = right + run
    const RIGHT_RUN: usize = 9;
    const NOOP: usize = 0;

    fn build(launcher: ScriptedLauncher, wrapper: WrapperConfig) -> TaskEnvironment {
        let factory = TaskFactory::new(Arc::new(launcher));
        let spec = TaskSpec::new(ScenarioId::new("world1"), "Level1-1");
        let options = TaskOptions {
            wrapper,
            ..TaskOptions::default()
        };
        factory.build(&spec, 0, 1, &options).unwrap()
    }

    fn bare() -> WrapperConfig {
        WrapperConfig::from_options(&Map::new()).unwrap()
    }

    fn scripted() -> ScriptedLauncher {
        ScriptedLauncher::new(EngineSlot::new()).with_frame_shape(6, 6, 3)
    }

    #[test]
    fn first_step_after_reset_only_pays_time_penalty() {
        let mut env = build(scripted(), bare());
        env.reset(Some(0), None).unwrap();

        let outcome = env.step(RIGHT_RUN).unwrap();
        // one snapshot: position is still warming up
        assert_eq!(env.history().len(), 1);
        assert!((outcome.reward - -0.01).abs() < 1e-9);

        // 4 frames x 2 px at run speed, scaler 1.0
        let outcome = env.step(RIGHT_RUN).unwrap();
        assert!((outcome.reward - (8.0 - 0.01)).abs() < 1e-9);
        env.close().unwrap();
    }

    #[test]
    fn frame_skip_stops_at_episode_end() {
        let mut env = build(scripted().with_level_length(44.0), bare());
        env.reset(None, None).unwrap();
        // start x = 40, level end at 44: done after 2 of 4 frames
        let outcome = env.step(RIGHT_RUN).unwrap();
        assert!(outcome.done);
        assert_eq!(env.lookup_variable("xscrollLo"), 44.0);
        env.close().unwrap();
    }

    #[test]
    fn reset_clears_history_and_statistics() {
        let mut env = build(scripted(), bare());
        env.reset(None, None).unwrap();
        for _ in 0..3 {
            env.step(RIGHT_RUN).unwrap();
        }
        assert_eq!(env.history().len(), 3);
        assert!(env.statistics("train")["train/max_x_position"] > 40.0);

        env.reset(None, None).unwrap();
        assert!(env.history().is_empty());
        assert_eq!(env.statistics("train")["train/frames"], 0.0);
        env.close().unwrap();
    }

    #[test]
    fn history_never_exceeds_capacity() {
        let mut env = build(scripted(), bare());
        env.reset(None, None).unwrap();
        for _ in 0..12 {
            env.step(NOOP).unwrap();
        }
        assert_eq!(env.history().len(), env.history().capacity());
        env.close().unwrap();
    }

    #[test]
    fn observation_follows_pipeline() {
        let mut env = build(scripted(), WrapperConfig::default());
        let (first, _) = env.reset(None, None).unwrap();
        assert_eq!(first.shape(), &[4, 84, 84, 3]);
        let outcome = env.step(NOOP).unwrap();
        assert_eq!(outcome.observation.shape(), &[4, 84, 84, 3]);
        assert_eq!(env.observation_stage_names().len(), 4);
        env.close().unwrap();
    }

    #[test]
    fn invalid_action_is_rejected() {
        let mut env = build(scripted(), bare());
        env.reset(None, None).unwrap();
        let err = env.step(12).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::Engine(EngineError::InvalidAction { index: 12, size: 12 })
        ));
        env.close().unwrap();
    }

    #[test]
    fn render_returns_the_raw_screen() {
        let mut env = build(scripted(), WrapperConfig::default());
        env.reset(None, None).unwrap();
        let mode: RenderMode = "rgb_array".parse().unwrap();
        assert_eq!(env.render(mode).unwrap().shape(), &[6, 6, 3]);
        assert_eq!(
            "human".parse::<RenderMode>().unwrap_err(),
            EngineError::UnsupportedRenderMode("human".into())
        );

        env.close().unwrap();
        assert_eq!(env.render(mode).unwrap_err(), EngineError::Closed);
    }

    #[test]
    fn close_is_idempotent() {
        let mut env = build(scripted(), bare());
        env.close().unwrap();
        env.close().unwrap();
        assert!(env.is_closed());
        assert_eq!(env.lookup_variable("time"), 0.0);
        assert!(matches!(
            env.step(NOOP),
            Err(HarnessError::Engine(EngineError::Closed))
        ));
    }
}
