//! Orchestrator - タスク列を順に実行する状態機械
//!
//! # 状態
//! - Uninitialized → TaskActive(start): `initialize()`
//! - TaskActive(i): `step()` ごとに global_step を 1 進める
//! - global_step が steps_per_task の倍数に達したら done を強制し、
//!   最後のタスクでなければ次のタスクへ切り替える
//! - global_step ≥ steps_per_task × num_tasks を観測したら Exhausted
//!
//! # 資源の順序
//! 切り替えは必ず close → build。close の失敗は warn ログとイベントに
//! 記録して続行し、build の失敗はそのまま呼び出し側に返す。

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::errors::HarnessError;
use crate::domain::events::{EventKind, HarnessEvent};
use crate::domain::frame::{Frame, RenderMode};
use crate::domain::ids::RunId;
use crate::domain::outcome::{Info, SEQ_IDX_KEY, StepOutcome};
use crate::domain::spec::TaskSpec;
use crate::domain::state::Phase;
use crate::impls::TracingEventSink;
use crate::ports::{Clock, EventSink, IdGenerator, SystemClock, UlidGenerator};
use crate::transform::config::WrapperConfig;
use crate::typed::task::Statistics;

use super::builder::{TaskFactory, TaskOptions};
use super::environment::TaskEnvironment;

/// Run-wide configuration handed to [`Orchestrator::initialize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Engine argument overrides shared by every task.
    pub engine: Map<String, Value>,
    /// Flat wrapper options; `None` uses [`WrapperConfig::default`].
    pub wrapper: Option<Map<String, Value>>,
    /// Scenario parameters by position in the sequence.
    pub scenario_overrides: Vec<Map<String, Value>>,
    /// Shuffle the task order once, deterministically.
    pub shuffle_seed: Option<u64>,
}

pub struct Orchestrator {
    factory: TaskFactory,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    run_id: RunId,
    phase: Phase,
    tasks: Vec<TaskSpec>,
    engine: Map<String, Value>,
    wrapper: WrapperConfig,
    scenario_overrides: Vec<Map<String, Value>>,
    active: Option<TaskEnvironment>,
    current: usize,
    global_step: u64,
    steps_per_task: u64,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("run_id", &self.run_id)
            .field("phase", &self.phase)
            .field("current", &self.current)
            .field("global_step", &self.global_step)
            .field("steps_per_task", &self.steps_per_task)
            .field("num_tasks", &self.tasks.len())
            .finish()
    }
}

impl Orchestrator {
    pub fn new(factory: TaskFactory) -> Self {
        Self {
            factory,
            events: Arc::new(TracingEventSink),
            clock: Arc::new(SystemClock),
            run_id: UlidGenerator::new(SystemClock).generate_run_id(),
            phase: Phase::Uninitialized,
            tasks: Vec::new(),
            engine: Map::new(),
            wrapper: WrapperConfig::default(),
            scenario_overrides: Vec::new(),
            active: None,
            current: 0,
            global_step: 0,
            steps_per_task: 0,
        }
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, ids: &dyn IdGenerator) -> Self {
        self.run_id = ids.generate_run_id();
        self
    }

    /// Build the task at `start_index` and enter `TaskActive(start_index)`.
    ///
    /// The wrapper options are validated before any engine is launched.
    /// A failed build leaves the orchestrator uninitialized.
    pub fn initialize(
        &mut self,
        sequence: &[TaskSpec],
        steps_per_task: u64,
        start_index: usize,
        config: HarnessConfig,
    ) -> Result<(), HarnessError> {
        if self.phase != Phase::Uninitialized {
            return Err(HarnessError::AlreadyInitialized);
        }
        if sequence.is_empty() {
            return Err(HarnessError::EmptySequence);
        }
        if steps_per_task == 0 {
            return Err(HarnessError::ZeroStepsPerTask);
        }
        if start_index >= sequence.len() {
            return Err(HarnessError::InvalidStartIndex {
                start: start_index,
                num_tasks: sequence.len(),
            });
        }

        let wrapper = match &config.wrapper {
            Some(options) => WrapperConfig::from_options(options)?,
            None => WrapperConfig::default(),
        };

        let mut tasks = sequence.to_vec();
        if let Some(seed) = config.shuffle_seed {
            tasks.shuffle(&mut StdRng::seed_from_u64(seed));
        }

        self.tasks = tasks;
        self.engine = config.engine;
        self.wrapper = wrapper;
        self.scenario_overrides = config.scenario_overrides;
        self.steps_per_task = steps_per_task;
        self.global_step = 0;

        let env = self.build(start_index)?;
        self.active = Some(env);
        self.current = start_index;
        self.phase = Phase::TaskActive(start_index);

        tracing::info!(
            run_id = %self.run_id,
            num_tasks = self.tasks.len(),
            steps_per_task,
            start_index,
            "orchestrator initialized"
        );
        Ok(())
    }

    /// Advance the active task by one agent step.
    ///
    /// `info` always carries `seq_idx`. At a task boundary `done` is forced
    /// to `true` and, unless this is the last task, the next task is built.
    pub fn step(&mut self, action: usize) -> Result<StepOutcome, HarnessError> {
        let index = self.enter()?;
        let env = self.active.as_mut().ok_or(HarnessError::NoActiveTask)?;

        let mut outcome = env.step(action)?;
        outcome.info.insert(SEQ_IDX_KEY.to_string(), Value::from(index));

        self.global_step += 1;
        if self.global_step % self.steps_per_task == 0 {
            outcome.done = true;
            self.emit(EventKind::BoundaryReached {
                task_index: index,
                global_step: self.global_step,
            });
            if index + 1 < self.tasks.len() {
                self.switch_to(index + 1)?;
            }
        }
        Ok(outcome)
    }

    pub fn reset(
        &mut self,
        seed: Option<u64>,
        options: Option<&Map<String, Value>>,
    ) -> Result<(Frame, Info), HarnessError> {
        self.enter()?;
        let env = self.active.as_mut().ok_or(HarnessError::NoActiveTask)?;
        env.reset(seed, options)
    }

    /// Release the active environment. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.release_active();
    }

    /// Budget and lifecycle gate shared by `step` and `reset`.
    fn enter(&mut self) -> Result<usize, HarnessError> {
        match self.phase {
            Phase::Uninitialized => Err(HarnessError::NotInitialized),
            Phase::Exhausted => Err(self.budget_exceeded()),
            Phase::TaskActive(index) => {
                if self.global_step >= self.budget() {
                    self.phase = Phase::Exhausted;
                    tracing::error!(
                        run_id = %self.run_id,
                        global_step = self.global_step,
                        budget = self.budget(),
                        "step budget exhausted"
                    );
                    self.emit(EventKind::Exhausted {
                        global_step: self.global_step,
                    });
                    return Err(self.budget_exceeded());
                }
                Ok(index)
            }
        }
    }

    fn budget_exceeded(&self) -> HarnessError {
        HarnessError::StepBudgetExceeded {
            steps: self.global_step,
            budget: self.budget(),
        }
    }

    /// Close the current task, then build `next`.
    fn switch_to(&mut self, next: usize) -> Result<(), HarnessError> {
        let from = self.current;
        self.release_active();

        self.current = next;
        self.phase = Phase::TaskActive(next);
        let env = self.build(next)?;
        self.active = Some(env);

        tracing::info!(
            run_id = %self.run_id,
            from,
            to = next,
            global_step = self.global_step,
            "task switched"
        );
        self.emit(EventKind::TaskSwitched {
            from,
            to: next,
            global_step: self.global_step,
        });
        Ok(())
    }

    fn build(&self, index: usize) -> Result<TaskEnvironment, HarnessError> {
        let options = TaskOptions {
            engine: self.engine.clone(),
            scenario: self
                .scenario_overrides
                .get(index)
                .cloned()
                .unwrap_or_default(),
            wrapper: self.wrapper.clone(),
        };
        let env = self
            .factory
            .build(&self.tasks[index], index, self.tasks.len(), &options)?;
        self.emit(EventKind::TaskBuilt {
            task_index: index,
            task_name: env.task_name().to_string(),
        });
        Ok(env)
    }

    fn release_active(&mut self) {
        let Some(mut env) = self.active.take() else {
            return;
        };
        let task_index = env.task_index();
        match env.close() {
            Ok(()) => self.emit(EventKind::TaskReleased { task_index }),
            Err(e) => {
                tracing::warn!(
                    run_id = %self.run_id,
                    task_index,
                    error = %e,
                    "failed to release task environment; continuing"
                );
                self.emit(EventKind::ReleaseFailed {
                    task_index,
                    reason: e.to_string(),
                });
            }
        }
    }

    fn emit(&self, kind: EventKind) {
        self.events.emit(HarnessEvent {
            run_id: self.run_id,
            at: self.clock.now(),
            kind,
        });
    }

    fn active_env(&self) -> Result<&TaskEnvironment, HarnessError> {
        match self.phase {
            Phase::Uninitialized => Err(HarnessError::NotInitialized),
            _ => self.active.as_ref().ok_or(HarnessError::NoActiveTask),
        }
    }

    fn active_env_mut(&mut self) -> Result<&mut TaskEnvironment, HarnessError> {
        match self.phase {
            Phase::Uninitialized => Err(HarnessError::NotInitialized),
            _ => self.active.as_mut().ok_or(HarnessError::NoActiveTask),
        }
    }

    pub fn active_task(&self) -> Option<&TaskEnvironment> {
        self.active.as_ref()
    }

    /// Index of the current task in the sequence.
    pub fn task_id(&self) -> usize {
        self.current
    }

    pub fn task_name(&self) -> Option<&str> {
        self.active.as_ref().map(TaskEnvironment::task_name)
    }

    pub fn num_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn global_step(&self) -> u64 {
        self.global_step
    }

    pub fn steps_per_task(&self) -> u64 {
        self.steps_per_task
    }

    /// `steps_per_task * num_tasks`.
    pub fn budget(&self) -> u64 {
        self.steps_per_task.saturating_mul(self.tasks.len() as u64)
    }

    pub fn statistics(&self, mode: &str) -> Result<Statistics, HarnessError> {
        Ok(self.active_env()?.statistics(mode))
    }

    pub fn success(&self) -> Result<f64, HarnessError> {
        Ok(self.active_env()?.success())
    }

    pub fn clear_episode_statistics(&mut self) -> Result<(), HarnessError> {
        self.active_env_mut()?.clear_episode_statistics();
        Ok(())
    }

    pub fn render(&mut self, mode: RenderMode) -> Result<Frame, HarnessError> {
        Ok(self.active_env_mut()?.render(mode)?)
    }

    pub fn lookup_variable(&self, name: &str) -> f64 {
        self.active
            .as_ref()
            .map_or(0.0, |env| env.lookup_variable(name))
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.release_active();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{EngineError, ErrorKind};
    use crate::domain::spec::{ScenarioId, Sequence};
    use crate::impls::{EngineSlot, MemoryEventSink, ScriptedLauncher};
    use rstest::rstest;
    use serde_json::json;

    fn sequence(n: usize) -> Vec<TaskSpec> {
        (1..=n)
            .map(|s| TaskSpec::new(ScenarioId::new("world1"), format!("Level1-{s}")))
            .collect()
    }

    fn bare() -> HarnessConfig {
        HarnessConfig {
            wrapper: Some(Map::new()),
            ..HarnessConfig::default()
        }
    }

    fn orchestrator(launcher: ScriptedLauncher) -> (Orchestrator, Arc<MemoryEventSink>) {
        let events = Arc::new(MemoryEventSink::new());
        let factory = TaskFactory::new(Arc::new(launcher));
        let orch = Orchestrator::new(factory).with_event_sink(events.clone());
        (orch, events)
    }

    fn scripted() -> ScriptedLauncher {
        ScriptedLauncher::new(EngineSlot::new()).with_frame_shape(4, 4, 1)
    }

    #[rstest]
    #[case(1, 1)]
    #[case(3, 2)]
    #[case(5, 4)]
    fn budget_is_steps_times_tasks(#[case] steps: u64, #[case] tasks: usize) {
        let (mut orch, _) = orchestrator(scripted());
        orch.initialize(&sequence(tasks), steps, 0, bare()).unwrap();
        orch.reset(None, None).unwrap();

        for _ in 0..steps * tasks as u64 {
            orch.step(0).unwrap();
        }
        let err = orch.step(0).unwrap_err();
        assert!(matches!(err, HarnessError::StepBudgetExceeded { .. }));
        assert_eq!(err.kind(), ErrorKind::Budget);
        assert_eq!(orch.phase(), Phase::Exhausted);
        orch.close();
    }

    #[test]
    fn step_info_carries_seq_idx() {
        let (mut orch, _) = orchestrator(scripted());
        orch.initialize(&sequence(2), 2, 0, bare()).unwrap();
        orch.reset(None, None).unwrap();

        assert_eq!(orch.step(0).unwrap().seq_idx(), Some(0));
        let boundary = orch.step(0).unwrap();
        assert_eq!(boundary.seq_idx(), Some(0));
        assert!(boundary.done);
        assert_eq!(orch.task_id(), 1);
        assert_eq!(orch.step(0).unwrap().seq_idx(), Some(1));
        orch.close();
    }

    #[test]
    fn switches_happen_once_per_boundary() {
        let (mut orch, events) = orchestrator(scripted());
        orch.initialize(&sequence(3), 2, 0, bare()).unwrap();
        orch.reset(None, None).unwrap();
        for _ in 0..6 {
            orch.step(0).unwrap();
        }

        let switches: Vec<_> = events
            .kinds()
            .into_iter()
            .filter_map(|k| match k {
                EventKind::TaskSwitched { from, to, global_step } => Some((from, to, global_step)),
                _ => None,
            })
            .collect();
        assert_eq!(switches, vec![(0, 1, 2), (1, 2, 4)]);
        assert_eq!(orch.task_id(), 2);
        orch.close();
    }

    #[test]
    fn lifecycle_errors() {
        let (mut orch, _) = orchestrator(scripted());
        assert!(matches!(orch.step(0), Err(HarnessError::NotInitialized)));
        assert!(matches!(
            orch.render(RenderMode::RgbArray),
            Err(HarnessError::NotInitialized)
        ));
        assert!(matches!(orch.statistics("x"), Err(HarnessError::NotInitialized)));

        assert!(matches!(
            orch.initialize(&[], 10, 0, bare()),
            Err(HarnessError::EmptySequence)
        ));
        assert!(matches!(
            orch.initialize(&sequence(2), 0, 0, bare()),
            Err(HarnessError::ZeroStepsPerTask)
        ));
        assert!(matches!(
            orch.initialize(&sequence(2), 10, 2, bare()),
            Err(HarnessError::InvalidStartIndex { start: 2, num_tasks: 2 })
        ));

        orch.initialize(&sequence(2), 10, 1, bare()).unwrap();
        assert_eq!(orch.task_id(), 1);
        assert_eq!(orch.render(RenderMode::RgbArray).unwrap().shape(), &[4, 4, 1]);
        assert!(matches!(
            orch.initialize(&sequence(2), 10, 0, bare()),
            Err(HarnessError::AlreadyInitialized)
        ));
        orch.close();
    }

    #[test]
    fn wrapper_errors_surface_before_launch() {
        let launcher = Arc::new(scripted());
        let factory = TaskFactory::new(launcher.clone());
        let mut orch = Orchestrator::new(factory);
        let config = HarnessConfig {
            wrapper: Some(json!({ "resize": true }).as_object().cloned().unwrap()),
            ..HarnessConfig::default()
        };
        let err = orch.initialize(&sequence(2), 10, 0, config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(launcher.journal().is_empty());
        assert!(!launcher.slot().is_held());
        assert_eq!(orch.phase(), Phase::Uninitialized);
    }

    #[test]
    fn release_failure_is_logged_and_run_continues() {
        let (mut orch, events) = orchestrator(scripted().with_close_failure(0));
        orch.initialize(&sequence(2), 1, 0, bare()).unwrap();
        orch.reset(None, None).unwrap();

        let outcome = orch.step(0).unwrap();
        assert!(outcome.done);
        assert_eq!(orch.task_id(), 1);
        assert!(events
            .kinds()
            .iter()
            .any(|k| matches!(k, EventKind::ReleaseFailed { task_index: 0, .. })));
        orch.close();
    }

    #[test]
    fn build_failure_on_switch_is_propagated() {
        let (mut orch, _) = orchestrator(scripted().with_launch_failure(1));
        orch.initialize(&sequence(2), 1, 0, bare()).unwrap();
        orch.reset(None, None).unwrap();

        let err = orch.step(0).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::ResourceAcquisition(EngineError::LaunchFailed(_))
        ));
        assert!(matches!(orch.reset(None, None), Err(HarnessError::NoActiveTask)));
    }

    #[test]
    fn close_is_idempotent_and_releases_the_slot() {
        let launcher = Arc::new(scripted());
        let events = Arc::new(MemoryEventSink::new());
        let mut orch =
            Orchestrator::new(TaskFactory::new(launcher.clone())).with_event_sink(events.clone());
        orch.initialize(&sequence(1), 5, 0, bare()).unwrap();
        assert!(launcher.slot().is_held());

        orch.close();
        orch.close();
        assert!(!launcher.slot().is_held());
        let released = events
            .kinds()
            .into_iter()
            .filter(|k| matches!(k, EventKind::TaskReleased { .. }))
            .count();
        assert_eq!(released, 1);
    }

    #[test]
    fn events_are_stamped_by_the_injected_clock() {
        use crate::ports::FixedClock;
        use chrono::{TimeZone, Utc};

        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let events = Arc::new(MemoryEventSink::new());
        let mut orch = Orchestrator::new(TaskFactory::new(Arc::new(scripted())))
            .with_event_sink(events.clone())
            .with_clock(Arc::new(FixedClock::new(at)))
            .with_id_generator(&UlidGenerator::new(FixedClock::new(at)));
        orch.initialize(&sequence(1), 1, 0, bare()).unwrap();
        orch.close();

        assert_eq!(orch.run_id().timestamp_ms(), at.timestamp_millis() as u64);
        let recorded = events.events();
        assert_eq!(recorded.len(), 2);
        assert!(recorded.iter().all(|e| e.at == at && e.run_id == orch.run_id()));
    }

    #[test]
    fn shuffle_is_deterministic() {
        let tasks = Sequence::WorldProgression8.tasks();
        let (mut a, _) = orchestrator(scripted());
        let (mut b, _) = orchestrator(scripted());
        let config = HarnessConfig {
            shuffle_seed: Some(7),
            ..bare()
        };
        a.initialize(tasks, 10, 0, config.clone()).unwrap();
        b.initialize(tasks, 10, 0, config).unwrap();
        assert_eq!(a.tasks(), b.tasks());
        assert_eq!(a.tasks().len(), tasks.len());
        a.close();
        b.close();
    }

    #[test]
    fn scenario_overrides_follow_sequence_position() {
        let (mut orch, _) = orchestrator(scripted());
        let config = HarnessConfig {
            scenario_overrides: vec![
                Map::new(),
                json!({ "reward_position": 2.0 }).as_object().cloned().unwrap(),
            ],
            ..bare()
        };
        orch.initialize(&sequence(2), 1, 1, config).unwrap();
        let task = orch.active_task().unwrap().task();
        assert_eq!(
            task.reward_transforms(crate::domain::state::RewardProfile::Sparse),
            vec![crate::transform::RewardTransformSpec::Position { scaler: 2.0 }]
        );
        orch.close();
    }
}
