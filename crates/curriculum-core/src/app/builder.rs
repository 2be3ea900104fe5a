//! TaskFactory - タスク環境の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターン（`with_*` で差し替え）
//! - Fail-fast 設計: 設定の検証をすべて終えてから最後にエンジン資源を確保する
//!
//! # build の順序
//! 1. EngineSettings（デフォルト引数 + 呼び出し側の上書き）
//! 2. シナリオ registry からタスク生成
//! 3. 報酬チェーン（dense / sparse のどちらか一方）
//! 4. StateHistory と観測パイプライン
//! 5. エンジン起動（ここで失敗したら ResourceAcquisition）

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::errors::HarnessError;
use crate::domain::history::StateHistory;
use crate::domain::settings::{EngineSettings, merge_options};
use crate::domain::spec::TaskSpec;
use crate::ports::{EngineLauncher, FrameSink};
use crate::transform::config::WrapperConfig;
use crate::transform::observation::{ObservationPipeline, PipelineContext};
use crate::transform::reward::RewardChain;
use crate::typed::registry::ScenarioRegistry;

use super::environment::{EnvironmentParts, TaskEnvironment};

/// Merged configuration for building one task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskOptions {
    /// Overrides of the default engine arguments.
    pub engine: Map<String, Value>,
    /// Scenario parameters, merged over the task spec's own overrides.
    pub scenario: Map<String, Value>,
    pub wrapper: WrapperConfig,
}

/// TaskFactory は TaskSpec から TaskEnvironment を組み立てる
///
/// # 使用例
/// ```ignore
/// let factory = TaskFactory::new(Arc::new(ScriptedLauncher::process()));
/// let env = factory.build(&spec, 0, 4, &TaskOptions::default())?;
/// ```
///
/// 前に作った TaskEnvironment への参照は持たない。
#[derive(Clone)]
pub struct TaskFactory {
    registry: ScenarioRegistry,
    launcher: Arc<dyn EngineLauncher>,
    frame_sink: Option<Arc<dyn FrameSink>>,
}

impl TaskFactory {
    /// Factory over the built-in scenarios.
    pub fn new(launcher: Arc<dyn EngineLauncher>) -> Self {
        Self {
            registry: ScenarioRegistry::builtin_cloned(),
            launcher,
            frame_sink: None,
        }
    }

    pub fn with_registry(mut self, registry: ScenarioRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Send recorded episodes here instead of the `record_dir` directory.
    pub fn with_frame_sink(mut self, sink: Arc<dyn FrameSink>) -> Self {
        self.frame_sink = Some(sink);
        self
    }

    pub fn registry(&self) -> &ScenarioRegistry {
        &self.registry
    }

    pub fn build(
        &self,
        spec: &TaskSpec,
        task_index: usize,
        num_tasks: usize,
        options: &TaskOptions,
    ) -> Result<TaskEnvironment, HarnessError> {
        let settings = EngineSettings::resolve(spec, task_index, num_tasks, &options.engine)?;

        let constructor = self
            .registry
            .get(&spec.scenario)
            .ok_or_else(|| HarnessError::UnknownScenario(spec.scenario.clone()))?;
        let params = merge_options(&spec.overrides, &options.scenario);
        let task = constructor(spec, &params)?;

        let profile = options.wrapper.profile();
        let rewards = RewardChain::from_specs(&task.reward_transforms(profile))?;
        let history = StateHistory::new(settings.history_capacity)?;
        let observations = ObservationPipeline::build(
            &options.wrapper,
            PipelineContext {
                seed: settings.seed,
                record_every: settings.record_every,
                name_prefix: spec.task_name.clone(),
                frame_sink: self.frame_sink.clone(),
            },
        )?;

        // engine last: nothing above may fail once the slot is held
        let engine = self
            .launcher
            .launch(&settings)
            .map_err(HarnessError::ResourceAcquisition)?;

        tracing::info!(
            task_name = %spec.task_name,
            scenario = %spec.scenario,
            task_index,
            num_tasks,
            ?profile,
            "task environment built"
        );

        Ok(TaskEnvironment::assemble(EnvironmentParts {
            spec: spec.clone(),
            settings,
            task,
            engine,
            history,
            rewards,
            observations,
            profile,
        }))
    }
}
