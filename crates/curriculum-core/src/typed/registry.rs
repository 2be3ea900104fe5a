//! ScenarioRegistry - シナリオ ID からタスク生成関数への対応表
//!
//! # 学習ポイント
//! - HashMap での型消去された生成関数（`Arc<dyn Fn>`）の管理
//! - LazyLock でプロセスに 1 つの組み込み registry
//!
//! 組み込み registry は World1..World8 を登録済み。
//! 独自シナリオを足すときは `ScenarioRegistry::builtin_cloned()` から始める。

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use serde_json::{Map, Value};

use crate::domain::errors::ConfigError;
use crate::domain::spec::{Scenario, ScenarioId, TaskSpec};

use super::task::Task;
use super::world::WorldTask;

/// Builds a task from its spec and its merged scenario parameters.
pub type TaskConstructor =
    Arc<dyn Fn(&TaskSpec, &Map<String, Value>) -> Result<Box<dyn Task>, ConfigError> + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("scenario '{0}' is already registered")]
    AlreadyRegistered(ScenarioId),
}

static BUILTIN: LazyLock<ScenarioRegistry> = LazyLock::new(|| {
    let constructors = Scenario::ALL
        .into_iter()
        .map(|scenario| {
            let world = scenario.world();
            let constructor: TaskConstructor =
                Arc::new(move |spec: &TaskSpec, params: &Map<String, Value>| {
                    WorldTask::from_params(world, spec, params).map(|t| Box::new(t) as Box<dyn Task>)
                });
            (scenario.id(), constructor)
        })
        .collect();
    ScenarioRegistry { constructors }
});

#[derive(Clone, Default)]
pub struct ScenarioRegistry {
    constructors: HashMap<ScenarioId, TaskConstructor>,
}

impl std::fmt::Debug for ScenarioRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioRegistry")
            .field("scenarios", &self.registered_scenarios())
            .finish()
    }
}

impl ScenarioRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry with the eight world scenarios.
    pub fn builtin() -> &'static ScenarioRegistry {
        &BUILTIN
    }

    pub fn builtin_cloned() -> Self {
        BUILTIN.clone()
    }

    pub fn register<F>(&mut self, id: ScenarioId, constructor: F) -> Result<(), RegistryError>
    where
        F: Fn(&TaskSpec, &Map<String, Value>) -> Result<Box<dyn Task>, ConfigError>
            + Send
            + Sync
            + 'static,
    {
        if self.constructors.contains_key(&id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        self.constructors.insert(id, Arc::new(constructor));
        Ok(())
    }

    pub fn get(&self, id: &ScenarioId) -> Option<TaskConstructor> {
        self.constructors.get(id).cloned()
    }

    pub fn contains(&self, id: &ScenarioId) -> bool {
        self.constructors.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn registered_scenarios(&self) -> Vec<ScenarioId> {
        let mut ids: Vec<_> = self.constructors.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::RewardProfile;

    #[test]
    fn builtin_registers_all_worlds() {
        let ids = ScenarioRegistry::builtin().registered_scenarios();
        assert_eq!(ids.len(), 8);
        assert!(ids.contains(&ScenarioId::new("world8")));
        assert_eq!(ids, Scenario::ALL.map(Scenario::id).to_vec());
    }

    #[test]
    fn builtin_constructor_builds_world_task() {
        let spec = TaskSpec::new(ScenarioId::new("world3"), "Level3-2");
        let ctor = ScenarioRegistry::builtin().get(&spec.scenario).unwrap();
        let task = ctor(&spec, &Map::new()).unwrap();
        assert_eq!(task.task_name(), "Level3-2");
        assert_eq!(task.reward_transforms(RewardProfile::Sparse).len(), 1);
    }

    #[test]
    fn double_registration_is_rejected() {
        let mut registry = ScenarioRegistry::builtin_cloned();
        let result = registry.register(ScenarioId::new("world1"), |spec, params| {
            WorldTask::from_params(1, spec, params).map(|t| Box::new(t) as Box<dyn Task>)
        });
        assert!(matches!(result, Err(RegistryError::AlreadyRegistered(_))));
    }

    #[test]
    fn unknown_scenario_is_absent() {
        assert!(ScenarioRegistry::builtin().get(&ScenarioId::new("world9")).is_none());
    }
}
