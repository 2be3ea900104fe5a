//! Errors - エラー型と分類
//!
//! # 分類
//! - Configuration: 設定ミス。エンジン資源を確保する前に検出する
//! - Budget: ステップ予算の超過。run の終了を意味する
//! - Resource: エンジン資源の確保失敗。リトライしない
//! - Lifecycle: 初期化前の呼び出しなど、API の使い方の誤り
//!
//! 解放（close）の失敗はエラーとして返さず、warn ログとイベントで記録する。

use thiserror::Error;

use super::spec::ScenarioId;

/// ErrorKind は HarnessError の運用分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Budget,
    Resource,
    Lifecycle,
}

/// Configuration problems detected while building a task environment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("option '{key}' requires '{companion}' to be set")]
    MissingCompanion {
        key: &'static str,
        companion: &'static str,
    },

    #[error("option '{key}' has an invalid value: expected {expected}")]
    InvalidType {
        key: String,
        expected: &'static str,
    },

    #[error("unknown augmentation '{0}' (expected conv, shift or noise)")]
    UnknownAugmentation(String),

    #[error("option '{key}' must be positive")]
    NonPositive { key: String },

    #[error("invalid parameter for {transform} transform: {reason}")]
    InvalidTransform {
        transform: &'static str,
        reason: String,
    },

    #[error("invalid engine settings: {0}")]
    InvalidSettings(String),

    #[error("invalid scenario parameters for '{scenario}': {reason}")]
    InvalidScenarioParameters { scenario: ScenarioId, reason: String },
}

/// Failures reported by a simulation engine or its launcher.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("an engine instance is already live in this process")]
    SlotBusy,

    #[error("engine failed to start: {0}")]
    LaunchFailed(String),

    #[error("engine failed to close: {0}")]
    CloseFailed(String),

    #[error("engine is closed")]
    Closed,

    #[error("action index {index} is out of range (action space has {size} actions)")]
    InvalidAction { index: usize, size: usize },

    #[error("render mode '{0}' is not supported (expected rgb_array)")]
    UnsupportedRenderMode(String),
}

/// HarnessError はハーネス全体のエラー
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("step budget exceeded: {steps} steps taken, budget is {budget}")]
    StepBudgetExceeded { steps: u64, budget: u64 },

    #[error("could not acquire task environment: {0}")]
    ResourceAcquisition(EngineError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("no scenario registered for '{0}'")]
    UnknownScenario(ScenarioId),

    #[error("orchestrator is not initialized")]
    NotInitialized,

    #[error("orchestrator is already initialized")]
    AlreadyInitialized,

    #[error("no live task environment (the previous task switch failed)")]
    NoActiveTask,

    #[error("sequence is empty")]
    EmptySequence,

    #[error("steps_per_task must be positive")]
    ZeroStepsPerTask,

    #[error("start index {start} is out of range for a sequence of {num_tasks} tasks")]
    InvalidStartIndex { start: usize, num_tasks: usize },
}

impl HarnessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HarnessError::Configuration(_)
            | HarnessError::UnknownScenario(_)
            | HarnessError::EmptySequence
            | HarnessError::ZeroStepsPerTask
            | HarnessError::InvalidStartIndex { .. } => ErrorKind::Configuration,
            HarnessError::StepBudgetExceeded { .. } => ErrorKind::Budget,
            HarnessError::ResourceAcquisition(_) | HarnessError::Engine(_) => ErrorKind::Resource,
            HarnessError::NotInitialized
            | HarnessError::AlreadyInitialized
            | HarnessError::NoActiveTask => ErrorKind::Lifecycle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_convert_into_harness_errors() {
        let err: HarnessError = ConfigError::MissingCompanion {
            key: "resize",
            companion: "frame_height",
        }
        .into();

        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("frame_height"));
    }

    #[test]
    fn budget_error_reports_counts() {
        let err = HarnessError::StepBudgetExceeded {
            steps: 2000,
            budget: 2000,
        };
        assert_eq!(err.kind(), ErrorKind::Budget);
        assert_eq!(
            err.to_string(),
            "step budget exceeded: 2000 steps taken, budget is 2000"
        );
    }

    #[test]
    fn acquisition_failures_are_resource_errors() {
        let err = HarnessError::ResourceAcquisition(EngineError::SlotBusy);
        assert_eq!(err.kind(), ErrorKind::Resource);
    }
}
