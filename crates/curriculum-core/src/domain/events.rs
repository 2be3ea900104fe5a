//! Events - ドメインイベント
//!
//! orchestrator のライフサイクル上の出来事。EventSink に送られる。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::RunId;

/// HarnessEvent は run 内で発生したイベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessEvent {
    pub run_id: RunId,
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    /// A task environment was built and holds the engine.
    TaskBuilt { task_index: usize, task_name: String },
    /// The engine of a task environment was released.
    TaskReleased { task_index: usize },
    /// Closing a task environment failed; the run continues.
    ReleaseFailed { task_index: usize, reason: String },
    /// A task boundary forced `done = true`.
    BoundaryReached { task_index: usize, global_step: u64 },
    TaskSwitched {
        from: usize,
        to: usize,
        global_step: u64,
    },
    /// The whole step budget has been spent.
    Exhausted { global_step: u64 },
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::TaskBuilt { .. } => "task_built",
            EventKind::TaskReleased { .. } => "task_released",
            EventKind::ReleaseFailed { .. } => "release_failed",
            EventKind::BoundaryReached { .. } => "boundary_reached",
            EventKind::TaskSwitched { .. } => "task_switched",
            EventKind::Exhausted { .. } => "exhausted",
        }
    }
}
