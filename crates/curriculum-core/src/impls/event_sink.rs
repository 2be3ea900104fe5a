//! EventSink の実装
//!
//! # 学習ポイント
//! - tracing の構造化フィールドでイベントを出す
//! - Mutex<Vec<_>> によるテスト用の記録

use std::sync::{Mutex, PoisonError};

use crate::domain::events::{EventKind, HarnessEvent};
use crate::ports::EventSink;

/// TracingEventSink はイベントを info レベルのログとして流す
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: HarnessEvent) {
        let run_id = event.run_id.to_string();
        match &event.kind {
            EventKind::ReleaseFailed { task_index, reason } => {
                tracing::warn!(%run_id, task_index, %reason, event = event.kind.name());
            }
            EventKind::TaskBuilt {
                task_index,
                task_name,
            } => {
                tracing::info!(%run_id, task_index, %task_name, event = event.kind.name());
            }
            EventKind::TaskSwitched {
                from,
                to,
                global_step,
            } => {
                tracing::info!(%run_id, from, to, global_step, event = event.kind.name());
            }
            EventKind::TaskReleased { task_index } => {
                tracing::debug!(%run_id, task_index, event = event.kind.name());
            }
            EventKind::BoundaryReached {
                task_index,
                global_step,
            } => {
                tracing::debug!(%run_id, task_index, global_step, event = event.kind.name());
            }
            EventKind::Exhausted { global_step } => {
                tracing::info!(%run_id, global_step, event = event.kind.name());
            }
        }
    }
}

/// MemoryEventSink はイベントをメモリに溜める
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<HarnessEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HarnessEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Event kinds only, in emission order.
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().into_iter().map(|e| e.kind).collect()
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, event: HarnessEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ulid::Ulid;

    fn event(kind: EventKind) -> HarnessEvent {
        HarnessEvent {
            run_id: Ulid::new().into(),
            at: Utc::now(),
            kind,
        }
    }

    #[test]
    fn memory_sink_keeps_emission_order() {
        let sink = MemoryEventSink::new();
        sink.emit(event(EventKind::TaskBuilt {
            task_index: 0,
            task_name: "Level1-1".into(),
        }));
        sink.emit(event(EventKind::Exhausted { global_step: 10 }));

        assert_eq!(
            sink.kinds(),
            vec![
                EventKind::TaskBuilt {
                    task_index: 0,
                    task_name: "Level1-1".into()
                },
                EventKind::Exhausted { global_step: 10 },
            ]
        );
    }

    #[test]
    fn tracing_sink_accepts_every_kind() {
        let sink = TracingEventSink;
        sink.emit(event(EventKind::ReleaseFailed {
            task_index: 1,
            reason: "boom".into(),
        }));
        sink.emit(event(EventKind::TaskReleased { task_index: 1 }));
    }
}
