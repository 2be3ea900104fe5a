//! StateHistory - 直近 N ステップの snapshot を保持する FIFO バッファ
//!
//! 差分ベースの reward transform はすべてここを読む。
//! 容量を超えたら最も古い snapshot から捨てる。

use std::collections::VecDeque;

use super::errors::ConfigError;
use super::snapshot::StateSnapshot;

/// Default number of snapshots kept per task environment.
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

static ZERO_SNAPSHOT: StateSnapshot = StateSnapshot::zero();

/// Fixed-capacity ring buffer of [`StateSnapshot`]s.
#[derive(Debug, Clone)]
pub struct StateHistory {
    buf: VecDeque<StateSnapshot>,
    capacity: usize,
}

impl StateHistory {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::NonPositive {
                key: "history_capacity".to_string(),
            });
        }
        Ok(Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Append a snapshot, evicting the oldest one when full.
    pub fn push(&mut self, snapshot: StateSnapshot) {
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(snapshot);
    }

    /// Most recent snapshot, or an all-zero snapshot when empty.
    pub fn latest(&self) -> &StateSnapshot {
        self.buf.back().unwrap_or(&ZERO_SNAPSHOT)
    }

    /// `at(0)` is the latest snapshot, `at(1)` the one before it, and so on.
    pub fn at(&self, offset_from_end: usize) -> Option<&StateSnapshot> {
        let len = self.buf.len();
        if offset_from_end >= len {
            return None;
        }
        self.buf.get(len - 1 - offset_from_end)
    }

    /// Value of `name` at `offset_from_end`; `0.0` when the entry or the name is missing.
    pub fn value_at(&self, offset_from_end: usize, name: &str) -> f64 {
        self.at(offset_from_end).map_or(0.0, |s| s.get(name))
    }

    /// Oldest snapshot still held.
    pub fn oldest(&self) -> Option<&StateSnapshot> {
        self.buf.front()
    }

    /// Snapshots from oldest to latest.
    pub fn iter(&self) -> impl Iterator<Item = &StateSnapshot> {
        self.buf.iter()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for StateHistory {
    fn default() -> Self {
        Self {
            buf: VecDeque::with_capacity(DEFAULT_HISTORY_CAPACITY),
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}
