//! EngineSlot - プロセスあたり 1 インスタンスの制約を表現する
//!
//! # 学習ポイント
//! - AtomicBool の compare_exchange による排他的な確保
//! - 明示的な acquire / release（解放順序を Drop に任せない）
//!
//! `EngineSlot::process()` がプロセス全体で共有される slot。
//! テストは `EngineSlot::new()` で独立した slot を作る。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use crate::domain::errors::EngineError;

static PROCESS_SLOT: LazyLock<Arc<EngineSlot>> = LazyLock::new(EngineSlot::new);

#[derive(Debug, Default)]
pub struct EngineSlot {
    held: AtomicBool,
}

impl EngineSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The slot shared by every launcher in this process.
    pub fn process() -> Arc<Self> {
        Arc::clone(&PROCESS_SLOT)
    }

    /// Take the slot, or fail with `SlotBusy` if an engine is still live.
    pub fn acquire(self: &Arc<Self>) -> Result<SlotLease, EngineError> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| EngineError::SlotBusy)?;
        Ok(SlotLease {
            slot: Arc::clone(self),
            released: false,
        })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Proof of holding the slot. Must be released explicitly.
#[derive(Debug)]
pub struct SlotLease {
    slot: Arc<EngineSlot>,
    released: bool,
}

impl SlotLease {
    /// Give the slot back. Calling it again is a no-op.
    pub fn release(&mut self) {
        if !self.released {
            self.slot.held.store(false, Ordering::Release);
            self.released = true;
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for SlotLease {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!("engine slot lease dropped without an explicit release");
            self.release();
        }
    }
}
