//! EventSink port - イベント記録の抽象化
//!
//! # 実装
//! - TracingEventSink: tracing に流す（デフォルト）
//! - MemoryEventSink: メモリに溜める（テスト・CLI のサマリ用）

use crate::domain::events::HarnessEvent;

/// EventSink はハーネスのイベントを記録
///
/// 記録の失敗で run を止めてはいけないので、戻り値は持たない。
pub trait EventSink: Send + Sync {
    fn emit(&self, event: HarnessEvent);
}
