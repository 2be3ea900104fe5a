//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **EngineSlot**: プロセスあたり 1 エンジンの制約
//! - **ScriptedLauncher / ScriptedEngine**: 決定的な軽量エンジン（CLI・テスト用）
//! - **TracingEventSink / MemoryEventSink**: イベントの出力先
//! - **DirectoryFrameSink / MemoryFrameSink**: 録画タップの出力先
//!
//! 本物のエミュレータ連携は別クレートで EngineLauncher を実装する。

pub mod event_sink;
pub mod frame_sink;
pub mod scripted;
pub mod slot;

// 主要な型を再エクスポート
pub use self::event_sink::{MemoryEventSink, TracingEventSink};
pub use self::frame_sink::{DirectoryFrameSink, MemoryFrameSink, RecordedEpisode};
pub use self::scripted::{LifecycleRecord, ScriptedEngine, ScriptedLauncher};
pub use self::slot::{EngineSlot, SlotLease};
