//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! シミュレーションエンジン、時刻、ID、イベント・録画の出力先は
//! すべて trait 越しに扱い、実装の詳細を隠蔽します。

pub mod clock;
pub mod engine;
pub mod event_sink;
pub mod frame_sink;
pub mod id_generator;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::engine::{Engine, EngineLauncher, RawStep};
pub use self::event_sink::EventSink;
pub use self::frame_sink::FrameSink;
pub use self::id_generator::{IdGenerator, UlidGenerator};
