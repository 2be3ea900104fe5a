//! Engine port - シミュレーションエンジンの抽象化
//!
//! エンジン本体（エミュレータ）はこのクレートの外側にある。
//! ここでは「1 フレーム進める・リセット・閉じる・変数を読む」だけを要求する。
//!
//! # 資源の制約
//! エンジンはプロセスあたり同時に 1 インスタンスまで。
//! 確保は EngineLauncher::launch、解放は Engine::close で明示的に行う。

use serde_json::{Map, Value};

use crate::domain::errors::EngineError;
use crate::domain::frame::Frame;
use crate::domain::outcome::Info;
use crate::domain::settings::{Buttons, EngineSettings};

/// Result of a single raw engine frame.
#[derive(Debug, Clone)]
pub struct RawStep {
    pub frame: Frame,
    pub reward: f64,
    pub done: bool,
    pub truncated: bool,
    pub info: Info,
}

/// Engine は 1 つの live なシミュレータ
pub trait Engine: Send {
    /// Advance one raw frame with `buttons` held.
    fn step(&mut self, buttons: &Buttons) -> Result<RawStep, EngineError>;

    /// Start a new episode.
    fn reset(
        &mut self,
        seed: Option<u64>,
        options: Option<&Map<String, Value>>,
    ) -> Result<(Frame, Info), EngineError>;

    /// Current screen.
    fn render(&mut self) -> Frame;

    /// Current value of a named state variable; `0.0` for unknown names.
    fn lookup_variable(&self, name: &str) -> f64;

    /// Release the engine resource.
    fn close(&mut self) -> Result<(), EngineError>;
}

/// EngineLauncher はエンジン資源を確保して Engine を返す
///
/// 別のインスタンスがまだ live なら `EngineError::SlotBusy` で失敗してよい。
pub trait EngineLauncher: Send + Sync {
    fn launch(&self, settings: &EngineSettings) -> Result<Box<dyn Engine>, EngineError>;
}
