//! FrameSink port - 録画タップの出力先
//!
//! 動画エンコードはこのクレートの範囲外。タップは最終フレーム列を
//! エピソード単位で FrameSink に渡すだけ。

use std::io;

use crate::domain::frame::Frame;

pub trait FrameSink: Send + Sync {
    /// Persist the frames of one recorded episode.
    fn write_episode(&self, name_prefix: &str, episode_id: u64, frames: &[Frame]) -> io::Result<()>;
}
