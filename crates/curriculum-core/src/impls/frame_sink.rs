//! FrameSink の実装
//!
//! - DirectoryFrameSink: `<dir>/<prefix>-episode-<n>.jsonl` に 1 フレーム 1 行で書く
//! - MemoryFrameSink: テスト用

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::domain::frame::Frame;
use crate::ports::FrameSink;

#[derive(Debug, Clone)]
pub struct DirectoryFrameSink {
    dir: PathBuf,
}

impl DirectoryFrameSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn episode_path(&self, name_prefix: &str, episode_id: u64) -> PathBuf {
        self.dir
            .join(format!("{name_prefix}-episode-{episode_id}.jsonl"))
    }
}

impl FrameSink for DirectoryFrameSink {
    fn write_episode(&self, name_prefix: &str, episode_id: u64, frames: &[Frame]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.episode_path(name_prefix, episode_id);
        let mut out = BufWriter::new(File::create(&path)?);
        for frame in frames {
            serde_json::to_writer(&mut out, frame)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        tracing::debug!(path = %path.display(), frames = frames.len(), "episode recorded");
        Ok(())
    }
}

/// One episode captured by [`MemoryFrameSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEpisode {
    pub name_prefix: String,
    pub episode_id: u64,
    pub frames: Vec<Frame>,
}

#[derive(Debug, Default)]
pub struct MemoryFrameSink {
    episodes: Mutex<Vec<RecordedEpisode>>,
}

impl MemoryFrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn episodes(&self) -> Vec<RecordedEpisode> {
        self.episodes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FrameSink for MemoryFrameSink {
    fn write_episode(&self, name_prefix: &str, episode_id: u64, frames: &[Frame]) -> io::Result<()> {
        self.episodes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedEpisode {
                name_prefix: name_prefix.to_string(),
                episode_id,
                frames: frames.to_vec(),
            });
        Ok(())
    }
}
