//! Observation pipeline - 観測の整形
//!
//! 適用順は設定の並びに関係なく固定：
//! augment → resize → rescale → normalize → frame stack → channel stack → recording tap
//!
//! 各段は `reset`（エピソード開始）と `observe`（毎ステップ）の 2 つの入口を持つ。

use std::collections::VecDeque;
use std::sync::Arc;

use crate::domain::errors::ConfigError;
use crate::domain::frame::Frame;
use crate::impls::frame_sink::DirectoryFrameSink;
use crate::ports::FrameSink;

use super::augment::Augmenter;
use super::config::{FrameSize, WrapperConfig};

const NORMALIZE_EPSILON: f64 = 1e-8;

/// ObservationTransform は観測 1 枚を変換する段
pub trait ObservationTransform: Send {
    fn name(&self) -> &'static str;

    /// First frame of an episode.
    fn reset(&mut self, frame: Frame) -> Frame {
        self.observe(frame)
    }

    fn observe(&mut self, frame: Frame) -> Frame;

    fn close(&mut self) {}
}

struct Augment(Augmenter);

impl ObservationTransform for Augment {
    fn name(&self) -> &'static str {
        "augment"
    }

    fn reset(&mut self, frame: Frame) -> Frame {
        self.0.new_episode();
        self.0.apply(&frame)
    }

    fn observe(&mut self, frame: Frame) -> Frame {
        self.0.apply(&frame)
    }
}

/// Bilinear resize of a `[h, w, c]` frame.
struct Resize(FrameSize);

impl ObservationTransform for Resize {
    fn name(&self) -> &'static str {
        "resize"
    }

    fn observe(&mut self, frame: Frame) -> Frame {
        resize_bilinear(&frame, self.0)
    }
}

pub fn resize_bilinear(frame: &Frame, size: FrameSize) -> Frame {
    let (h, w, c) = frame.hwc();
    let FrameSize {
        height: out_h,
        width: out_w,
    } = size;
    if (h, w) == (out_h, out_w) || h == 0 || w == 0 {
        return frame.clone();
    }

    let scale_y = h as f32 / out_h as f32;
    let scale_x = w as f32 / out_w as f32;
    let mut data = Vec::with_capacity(out_h * out_w * c);
    for oy in 0..out_h {
        // pixel-centre alignment
        let fy = ((oy as f32 + 0.5) * scale_y - 0.5).clamp(0.0, (h - 1) as f32);
        let y0 = fy.floor() as usize;
        let y1 = (y0 + 1).min(h - 1);
        let wy = fy - y0 as f32;
        for ox in 0..out_w {
            let fx = ((ox as f32 + 0.5) * scale_x - 0.5).clamp(0.0, (w - 1) as f32);
            let x0 = fx.floor() as usize;
            let x1 = (x0 + 1).min(w - 1);
            let wx = fx - x0 as f32;
            for ch in 0..c {
                let top = frame.at(y0, x0, ch) * (1.0 - wx) + frame.at(y0, x1, ch) * wx;
                let bottom = frame.at(y1, x0, ch) * (1.0 - wx) + frame.at(y1, x1, ch) * wx;
                data.push(top * (1.0 - wy) + bottom * wy);
            }
        }
    }
    Frame::from_hwc(out_h, out_w, c, data)
}

struct Rescale;

impl ObservationTransform for Rescale {
    fn name(&self) -> &'static str {
        "rescale"
    }

    fn observe(&mut self, frame: Frame) -> Frame {
        frame.map(|v| v / 255.0)
    }
}

/// Per-element running mean / variance normalisation.
#[derive(Default)]
struct RunningNormalize {
    count: f64,
    mean: Vec<f64>,
    var: Vec<f64>,
}

impl RunningNormalize {
    fn update(&mut self, data: &[f32]) {
        if self.mean.len() != data.len() {
            self.count = 1e-4;
            self.mean = vec![0.0; data.len()];
            self.var = vec![1.0; data.len()];
        }
        let total = self.count + 1.0;
        for ((mean, var), x) in self.mean.iter_mut().zip(&mut self.var).zip(data) {
            let delta = f64::from(*x) - *mean;
            *mean += delta / total;
            let m2 = *var * self.count + delta * delta * self.count / total;
            *var = m2 / total;
        }
        self.count = total;
    }
}

impl ObservationTransform for RunningNormalize {
    fn name(&self) -> &'static str {
        "normalize_observation"
    }

    fn observe(&mut self, mut frame: Frame) -> Frame {
        self.update(frame.data());
        for ((v, mean), var) in frame.data_mut().iter_mut().zip(&self.mean).zip(&self.var) {
            *v = ((f64::from(*v) - mean) / (var + NORMALIZE_EPSILON).sqrt()) as f32;
        }
        frame
    }
}

/// Keep the last `depth` frames, stacked along a new leading axis.
struct FrameStack {
    depth: usize,
    frames: VecDeque<Frame>,
}

impl FrameStack {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            frames: VecDeque::with_capacity(depth),
        }
    }

    fn stacked(&self) -> Frame {
        let inner = self
            .frames
            .front()
            .map(|f| f.shape().to_vec())
            .unwrap_or_default();
        let mut shape = Vec::with_capacity(inner.len() + 1);
        shape.push(self.frames.len());
        shape.extend(inner);
        let data = self
            .frames
            .iter()
            .flat_map(|f| f.data().iter().copied())
            .collect();
        Frame::new(shape, data)
    }
}

impl ObservationTransform for FrameStack {
    fn name(&self) -> &'static str {
        "frame_stack"
    }

    fn reset(&mut self, frame: Frame) -> Frame {
        self.frames.clear();
        for _ in 0..self.depth {
            self.frames.push_back(frame.clone());
        }
        self.stacked()
    }

    fn observe(&mut self, frame: Frame) -> Frame {
        if self.frames.len() == self.depth {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
        self.stacked()
    }
}

/// `[k, h, w, c]` → `[h, w, k * c]`.
struct ChannelStack;

impl ObservationTransform for ChannelStack {
    fn name(&self) -> &'static str {
        "channel_stack"
    }

    fn observe(&mut self, frame: Frame) -> Frame {
        let &[k, h, w, c] = frame.shape() else {
            return frame;
        };
        let src = frame.data();
        let plane = h * w * c;
        let mut data = Vec::with_capacity(frame.len());
        for pixel in 0..h * w {
            for i in 0..k {
                let start = i * plane + pixel * c;
                data.extend_from_slice(&src[start..start + c]);
            }
        }
        Frame::from_hwc(h, w, k * c, data)
    }
}

/// Records every `record_every`-th episode to a FrameSink.
struct RecordingTap {
    sink: Arc<dyn FrameSink>,
    name_prefix: String,
    record_every: u64,
    next_episode: u64,
    current: Option<(u64, Vec<Frame>)>,
}

impl RecordingTap {
    fn flush(&mut self) {
        if let Some((episode_id, frames)) = self.current.take() {
            if let Err(e) = self.sink.write_episode(&self.name_prefix, episode_id, &frames) {
                tracing::warn!(
                    name_prefix = %self.name_prefix,
                    episode_id,
                    error = %e,
                    "failed to write recorded episode"
                );
            }
        }
    }
}

impl ObservationTransform for RecordingTap {
    fn name(&self) -> &'static str {
        "record"
    }

    fn reset(&mut self, frame: Frame) -> Frame {
        self.flush();
        let episode_id = self.next_episode;
        self.next_episode += 1;
        if episode_id % self.record_every == 0 {
            self.current = Some((episode_id, vec![frame.clone()]));
        }
        frame
    }

    fn observe(&mut self, frame: Frame) -> Frame {
        if let Some((_, frames)) = self.current.as_mut() {
            frames.push(frame.clone());
        }
        frame
    }

    fn close(&mut self) {
        self.flush();
    }
}

/// Inputs to the pipeline that do not come from the wrapper options.
#[derive(Clone)]
pub struct PipelineContext {
    pub seed: u64,
    pub record_every: u64,
    /// Prefix for recorded episodes, normally the task name.
    pub name_prefix: String,
    /// Replaces the directory sink built from `record_dir`.
    pub frame_sink: Option<Arc<dyn FrameSink>>,
}

/// ObservationPipeline は観測変換の列
pub struct ObservationPipeline {
    stages: Vec<Box<dyn ObservationTransform>>,
}

impl std::fmt::Debug for ObservationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ObservationPipeline {
    pub fn build(config: &WrapperConfig, ctx: PipelineContext) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut stages: Vec<Box<dyn ObservationTransform>> = Vec::new();
        if let Some(kind) = config.augment {
            stages.push(Box::new(Augment(Augmenter::new(kind, ctx.seed))));
        }
        if let Some(size) = config.resize {
            stages.push(Box::new(Resize(size)));
        }
        if config.rescale {
            stages.push(Box::new(Rescale));
        }
        if config.normalize_observation {
            stages.push(Box::new(RunningNormalize::default()));
        }
        if let Some(depth) = config.frame_stack {
            stages.push(Box::new(FrameStack::new(depth)));
        }
        if config.lstm {
            stages.push(Box::new(ChannelStack));
        }
        if let Some(dir) = &config.record {
            let sink = ctx
                .frame_sink
                .unwrap_or_else(|| Arc::new(DirectoryFrameSink::new(dir.clone())));
            stages.push(Box::new(RecordingTap {
                sink,
                name_prefix: ctx.name_prefix,
                record_every: ctx.record_every.max(1),
                next_episode: 0,
                current: None,
            }));
        }
        Ok(Self { stages })
    }

    pub fn reset(&mut self, frame: Frame) -> Frame {
        self.stages.iter_mut().fold(frame, |f, stage| stage.reset(f))
    }

    pub fn observe(&mut self, frame: Frame) -> Frame {
        self.stages.iter_mut().fold(frame, |f, stage| stage.observe(f))
    }

    pub fn close(&mut self) {
        for stage in &mut self.stages {
            stage.close();
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}
