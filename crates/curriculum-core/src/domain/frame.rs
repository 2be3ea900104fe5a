//! Observation frames.
//!
//! A frame is a dense `f32` tensor in row-major order. Raw engine frames are
//! `[height, width, channels]`; frame stacking adds a leading axis.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::EngineError;

/// `render(mode)` の出力形式。配列として返すモードのみ。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    #[default]
    RgbArray,
}

impl FromStr for RenderMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rgb_array" => Ok(RenderMode::RgbArray),
            other => Err(EngineError::UnsupportedRenderMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Frame {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
        debug_assert_eq!(
            shape.iter().product::<usize>(),
            data.len(),
            "frame data does not match shape {shape:?}"
        );
        Self { shape, data }
    }

    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            data: vec![0.0; len],
        }
    }

    /// Frame of shape `[height, width, channels]`.
    pub fn from_hwc(height: usize, width: usize, channels: usize, data: Vec<f32>) -> Self {
        Self::new(vec![height, width, channels], data)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// `(height, width, channels)` taken from the last three axes.
    pub fn hwc(&self) -> (usize, usize, usize) {
        match self.shape.as_slice() {
            [.., h, w, c] => (*h, *w, *c),
            [h, w] => (*h, *w, 1),
            [n] => (1, *n, 1),
            [] => (0, 0, 0),
        }
    }

    /// Value at `(y, x, c)` of a `[height, width, channels]` frame.
    pub fn at(&self, y: usize, x: usize, c: usize) -> f32 {
        let (_, w, ch) = self.hwc();
        self.data[(y * w + x) * ch + c]
    }

    pub fn map(mut self, mut f: impl FnMut(f32) -> f32) -> Self {
        for v in &mut self.data {
            *v = f(*v);
        }
        self
    }
}
