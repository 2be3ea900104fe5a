//! Random image augmentations.
//!
//! All three work on `[height, width, channels]` frames in the `0..=255`
//! range and draw from a seeded `StdRng`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::frame::Frame;

use super::config::Augmentation;

const SHIFT_PAD: usize = 4;
const NOISE_SIGMA: f64 = 0.05 * 255.0;

#[derive(Debug)]
pub struct Augmenter {
    kind: Augmentation,
    rng: StdRng,
    kernel: [f32; 9],
}

impl Augmenter {
    pub fn new(kind: Augmentation, seed: u64) -> Self {
        let mut augmenter = Self {
            kind,
            rng: StdRng::seed_from_u64(seed),
            kernel: [0.0; 9],
        };
        augmenter.new_episode();
        augmenter
    }

    pub fn kind(&self) -> Augmentation {
        self.kind
    }

    /// Resample per-episode parameters (the conv kernel).
    pub fn new_episode(&mut self) {
        let mut sum = 0.0;
        for w in &mut self.kernel {
            *w = self.rng.gen_range(0.0..1.0);
            sum += *w;
        }
        if sum <= f32::EPSILON {
            self.kernel = [0.0; 9];
            self.kernel[4] = 1.0;
        } else {
            for w in &mut self.kernel {
                *w /= sum;
            }
        }
    }

    pub fn apply(&mut self, frame: &Frame) -> Frame {
        match self.kind {
            Augmentation::Shift => self.shift(frame),
            Augmentation::Noise => self.noise(frame),
            Augmentation::Conv => self.conv(frame),
        }
    }

    /// Replicate-pad by 4 pixels and crop back at a random offset.
    fn shift(&mut self, frame: &Frame) -> Frame {
        let (h, w, c) = frame.hwc();
        let dy = self.rng.gen_range(0..=2 * SHIFT_PAD) as isize - SHIFT_PAD as isize;
        let dx = self.rng.gen_range(0..=2 * SHIFT_PAD) as isize - SHIFT_PAD as isize;

        let mut data = Vec::with_capacity(frame.len());
        for y in 0..h {
            let sy = (y as isize + dy).clamp(0, h as isize - 1) as usize;
            for x in 0..w {
                let sx = (x as isize + dx).clamp(0, w as isize - 1) as usize;
                for ch in 0..c {
                    data.push(frame.at(sy, sx, ch));
                }
            }
        }
        Frame::new(frame.shape().to_vec(), data)
    }

    /// Additive gaussian noise (Box-Muller), clamped to the pixel range.
    fn noise(&mut self, frame: &Frame) -> Frame {
        let rng = &mut self.rng;
        frame.clone().map(|v| {
            let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
            let u2: f64 = rng.gen_range(0.0..1.0);
            let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
            (f64::from(v) + z * NOISE_SIGMA).clamp(0.0, 255.0) as f32
        })
    }

    /// 3x3 convolution with the episode's random kernel, edges replicated.
    fn conv(&mut self, frame: &Frame) -> Frame {
        let (h, w, c) = frame.hwc();
        let mut data = Vec::with_capacity(frame.len());
        for y in 0..h {
            for x in 0..w {
                for ch in 0..c {
                    let mut acc = 0.0;
                    for ky in 0..3 {
                        for kx in 0..3 {
                            let sy = (y + ky).saturating_sub(1).min(h - 1);
                            let sx = (x + kx).saturating_sub(1).min(w - 1);
                            acc += self.kernel[ky * 3 + kx] * frame.at(sy, sx, ch);
                        }
                    }
                    data.push(acc.clamp(0.0, 255.0));
                }
            }
        }
        Frame::new(frame.shape().to_vec(), data)
    }
}
