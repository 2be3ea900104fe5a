//! ScriptedEngine - 決定的な軽量エンジン実装
//!
//! 本物のエミュレータの代わりに、横スクロールの進行を単純な物理で
//! 再現する。CLI のデモとテストで使う。
//!
//! - 右ボタンで前進、B で加速、A でジャンプ
//! - 128 px 進むごとにコイン 1 枚（スコア +200）
//! - time は 24 フレームごとに 1 減り、0 で truncated
//! - x がレベル長に達すると done
//!
//! 生の報酬は常に 0。報酬は RewardChain が状態変数から作る。
//!
//! # 障害注入
//! `with_launch_failure` / `with_close_failure` で特定の task_index の
//! launch / close を失敗させられる。close の失敗時も slot は解放される。

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};

use crate::domain::errors::EngineError;
use crate::domain::frame::Frame;
use crate::domain::outcome::Info;
use crate::domain::settings::{Buttons, EngineSettings};
use crate::impls::slot::{EngineSlot, SlotLease};
use crate::ports::engine::{Engine, EngineLauncher, RawStep};

const B: usize = 0;
const LEFT: usize = 6;
const RIGHT: usize = 7;
const A: usize = 8;

const GROUND_Y: f64 = 176.0;
const JUMP_FRAMES: u32 = 16;
const START_TIME: f64 = 400.0;
const FRAMES_PER_TICK: u64 = 24;
const COIN_SPACING: f64 = 128.0;
const DEFAULT_SHAPE: (usize, usize, usize) = (60, 64, 3);

/// Entry of the launcher's lifecycle journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleRecord {
    Launched { task_index: usize, level: String },
    Closed { task_index: usize, level: String },
}

type Journal = Arc<Mutex<Vec<LifecycleRecord>>>;

fn record(journal: &Journal, entry: LifecycleRecord) {
    journal
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(entry);
}

/// Parse `LevelW-S` into `(world, stage)`.
fn parse_level(level: &str) -> Option<(u8, u8)> {
    let rest = level.strip_prefix("Level")?;
    let (w, s) = rest.split_once('-')?;
    let (world, stage): (u8, u8) = (w.parse().ok()?, s.parse().ok()?);
    // world / stage は 1 始まり
    (world >= 1 && stage >= 1).then_some((world, stage))
}

/// ScriptedLauncher は EngineSlot を確保して ScriptedEngine を起動する
pub struct ScriptedLauncher {
    slot: Arc<EngineSlot>,
    frame_shape: (usize, usize, usize),
    level_length: Option<f64>,
    death_rate: f64,
    fail_launch: HashSet<usize>,
    fail_close: HashSet<usize>,
    journal: Journal,
}

impl ScriptedLauncher {
    pub fn new(slot: Arc<EngineSlot>) -> Self {
        Self {
            slot,
            frame_shape: DEFAULT_SHAPE,
            level_length: None,
            death_rate: 0.0,
            fail_launch: HashSet::new(),
            fail_close: HashSet::new(),
            journal: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Launcher bound to the process-wide engine slot.
    pub fn process() -> Self {
        Self::new(EngineSlot::process())
    }

    pub fn with_frame_shape(mut self, height: usize, width: usize, channels: usize) -> Self {
        self.frame_shape = (height, width, channels);
        self
    }

    /// Fixed level length in pixels. Defaults to 3000 for castle stages, 3200 otherwise.
    pub fn with_level_length(mut self, length: f64) -> Self {
        self.level_length = Some(length);
        self
    }

    /// Probability of losing a life on each raw frame.
    pub fn with_death_rate(mut self, rate: f64) -> Self {
        self.death_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_launch_failure(mut self, task_index: usize) -> Self {
        self.fail_launch.insert(task_index);
        self
    }

    pub fn with_close_failure(mut self, task_index: usize) -> Self {
        self.fail_close.insert(task_index);
        self
    }

    pub fn slot(&self) -> &Arc<EngineSlot> {
        &self.slot
    }

    /// Launch / close history, oldest first.
    pub fn journal(&self) -> Vec<LifecycleRecord> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EngineLauncher for ScriptedLauncher {
    fn launch(&self, settings: &EngineSettings) -> Result<Box<dyn Engine>, EngineError> {
        if self.fail_launch.contains(&settings.task_index) {
            return Err(EngineError::LaunchFailed(format!(
                "simulated launch failure for {}",
                settings.level
            )));
        }
        let (world, stage) = parse_level(&settings.level).ok_or_else(|| {
            EngineError::LaunchFailed(format!("unknown level '{}'", settings.level))
        })?;

        let lease = self.slot.acquire()?;
        record(
            &self.journal,
            LifecycleRecord::Launched {
                task_index: settings.task_index,
                level: settings.level.clone(),
            },
        );
        tracing::debug!(level = %settings.level, task_index = settings.task_index, "scripted engine launched");

        let level_length = self
            .level_length
            .unwrap_or(if stage == 4 { 3000.0 } else { 3200.0 });

        Ok(Box::new(ScriptedEngine {
            level: settings.level.clone(),
            task_index: settings.task_index,
            world,
            stage,
            shape: self.frame_shape,
            level_length,
            death_rate: self.death_rate,
            fail_close: self.fail_close.contains(&settings.task_index),
            lease,
            journal: Arc::clone(&self.journal),
            closed: false,
            rng: StdRng::seed_from_u64(settings.seed),
            body: Body::start(),
        }))
    }
}

/// Mutable per-episode state.
#[derive(Debug, Clone)]
struct Body {
    x: f64,
    max_x: f64,
    y: f64,
    airborne: u32,
    coins: f64,
    score: f64,
    lives: f64,
    time: f64,
    frames: u64,
    direction: f64,
}

impl Body {
    fn start() -> Self {
        Self {
            x: 40.0,
            max_x: 40.0,
            y: GROUND_Y,
            airborne: 0,
            coins: 0.0,
            score: 0.0,
            lives: 2.0,
            time: START_TIME,
            frames: 0,
            direction: 1.0,
        }
    }
}

pub struct ScriptedEngine {
    level: String,
    task_index: usize,
    world: u8,
    stage: u8,
    shape: (usize, usize, usize),
    level_length: f64,
    death_rate: f64,
    fail_close: bool,
    lease: SlotLease,
    journal: Journal,
    closed: bool,
    rng: StdRng,
    body: Body,
}

impl ScriptedEngine {
    fn advance(&mut self, buttons: &Buttons) {
        let b = &mut self.body;

        let mut dx = 0.0;
        if buttons[RIGHT] == 1 {
            dx += 1.0;
            b.direction = 1.0;
        }
        if buttons[LEFT] == 1 {
            dx -= 1.0;
            b.direction = 2.0;
        }
        if buttons[B] == 1 {
            dx *= 2.0;
        }
        b.x = (b.x + dx).max(0.0);

        if buttons[A] == 1 && b.airborne == 0 {
            b.airborne = JUMP_FRAMES;
        }
        if b.airborne > 0 {
            let t = f64::from(JUMP_FRAMES - b.airborne);
            let half = f64::from(JUMP_FRAMES) / 2.0;
            b.y = GROUND_Y - 4.0 * (half - (t - half).abs());
            b.airborne -= 1;
        } else {
            b.y = GROUND_Y;
        }

        if b.x > b.max_x {
            let crossed = (b.x / COIN_SPACING).floor() - (b.max_x / COIN_SPACING).floor();
            if crossed > 0.0 {
                b.coins += crossed;
                b.score += 200.0 * crossed;
            }
            b.max_x = b.x;
        }

        b.frames += 1;
        if b.frames % FRAMES_PER_TICK == 0 {
            b.time = (b.time - 1.0).max(0.0);
        }

        if self.death_rate > 0.0 && self.rng.gen_bool(self.death_rate) {
            self.body.lives -= 1.0;
        }
    }

    fn draw(&self) -> Frame {
        let (h, w, c) = self.shape;
        let scroll = self.body.x as usize;
        let player_row = ((self.body.y / 240.0) * h as f64) as usize;
        let mut data = Vec::with_capacity(h * w * c);
        for y in 0..h {
            for x in 0..w {
                for ch in 0..c {
                    let v: f32 = if y == player_row.min(h.saturating_sub(1)) && x == w / 3 {
                        255.0
                    } else {
                        ((scroll + x * 3 + y * 2 + ch * 40) % 256) as f32
                    };
                    data.push(v);
                }
            }
        }
        Frame::from_hwc(h, w, c, data)
    }

    fn level_info(&self) -> Info {
        let mut info = Map::new();
        info.insert("level".into(), Value::from(self.level.clone()));
        info.insert("frames".into(), Value::from(self.body.frames));
        info
    }
}

impl Engine for ScriptedEngine {
    fn step(&mut self, buttons: &Buttons) -> Result<RawStep, EngineError> {
        if self.closed {
            return Err(EngineError::Closed);
        }
        self.advance(buttons);

        let done = self.body.x >= self.level_length || self.body.lives < 0.0;
        let truncated = self.body.time <= 0.0;
        Ok(RawStep {
            frame: self.draw(),
            reward: 0.0,
            done,
            truncated,
            info: self.level_info(),
        })
    }

    fn reset(
        &mut self,
        seed: Option<u64>,
        _options: Option<&Map<String, Value>>,
    ) -> Result<(Frame, Info), EngineError> {
        if self.closed {
            return Err(EngineError::Closed);
        }
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.body = Body::start();
        Ok((self.draw(), self.level_info()))
    }

    fn render(&mut self) -> Frame {
        self.draw()
    }

    fn lookup_variable(&self, name: &str) -> f64 {
        let b = &self.body;
        match name {
            "xscrollHi" | "player_x_posHi" => (b.x / 256.0).floor(),
            "xscrollLo" | "player_x_posLo" => b.x.rem_euclid(256.0).floor(),
            "player_y_pos" => b.y,
            "player_y_screen" => 1.0,
            "jump_airborne" => f64::from(u8::from(b.airborne > 0)),
            "moving_direction" => b.direction,
            "coins" => b.coins,
            "score" => b.score,
            "lives" => b.lives,
            "time" => b.time,
            "world" => f64::from(self.world - 1),
            "stage" => f64::from(self.stage - 1),
            "levelLo" => f64::from(self.stage - 1),
            "levelHi" => f64::from(self.world - 1),
            _ => 0.0,
        }
    }

    fn close(&mut self) -> Result<(), EngineError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.lease.release();
        record(
            &self.journal,
            LifecycleRecord::Closed {
                task_index: self.task_index,
                level: self.level.clone(),
            },
        );
        if self.fail_close {
            return Err(EngineError::CloseFailed(format!(
                "simulated close failure for {}",
                self.level
            )));
        }
        Ok(())
    }
}
