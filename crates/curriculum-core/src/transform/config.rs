//! WrapperConfig - ラッパー設定のパースと検証
//!
//! フラットなオプションマップ（`serde_json::Map`）を型付きの設定に変換する。
//!
//! # ルール
//! - 未知のキーは無視
//! - キーが無い / null は「無効」
//! - 有効化したオプションに必要な相方（companion）が無ければ ConfigError
//! - `frame_stack` は正の整数か `false`（`0` も無効扱い）
//! - `lstm` はスタックしたフレームをチャンネル方向に並べ直すので `frame_stack` が必要
//!
//! 検証はエンジン資源を確保する前に行われる。

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::errors::ConfigError;
use crate::domain::state::RewardProfile;

/// Random image augmentation applied to raw frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Augmentation {
    Conv,
    Shift,
    Noise,
}

impl FromStr for Augmentation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "conv" => Ok(Augmentation::Conv),
            "shift" => Ok(Augmentation::Shift),
            "noise" => Ok(Augmentation::Noise),
            _ => Err(ConfigError::UnknownAugmentation(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub height: usize,
    pub width: usize,
}

/// Typed wrapper configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrapperConfig {
    pub sparse_rewards: bool,
    pub augment: Option<Augmentation>,
    pub resize: Option<FrameSize>,
    pub rescale: bool,
    pub normalize_observation: bool,
    pub frame_stack: Option<usize>,
    pub lstm: bool,
    /// Directory of the recording tap; `None` disables recording.
    pub record: Option<PathBuf>,
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            sparse_rewards: false,
            augment: None,
            resize: Some(FrameSize {
                height: 84,
                width: 84,
            }),
            rescale: true,
            normalize_observation: true,
            frame_stack: Some(4),
            lstm: false,
            record: None,
        }
    }
}

impl WrapperConfig {
    pub fn from_options(options: &Map<String, Value>) -> Result<Self, ConfigError> {
        let augment = if flag(options, "augment")? {
            let name = text(options, "augmentation")?.ok_or(ConfigError::MissingCompanion {
                key: "augment",
                companion: "augmentation",
            })?;
            Some(name.parse()?)
        } else {
            None
        };

        let resize = if flag(options, "resize")? {
            let height = dimension(options, "frame_height")?.ok_or(ConfigError::MissingCompanion {
                key: "resize",
                companion: "frame_height",
            })?;
            let width = dimension(options, "frame_width")?.ok_or(ConfigError::MissingCompanion {
                key: "resize",
                companion: "frame_width",
            })?;
            Some(FrameSize { height, width })
        } else {
            None
        };

        let record = if flag(options, "record")? {
            let dir = text(options, "record_dir")?.ok_or(ConfigError::MissingCompanion {
                key: "record",
                companion: "record_dir",
            })?;
            Some(PathBuf::from(dir))
        } else {
            None
        };

        let config = Self {
            sparse_rewards: flag(options, "sparse_rewards")?,
            augment,
            resize,
            rescale: flag(options, "rescale")?,
            normalize_observation: flag(options, "normalize_observation")?,
            frame_stack: stack_depth(options)?,
            lstm: flag(options, "lstm")?,
            record,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check a typed config, including one that was deserialized or built
    /// field by field.
    ///
    /// A disabled stack is `None`; `Some(0)` is rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(size) = self.resize {
            if size.height == 0 {
                return Err(ConfigError::NonPositive {
                    key: "frame_height".to_string(),
                });
            }
            if size.width == 0 {
                return Err(ConfigError::NonPositive {
                    key: "frame_width".to_string(),
                });
            }
        }
        if self.frame_stack == Some(0) {
            return Err(ConfigError::NonPositive {
                key: "frame_stack".to_string(),
            });
        }
        if self.lstm && self.frame_stack.is_none() {
            return Err(ConfigError::MissingCompanion {
                key: "lstm",
                companion: "frame_stack",
            });
        }
        Ok(())
    }

    pub fn profile(&self) -> RewardProfile {
        RewardProfile::from_sparse_flag(self.sparse_rewards)
    }
}

fn flag(options: &Map<String, Value>, key: &str) -> Result<bool, ConfigError> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(ConfigError::InvalidType {
            key: key.to_string(),
            expected: "a boolean",
        }),
    }
}

fn text<'a>(options: &'a Map<String, Value>, key: &str) -> Result<Option<&'a str>, ConfigError> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ConfigError::InvalidType {
            key: key.to_string(),
            expected: "a string",
        }),
    }
}

fn dimension(options: &Map<String, Value>, key: &str) -> Result<Option<usize>, ConfigError> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => match v.as_u64() {
            Some(0) => Err(ConfigError::NonPositive {
                key: key.to_string(),
            }),
            Some(n) => Ok(Some(n as usize)),
            None => Err(ConfigError::InvalidType {
                key: key.to_string(),
                expected: "a positive integer",
            }),
        },
    }
}

fn stack_depth(options: &Map<String, Value>) -> Result<Option<usize>, ConfigError> {
    match options.get("frame_stack") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
        Some(v) => match v.as_u64() {
            Some(0) => Ok(None),
            Some(n) => Ok(Some(n as usize)),
            None => Err(ConfigError::InvalidType {
                key: "frame_stack".to_string(),
                expected: "a positive integer or false",
            }),
        },
    }
}
