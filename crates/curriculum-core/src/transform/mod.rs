//! Transform - 報酬と観測の整形チェーン
//!
//! - `reward`: 宣言順に適用される reward transform（StateHistory を読む）
//! - `observation`: 固定順序の観測パイプライン
//! - `config`: フラットなオプションマップから WrapperConfig への変換

pub mod augment;
pub mod config;
pub mod observation;
pub mod reward;

pub use self::config::{Augmentation, FrameSize, WrapperConfig};
pub use self::observation::{ObservationPipeline, ObservationTransform, PipelineContext};
pub use self::reward::{RewardChain, RewardTransform, RewardTransformSpec};
