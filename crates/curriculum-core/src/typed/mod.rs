//! Typed - タスクの能力セットとシナリオ registry
//!
//! # 二層構造
//! - **表層**: `Task` trait - シナリオごとの報酬・成功指標・統計
//! - **内部**: `ScenarioRegistry` - シナリオ ID から `Box<dyn Task>` を生成

pub mod registry;
pub mod task;
pub mod world;

// 主要な trait/型 を再エクスポート
pub use self::registry::{RegistryError, ScenarioRegistry, TaskConstructor};
pub use self::task::{Statistics, Task, normalize_success};
pub use self::world::{WorldParams, WorldTask};
