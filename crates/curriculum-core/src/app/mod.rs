//! App - アプリケーション層
//!
//! ports と transform を組み合わせてハーネス本体を実装します。
//!
//! # 主要コンポーネント
//! - **TaskFactory**: TaskSpec から TaskEnvironment を構築
//! - **TaskEnvironment**: エンジン 1 つ分の step / reset / close
//! - **Orchestrator**: ステップ予算に従ってタスクを切り替える状態機械

pub mod builder;
pub mod environment;
pub mod orchestrator;

// 主要な型を再エクスポート
pub use self::builder::{TaskFactory, TaskOptions};
pub use self::environment::TaskEnvironment;
pub use self::orchestrator::{HarnessConfig, Orchestrator};
