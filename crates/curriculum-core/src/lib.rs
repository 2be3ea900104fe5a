//! curriculum-core
//!
//! Building blocks for running an agent through a curriculum of tasks
//! with a fixed step budget per task.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, spec, snapshot, history, outcome, state, errors, events）
//! - **ports**: 抽象化レイヤー（Engine, EngineLauncher, Clock, IdGenerator, EventSink, FrameSink）
//! - **transform**: 報酬・観測の変換チェーン（RewardChain, ObservationPipeline, WrapperConfig）
//! - **typed**: シナリオごとの Task trait と ScenarioRegistry
//! - **app**: TaskFactory, TaskEnvironment, Orchestrator
//! - **impls**: 実装（ScriptedLauncher, EngineSlot, イベント・録画の出力先）

pub mod domain;
pub mod ports;
pub mod transform;
pub mod typed;
pub mod app;
pub mod impls;
