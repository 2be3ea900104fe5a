//! Domain model (ids, specs, snapshots, history, outcomes, errors, events).
//!
//! 外部（エンジン・ファイル）に依存しない純粋なデータ型だけを置く。

pub mod errors;
pub mod events;
pub mod frame;
pub mod history;
pub mod ids;
pub mod outcome;
pub mod settings;
pub mod snapshot;
pub mod spec;
pub mod state;

pub use self::errors::{ConfigError, EngineError, ErrorKind, HarnessError};
pub use self::events::{EventKind, HarnessEvent};
pub use self::frame::{Frame, RenderMode};
pub use self::history::{DEFAULT_HISTORY_CAPACITY, StateHistory};
pub use self::ids::RunId;
pub use self::outcome::{Info, SEQ_IDX_KEY, StepOutcome};
pub use self::settings::{ActionSet, Buttons, EngineSettings, merge_options};
pub use self::snapshot::{StateSnapshot, TRACKED_VARIABLES, VariableId};
pub use self::spec::{Scenario, ScenarioId, Sequence, TaskSpec};
pub use self::state::{Phase, RewardProfile};
