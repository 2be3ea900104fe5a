//! Step results handed back to the agent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::frame::Frame;

/// Free-form per-step information. Always carries `seq_idx` once it has
/// passed through the orchestrator.
pub type Info = Map<String, Value>;

/// Key injected into every orchestrated step's info map.
pub const SEQ_IDX_KEY: &str = "seq_idx";

/// `(observation, reward, done, truncated, info)` of one agent step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub observation: Frame,
    pub reward: f64,
    pub done: bool,
    pub truncated: bool,
    #[serde(default)]
    pub info: Info,
}

impl StepOutcome {
    pub fn is_terminal(&self) -> bool {
        self.done || self.truncated
    }

    pub fn seq_idx(&self) -> Option<usize> {
        self.info
            .get(SEQ_IDX_KEY)
            .and_then(Value::as_u64)
            .map(|v| v as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_idx_is_read_from_info() {
        let mut info = Info::new();
        info.insert(SEQ_IDX_KEY.to_string(), Value::from(3u64));
        let outcome = StepOutcome {
            observation: Frame::zeros(vec![1, 1, 1]),
            reward: 0.0,
            done: false,
            truncated: true,
            info,
        };
        assert_eq!(outcome.seq_idx(), Some(3));
        assert!(outcome.is_terminal());
    }
}
