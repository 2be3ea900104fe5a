//! State - orchestrator の状態と報酬プロファイル

use serde::{Deserialize, Serialize};

/// Phase は orchestrator の状態を表現
///
/// # 状態遷移
/// - Uninitialized -> TaskActive(start): initialize()
/// - TaskActive(i) -> TaskActive(i): step()
/// - TaskActive(i) -> TaskActive(i + 1): タスク境界に到達（最後のタスクを除く）
/// - TaskActive(i) -> Exhausted: 予算を使い切った後の最初の呼び出し
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "task_index", rename_all = "snake_case")]
pub enum Phase {
    Uninitialized,
    TaskActive(usize),
    Exhausted,
}

impl Phase {
    pub fn task_index(self) -> Option<usize> {
        match self {
            Phase::TaskActive(i) => Some(i),
            Phase::Uninitialized | Phase::Exhausted => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Exhausted)
    }
}

/// Which reward transform list a task installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardProfile {
    Dense,
    Sparse,
}

impl RewardProfile {
    pub fn from_sparse_flag(sparse_rewards: bool) -> Self {
        if sparse_rewards {
            RewardProfile::Sparse
        } else {
            RewardProfile::Dense
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_serializes_with_task_index() {
        let v = serde_json::to_value(Phase::TaskActive(2)).unwrap();
        assert_eq!(v["phase"], "task_active");
        assert_eq!(v["task_index"], 2);
    }

    #[test]
    fn sparse_flag_selects_profile() {
        assert_eq!(RewardProfile::from_sparse_flag(true), RewardProfile::Sparse);
        assert_eq!(RewardProfile::from_sparse_flag(false), RewardProfile::Dense);
    }
}
