//! Task trait - シナリオが提供する能力の定義
//!
//! # 学習ポイント
//! - trait のデフォルトメソッドで共通ロジック（success の正規化）を提供
//! - `Box<dyn Task>` として registry から生成される
//!
//! タスクは報酬 transform の一覧、成功指標、統計を提供する。
//! エンジンそのものは持たない（TaskEnvironment が持つ）。

use std::collections::BTreeMap;

use crate::domain::history::StateHistory;
use crate::domain::spec::ScenarioId;
use crate::domain::state::RewardProfile;
use crate::transform::reward::RewardTransformSpec;

/// `"{mode}/{name}" -> value`
pub type Statistics = BTreeMap<String, f64>;

/// `(metric - lower) / (upper - lower)` clipped to `[0, 1]`.
///
/// A degenerate range (`upper <= lower`) yields 1 once the metric reaches
/// `upper`, 0 otherwise. NaN metrics yield 0.
pub fn normalize_success(metric: f64, lower: f64, upper: f64) -> f64 {
    if metric.is_nan() {
        return 0.0;
    }
    if upper <= lower {
        return if metric >= upper { 1.0 } else { 0.0 };
    }
    ((metric - lower) / (upper - lower)).clamp(0.0, 1.0)
}

/// Task はシナリオ固有の能力セット
pub trait Task: Send {
    fn scenario(&self) -> &ScenarioId;

    fn task_name(&self) -> &str;

    /// Reward transform list for `profile`, in application order.
    fn reward_transforms(&self, profile: RewardProfile) -> Vec<RewardTransformSpec>;

    /// Raw value of the success metric for the current episode.
    fn success_metric(&self) -> f64;

    /// `(lower, upper)` bounds used to normalise the success metric.
    fn performance_bounds(&self) -> (f64, f64);

    /// Called once per agent step after the new snapshot has been pushed.
    fn observe(&mut self, history: &StateHistory);

    fn clear_episode_statistics(&mut self);

    fn extra_statistics(&self, mode: &str) -> Statistics;

    fn success(&self) -> f64 {
        let (lower, upper) = self.performance_bounds();
        normalize_success(self.success_metric(), lower, upper)
    }

    fn statistics(&self, mode: &str) -> Statistics {
        let mut stats = self.extra_statistics(mode);
        stats.insert(format!("{mode}/success"), self.success());
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(100.0, 0.0)]
    #[case(50.0, 0.0)]
    #[case(1650.0, 0.5)]
    #[case(3200.0, 1.0)]
    #[case(5000.0, 1.0)]
    #[case(f64::NAN, 0.0)]
    fn success_is_clipped_to_unit_range(#[case] metric: f64, #[case] expected: f64) {
        assert!((normalize_success(metric, 100.0, 3200.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn degenerate_bounds_do_not_divide_by_zero() {
        assert_eq!(normalize_success(10.0, 10.0, 10.0), 1.0);
        assert_eq!(normalize_success(9.0, 10.0, 10.0), 0.0);
    }
}
