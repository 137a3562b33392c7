use serde::{Deserialize, Serialize};

use crate::wheel_resolver::SpinResult;

/// Session-lifetime tally of settled spins.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningTotals {
    pub spin_count: u64,
    pub cumulative_payout: i64,
}

impl RunningTotals {
    /// Folds one settled spin into the totals.
    pub fn apply(self, result: &SpinResult) -> Self {
        Self {
            spin_count: self.spin_count.saturating_add(1),
            cumulative_payout: self.cumulative_payout.saturating_add(result.awarded_payout),
        }
    }

    pub fn reset(self) -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(awarded_payout: i64) -> SpinResult {
        SpinResult {
            final_angle_degrees: 0.0,
            segment_index: 0,
            base_payout: awarded_payout,
            predicted_correctly: false,
            awarded_payout,
        }
    }

    #[test]
    fn test_apply_is_a_fold() {
        let totals = [5, 50, 1_000]
            .iter()
            .map(|&p| result(p))
            .fold(RunningTotals::default(), |totals, r| totals.apply(&r));
        assert_eq!(totals, RunningTotals { spin_count: 3, cumulative_payout: 1_055 });
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let totals = RunningTotals { spin_count: 42, cumulative_payout: 99_999 };
        assert_eq!(totals.reset(), RunningTotals { spin_count: 0, cumulative_payout: 0 });
    }

    #[test]
    fn test_apply_saturates() {
        let totals = RunningTotals { spin_count: u64::MAX, cumulative_payout: i64::MAX - 1 };
        let next = totals.apply(&result(10));
        assert_eq!(next.spin_count, u64::MAX);
        assert_eq!(next.cumulative_payout, i64::MAX);
    }
}
