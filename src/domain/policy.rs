use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Thresholds the lending rules are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingPolicy {
    /// Simultaneous active borrowings allowed per member.
    pub max_active_borrowings: usize,
    /// Whole days a loan may last before its return counts as late.
    pub loan_period_days: i64,
    /// Days a member is barred from borrowing after a late return.
    pub penalty_days: i64,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self {
            max_active_borrowings: 2,
            loan_period_days: 7,
            penalty_days: 3,
        }
    }
}

impl LendingPolicy {
    /// Saturates instead of panicking on out-of-range day counts.
    pub fn penalty_window(&self) -> Duration {
        Duration::try_days(self.penalty_days).unwrap_or(Duration::MAX)
    }
}
