//! Aggregate payout statistics.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use quizpay_types::{RewardRecord, RewardStatus};

/// Count and summed token value of the records in one status.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StatusTotals {
    pub count: usize,
    pub amount: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PayoutStats {
    pub total: usize,
    pub by_status: BTreeMap<RewardStatus, StatusTotals>,
    /// Distinct recipients with at least one `SUCCESS` reward.
    pub learners_paid: usize,
    pub tokens_paid: f64,
    /// Mean grade over `SUCCESS` rewards; `None` when nothing was paid.
    pub average_grade: Option<f64>,
}

impl PayoutStats {
    pub fn from_records(records: &[RewardRecord]) -> Self {
        let mut stats = Self {
            total: records.len(),
            ..Self::default()
        };
        for status in RewardStatus::ALL {
            stats.by_status.insert(status, StatusTotals::default());
        }

        let mut learners = HashSet::new();
        let mut grade_sum = 0u64;
        let mut paid = 0usize;

        for record in records {
            let totals = stats.by_status.entry(record.status).or_default();
            totals.count += 1;
            totals.amount += record.amount.as_f64();

            if record.status == RewardStatus::Success {
                learners.insert(record.recipient.clone());
                stats.tokens_paid += record.amount.as_f64();
                grade_sum += u64::from(record.grade);
                paid += 1;
            }
        }

        stats.learners_paid = learners.len();
        if paid > 0 {
            stats.average_grade = Some(grade_sum as f64 / paid as f64);
        }
        stats
    }

    pub fn count(&self, status: RewardStatus) -> usize {
        self.by_status.get(&status).map_or(0, |t| t.count)
    }
}
