//! Reward storage trait.

use quizpay_types::{NewReward, RewardId, RewardRecord, RewardStatus, Timestamp};

use crate::{AttemptOutcome, PayoutStats, StoreError};

/// Durable reward records, keyed by identity.
///
/// Records are never deleted. Status changes only through
/// [`record_outcome`](RewardStore::record_outcome) after an attempt and
/// [`retry`](RewardStore::retry) by the operator.
pub trait RewardStore: Send + Sync {
    /// Insert a freshly earned reward as `PENDING`. Fails with
    /// [`StoreError::Duplicate`] if the identity is already stored.
    fn insert_reward(&self, reward: &NewReward) -> Result<RewardRecord, StoreError>;

    /// All records whose status is `PENDING`.
    ///
    /// Records that cannot be decoded are logged and skipped.
    fn fetch_pending(&self) -> Result<Vec<RewardRecord>, StoreError>;

    /// Persist the outcome of one attempt. Writing the same outcome twice
    /// leaves the record unchanged apart from the processed timestamp.
    fn record_outcome(
        &self,
        identity: &RewardId,
        outcome: &AttemptOutcome,
    ) -> Result<(), StoreError>;

    /// Move a `FAILED` or `SUBMITTED` record back to `PENDING`.
    fn retry(&self, identity: &RewardId) -> Result<RewardRecord, StoreError>;

    fn get(&self, identity: &RewardId) -> Result<RewardRecord, StoreError>;

    /// Every decodable record, optionally filtered by status, ordered by
    /// creation time.
    fn list(&self, status: Option<RewardStatus>) -> Result<Vec<RewardRecord>, StoreError>;

    fn stats(&self) -> Result<PayoutStats, StoreError> {
        Ok(PayoutStats::from_records(&self.list(None)?))
    }
}

/// Build the initial `PENDING` record for a new reward.
pub fn new_record(reward: &NewReward, now: Timestamp) -> Result<RewardRecord, StoreError> {
    let identity = reward
        .identity()
        .map_err(|e| StoreError::InvalidReward(e.to_string()))?;
    Ok(RewardRecord {
        identity,
        recipient: reward.recipient.clone(),
        amount: reward.amount.clone(),
        grade: reward.grade,
        quiz: reward.quiz.clone(),
        course: reward.course.clone(),
        lesson: reward.lesson.clone(),
        status: RewardStatus::Pending,
        status_detail: None,
        created_at: now,
        processed_at: None,
    })
}

/// Reset a `FAILED` or `SUBMITTED` record to `PENDING`, clearing the
/// attempt details.
///
/// The ledger is not consulted: a failed or queued transaction that later
/// applied would be paid twice.
pub fn reopen(record: &mut RewardRecord) -> Result<(), StoreError> {
    if !matches!(record.status, RewardStatus::Failed | RewardStatus::Submitted) {
        return Err(StoreError::NotRetryable {
            identity: record.identity.to_string(),
            status: record.status,
        });
    }
    record.status = RewardStatus::Pending;
    record.status_detail = None;
    record.processed_at = None;
    Ok(())
}
