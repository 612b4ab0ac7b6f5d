//! The result of one payout attempt, as written back to the store.

use quizpay_types::{RewardRecord, RewardStatus, StatusDetail, StatusLine, Timestamp};

/// Engine result and transaction id of one attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub engine_result: String,
    pub engine_message: Option<String>,
    pub tx_hash: Option<String>,
}

impl AttemptOutcome {
    pub fn new(engine_result: impl Into<String>, tx_hash: Option<String>) -> Self {
        Self {
            engine_result: engine_result.into(),
            engine_message: None,
            tx_hash,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.engine_message = Some(message.into());
        self
    }

    pub fn status(&self) -> RewardStatus {
        RewardStatus::from_engine_result(&self.engine_result)
    }

    /// `<engine_result>:<tx_hash>`, or the bare result when no hash exists.
    pub fn status_line(&self) -> StatusLine {
        StatusLine::attempted(self.engine_result.clone(), self.tx_hash.clone())
    }

    /// Write this outcome onto `record`.
    pub fn apply_to(&self, record: &mut RewardRecord, now: Timestamp) {
        record.status = self.status();
        record.status_detail = Some(StatusDetail {
            engine_result: self.engine_result.clone(),
            engine_message: self.engine_message.clone(),
            tx_hash: self.tx_hash.clone(),
        });
        record.processed_at = Some(now);
    }
}
