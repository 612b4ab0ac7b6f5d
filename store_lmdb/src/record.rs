//! On-disk layout of a reward.

use serde::{Deserialize, Serialize};

use quizpay_crypto::{decrypt, encrypt, CipherKey};
use quizpay_types::{
    RewardId, RewardPayload, RewardRecord, RewardStatus, StatusDetail, StatusLine, Timestamp,
};

use crate::LmdbError;

/// A reward as stored in the `rewards` database.
///
/// Filterable fields are kept in the clear; the learner details travel in
/// `payload`, encrypted JSON matching [`RewardPayload`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredReward {
    pub identity: String,
    pub status: RewardStatus,
    /// `payPENDING` or `<engine_result>:<tx_hash>`.
    pub status_line: String,
    pub engine_message: Option<String>,
    pub grade: u8,
    pub payload: String,
    pub created_at: u64,
    pub processed_at: Option<u64>,
}

impl StoredReward {
    /// Seal `record` for storage.
    pub fn seal(record: &RewardRecord, key: &CipherKey) -> Result<Self, LmdbError> {
        let status_line = record.status_line().to_string();
        let payload = RewardPayload {
            course: record.course.clone(),
            lesson: record.lesson.clone(),
            quiz: record.quiz.clone(),
            account: record.recipient.clone(),
            amount: record.amount.clone(),
            status: status_line.clone(),
        };
        let json = serde_json::to_string(&payload).map_err(|e| LmdbError::Payload(e.to_string()))?;

        Ok(Self {
            identity: record.identity.to_string(),
            status: record.status,
            status_line,
            engine_message: record
                .status_detail
                .as_ref()
                .and_then(|d| d.engine_message.clone()),
            grade: record.grade,
            payload: encrypt(&json, key)?,
            created_at: record.created_at.as_secs(),
            processed_at: record.processed_at.map(|t| t.as_secs()),
        })
    }

    /// Decrypt and rebuild the full record.
    pub fn open(&self, key: &CipherKey) -> Result<RewardRecord, LmdbError> {
        let json = decrypt(&self.payload, key)?;
        let payload: RewardPayload =
            serde_json::from_str(&json).map_err(|e| LmdbError::Payload(e.to_string()))?;
        let identity =
            RewardId::new(self.identity.clone()).map_err(|e| LmdbError::Payload(e.to_string()))?;
        let line: StatusLine = self
            .status_line
            .parse()
            .map_err(|e: quizpay_types::TypesError| LmdbError::Payload(e.to_string()))?;

        let status_detail = match line {
            StatusLine::Pending => None,
            StatusLine::Attempted {
                engine_result,
                tx_hash,
            } => Some(StatusDetail {
                engine_result,
                engine_message: self.engine_message.clone(),
                tx_hash,
            }),
        };

        Ok(RewardRecord {
            identity,
            recipient: payload.account,
            amount: payload.amount,
            grade: self.grade,
            quiz: payload.quiz,
            course: payload.course,
            lesson: payload.lesson,
            status: self.status,
            status_detail,
            created_at: Timestamp::new(self.created_at),
            processed_at: self.processed_at.map(Timestamp::new),
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, LmdbError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LmdbError> {
        Ok(bincode::deserialize(bytes)?)
    }
}
