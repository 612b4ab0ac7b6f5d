use quizpay_types::RewardStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("reward not found: {0}")]
    NotFound(String),

    #[error("reward already exists: {0}")]
    Duplicate(String),

    #[error("reward {identity} is {status}; only FAILED or SUBMITTED rewards can be retried")]
    NotRetryable {
        identity: String,
        status: RewardStatus,
    },

    #[error("invalid reward: {0}")]
    InvalidReward(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("record is corrupted: {0}")]
    Corruption(String),
}
