//! LMDB storage backend for the payout processor.
//!
//! Implements [`quizpay_store::RewardStore`] using the `heed` LMDB bindings.
//! Rewards live in one `rewards` database keyed by identity; each value is a
//! bincode [`StoredReward`] whose learner payload is encrypted at rest.

pub mod environment;
pub mod error;
pub mod record;
pub mod reward;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use record::StoredReward;
pub use reward::LmdbRewardStore;
