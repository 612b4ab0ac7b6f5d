//! Abstract reward storage for the payout processor.
//!
//! Backends (LMDB, in-memory for testing) implement [`RewardStore`]. The
//! processor and the operator commands depend only on the trait.

pub mod error;
pub mod outcome;
pub mod reward;
pub mod stats;

pub use error::StoreError;
pub use outcome::AttemptOutcome;
pub use reward::{new_record, reopen, RewardStore};
pub use stats::{PayoutStats, StatusTotals};
