//! Fundamental types for the quizpay payout processor.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! reward identities, ledger addresses, token values, statuses and the
//! durable reward record itself.

pub mod address;
pub mod amount;
pub mod error;
pub mod identity;
pub mod record;
pub mod status;
pub mod time;

pub use address::AccountAddress;
pub use amount::{Drops, TokenValue};
pub use error::TypesError;
pub use identity::RewardId;
pub use record::{NewReward, RewardPayload, RewardRecord, StatusDetail};
pub use status::{RewardStatus, StatusLine};
pub use time::Timestamp;
