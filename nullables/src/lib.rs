//! Nullable infrastructure for deterministic testing.
//!
//! The processor talks to its two external systems through traits
//! (`RewardStore`, `LedgerGateway`). This crate provides in-memory versions
//! that:
//! - Return scripted values
//! - Record every call for assertions
//! - Inject failures and delays on demand
//! - Never touch the filesystem or network

pub mod ledger;
pub mod store;

pub use ledger::{NullLedger, NullLedgerConnection, NullSubmit};
pub use store::NullRewardStore;
