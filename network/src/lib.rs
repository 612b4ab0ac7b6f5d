//! Ledger gateway for the payout processor.
//!
//! [`LedgerGateway`] / [`LedgerConnection`] are the seams the processor
//! depends on; [`XrplClient`] implements them over the ledger's JSON
//! WebSocket API (`account_info`, `ledger_current`, `submit`).

pub mod client;
pub mod error;
pub mod gateway;
pub mod protocol;

pub use client::{XrplClient, XrplClientConfig, XrplConnection};
pub use error::NetworkError;
pub use gateway::{LedgerConnection, LedgerGateway, SubmitResult};
