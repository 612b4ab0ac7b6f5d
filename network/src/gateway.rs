//! The ledger operations the payout processor depends on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use quizpay_transactions::SignedTransaction;
use quizpay_types::AccountAddress;

use crate::NetworkError;

/// Synchronous acknowledgement of a submitted transaction.
///
/// This is the node's preliminary verdict, not final validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResult {
    pub engine_result: String,
    pub engine_result_message: Option<String>,
    pub tx_hash: String,
}

/// Opens connections to a ledger node.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    type Connection: LedgerConnection + 'static;

    async fn connect(&self) -> Result<Self::Connection, NetworkError>;
}

/// One live connection. Requests may be issued concurrently.
#[async_trait]
pub trait LedgerConnection: Send + Sync {
    /// Next sequence number of `account`, from the current open ledger.
    async fn account_sequence(&self, account: &AccountAddress) -> Result<u32, NetworkError>;

    /// Index of the ledger currently being built.
    async fn current_ledger_index(&self) -> Result<u32, NetworkError>;

    async fn submit(&self, tx: &SignedTransaction) -> Result<SubmitResult, NetworkError>;

    async fn close(&self);
}
