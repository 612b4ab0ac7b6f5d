//! Payment transactions for the quizpay processor.
//!
//! - [`Payment`]: the one transaction type the processor signs
//! - [`amount`]: issued-token and native fee encodings
//! - [`codec`]: canonical binary field serialization
//! - [`sign_payment`]: signing payload, signature and transaction id

pub mod amount;
pub mod codec;
pub mod error;
pub mod payment;
pub mod sign;

pub use amount::{Currency, IssuedAmount};
pub use error::TransactionError;
pub use payment::{Memo, Payment};
pub use sign::{sign_payment, SignedTransaction};
