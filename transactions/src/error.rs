use quizpay_crypto::KeyError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("token value {value} cannot be represented: {reason}")]
    UnrepresentableAmount { value: String, reason: &'static str },

    #[error("fee of {0} drops exceeds the native amount range")]
    FeeOutOfRange(u64),

    #[error("field of {0} bytes is too long to encode")]
    FieldTooLong(usize),

    #[error("invalid account {account}: {source}")]
    InvalidAccount {
        account: String,
        #[source]
        source: KeyError,
    },
}
