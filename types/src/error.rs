//! Validation errors for the shared types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid account address: {0}")]
    InvalidAddress(String),

    #[error("invalid token value: {0}")]
    InvalidTokenValue(String),

    #[error("invalid reward identity: {0}")]
    InvalidIdentity(String),

    #[error("invalid grade {0}: must be between 0 and 100")]
    InvalidGrade(u8),

    #[error("unknown reward status: {0}")]
    UnknownStatus(String),

    #[error("malformed status line: {0}")]
    MalformedStatusLine(String),
}
