//! Reward status: the flat filter field and the composite status line.
//!
//! Every stored reward carries two parallel views of its state:
//! - [`RewardStatus`], a small enum used for fast filtering (`PENDING`, ...).
//! - [`StatusLine`], the composite string shared with the LMS side:
//!   `payPENDING` while queued, `<engine_result>:<tx_hash>` after an attempt.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Engine result the ledger returns for an applied transaction.
pub const ENGINE_SUCCESS: &str = "tesSUCCESS";

/// Engine result for a transaction held in the open-ledger queue.
pub const ENGINE_QUEUED: &str = "terQUEUED";

/// Status line of a reward waiting to be paid.
pub const PENDING_LINE: &str = "payPENDING";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardStatus {
    /// Waiting for the processor to pick it up.
    Pending,
    /// Accepted provisionally (queued by the ledger); not final.
    Submitted,
    /// Applied on the ledger.
    Success,
    /// Rejected or never reached the ledger; eligible for operator retry.
    Failed,
}

impl RewardStatus {
    pub const ALL: [RewardStatus; 4] = [
        RewardStatus::Pending,
        RewardStatus::Submitted,
        RewardStatus::Success,
        RewardStatus::Failed,
    ];

    /// Classify a ledger engine result code.
    pub fn from_engine_result(code: &str) -> Self {
        match code {
            ENGINE_SUCCESS => Self::Success,
            ENGINE_QUEUED => Self::Submitted,
            _ => Self::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Submitted => "SUBMITTED",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for RewardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RewardStatus {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| TypesError::UnknownStatus(s.to_string()))
    }
}

/// Composite status string stored next to the flat status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusLine {
    Pending,
    Attempted {
        engine_result: String,
        tx_hash: Option<String>,
    },
}

impl StatusLine {
    pub fn attempted(engine_result: impl Into<String>, tx_hash: Option<String>) -> Self {
        Self::Attempted {
            engine_result: engine_result.into(),
            tx_hash,
        }
    }

    /// The flat status this line implies.
    pub fn status(&self) -> RewardStatus {
        match self {
            Self::Pending => RewardStatus::Pending,
            Self::Attempted { engine_result, .. } => RewardStatus::from_engine_result(engine_result),
        }
    }

    pub fn engine_result(&self) -> Option<&str> {
        match self {
            Self::Pending => None,
            Self::Attempted { engine_result, .. } => Some(engine_result),
        }
    }

    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            Self::Pending => None,
            Self::Attempted { tx_hash, .. } => tx_hash.as_deref(),
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str(PENDING_LINE),
            Self::Attempted {
                engine_result,
                tx_hash: Some(hash),
            } => write!(f, "{engine_result}:{hash}"),
            Self::Attempted {
                engine_result,
                tx_hash: None,
            } => f.write_str(engine_result),
        }
    }
}

impl FromStr for StatusLine {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == PENDING_LINE {
            return Ok(Self::Pending);
        }
        let (code, hash) = match s.split_once(':') {
            Some((code, hash)) => (code, Some(hash)),
            None => (s, None),
        };
        let code_ok = !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        let hash_ok = hash.map_or(true, |h| !h.is_empty() && h.chars().all(|c| c.is_ascii_hexdigit()));
        if !code_ok || !hash_ok {
            return Err(TypesError::MalformedStatusLine(s.to_string()));
        }
        Ok(Self::attempted(code, hash.map(str::to_string)))
    }
}
