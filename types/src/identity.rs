//! Reward identity - the deduplication key for a reward event.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{AccountAddress, TypesError};

/// Unique key of one reward event.
///
/// Rewards created by the LMS are keyed `<recipient>_<quiz>`, so a learner
/// can be paid at most once per quiz. Arbitrary identities are accepted for
/// other sources as long as they are non-empty and contain no whitespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RewardId(String);

impl RewardId {
    pub fn new(raw: impl Into<String>) -> Result<Self, TypesError> {
        let s = raw.into();
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            return Err(TypesError::InvalidIdentity(s));
        }
        Ok(Self(s))
    }

    /// Identity of the reward for `recipient` passing `quiz`.
    pub fn for_quiz(recipient: &AccountAddress, quiz: &str) -> Result<Self, TypesError> {
        Self::new(format!("{}_{}", recipient, quiz))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RewardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RewardId {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RewardId> for String {
    fn from(id: RewardId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_identity_joins_recipient_and_quiz() {
        let addr = AccountAddress::parse("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh").unwrap();
        let id = RewardId::for_quiz(&addr, "42").unwrap();
        assert_eq!(id.as_str(), "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh_42");
    }

    #[test]
    fn empty_or_spaced_identity_rejected() {
        assert!(RewardId::new("").is_err());
        assert!(RewardId::new("u1 q5").is_err());
        assert!(RewardId::new("u1_q5").is_ok());
    }
}
