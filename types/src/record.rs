//! The durable reward record and the encrypted payload it carries.

use serde::{Deserialize, Serialize};

use crate::{AccountAddress, RewardId, RewardStatus, StatusLine, Timestamp, TokenValue, TypesError};

/// A reward as seen by the payout processor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRecord {
    pub identity: RewardId,
    pub recipient: AccountAddress,
    pub amount: TokenValue,
    /// Quiz grade in percent.
    pub grade: u8,
    pub quiz: String,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub lesson: String,
    pub status: RewardStatus,
    pub status_detail: Option<StatusDetail>,
    pub created_at: Timestamp,
    pub processed_at: Option<Timestamp>,
}

impl RewardRecord {
    /// The composite status line for this record.
    pub fn status_line(&self) -> StatusLine {
        match &self.status_detail {
            Some(detail) if self.status != RewardStatus::Pending => {
                StatusLine::attempted(detail.engine_result.clone(), detail.tx_hash.clone())
            }
            _ => StatusLine::Pending,
        }
    }

    /// Short human summary, e.g. `FAILED:tecPATH_DRY` or `PENDING`.
    pub fn summary(&self) -> String {
        match &self.status_detail {
            Some(detail) if self.status != RewardStatus::Pending => {
                format!("{}:{}", self.status, detail.engine_result)
            }
            _ => self.status.to_string(),
        }
    }
}

/// Ledger outcome details kept on an attempted record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDetail {
    pub engine_result: String,
    pub engine_message: Option<String>,
    pub tx_hash: Option<String>,
}

/// Encrypted-at-rest payload, shared in shape with the LMS side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPayload {
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub lesson: String,
    #[serde(deserialize_with = "de_quiz")]
    pub quiz: String,
    pub account: AccountAddress,
    #[serde(deserialize_with = "de_amount")]
    pub amount: TokenValue,
    /// Status line mirror, e.g. `payPENDING`.
    pub status: String,
}

/// A reward about to be inserted by the LMS integration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewReward {
    pub recipient: AccountAddress,
    pub quiz: String,
    pub amount: TokenValue,
    pub grade: u8,
    pub course: String,
    pub lesson: String,
}

impl NewReward {
    pub fn new(
        recipient: AccountAddress,
        quiz: impl Into<String>,
        amount: TokenValue,
        grade: u8,
    ) -> Result<Self, TypesError> {
        if grade > 100 {
            return Err(TypesError::InvalidGrade(grade));
        }
        Ok(Self {
            recipient,
            quiz: quiz.into(),
            amount,
            grade,
            course: String::new(),
            lesson: String::new(),
        })
    }

    pub fn with_context(mut self, course: impl Into<String>, lesson: impl Into<String>) -> Self {
        self.course = course.into();
        self.lesson = lesson.into();
        self
    }

    pub fn identity(&self) -> Result<RewardId, TypesError> {
        RewardId::for_quiz(&self.recipient, &self.quiz)
    }

    /// The payload to encrypt for a freshly queued reward.
    pub fn payload(&self) -> RewardPayload {
        RewardPayload {
            course: self.course.clone(),
            lesson: self.lesson.clone(),
            quiz: self.quiz.clone(),
            account: self.recipient.clone(),
            amount: self.amount.clone(),
            status: StatusLine::Pending.to_string(),
        }
    }
}

// The LMS writes quiz ids and amounts as JSON numbers; newer writers use strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Int(u64),
    Float(f64),
    Text(String),
}

impl NumberOrText {
    fn into_text(self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s,
        }
    }
}

fn de_quiz<'de, D: serde::Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(NumberOrText::deserialize(d)?.into_text())
}

fn de_amount<'de, D: serde::Deserializer<'de>>(d: D) -> Result<TokenValue, D::Error> {
    let text = NumberOrText::deserialize(d)?.into_text();
    TokenValue::parse(text).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";

    #[test]
    fn payload_accepts_numeric_fields_from_lms() {
        let json = format!(
            r#"{{"course":"Intro","lesson":"L1","quiz":5,"account":"{ADDR}","amount":10,"status":"payPENDING"}}"#
        );
        let payload: RewardPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(payload.quiz, "5");
        assert_eq!(payload.amount.as_str(), "10");
        assert_eq!(payload.status, "payPENDING");
    }

    #[test]
    fn payload_accepts_fractional_amount() {
        let json = format!(r#"{{"quiz":"q5","account":"{ADDR}","amount":2.5,"status":"payPENDING"}}"#);
        let payload: RewardPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(payload.amount.parts(), (25, -1));
        assert_eq!(payload.course, "");
    }

    #[test]
    fn payload_rejects_zero_amount() {
        let json = format!(r#"{{"quiz":"q5","account":"{ADDR}","amount":0,"status":"payPENDING"}}"#);
        assert!(serde_json::from_str::<RewardPayload>(&json).is_err());
    }

    #[test]
    fn new_reward_rejects_grade_above_100() {
        let addr = AccountAddress::parse(ADDR).unwrap();
        let amount = TokenValue::parse("1").unwrap();
        assert!(NewReward::new(addr.clone(), "q1", amount.clone(), 101).is_err());
        let reward = NewReward::new(addr, "q1", amount, 100).unwrap();
        assert_eq!(reward.identity().unwrap().as_str(), format!("{ADDR}_q1"));
        assert_eq!(reward.payload().status, "payPENDING");
    }

    #[test]
    fn summary_includes_engine_result_after_attempt() {
        let mut record = RewardRecord {
            identity: RewardId::new("u1_q5").unwrap(),
            recipient: AccountAddress::parse(ADDR).unwrap(),
            amount: TokenValue::parse("10").unwrap(),
            grade: 90,
            quiz: "q5".into(),
            course: String::new(),
            lesson: String::new(),
            status: RewardStatus::Pending,
            status_detail: None,
            created_at: Timestamp::new(1),
            processed_at: None,
        };
        assert_eq!(record.summary(), "PENDING");
        assert_eq!(record.status_line(), StatusLine::Pending);

        record.status = RewardStatus::Failed;
        record.status_detail = Some(StatusDetail {
            engine_result: "tecPATH_DRY".into(),
            engine_message: None,
            tx_hash: Some("AB12".into()),
        });
        assert_eq!(record.summary(), "FAILED:tecPATH_DRY");
        assert_eq!(record.status_line().to_string(), "tecPATH_DRY:AB12");
    }
}
