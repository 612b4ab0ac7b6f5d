//! The Payment transaction the processor signs for each reward.

use serde::{Deserialize, Serialize};

use quizpay_crypto::{decode_account_id, AccountId};
use quizpay_types::{AccountAddress, Drops};

use crate::amount::{encode_drops, encode_issued_value, IssuedAmount};
use crate::codec::{BinarySerializer, FieldCode, PAYMENT_TYPE};
use crate::error::TransactionError;

/// A single text memo, carried as UTF-8 `MemoData`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
    pub data: String,
}

impl Memo {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }
}

/// A token payment from the payer to one learner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub account: AccountAddress,
    pub destination: AccountAddress,
    pub amount: IssuedAmount,
    pub fee: Drops,
    pub sequence: u32,
    pub last_ledger_sequence: u32,
    pub memos: Vec<Memo>,
}

impl Payment {
    /// Canonical binary form.
    ///
    /// `signing_pub_key` is always present on a signed transaction;
    /// `signature` is omitted when producing the signing payload.
    pub fn serialize(
        &self,
        signing_pub_key: &[u8],
        signature: Option<&[u8]>,
    ) -> Result<Vec<u8>, TransactionError> {
        let account = account_id(&self.account)?;
        let destination = account_id(&self.destination)?;
        let issuer = account_id(&self.amount.issuer)?;

        let mut amount = Vec::with_capacity(48);
        amount.extend_from_slice(&encode_issued_value(&self.amount.value)?);
        amount.extend_from_slice(&self.amount.currency.to_bytes());
        amount.extend_from_slice(issuer.as_bytes());

        let mut s = BinarySerializer::new();
        s.u16(FieldCode::TRANSACTION_TYPE, PAYMENT_TYPE)
            .u32(FieldCode::SEQUENCE, self.sequence)
            .u32(FieldCode::LAST_LEDGER_SEQUENCE, self.last_ledger_sequence)
            .raw(FieldCode::AMOUNT, &amount)
            .raw(FieldCode::FEE, &encode_drops(self.fee)?);
        s.vl(FieldCode::SIGNING_PUB_KEY, signing_pub_key)?;
        if let Some(signature) = signature {
            s.vl(FieldCode::TXN_SIGNATURE, signature)?;
        }
        s.vl(FieldCode::ACCOUNT, account.as_bytes())?;
        s.vl(FieldCode::DESTINATION, destination.as_bytes())?;

        if !self.memos.is_empty() {
            s.field(FieldCode::MEMOS);
            for memo in &self.memos {
                s.field(FieldCode::MEMO);
                s.vl(FieldCode::MEMO_DATA, memo.data.as_bytes())?;
                s.field(FieldCode::OBJECT_END);
            }
            s.field(FieldCode::ARRAY_END);
        }

        Ok(s.into_bytes())
    }
}

fn account_id(address: &AccountAddress) -> Result<AccountId, TransactionError> {
    decode_account_id(address).map_err(|source| TransactionError::InvalidAccount {
        account: address.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Currency;
    use quizpay_types::TokenValue;

    const GENESIS: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
    const GENESIS_ID: &str = "B5F762798A53D543A014CAF8B297CFF8F2F937E8";
    const ZERO: &str = "rrrrrrrrrrrrrrrrrrrrrhoLvTp";

    fn payment(memos: Vec<Memo>) -> Payment {
        Payment {
            account: AccountAddress::parse(GENESIS).unwrap(),
            destination: AccountAddress::parse(ZERO).unwrap(),
            amount: IssuedAmount {
                currency: Currency::parse("EDU").unwrap(),
                issuer: AccountAddress::parse(GENESIS).unwrap(),
                value: TokenValue::parse("1").unwrap(),
            },
            fee: Drops::new(12),
            sequence: 5,
            last_ledger_sequence: 110,
            memos,
        }
    }

    #[test]
    fn payment_layout() {
        let key = [0xEDu8; 33];
        let bytes = payment(vec![]).serialize(&key, None).unwrap();
        let hex = hex::encode_upper(&bytes);

        let currency = format!("{}{}{}", "00".repeat(12), hex::encode_upper("EDU"), "00".repeat(5));
        let expected = [
            "120000".to_string(),
            "2400000005".into(),
            "201B0000006E".into(),
            format!("61D4838D7EA4C68000{currency}{GENESIS_ID}"),
            "68400000000000000C".into(),
            format!("7321{}", "ED".repeat(33)),
            format!("8114{GENESIS_ID}"),
            format!("8314{}", "00".repeat(20)),
        ]
        .concat();
        assert_eq!(hex, expected);
    }

    #[test]
    fn memos_are_wrapped_in_array() {
        let key = [0xEDu8; 33];
        let bare = payment(vec![]).serialize(&key, None).unwrap();
        let with_memo = payment(vec![Memo::new("Quiz ID: 5")]).serialize(&key, None).unwrap();

        let tail = &with_memo[bare.len()..];
        let mut expected = vec![0xF9, 0xEA, 0x7D, 10];
        expected.extend_from_slice(b"Quiz ID: 5");
        expected.extend_from_slice(&[0xE1, 0xF1]);
        assert_eq!(tail, expected.as_slice());
    }

    #[test]
    fn signature_goes_between_key_and_account() {
        let key = [0xEDu8; 33];
        let sig = [0xABu8; 64];
        let unsigned = payment(vec![]).serialize(&key, None).unwrap();
        let signed = payment(vec![]).serialize(&key, Some(&sig)).unwrap();
        assert_eq!(signed.len(), unsigned.len() + 2 + 64);

        let hex = hex::encode_upper(&signed);
        let at = hex.find(&format!("7440{}", "AB".repeat(64))).unwrap();
        assert!(at > hex.find("7321").unwrap());
        assert!(at < hex.find(&format!("8114{GENESIS_ID}")).unwrap());
    }

    #[test]
    fn bad_destination_checksum_is_reported() {
        let mut p = payment(vec![]);
        p.destination = AccountAddress::parse("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTi").unwrap();
        let err = p.serialize(&[0xED; 33], None).unwrap_err();
        assert!(matches!(err, TransactionError::InvalidAccount { .. }));
    }
}
