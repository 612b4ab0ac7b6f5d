//! Ledger amount encodings.
//!
//! Native fees are 64-bit words with the "positive native" bit set. Issued
//! token amounts are 48 bytes: an 8-byte value word followed by the 20-byte
//! currency code and the 20-byte issuer account id.

use serde::{Deserialize, Serialize};
use std::fmt;

use quizpay_types::{AccountAddress, Drops, TokenValue};

use crate::error::TransactionError;

const NOT_NATIVE_BIT: u64 = 1 << 63;
const POSITIVE_BIT: u64 = 1 << 62;

const MIN_MANTISSA: u128 = 1_000_000_000_000_000;
const MAX_MANTISSA: u128 = 9_999_999_999_999_999;
const MIN_EXPONENT: i32 = -96;
const MAX_EXPONENT: i32 = 80;
const EXPONENT_BIAS: i32 = 97;

/// Largest drop count the native amount word can carry.
const MAX_DROPS: u64 = (1 << 62) - 1;

/// Three-letter or 160-bit issued currency code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency {
    code: String,
    bytes: [u8; 20],
}

impl Currency {
    pub fn parse(code: impl Into<String>) -> Result<Self, TransactionError> {
        let code = code.into();
        let bytes =
            currency_bytes(&code).ok_or_else(|| TransactionError::InvalidCurrency(code.clone()))?;
        Ok(Self { code, bytes })
    }

    pub fn as_str(&self) -> &str {
        &self.code
    }

    pub fn to_bytes(&self) -> [u8; 20] {
        self.bytes
    }
}

fn currency_bytes(code: &str) -> Option<[u8; 20]> {
    let mut out = [0u8; 20];
    if code.len() == 3 {
        if code.eq_ignore_ascii_case("XRP") || !code.bytes().all(|b| b.is_ascii_graphic()) {
            return None;
        }
        out[12..15].copy_from_slice(code.as_bytes());
        return Some(out);
    }
    if code.len() == 40 {
        let raw = hex::decode(code).ok()?;
        // A zero first byte marks the standard (three-letter) layout.
        if raw[0] == 0 {
            return None;
        }
        out.copy_from_slice(&raw);
        return Some(out);
    }
    None
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

impl TryFrom<String> for Currency {
    type Error = TransactionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<Currency> for String {
    fn from(c: Currency) -> Self {
        c.code
    }
}

/// An issued token amount: `{currency, issuer, value}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedAmount {
    pub currency: Currency,
    pub issuer: AccountAddress,
    pub value: TokenValue,
}

/// Encode the 8-byte value word of an issued amount.
///
/// The decimal value is normalized to a 16-digit mantissa. Values that need
/// more than 16 significant digits, or whose exponent falls outside the
/// ledger's range, are rejected instead of rounded.
pub fn encode_issued_value(value: &TokenValue) -> Result<[u8; 8], TransactionError> {
    let unrepresentable = |reason| TransactionError::UnrepresentableAmount {
        value: value.to_string(),
        reason,
    };

    let (mut mantissa, mut exponent) = value.parts();
    if mantissa == 0 {
        return Err(unrepresentable("value is zero"));
    }
    while mantissa < MIN_MANTISSA {
        mantissa *= 10;
        exponent = exponent
            .checked_sub(1)
            .ok_or_else(|| unrepresentable("exponent too small"))?;
    }
    while mantissa > MAX_MANTISSA {
        if mantissa % 10 != 0 {
            return Err(unrepresentable("more than 16 significant digits"));
        }
        mantissa /= 10;
        exponent = exponent
            .checked_add(1)
            .ok_or_else(|| unrepresentable("exponent too large"))?;
    }
    if exponent > MAX_EXPONENT {
        return Err(unrepresentable("exponent too large"));
    }
    if exponent < MIN_EXPONENT {
        return Err(unrepresentable("exponent too small"));
    }

    let word = NOT_NATIVE_BIT
        | POSITIVE_BIT
        | ((exponent + EXPONENT_BIAS) as u64) << 54
        | mantissa as u64;
    Ok(word.to_be_bytes())
}

/// Encode a native fee in drops.
pub fn encode_drops(drops: Drops) -> Result<[u8; 8], TransactionError> {
    if drops.get() > MAX_DROPS {
        return Err(TransactionError::FeeOutOfRange(drops.get()));
    }
    Ok((POSITIVE_BIT | drops.get()).to_be_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(s: &str) -> TokenValue {
        TokenValue::parse(s).unwrap()
    }

    fn word(s: &str) -> String {
        hex::encode_upper(encode_issued_value(&value(s)).unwrap())
    }

    #[test]
    fn one_token() {
        assert_eq!(word("1"), "D4838D7EA4C68000");
    }

    #[test]
    fn equal_values_encode_equally() {
        assert_eq!(word("10"), word("1e1"));
        assert_eq!(word("10"), word("10.000"));
        assert_eq!(word("0.5"), word("5e-1"));
    }

    #[test]
    fn larger_values_sort_higher() {
        let a = u64::from_be_bytes(encode_issued_value(&value("2.5")).unwrap());
        let b = u64::from_be_bytes(encode_issued_value(&value("25")).unwrap());
        assert!(b > a);
    }

    #[test]
    fn sixteen_digits_fit_seventeen_do_not() {
        assert!(encode_issued_value(&value("1234567890123456")).is_ok());
        assert!(encode_issued_value(&value("12345678901234560")).is_ok());
        assert!(matches!(
            encode_issued_value(&value("12345678901234567")),
            Err(TransactionError::UnrepresentableAmount { .. })
        ));
    }

    #[test]
    fn exponent_range_enforced() {
        assert!(encode_issued_value(&value("1e95")).is_ok());
        assert!(encode_issued_value(&value("1e96")).is_err());
        assert!(encode_issued_value(&value("1e-81")).is_ok());
        assert!(encode_issued_value(&value("1e-82")).is_err());
    }

    #[test]
    fn extreme_exponents_are_errors_not_overflows() {
        for s in ["1e-2147483648", "10000000000000000000e2147483647", "1e2147483647"] {
            assert!(
                matches!(
                    encode_issued_value(&value(s)),
                    Err(TransactionError::UnrepresentableAmount { .. })
                ),
                "{s}"
            );
        }
    }

    #[test]
    fn fee_drops() {
        assert_eq!(
            hex::encode_upper(encode_drops(Drops::new(12)).unwrap()),
            "400000000000000C"
        );
        assert!(encode_drops(Drops::new(u64::MAX)).is_err());
    }

    #[test]
    fn three_letter_currency_layout() {
        let usd = Currency::parse("USD").unwrap();
        let bytes = usd.to_bytes();
        assert_eq!(&bytes[12..15], b"USD");
        assert!(bytes[..12].iter().chain(&bytes[15..]).all(|b| *b == 0));
    }

    #[test]
    fn hex_currency_is_raw() {
        let code = "5155495A00000000000000000000000000000000";
        let currency = Currency::parse(code).unwrap();
        assert_eq!(hex::encode_upper(currency.to_bytes()), code);
    }

    #[test]
    fn bad_currencies_rejected() {
        let zeros = "0".repeat(40);
        let not_hex = "Z".repeat(40);
        for bad in ["XRP", "xrp", "US", "USDT", "U D", "", zeros.as_str(), not_hex.as_str()] {
            assert!(Currency::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
