//! Token value and fee amounts.
//!
//! Issued-token values are kept as validated decimal strings so that the
//! exact amount the LMS recorded is what ends up in the transaction; the
//! binary codec normalizes them into mantissa/exponent form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Largest number of significant digits accepted before normalization.
const MAX_DIGITS: usize = 38;

/// A strictly positive decimal token value, e.g. `10`, `0.25`, `1.5e3`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenValue(String);

impl TokenValue {
    pub fn parse(raw: impl Into<String>) -> Result<Self, TypesError> {
        let s = raw.into().trim().to_string();
        let (mantissa, _) =
            decimal_parts(&s).ok_or_else(|| TypesError::InvalidTokenValue(s.clone()))?;
        if mantissa == 0 {
            return Err(TypesError::InvalidTokenValue(s));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into an integer mantissa and a base-10 exponent so that
    /// `value == mantissa * 10^exponent`.
    pub fn parts(&self) -> (u128, i32) {
        // Validated at construction.
        decimal_parts(&self.0).unwrap_or((0, 0))
    }

    /// Lossy numeric view, used for reporting totals.
    pub fn as_f64(&self) -> f64 {
        let (mantissa, exponent) = self.parts();
        mantissa as f64 * 10f64.powi(exponent)
    }
}

/// Parse `digits[.digits][e[+-]digits]` into `(mantissa, exponent)`.
fn decimal_parts(s: &str) -> Option<(u128, i32)> {
    let (number, exp_part) = match s.find(&['e', 'E'][..]) {
        Some(idx) => (&s[..idx], Some(&s[idx + 1..])),
        None => (s, None),
    };
    let (int_part, frac_part) = match number.split_once('.') {
        Some((i, f)) => (i, f),
        None => (number, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let mut exponent: i32 = match exp_part {
        Some(e) => {
            let digits = e.strip_prefix(&['+', '-'][..]).unwrap_or(e);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            e.parse().ok()?
        }
        None => 0,
    };
    exponent = exponent.checked_sub(i32::try_from(frac_part.len()).ok()?)?;

    let digits: String = format!("{int_part}{frac_part}")
        .trim_start_matches('0')
        .to_string();
    if digits.is_empty() {
        return Some((0, 0));
    }
    if digits.len() > MAX_DIGITS {
        return None;
    }
    let mantissa: u128 = digits.parse().ok()?;
    Some((mantissa, exponent))
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TokenValue {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TokenValue {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<TokenValue> for String {
    fn from(v: TokenValue) -> Self {
        v.0
    }
}

/// Native-currency fee in drops (1 XRP = 1,000,000 drops).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Drops(u64);

impl Drops {
    /// Upper bound for any fee this processor will sign.
    pub const FEE_CAP: Self = Self(1_000);

    pub fn new(drops: u64) -> Self {
        Self(drops)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// The configured fee, never above [`Drops::FEE_CAP`].
    pub fn capped(self) -> Self {
        self.min(Self::FEE_CAP)
    }
}

impl fmt::Display for Drops {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} drops", self.0)
    }
}
