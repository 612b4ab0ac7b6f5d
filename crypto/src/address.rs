//! Base58 account-id codec using the ledger alphabet.
//!
//! Encoded form: base58(version `0x00` ++ 20-byte account id ++ checksum),
//! where the checksum is the first four bytes of double SHA-256.

use quizpay_types::AccountAddress;

use crate::error::KeyError;
use crate::hash::checksum;

const ACCOUNT_VERSION: u8 = 0x00;
const ACCOUNT_ID_LEN: usize = 20;

/// Raw 20-byte account identifier as used in the binary transaction format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AccountId(pub [u8; ACCOUNT_ID_LEN]);

impl AccountId {
    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LEN] {
        &self.0
    }
}

/// Decode base58 with the ledger alphabet and verify the trailing checksum.
/// Returns the payload without the checksum.
pub(crate) fn decode_checked(encoded: &str) -> Result<Vec<u8>, KeyError> {
    let raw = bs58::decode(encoded)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .into_vec()
        .map_err(|e| KeyError::Base58(e.to_string()))?;
    if raw.len() < 5 {
        return Err(KeyError::Length(raw.len()));
    }
    let (payload, check) = raw.split_at(raw.len() - 4);
    if checksum(payload) != check {
        return Err(KeyError::Checksum);
    }
    Ok(payload.to_vec())
}

/// Append the checksum and encode with the ledger alphabet.
pub(crate) fn encode_checked(payload: &[u8]) -> String {
    let mut bytes = payload.to_vec();
    bytes.extend_from_slice(&checksum(payload));
    bs58::encode(bytes)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .into_string()
}

/// Decode an `r...` address into its 20-byte account id.
pub fn decode_account_id(address: &AccountAddress) -> Result<AccountId, KeyError> {
    let payload = decode_checked(address.as_str())?;
    if payload.len() != ACCOUNT_ID_LEN + 1 {
        return Err(KeyError::Length(payload.len()));
    }
    if payload[0] != ACCOUNT_VERSION {
        return Err(KeyError::Version);
    }
    let mut id = [0u8; ACCOUNT_ID_LEN];
    id.copy_from_slice(&payload[1..]);
    Ok(AccountId(id))
}

/// Encode a 20-byte account id as an `r...` address.
pub fn encode_account_id(id: &AccountId) -> AccountAddress {
    let mut payload = Vec::with_capacity(ACCOUNT_ID_LEN + 1);
    payload.push(ACCOUNT_VERSION);
    payload.extend_from_slice(&id.0);
    // The ledger alphabet starts with 'r', so a zero version byte always
    // yields a well-formed address.
    AccountAddress::parse(encode_checked(&payload))
        .unwrap_or_else(|e| unreachable!("encoded account id is not an address: {e}"))
}
