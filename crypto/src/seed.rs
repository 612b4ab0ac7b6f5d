//! Payer keys derived from an `sEd...` family seed.
//!
//! An ed25519 family seed is base58(`01 E1 4B` ++ 16 bytes entropy ++ checksum).
//! The signing secret is SHA-512Half(entropy); the public key is reported to
//! the ledger with a leading `0xED` marker byte.

use ed25519_dalek::{Signer, SigningKey};
use zeroize::Zeroizing;

use crate::address::{decode_checked, encode_checked};
use crate::error::KeyError;
use crate::hash::sha512_half;

const ED25519_SEED_PREFIX: [u8; 3] = [0x01, 0xE1, 0x4B];
const SECP256K1_SEED_VERSION: u8 = 0x21;
const ENTROPY_LEN: usize = 16;

/// Marker byte prepended to ed25519 public keys on the ledger.
pub const ED25519_KEY_MARKER: u8 = 0xED;

/// Decode an ed25519 family seed into its 16 bytes of entropy.
pub fn decode_family_seed(seed: &str) -> Result<Zeroizing<[u8; ENTROPY_LEN]>, KeyError> {
    let payload = Zeroizing::new(decode_checked(seed.trim())?);
    if payload.len() == ENTROPY_LEN + 1 && payload[0] == SECP256K1_SEED_VERSION {
        return Err(KeyError::UnsupportedSeed);
    }
    if payload.len() != ED25519_SEED_PREFIX.len() + ENTROPY_LEN {
        return Err(KeyError::Length(payload.len()));
    }
    if payload[..3] != ED25519_SEED_PREFIX {
        return Err(KeyError::Version);
    }
    let mut entropy = Zeroizing::new([0u8; ENTROPY_LEN]);
    entropy.copy_from_slice(&payload[3..]);
    Ok(entropy)
}

/// Encode 16 bytes of entropy as an ed25519 family seed.
pub fn encode_family_seed(entropy: &[u8; ENTROPY_LEN]) -> String {
    let mut payload = Zeroizing::new(Vec::with_capacity(ED25519_SEED_PREFIX.len() + ENTROPY_LEN));
    payload.extend_from_slice(&ED25519_SEED_PREFIX);
    payload.extend_from_slice(entropy);
    encode_checked(&payload)
}

/// The payer's signing key.
pub struct PayerKeys {
    signing_key: SigningKey,
}

impl PayerKeys {
    pub fn from_family_seed(seed: &str) -> Result<Self, KeyError> {
        let entropy = decode_family_seed(seed)?;
        Ok(Self::from_entropy(&entropy))
    }

    pub fn from_entropy(entropy: &[u8; ENTROPY_LEN]) -> Self {
        let secret = Zeroizing::new(sha512_half(&[entropy.as_slice()]));
        Self {
            signing_key: SigningKey::from_bytes(&secret),
        }
    }

    /// 33-byte public key as the ledger expects it in `SigningPubKey`.
    pub fn public_key(&self) -> [u8; 33] {
        let mut out = [0u8; 33];
        out[0] = ED25519_KEY_MARKER;
        out[1..].copy_from_slice(self.signing_key.verifying_key().as_bytes());
        out
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl std::fmt::Debug for PayerKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PayerKeys({})", hex::encode_upper(self.public_key()))
    }
}
