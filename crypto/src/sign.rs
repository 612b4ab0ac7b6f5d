//! Ed25519 signature verification for ledger-style public keys.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::seed::ED25519_KEY_MARKER;

/// Verify `signature` over `message` for a 33-byte `0xED`-prefixed key.
///
/// Returns `false` for keys of any other shape.
pub fn verify_signature(message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
    let Some((&ED25519_KEY_MARKER, raw_key)) = public_key.split_first() else {
        return false;
    };
    let Ok(raw_key) = <[u8; 32]>::try_from(raw_key) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&raw_key) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };
    verifying_key.verify(message, &signature).is_ok()
}
