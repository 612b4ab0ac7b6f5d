//! SHA-2 helpers used by the ledger: SHA-512Half and the base58 checksum.

use sha2::{Digest, Sha256, Sha512};

/// Four-byte prefixes the ledger mixes into hashes and signing payloads.
pub struct HashPrefix;

impl HashPrefix {
    /// `TXN\0`: transaction id.
    pub const TRANSACTION_ID: [u8; 4] = *b"TXN\0";
    /// `STX\0`: single-signature signing payload.
    pub const TRANSACTION_SIGN: [u8; 4] = *b"STX\0";
}

/// First 32 bytes of SHA-512 over the concatenated parts.
pub fn sha512_half(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..32]);
    out
}

/// First four bytes of SHA-256(SHA-256(data)).
pub(crate) fn checksum(data: &[u8]) -> [u8; 4] {
    let once = Sha256::digest(data);
    let twice = Sha256::digest(once);
    let mut out = [0u8; 4];
    out.copy_from_slice(&twice[..4]);
    out
}
