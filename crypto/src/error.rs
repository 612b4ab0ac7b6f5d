use thiserror::Error;

/// Payload encryption/decryption failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("cipher key must be exactly 32 bytes, got {0}")]
    KeyLength(usize),

    #[error("ciphertext is missing the iv separator")]
    MissingSeparator,

    #[error("ciphertext is not valid hex: {0}")]
    Hex(String),

    #[error("iv must be 16 bytes, got {0}")]
    IvLength(usize),

    #[error("ciphertext length {0} is not a positive multiple of the block size")]
    CiphertextLength(usize),

    #[error("decryption failed: bad padding (wrong key or corrupted data)")]
    Padding,

    #[error("decrypted payload is not valid UTF-8")]
    NotUtf8,

    #[error("random number generator unavailable: {0}")]
    Rng(String),
}

/// Address and seed decoding failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid base58: {0}")]
    Base58(String),

    #[error("checksum mismatch")]
    Checksum,

    #[error("unexpected payload length {0}")]
    Length(usize),

    #[error("unexpected version prefix")]
    Version,

    #[error("only ed25519 family seeds (sEd...) are supported")]
    UnsupportedSeed,
}
