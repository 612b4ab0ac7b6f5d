//! Payload cipher for reward records at rest.
//!
//! AES-256-CBC with PKCS#7 padding and a fresh random IV per message. The
//! wire form is `hex(iv):hex(ciphertext)`, which is what the LMS side writes,
//! so records round-trip between both sides with the same 32-byte key.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CipherError;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;

/// The 32-byte symmetric key, wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CipherKey([u8; KEY_LEN]);

impl CipherKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a key from the raw bytes of a configured secret string.
    pub fn from_secret(secret: &str) -> Result<Self, CipherError> {
        let bytes = secret.as_bytes();
        let key: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| CipherError::KeyLength(bytes.len()))?;
        Ok(Self(key))
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CipherKey(..)")
    }
}

/// Encrypt `plaintext`, returning `hex(iv):hex(ciphertext)`.
pub fn encrypt(plaintext: &str, key: &CipherKey) -> Result<String, CipherError> {
    let mut iv = [0u8; IV_LEN];
    getrandom::getrandom(&mut iv).map_err(|e| CipherError::Rng(e.to_string()))?;

    let ciphertext = Aes256CbcEnc::new(&key.0.into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    Ok(format!("{}:{}", hex::encode(iv), hex::encode(ciphertext)))
}

/// Decrypt a `hex(iv):hex(ciphertext)` string.
pub fn decrypt(encoded: &str, key: &CipherKey) -> Result<String, CipherError> {
    let (iv_hex, body_hex) = encoded
        .split_once(':')
        .ok_or(CipherError::MissingSeparator)?;

    let iv = hex::decode(iv_hex).map_err(|e| CipherError::Hex(e.to_string()))?;
    let iv: [u8; IV_LEN] = iv
        .as_slice()
        .try_into()
        .map_err(|_| CipherError::IvLength(iv.len()))?;

    let body = hex::decode(body_hex).map_err(|e| CipherError::Hex(e.to_string()))?;
    if body.is_empty() || body.len() % BLOCK_LEN != 0 {
        return Err(CipherError::CiphertextLength(body.len()));
    }

    let plaintext = Aes256CbcDec::new(&key.0.into(), &iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&body)
        .map_err(|_| CipherError::Padding)?;

    String::from_utf8(plaintext).map_err(|_| CipherError::NotUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> CipherKey {
        CipherKey::from_secret("lbwyBzfgzUIvXZFShJuikaWvLJhIVq36").unwrap()
    }

    const PAYLOAD: &str = r#"{"course":"Intro","lesson":"L1","quiz":5,"account":"rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh","amount":10,"status":"payPENDING"}"#;

    #[test]
    fn roundtrip() {
        let encrypted = encrypt(PAYLOAD, &key()).unwrap();
        assert_eq!(decrypt(&encrypted, &key()).unwrap(), PAYLOAD);
    }

    #[test]
    fn wire_format_is_hex_iv_colon_hex_body() {
        let encrypted = encrypt("hello", &key()).unwrap();
        let (iv, body) = encrypted.split_once(':').unwrap();
        assert_eq!(iv.len(), IV_LEN * 2);
        // "hello" pads to one block.
        assert_eq!(body.len(), BLOCK_LEN * 2);
        assert!(encrypted.chars().all(|c| c == ':' || c.is_ascii_hexdigit()));
    }

    #[test]
    fn fresh_iv_per_message() {
        let a = encrypt(PAYLOAD, &key()).unwrap();
        let b = encrypt(PAYLOAD, &key()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let encrypted = encrypt("", &key()).unwrap();
        assert_eq!(decrypt(&encrypted, &key()).unwrap(), "");
    }

    #[test]
    fn wrong_key_fails() {
        let encrypted = encrypt(PAYLOAD, &key()).unwrap();
        let other = CipherKey::new([7u8; 32]);
        assert!(decrypt(&encrypted, &other).is_err());
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let encrypted = encrypt(PAYLOAD, &key()).unwrap();
        let truncated = &encrypted[..encrypted.len() - 2];
        assert!(matches!(
            decrypt(truncated, &key()),
            Err(CipherError::CiphertextLength(_))
        ));

        let (iv, _) = encrypted.split_once(':').unwrap();
        assert_eq!(
            decrypt(&format!("{iv}:"), &key()),
            Err(CipherError::CiphertextLength(0))
        );
    }

    #[test]
    fn malformed_envelopes_fail() {
        assert_eq!(decrypt("deadbeef", &key()), Err(CipherError::MissingSeparator));
        assert!(matches!(decrypt("zz:00", &key()), Err(CipherError::Hex(_))));
        assert_eq!(
            decrypt("0011:00112233445566778899aabbccddeeff", &key()),
            Err(CipherError::IvLength(2))
        );
    }

    #[test]
    fn key_must_be_32_bytes() {
        assert_eq!(
            CipherKey::from_secret("short").unwrap_err(),
            CipherError::KeyLength(5)
        );
    }
}
