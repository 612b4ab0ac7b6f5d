//! Cryptographic building blocks for the payout processor.
//!
//! - **AES-256-CBC** payload cipher (`hex(iv):hex(ciphertext)`), shared with the LMS
//! - **Base58** account-id and family-seed codecs using the ledger alphabet
//! - **Ed25519** payer keys derived from `sEd...` family seeds
//! - **SHA-512Half** transaction hashing

pub mod address;
pub mod cipher;
pub mod error;
pub mod hash;
pub mod seed;
pub mod sign;

pub use address::{decode_account_id, encode_account_id, AccountId};
pub use cipher::{decrypt, encrypt, CipherKey};
pub use error::{CipherError, KeyError};
pub use hash::{sha512_half, HashPrefix};
pub use seed::{decode_family_seed, encode_family_seed, PayerKeys};
pub use sign::verify_signature;
