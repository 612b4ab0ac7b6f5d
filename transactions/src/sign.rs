//! Signing a Payment with the payer key.

use serde::{Deserialize, Serialize};

use quizpay_crypto::{sha512_half, HashPrefix, PayerKeys};
use quizpay_types::AccountAddress;

use crate::error::TransactionError;
use crate::payment::Payment;

/// A signed, ready-to-submit transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Uppercase hex of the signed binary form (`tx_blob`).
    pub blob: String,
    /// Transaction id: uppercase hex SHA-512Half over `TXN\0 || blob`.
    pub hash: String,
    pub sequence: u32,
    pub destination: AccountAddress,
}

/// Sign `payment` and compute its transaction id.
pub fn sign_payment(
    payment: &Payment,
    keys: &PayerKeys,
) -> Result<SignedTransaction, TransactionError> {
    let public_key = keys.public_key();

    let unsigned = payment.serialize(&public_key, None)?;
    let mut signing_payload =
        Vec::with_capacity(HashPrefix::TRANSACTION_SIGN.len() + unsigned.len());
    signing_payload.extend_from_slice(&HashPrefix::TRANSACTION_SIGN);
    signing_payload.extend_from_slice(&unsigned);
    let signature = keys.sign(&signing_payload);

    let signed = payment.serialize(&public_key, Some(&signature))?;
    let hash = sha512_half(&[HashPrefix::TRANSACTION_ID.as_slice(), signed.as_slice()]);

    Ok(SignedTransaction {
        blob: hex::encode_upper(&signed),
        hash: hex::encode_upper(hash),
        sequence: payment.sequence,
        destination: payment.destination.clone(),
    })
}
