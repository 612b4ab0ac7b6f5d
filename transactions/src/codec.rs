//! Canonical binary serialization of ledger transaction fields.
//!
//! Fields must be written in canonical order: ascending type code, then
//! ascending field code. [`FieldCode`] constants are declared in that order.

use crate::error::TransactionError;

/// A `(type code, field code)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FieldCode {
    pub type_code: u8,
    pub field_code: u8,
}

impl FieldCode {
    const fn new(type_code: u8, field_code: u8) -> Self {
        Self {
            type_code,
            field_code,
        }
    }

    pub const TRANSACTION_TYPE: Self = Self::new(1, 2);
    pub const SEQUENCE: Self = Self::new(2, 4);
    pub const LAST_LEDGER_SEQUENCE: Self = Self::new(2, 27);
    pub const AMOUNT: Self = Self::new(6, 1);
    pub const FEE: Self = Self::new(6, 8);
    pub const SIGNING_PUB_KEY: Self = Self::new(7, 3);
    pub const TXN_SIGNATURE: Self = Self::new(7, 4);
    pub const MEMO_DATA: Self = Self::new(7, 13);
    pub const ACCOUNT: Self = Self::new(8, 1);
    pub const DESTINATION: Self = Self::new(8, 3);
    pub const OBJECT_END: Self = Self::new(14, 1);
    pub const MEMO: Self = Self::new(14, 10);
    pub const ARRAY_END: Self = Self::new(15, 1);
    pub const MEMOS: Self = Self::new(15, 9);

    /// Encoded field id: one to three bytes depending on code sizes.
    pub fn header(&self) -> Vec<u8> {
        let (t, f) = (self.type_code, self.field_code);
        match (t < 16, f < 16) {
            (true, true) => vec![(t << 4) | f],
            (true, false) => vec![t << 4, f],
            (false, true) => vec![f, t],
            (false, false) => vec![0, t, f],
        }
    }
}

/// Transaction type code of a Payment.
pub const PAYMENT_TYPE: u16 = 0;

const MAX_VL_LEN: usize = 918_744;

/// Append-only field writer.
#[derive(Debug, Default)]
pub struct BinarySerializer {
    buf: Vec<u8>,
}

impl BinarySerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn field(&mut self, code: FieldCode) -> &mut Self {
        self.buf.extend_from_slice(&code.header());
        self
    }

    pub fn u16(&mut self, code: FieldCode, value: u16) -> &mut Self {
        self.field(code);
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn u32(&mut self, code: FieldCode, value: u32) -> &mut Self {
        self.field(code);
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Fixed-width value (amounts) written without a length prefix.
    pub fn raw(&mut self, code: FieldCode, bytes: &[u8]) -> &mut Self {
        self.field(code);
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Variable-length blob or account id.
    pub fn vl(&mut self, code: FieldCode, bytes: &[u8]) -> Result<&mut Self, TransactionError> {
        let prefix = vl_prefix(bytes.len())?;
        self.field(code);
        self.buf.extend_from_slice(&prefix);
        self.buf.extend_from_slice(bytes);
        Ok(self)
    }
}

/// Length prefix for variable-length fields.
pub fn vl_prefix(len: usize) -> Result<Vec<u8>, TransactionError> {
    match len {
        0..=192 => Ok(vec![len as u8]),
        193..=12_480 => {
            let n = len - 193;
            Ok(vec![193 + (n >> 8) as u8, (n & 0xFF) as u8])
        }
        12_481..=MAX_VL_LEN => {
            let n = len - 12_481;
            Ok(vec![
                241 + (n >> 16) as u8,
                ((n >> 8) & 0xFF) as u8,
                (n & 0xFF) as u8,
            ])
        }
        _ => Err(TransactionError::FieldTooLong(len)),
    }
}
