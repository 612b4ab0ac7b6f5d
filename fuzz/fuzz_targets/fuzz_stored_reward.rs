#![no_main]

use libfuzzer_sys::fuzz_target;

use quizpay_crypto::CipherKey;
use quizpay_store_lmdb::StoredReward;

// Corrupt database values must be rejected without panicking.
fuzz_target!(|data: &[u8]| {
    if let Ok(stored) = StoredReward::from_bytes(data) {
        let _ = stored.open(&CipherKey::new([0x42; 32]));
    }
});
