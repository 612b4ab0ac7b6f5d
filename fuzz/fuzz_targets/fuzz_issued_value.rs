#![no_main]

use libfuzzer_sys::fuzz_target;

use quizpay_transactions::amount::encode_issued_value;
use quizpay_types::TokenValue;

// Token amounts from the LMS are free text; parsing and encoding must never panic.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(value) = TokenValue::parse(text) {
        let _ = encode_issued_value(&value);
    }
});
