#![no_main]

use libfuzzer_sys::fuzz_target;

use quizpay_types::{RewardStatus, StatusLine};

// Any status line that parses must print back to itself.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(line) = text.parse::<StatusLine>() {
        assert_eq!(line.to_string(), text);
    }
    let _ = text.parse::<RewardStatus>();
});
