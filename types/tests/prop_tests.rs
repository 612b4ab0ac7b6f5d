use proptest::prelude::*;

use quizpay_types::{RewardStatus, StatusLine, TokenValue};

proptest! {
    /// Any positive integer is accepted and decomposes with a zero exponent.
    #[test]
    fn positive_integers_parse(n in 1u64..) {
        let value = TokenValue::parse(n.to_string()).unwrap();
        prop_assert_eq!(value.parts(), (n as u128, 0));
    }

    /// `int.frac` decomposes into the digits with a negative exponent equal to
    /// the fraction length.
    #[test]
    fn fractions_shift_the_exponent(int in 1u32..1_000_000, frac in "[0-9]{1,6}") {
        let value = TokenValue::parse(format!("{int}.{frac}")).unwrap();
        let expected: u128 = format!("{int}{frac}").parse().unwrap();
        prop_assert_eq!(value.parts(), (expected, -(frac.len() as i32)));
    }

    /// Status lines written by the processor are read back unchanged, and the
    /// flat status only depends on the engine result.
    #[test]
    fn attempted_status_lines_read_back(
        code in "(tes|tec|tef|tel|tem|ter|loc)[A-Z_]{1,20}",
        hash in proptest::option::of("[0-9A-F]{64}"),
    ) {
        let line = StatusLine::attempted(code.clone(), hash);
        let parsed: StatusLine = line.to_string().parse().unwrap();
        prop_assert_eq!(parsed.status(), RewardStatus::from_engine_result(&code));
        prop_assert_eq!(parsed, line);
    }

    /// Arbitrary text never panics the status line parser.
    #[test]
    fn status_line_parser_total(s in ".*") {
        let _ = s.parse::<StatusLine>();
    }
}
