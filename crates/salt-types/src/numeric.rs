//! Number literal parsing (spec §2 component C): converts a numeric
//! string, with optional radix prefix and decimal point, into a typed
//! integer or float, flagging over/underflow rather than panicking.

/// The result of parsing a numeric literal's text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberLiteral {
    /// An integer literal that fits in `u64` (spec §3 invariant).
    Int(u64),
    /// A float literal that fits in `f64`.
    Float(f64),
    /// Magnitude exceeds the representable range (spec §3 invariant,
    /// spec §8 scenario 6); the caller emits a parse diagnostic and
    /// substitutes a typed poison value.
    Error,
}

/// Parse a numeric literal's source text (digits only, no leading sign --
/// a leading `-` is a unary operator handled by the parser, not part of
/// the literal itself).
///
/// Accepted forms: `123`, `0x1F`, `0o17`, `0b101` (integers only for
/// radix-prefixed forms), `3.14`, `1.0e10` (floats; presence of `.` or an
/// exponent marker selects the float path).
pub fn parse_number(text: &str) -> NumberLiteral {
    if is_float_literal(text) {
        return match text.parse::<f64>() {
            Ok(value) if value.is_finite() => NumberLiteral::Float(value),
            _ => NumberLiteral::Error,
        };
    }

    let (radix, digits) = if let Some(rest) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        (16, rest)
    } else if let Some(rest) = text.strip_prefix("0o").or_else(|| text.strip_prefix("0O")) {
        (8, rest)
    } else if let Some(rest) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        (2, rest)
    } else {
        (10, text)
    };

    if digits.is_empty() {
        return NumberLiteral::Error;
    }

    match u64::from_str_radix(digits, radix) {
        Ok(value) => NumberLiteral::Int(value),
        Err(_) => NumberLiteral::Error,
    }
}

fn is_float_literal(text: &str) -> bool {
    if text.starts_with("0x") || text.starts_with("0X") || text.starts_with("0o") || text.starts_with("0O")
        || text.starts_with("0b") || text.starts_with("0B")
    {
        return false;
    }
    text.contains('.') || text.contains('e') || text.contains('E')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_decimal() {
        assert_eq!(parse_number("42"), NumberLiteral::Int(42));
    }

    #[test]
    fn parses_radix_prefixes() {
        assert_eq!(parse_number("0x1F"), NumberLiteral::Int(31));
        assert_eq!(parse_number("0o17"), NumberLiteral::Int(15));
        assert_eq!(parse_number("0b101"), NumberLiteral::Int(5));
    }

    #[test]
    fn parses_float_forms() {
        assert_eq!(parse_number("3.14"), NumberLiteral::Float(3.14));
        assert_eq!(parse_number("1.0e10"), NumberLiteral::Float(1.0e10));
    }

    #[test]
    fn integer_overflow_is_error() {
        // 2^64, one past u64::MAX.
        assert_eq!(parse_number("18446744073709551616"), NumberLiteral::Error);
    }

    #[test]
    fn u64_max_round_trips() {
        assert_eq!(parse_number(&u64::MAX.to_string()), NumberLiteral::Int(u64::MAX));
    }

    #[test]
    fn i64_round_trip_property() {
        for i in [0i64, 1, -1i64 as u64 as i64, i64::MAX, 12345] {
            let magnitude = i.unsigned_abs();
            assert_eq!(parse_number(&magnitude.to_string()), NumberLiteral::Int(magnitude));
        }
    }

    #[test]
    fn f64_round_trip_property() {
        for f in [0.0f64, 1.5, 2.0, 100.25, -3.5f64] {
            let text = f.abs().to_string();
            assert_eq!(parse_number(&text), NumberLiteral::Float(f.abs()));
        }
    }
}
