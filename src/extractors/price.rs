//! Price text normalisation

/// Parse a printed price such as `"$1,299.00"` into a number.
///
/// Every character that is not an ASCII digit or `.` is dropped, then the
/// leading number (digits with at most one decimal point) is parsed, so a
/// trailing `"incl. VAT"` does not spoil the value. Anything that still
/// fails to parse, or parses to a non-finite value, yields 0.
pub fn parse_price(text: &str) -> f64 {
    try_parse_price(text).unwrap_or(0.0)
}

/// Like `parse_price`, but `None` when the text holds no usable number.
pub fn try_parse_price(text: &str) -> Option<f64> {
    let mut seen_dot = false;
    let number: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .take_while(|c| {
            if *c == '.' {
                if seen_dot {
                    return false;
                }
                seen_dot = true;
            }
            true
        })
        .collect();

    number.parse::<f64>().ok().filter(|price| price.is_finite())
}
