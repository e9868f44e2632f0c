//! Number formatting for card values and table cells.

/// Round to two decimal places, the precision every percentage is shown at.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Compress a magnitude into a `b`/`m`/`k` suffixed string with two decimals.
///
/// Values below one thousand (including all negatives) print in their
/// shortest plain form: `42.0` becomes `"42"`, `12.5` stays `"12.5"`.
pub fn format_number(num: f64) -> String {
    // Prints -0.0 as "0".
    let num = if num == 0.0 { 0.0 } else { num };
    if num >= 1_000_000_000.0 {
        format!("{:.2}b", num / 1_000_000_000.0)
    } else if num >= 1_000_000.0 {
        format!("{:.2}m", num / 1_000_000.0)
    } else if num >= 1_000.0 {
        format!("{:.2}k", num / 1_000.0)
    } else {
        format!("{num}")
    }
}

/// `format_number` with a dollar prefix: `1.5e9` becomes `"$1.50b"`.
pub fn format_currency(num: f64) -> String {
    format!("${}", format_number(num))
}

/// Two-decimal percentage string: `-3.14159` becomes `"-3.14%"`.
pub fn format_percent(pct: f64) -> String {
    format!("{pct:.2}%")
}

/// Whole number with comma thousands separators: `2296` becomes `"2,296"`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
