//! Money and timestamp formatting shared by both report pipelines.

use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};

/// Formats an amount as US dollars: `$1,234,567.50`, `-$1,234.50`.
pub fn format_currency(amount: Decimal) -> String {
    let (negative, digits) = grouped(amount);
    if negative {
        format!("-${}", digits)
    } else {
        format!("${}", digits)
    }
}

/// Same grouping and rounding as [`format_currency`] without the `$`.
pub fn format_amount(amount: Decimal) -> String {
    let (negative, digits) = grouped(amount);
    if negative { format!("-{}", digits) } else { digits }
}

/// Rounds to cents (half away from zero) and inserts thousands separators.
fn grouped(amount: Decimal) -> (bool, String) {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let plain = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut out = String::with_capacity(plain.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.push('.');
    out.push_str(frac_part);
    (negative, out)
}

/// `October 16, 2026 14:03:09`
pub fn long_timestamp(at: &NaiveDateTime) -> String {
    at.format("%B %d, %Y %H:%M:%S").to_string()
}

/// `10/16/2026 2:03 PM`
pub fn short_timestamp(at: &NaiveDateTime) -> String {
    at.format("%-m/%-d/%Y %-I:%M %p").to_string()
}
