//! Number and currency normalization.
//!
//! Handles US (`1,234.56`) and European (`1.234,56`, `1 234,56`) grouping,
//! currency symbols and codes, and accounting-style negatives `(12.00)`.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use super::patterns::CURRENCY_CODE;

/// Currency symbols stripped before parsing.
pub const CURRENCY_SYMBOLS: &[char] = &[
    '$', '€', '£', '¥', '₹', '₽', '₩', '₪', '₦', '₫', '₱', '₺', '¢',
];

/// Characters used as thousands grouping besides `,` and `.`.
const GROUPING_SPACES: &[char] = &[' ', '\u{00a0}', '\u{202f}', '\''];

/// Sentinel returned by [`normalize`] for unparseable input.
pub const UNPARSEABLE: &str = "0";

/// Parse a raw numeric string into a decimal, without rounding.
///
/// Returns `None` for anything that is not a number once currency markers
/// and grouping are removed.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let stripped = CURRENCY_CODE.replace_all(raw.trim(), "");
    let s: String = stripped
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c))
        .collect();

    let mut negative = false;
    let mut body = s.trim();
    if body.len() >= 2 && body.starts_with('(') && body.ends_with(')') {
        negative = true;
        body = body[1..body.len() - 1].trim();
    }

    if let Some(rest) = body.strip_prefix('-') {
        negative = !negative;
        body = rest.trim_start();
    }

    let compact: String = body.chars().filter(|c| !GROUPING_SPACES.contains(c)).collect();
    if compact.is_empty()
        || !compact.chars().any(|c| c.is_ascii_digit())
        || !compact
            .chars()
            .all(|c| c.is_ascii_digit() || c == ',' || c == '.')
    {
        return None;
    }

    let canonical = resolve_separators(&compact)?;
    let value = Decimal::from_str(&canonical).ok()?;

    Some(if negative { -value } else { value })
}

/// Decide which separator is the decimal point and drop the others.
fn resolve_separators(s: &str) -> Option<String> {
    let last_comma = s.rfind(',');
    let last_dot = s.rfind('.');

    let canonical = match (last_comma, last_dot) {
        // Both present: the rightmost one is the decimal point.
        (Some(c), Some(d)) if c > d => {
            let (int_part, frac) = s.split_at(c);
            format!("{}.{}", int_part.replace(['.', ','], ""), &frac[1..])
        }
        (Some(_), Some(d)) => {
            let (int_part, frac) = s.split_at(d);
            format!("{}.{}", int_part.replace(['.', ','], ""), &frac[1..])
        }
        // Comma only: decimal when the final group has exactly two digits.
        (Some(c), None) => {
            let frac = &s[c + 1..];
            if frac.len() == 2 {
                format!("{}.{}", s[..c].replace(',', ""), frac)
            } else {
                s.replace(',', "")
            }
        }
        // Dot only: several dots in groups of three are thousands grouping.
        (None, Some(d)) => {
            let groups: Vec<&str> = s.split('.').collect();
            if groups.len() > 2 && groups[1..].iter().all(|g| g.len() == 3) {
                s.replace('.', "")
            } else {
                let (int_part, frac) = s.split_at(d);
                format!("{}.{}", int_part.replace('.', ""), &frac[1..])
            }
        }
        (None, None) => s.to_string(),
    };

    let canonical = canonical.trim_end_matches('.').to_string();
    if canonical.is_empty() || canonical == "." {
        return None;
    }

    Some(if canonical.starts_with('.') {
        format!("0{}", canonical)
    } else {
        canonical
    })
}

/// Quantize a money value to cents, rounding half away from zero.
pub fn money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Canonical form of a quantity: no trailing fractional zeros.
pub fn quantity(value: Decimal) -> Decimal {
    value.normalize()
}

pub fn is_whole(value: Decimal) -> bool {
    value.fract().is_zero()
}

/// Normalize a raw numeric string to a canonical two-decimal string.
///
/// Returns [`UNPARSEABLE`] (`"0"`) when the input cannot be parsed; callers
/// must treat that as a failure, not as a zero price.
pub fn normalize(raw: &str) -> String {
    parse_amount(raw)
        .map(|value| money(value).to_string())
        .unwrap_or_else(|| UNPARSEABLE.to_string())
}
