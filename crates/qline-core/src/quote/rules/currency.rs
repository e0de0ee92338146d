//! Document currency detection and money display.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use super::numbers::money;
use super::{ExtractionMatch, FieldExtractor};

lazy_static! {
    static ref CODE: Regex =
        Regex::new(r"\b(?:USD|EUR|GBP|JPY|INR|CAD|AUD|CHF|SEK|NOK|DKK)\b").unwrap();
    static ref PREFIXED_DOLLAR: Regex = Regex::new(r"\b(?:C|CA|A|AU)\$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Jpy,
    Inr,
    Cad,
    Aud,
    Chf,
    Sek,
    Nok,
    Dkk,
}

impl Currency {
    pub const ALL: [Currency; 11] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
        Currency::Inr,
        Currency::Cad,
        Currency::Aud,
        Currency::Chf,
        Currency::Sek,
        Currency::Nok,
        Currency::Dkk,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Inr => "INR",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
            Currency::Chf => "CHF",
            Currency::Sek => "SEK",
            Currency::Nok => "NOK",
            Currency::Dkk => "DKK",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Jpy => "¥",
            Currency::Inr => "₹",
            Currency::Cad => "C$",
            Currency::Aud => "A$",
            Currency::Chf => "CHF",
            Currency::Sek | Currency::Nok | Currency::Dkk => "kr",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code))
    }

    /// Whether the symbol is written after the amount.
    fn symbol_follows(&self) -> bool {
        matches!(
            self,
            Currency::Eur | Currency::Sek | Currency::Nok | Currency::Dkk
        )
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Picks the most frequently mentioned currency in a document.
#[derive(Debug, Clone)]
pub struct CurrencyDetector {
    default: Currency,
}

impl CurrencyDetector {
    pub fn new(default: Currency) -> Self {
        Self { default }
    }

    fn counts(text: &str) -> Vec<(Currency, usize)> {
        let prefixed: Vec<&str> = PREFIXED_DOLLAR.find_iter(text).map(|m| m.as_str()).collect();
        let cad_prefixed = prefixed.iter().filter(|m| m.starts_with('C')).count();
        let aud_prefixed = prefixed.len() - cad_prefixed;
        let dollars = text.matches('$').count().saturating_sub(prefixed.len());

        let mut counts: Vec<(Currency, usize)> = vec![
            (Currency::Usd, dollars),
            (Currency::Eur, text.matches('€').count()),
            (Currency::Gbp, text.matches('£').count()),
            (Currency::Jpy, text.matches('¥').count()),
            (Currency::Inr, text.matches('₹').count()),
            (Currency::Cad, cad_prefixed),
            (Currency::Aud, aud_prefixed),
        ];

        for m in CODE.find_iter(text) {
            if let Some(currency) = Currency::from_code(m.as_str()) {
                match counts.iter_mut().find(|(c, _)| *c == currency) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((currency, 1)),
                }
            }
        }

        counts.retain(|(_, n)| *n > 0);
        counts
    }
}

impl Default for CurrencyDetector {
    fn default() -> Self {
        Self::new(Currency::Usd)
    }
}

impl FieldExtractor for CurrencyDetector {
    type Output = ExtractionMatch<Currency>;

    /// Most frequent currency, or the default with zero confidence.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        let counts = Self::counts(text);
        let total: usize = counts.iter().map(|(_, n)| n).sum();

        // Ties go to the earlier entry (symbols before codes).
        let mut best: Option<(Currency, usize)> = None;
        for (currency, n) in counts {
            if best.is_none_or(|(_, b)| n > b) {
                best = Some((currency, n));
            }
        }

        Some(match best {
            Some((currency, n)) => {
                ExtractionMatch::new(currency, n as f32 / total as f32, currency.code())
            }
            None => ExtractionMatch::new(self.default, 0.0, ""),
        })
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let counts = Self::counts(text);
        let total: usize = counts.iter().map(|(_, n)| n).sum();
        counts
            .into_iter()
            .map(|(currency, n)| {
                ExtractionMatch::new(currency, n as f32 / total as f32, currency.code())
            })
            .collect()
    }
}

/// Detect the document currency, falling back to `default`.
pub fn detect_currency(text: &str, default: Currency) -> Currency {
    CurrencyDetector::new(default)
        .extract(text)
        .map(|m| m.value)
        .unwrap_or(default)
}

/// Format an amount with US digit grouping and the currency's symbol.
pub fn format_money(amount: Decimal, currency: Currency) -> String {
    let amount = money(amount);
    let digits = amount.abs().to_string();
    let (int_part, frac) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };
    let number = format!("{}.{}", grouped, frac);

    match currency {
        Currency::Chf => format!("{}CHF {}", sign, number),
        c if c.symbol_follows() => format!("{}{} {}", sign, number, c.symbol()),
        c => format!("{}{}{}", sign, c.symbol(), number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_detect_currency() {
        assert_eq!(detect_currency("Widget $5.00 $10.00", Currency::Eur), Currency::Usd);
        assert_eq!(detect_currency("Teil 2 5,00 € 10,00 €", Currency::Usd), Currency::Eur);
        assert_eq!(detect_currency("Part C$5.00 C$10.00 $3", Currency::Usd), Currency::Cad);
        assert_eq!(detect_currency("Total GBP 100", Currency::Usd), Currency::Gbp);
        assert_eq!(detect_currency("no money here", Currency::Chf), Currency::Chf);
    }

    #[test]
    fn test_detector_confidence() {
        let found = CurrencyDetector::default()
            .extract("$1 $2 $3 €4")
            .unwrap();
        assert_eq!(found.value, Currency::Usd);
        assert_eq!(found.confidence, 0.75);

        assert_eq!(CurrencyDetector::default().extract_all("$1 €2").len(), 2);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Currency::from_code("eur"), Some(Currency::Eur));
        assert_eq!(Currency::from_code("XYZ"), None);
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(dec("1234.5"), Currency::Usd), "$1,234.50");
        assert_eq!(format_money(dec("1234567.891"), Currency::Usd), "$1,234,567.89");
        assert_eq!(format_money(dec("1234.56"), Currency::Eur), "1,234.56 €");
        assert_eq!(format_money(dec("99"), Currency::Chf), "CHF 99.00");
        assert_eq!(format_money(dec("-5"), Currency::Gbp), "-£5.00");
        assert_eq!(format_money(dec("0"), Currency::Sek), "0.00 kr");
    }
}
