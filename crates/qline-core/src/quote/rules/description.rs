//! Description recovery from an assigned line.

use super::classifier::LineClassifier;
use super::lexicon::{Lexicon, DEFAULT_LEXICON};
use super::patterns::{
    DESCRIPTION_NOISE, LEADING_QUANTITY_LABEL, LINE_NUMBER_PREFIX, TRAILING_CONJUNCTION,
    TRAILING_QUANTITY_LABEL, WHITESPACE_RUN,
};
use super::scanner::NumericToken;

const MIN_DESCRIPTION_LEN: usize = 3;

/// Characters trimmed from both ends of a description.
const EDGE_PUNCTUATION: &[char] = &[':', '-', '/', '.', '&', '#', '+'];

/// Extract with the built-in lexicon and a 100 character suffix limit.
pub fn extract_description(line: &str, consumed: &[NumericToken]) -> Option<String> {
    DescriptionExtractor::new(&DEFAULT_LEXICON, 100).extract(line, consumed)
}

/// Recovers the product description around the consumed numbers.
pub struct DescriptionExtractor<'a> {
    lexicon: &'a Lexicon,
    classifier: LineClassifier<'a>,
    max_suffix_len: usize,
}

impl<'a> DescriptionExtractor<'a> {
    pub fn new(lexicon: &'a Lexicon, max_suffix_len: usize) -> Self {
        Self {
            lexicon,
            classifier: LineClassifier::new(lexicon),
            max_suffix_len,
        }
    }

    /// Description for `line`, or `None` when what is left is too short,
    /// has no letters, or is not a product.
    ///
    /// Prefers the text before the first consumed number. Trailing text is
    /// appended when it reads like a continuation (material or process
    /// words).
    pub fn extract(&self, line: &str, consumed: &[NumericToken]) -> Option<String> {
        let first_start = consumed.iter().map(NumericToken::start).min()?;
        let last_end = consumed.iter().map(NumericToken::end).max()?;

        let prefix = self.prefix(&line[..first_start]);
        let suffix = clean(&line[last_end..]);

        let description = if prefix.chars().count() >= MIN_DESCRIPTION_LEN {
            if self.is_continuation_suffix(&suffix) {
                format!("{} {}", prefix, suffix)
            } else {
                prefix
            }
        } else {
            leftover(line, consumed)
        };

        self.validate(description)
    }

    fn prefix(&self, raw: &str) -> String {
        let mut text = raw.trim();
        if let Some(m) = LINE_NUMBER_PREFIX.find(text) {
            if text[m.end()..].trim().chars().count() >= MIN_DESCRIPTION_LEN {
                text = &text[m.end()..];
            }
        }
        clean(&TRAILING_QUANTITY_LABEL.replace(text, ""))
    }

    fn is_continuation_suffix(&self, suffix: &str) -> bool {
        !suffix.is_empty()
            && suffix.chars().count() < self.max_suffix_len
            && (self.lexicon.has_continuation_word(suffix) || self.lexicon.has_material(suffix))
    }

    fn validate(&self, description: String) -> Option<String> {
        if description.chars().count() < MIN_DESCRIPTION_LEN
            || !description.chars().any(char::is_alphabetic)
        {
            return None;
        }
        if self.classifier.description_reason(&description).is_some() {
            return None;
        }
        Some(description)
    }
}

/// Everything on the line except the consumed numbers and quantity labels.
fn leftover(line: &str, consumed: &[NumericToken]) -> String {
    let mut spans: Vec<(usize, usize)> = consumed.iter().map(|t| t.position).collect();
    spans.sort_unstable();

    let mut pieces = Vec::new();
    let mut cursor = 0;
    for (start, end) in spans.into_iter().chain(std::iter::once((line.len(), line.len()))) {
        if start >= cursor {
            let gap = LEADING_QUANTITY_LABEL.replace(&line[cursor..start], "");
            let gap = clean(&TRAILING_QUANTITY_LABEL.replace(&gap, ""));
            if !gap.is_empty() {
                pieces.push(gap);
            }
        }
        cursor = cursor.max(end);
    }

    pieces.join(" ")
}

/// Drop punctuation artifacts, collapse whitespace and trim dangling
/// conjunctions. Hyphens, underscores and colons survive.
fn clean(text: &str) -> String {
    let text = DESCRIPTION_NOISE.replace_all(text, " ");
    let text = WHITESPACE_RUN.replace_all(text.trim(), " ");
    let text = TRAILING_CONJUNCTION.replace(&text, "");
    text.trim_matches(|c: char| c.is_whitespace() || EDGE_PUNCTUATION.contains(&c))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::rules::scanner::TokenExtractor;
    use crate::quote::rules::FieldExtractor;

    fn describe(line: &str) -> Option<String> {
        let tokens = TokenExtractor::new().extract_all(line);
        let n = tokens.len();
        extract_description(line, &tokens[n.saturating_sub(3)..])
    }

    #[test]
    fn test_prefix_description() {
        assert_eq!(
            describe("Widget Assembly 2 50.00 100.00").as_deref(),
            Some("Widget Assembly")
        );
        assert_eq!(
            describe("1. Widget Assembly 2 50.00 100.00").as_deref(),
            Some("Widget Assembly")
        );
        assert_eq!(describe("Tool Box 2 15.00 30.00").as_deref(), Some("Tool Box"));
        assert_eq!(
            describe("Hex bolt, qty 40 2.50 100.00").as_deref(),
            Some("Hex bolt")
        );
    }

    #[test]
    fn test_continuation_suffix_is_appended() {
        let line = "19_5-basebalancer-05: Clear PC Material, 6 $240.92 $1,445.52 Machine and De-burr";
        assert_eq!(
            describe(line).as_deref(),
            Some("19_5-basebalancer-05: Clear PC Material Machine and De-burr")
        );

        // Not continuation vocabulary.
        assert_eq!(
            describe("Widget Assembly 2 50.00 100.00 see note").as_deref(),
            Some("Widget Assembly")
        );
    }

    #[test]
    fn test_trailing_conjunction_is_dropped() {
        assert_eq!(
            describe("19_5-limiter-01: steel Material machining and 5 80.00 400.00").as_deref(),
            Some("19_5-limiter-01: steel Material machining")
        );
    }

    #[test]
    fn test_leftover_when_prefix_is_empty() {
        assert_eq!(
            describe("Qty: 12 Bracket 4.50 54.00").as_deref(),
            Some("Bracket")
        );
    }

    #[test]
    fn test_rejections() {
        assert_eq!(describe("Freight Shipping 1 150.00 150.00"), None);
        assert_eq!(describe("AB 2 5.00 10.00"), None);
        assert_eq!(describe("## 2 5.00 10.00"), None);
        assert_eq!(
            describe("Shipping Container Latch Assembly 2 5.00 10.00").as_deref(),
            Some("Shipping Container Latch Assembly")
        );
    }
}
