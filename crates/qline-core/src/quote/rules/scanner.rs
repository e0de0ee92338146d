//! Candidate line scanning.
//!
//! Turns raw page text into the lines worth running role assignment on:
//! continuation lines are folded into the row above, non-item lines are
//! dropped, and short pricing-only lines are merged into the item they
//! belong to.

use rust_decimal::Decimal;
use tracing::debug;

use super::classifier::LineClassifier;
use super::lexicon::{Lexicon, DEFAULT_LEXICON};
use super::numbers::{parse_amount, CURRENCY_SYMBOLS};
use super::patterns::{CID_ARTIFACT, ITEM_START, NUMBER_TOKEN, PAGE_MARKER};
use super::FieldExtractor;

/// Longest line still treated as a pricing continuation.
const PRICING_CONTINUATION_MAX_LEN: usize = 40;

/// Lines folded into a numeric row at most.
const MAX_CONTINUATION_LINES: usize = 2;

/// Lines looked ahead for a pricing continuation.
const MERGE_LOOKAHEAD: usize = 2;

/// Unit words allowed to trail a number directly ("10pcs").
const UNIT_SUFFIXES: &[&str] = &["ea", "pc", "pcs", "each", "units", "x"];

/// A number found on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericToken {
    /// Matched text, including any currency marker.
    pub raw: String,
    /// Parsed value; `None` when the text does not parse.
    pub normalized: Option<Decimal>,
    /// Byte range within the line.
    pub position: (usize, usize),
    /// Surrounding text.
    pub context: String,
    pub has_currency: bool,
    pub is_percentage: bool,
}

impl NumericToken {
    pub fn start(&self) -> usize {
        self.position.0
    }

    pub fn end(&self) -> usize {
        self.position.1
    }
}

/// A logical line that may hold a line item.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateLine {
    /// 1-based number of the first physical line.
    pub line_number: usize,
    pub text: String,
    pub tokens: Vec<NumericToken>,
}

/// Boundary-aware numeric tokenizer.
///
/// Digits glued to letters, underscores or hyphens (`ESTOP-GEN2-4`,
/// `5-basebalancer`) are never split out as numbers.
#[derive(Debug, Clone)]
pub struct TokenExtractor {
    window: usize,
}

impl Default for TokenExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenExtractor {
    pub fn new() -> Self {
        Self { window: 20 }
    }

    /// Characters of context captured on each side of a token.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    fn context(&self, line: &str, start: usize, end: usize) -> String {
        let before: String = {
            let mut chars: Vec<char> = line[..start].chars().rev().take(self.window).collect();
            chars.reverse();
            chars.into_iter().collect()
        };
        let after: String = line[end..].chars().take(self.window).collect();
        format!("{}{}{}", before, &line[start..end], after)
    }
}

impl FieldExtractor for TokenExtractor {
    type Output = NumericToken;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut tokens = Vec::new();

        for caps in NUMBER_TOKEN.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let (start, end) = (whole.start(), whole.end());

            if !clean_before(text, start) || !clean_after(text, end) {
                continue;
            }

            let is_percentage = caps.name("pct").is_some();
            let raw = whole.as_str().to_string();
            let number = raw.trim_end_matches('%').trim_end();

            tokens.push(NumericToken {
                normalized: parse_amount(number),
                position: (start, end),
                context: self.context(text, start, end),
                has_currency: caps.name("cur").is_some(),
                is_percentage,
                raw,
            });
        }

        tokens
    }
}

fn clean_before(text: &str, start: usize) -> bool {
    match text[..start].chars().next_back() {
        None => true,
        Some(c) => {
            c.is_whitespace() || matches!(c, '(' | '[' | ':' | '=' | '|' | '*' | '"' | '\'' | ';' | '@')
        }
    }
}

fn clean_after(text: &str, end: usize) -> bool {
    let rest = &text[end..];
    let mut chars = rest.chars();
    let Some(next) = chars.next() else {
        return true;
    };

    if next.is_whitespace()
        || matches!(next, ')' | ']' | '|' | ';' | '*' | '"')
        || CURRENCY_SYMBOLS.contains(&next)
    {
        return true;
    }

    match next {
        ',' | '.' | ':' => chars.next().is_none_or(|c| c.is_whitespace()),
        '/' => chars.next().is_some_and(|c| c.is_alphabetic()),
        c if c.is_alphabetic() => {
            let word: String = rest
                .chars()
                .take_while(|c| c.is_alphabetic())
                .collect::<String>()
                .to_lowercase();
            UNIT_SUFFIXES.contains(&word.as_str())
        }
        _ => false,
    }
}

/// Normalize line endings and drop extraction artifacts.
///
/// Removes `(cid:NN)` glyph references and `=== PAGE n ===` markers.
pub fn clean_text(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace(['\r', '\u{000c}'], "\n");
    let without_cid = CID_ARTIFACT.replace_all(&unified, "");
    PAGE_MARKER.replace_all(&without_cid, "").into_owned()
}

/// Share of the text taken up by `cid:` glyph references.
pub fn cid_ratio(text: &str) -> f32 {
    let chars = text.chars().count();
    if chars == 0 {
        return 0.0;
    }
    text.matches("cid:").count() as f32 / chars as f32
}

/// Scan with the built-in lexicon.
pub fn scan(text: &str) -> Vec<CandidateLine> {
    LineScanner::new(&DEFAULT_LEXICON).scan(text)
}

struct LogicalLine {
    line_number: usize,
    text: String,
}

/// Finds candidate item lines in page text.
pub struct LineScanner<'a> {
    lexicon: &'a Lexicon,
    classifier: LineClassifier<'a>,
    tokenizer: TokenExtractor,
}

impl<'a> LineScanner<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self {
            lexicon,
            classifier: LineClassifier::new(lexicon),
            tokenizer: TokenExtractor::new(),
        }
    }

    pub fn with_keyword_window(mut self, window: usize) -> Self {
        self.tokenizer = self.tokenizer.with_window(window);
        self
    }

    pub fn tokenizer(&self) -> &TokenExtractor {
        &self.tokenizer
    }

    pub fn scan(&self, text: &str) -> Vec<CandidateLine> {
        let cleaned = clean_text(text);
        let logical = self.reconstruct(&cleaned);

        let mut candidates = Vec::new();
        let mut merged_into_previous = vec![false; logical.len()];

        for (i, line) in logical.iter().enumerate() {
            if merged_into_previous[i] {
                continue;
            }

            let mut text = line.text.clone();
            let mut tokens = self.tokenizer.extract_all(&text);

            if let Some(reason) = self.classifier.non_item_reason(&text, tokens.len()) {
                debug!("Line {} skipped ({}): {}", line.line_number, reason, text);
                continue;
            }

            let indicator = self.classifier.has_product_indicator(&text);
            if tokens.len() < 2 && !indicator {
                continue;
            }

            // Incomplete rows pick up the pricing that wrapped onto a later line.
            if tokens.len() < 3 {
                for j in (i + 1)..logical.len().min(i + 1 + MERGE_LOOKAHEAD) {
                    if merged_into_previous[j] {
                        break;
                    }
                    let next = &logical[j].text;
                    let next_tokens = self.tokenizer.extract_all(next);
                    if self.is_pricing_continuation(next, &next_tokens) {
                        debug!(
                            "Merging pricing line {} into line {}",
                            logical[j].line_number, line.line_number
                        );
                        text = format!("{} {}", text, next);
                        tokens = self.tokenizer.extract_all(&text);
                        merged_into_previous[j] = true;
                        break;
                    }
                    if !next_tokens.is_empty() {
                        break;
                    }
                }
            }

            if tokens.len() >= 2 || (tokens.len() == 1 && indicator) {
                candidates.push(CandidateLine {
                    line_number: line.line_number,
                    text,
                    tokens,
                });
            }
        }

        debug!("Scanned {} logical lines, {} candidates", logical.len(), candidates.len());
        candidates
    }

    /// Fold continuation lines into the numeric row they follow.
    fn reconstruct(&self, text: &str) -> Vec<LogicalLine> {
        let physical: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty())
            .collect();

        let mut logical = Vec::with_capacity(physical.len());
        let mut i = 0;

        while i < physical.len() {
            let (line_number, first) = physical[i];
            let mut joined = first.to_string();
            i += 1;

            if self.tokenizer.extract_all(first).len() >= 2 {
                let mut absorbed = 0;
                while absorbed < MAX_CONTINUATION_LINES && i < physical.len() {
                    let next = physical[i].1;
                    if !self.is_continuation(next) {
                        break;
                    }
                    joined.push(' ');
                    joined.push_str(next);
                    absorbed += 1;
                    i += 1;
                }
            }

            logical.push(LogicalLine {
                line_number,
                text: joined,
            });
        }

        logical
    }

    fn is_continuation(&self, line: &str) -> bool {
        let token_count = self.tokenizer.extract_all(line).len();

        token_count <= 1
            && self.lexicon.has_continuation_word(line)
            && !ITEM_START.is_match(line)
            && !self.classifier.has_product_indicator(line)
            && self.classifier.non_item_reason(line, token_count).is_none()
    }

    fn is_pricing_continuation(&self, line: &str, tokens: &[NumericToken]) -> bool {
        !tokens.is_empty()
            && tokens.iter().any(|t| t.has_currency)
            && line.chars().count() <= PRICING_CONTINUATION_MAX_LEN
            && !ITEM_START.is_match(line)
            && !self.classifier.has_product_indicator(line)
            && self.classifier.non_item_reason(line, tokens.len()).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn raws(text: &str) -> Vec<String> {
        TokenExtractor::new()
            .extract_all(text)
            .into_iter()
            .map(|t| t.raw)
            .collect()
    }

    #[test]
    fn test_tokens_respect_word_boundaries() {
        assert_eq!(raws("ESTOP-GEN2-4 Emergency stop 2 45.00 90.00"), vec!["2", "45.00", "90.00"]);
        assert_eq!(raws("19_5-basebalancer-05: Clear PC 6 $240.92 $1,445.52"), vec![
            "6", "$240.92", "$1,445.52"
        ]);
        assert_eq!(raws("Dated 01/15/2024"), Vec::<String>::new());
        assert_eq!(raws("Qty:5, 10pcs @12.50."), vec!["5", "10", "12.50"]);
    }

    #[test]
    fn test_token_details() {
        let tokens = TokenExtractor::new().extract_all("Bolt M6 $1.234,50 8.25%");
        assert_eq!(tokens.len(), 2);

        assert!(tokens[0].has_currency);
        assert_eq!(tokens[0].normalized, Some(dec("1234.50")));
        assert_eq!(tokens[0].position, (8, 17));
        assert!(tokens[0].context.contains("Bolt M6"));

        assert!(tokens[1].is_percentage);
        assert_eq!(tokens[1].normalized, Some(dec("8.25")));
    }

    #[test]
    fn test_clean_text() {
        let text = "Widget (cid:12)2 5.00 10.00\r\n=== PAGE 2 ===\r\nNext";
        let cleaned = clean_text(text);
        assert_eq!(cleaned, "Widget 2 5.00 10.00\n\nNext");
        assert!(cid_ratio("(cid:1)(cid:2)") > 0.1);
        assert_eq!(cid_ratio(""), 0.0);
    }

    #[test]
    fn test_continuation_lines_are_folded() {
        let text = "19_5-basebalancer-05: Clear PC Material, 6 $240.92 $1,445.52\n\
                    Machine and De-burr\n\
                    TOOLING SETUP 1 $2,000.00 $2,000.00";
        let lines = scan(text);

        assert_eq!(lines.len(), 2);
        assert!(lines[0].text.ends_with("Machine and De-burr"));
        assert_eq!(lines[0].line_number, 1);
        assert_eq!(lines[0].tokens.len(), 3);
        assert_eq!(lines[1].line_number, 3);
    }

    #[test]
    fn test_non_item_lines_are_skipped() {
        let text = "ACME Manufacturing Inc.\n\
                    123 Main Street, Suite 400\n\
                    San Jose, CA 95112\n\
                    Phone: (408) 555-1234\n\
                    Quote #: Q-2024-001\n\
                    Date: 01/15/2024\n\
                    Description Qty Unit Price Amount\n\
                    Widget Assembly 2 50.00 100.00\n\
                    Freight Shipping 1 150.00 150.00\n\
                    SUBTOTAL $100.00\n\
                    TOTAL $100.00";
        let lines = scan(text);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Widget Assembly 2 50.00 100.00");
    }

    #[test]
    fn test_pricing_line_is_merged() {
        let text = "ESTOP-4 Emergency stop button 2\n$45.00 $90.00";
        let lines = scan(text);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "ESTOP-4 Emergency stop button 2 $45.00 $90.00");
        assert_eq!(lines[0].tokens.len(), 3);
    }

    #[test]
    fn test_single_token_needs_indicator() {
        assert!(scan("Mounting bracket 45.00").is_empty());
        assert_eq!(scan("Mounting bracket $45.00").len(), 1);
    }
}
