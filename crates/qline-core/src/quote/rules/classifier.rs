//! Structural line classification: which lines can never be line items.
//!
//! Address detection needs a structural signal (ZIP with a state code or an
//! address word, a street suffix after a house number, a suite or P.O. box,
//! or two address words). A lone keyword such as "box" is not enough.

use std::fmt;

use regex::Regex;

use super::lexicon::Lexicon;
use super::patterns::*;

/// Why a line or description was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    FinancialSummary,
    DocumentMetadata,
    ContactInfo,
    Address,
    TermsAndConditions,
    ShippingCharge,
    HeaderRow,
    CompanyName,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::FinancialSummary => "financial summary",
            RejectReason::DocumentMetadata => "document metadata",
            RejectReason::ContactInfo => "contact info",
            RejectReason::Address => "address",
            RejectReason::TermsAndConditions => "terms and conditions",
            RejectReason::ShippingCharge => "shipping charge",
            RejectReason::HeaderRow => "header row",
            RejectReason::CompanyName => "company name",
        };
        f.write_str(s)
    }
}

/// Line classifier backed by the shared pattern tables and a lexicon.
pub struct LineClassifier<'a> {
    lexicon: &'a Lexicon,
}

impl<'a> LineClassifier<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self { lexicon }
    }

    /// Reason a scanned line is not a line item, if any.
    ///
    /// `token_count` is the number of numeric tokens found on the line.
    pub fn non_item_reason(&self, line: &str, token_count: usize) -> Option<RejectReason> {
        let line = line.trim();

        if FINANCIAL_TERM.is_match(line) || FINANCIAL_LINE_START.is_match(line) {
            return Some(RejectReason::FinancialSummary);
        }
        if DOCUMENT_METADATA.is_match(line) {
            return Some(RejectReason::DocumentMetadata);
        }
        if self.is_contact(line) {
            return Some(RejectReason::ContactInfo);
        }
        if self.is_address(line) {
            return Some(RejectReason::Address);
        }
        if TERMS_AND_CONDITIONS.is_match(line) || (token_count <= 1 && TERMS_NOTE.is_match(line))
        {
            return Some(RejectReason::TermsAndConditions);
        }
        if token_count <= 1 && HEADER_WORD.find_iter(line).count() >= 3 {
            return Some(RejectReason::HeaderRow);
        }
        if self.is_shipping_charge(&strip_numbers(line)) {
            return Some(RejectReason::ShippingCharge);
        }
        if COMPANY_SUFFIX.is_match(line)
            && !self.lexicon.has_product_keyword(line)
            && !self.lexicon.has_material(line)
        {
            return Some(RejectReason::CompanyName);
        }

        None
    }

    /// Reason a recovered description is not a product, if any.
    pub fn description_reason(&self, description: &str) -> Option<RejectReason> {
        if FINANCIAL_TERM.is_match(description) || FINANCIAL_LINE_START.is_match(description) {
            return Some(RejectReason::FinancialSummary);
        }
        if TERMS_AND_CONDITIONS.is_match(description) {
            return Some(RejectReason::TermsAndConditions);
        }
        if self.is_shipping_charge(description) {
            return Some(RejectReason::ShippingCharge);
        }
        if self.is_contact(description) {
            return Some(RejectReason::ContactInfo);
        }
        if self.is_address(description) {
            return Some(RejectReason::Address);
        }
        None
    }

    pub fn is_address(&self, line: &str) -> bool {
        if has_zip(&CITY_STATE_ZIP, line)
            || has_zip(&STATE_ZIP, line)
            || PO_BOX.is_match(line)
            || SUITE_NUMBER.is_match(line)
        {
            return true;
        }

        let keywords = self.lexicon.address_keyword_count(line);
        if keywords >= 2 {
            return true;
        }

        keywords >= 1 && (STREET_ADDRESS.is_match(line) || has_zip(&ZIP_CODE, line))
    }

    pub fn is_contact(&self, line: &str) -> bool {
        CONTACT_LABEL.is_match(line)
            || EMAIL.is_match(line)
            || WEBSITE.is_match(line)
            || PHONE.is_match(line)
    }

    /// Whether a description is only a shipping/handling/freight charge.
    ///
    /// Four or more words, a part number or a material keyword make it a
    /// product regardless of shipping vocabulary.
    pub fn is_shipping_charge(&self, description: &str) -> bool {
        let text = description.trim().trim_end_matches([':', '-', '.']).trim();
        if text.is_empty() {
            return false;
        }
        if text.split_whitespace().count() >= 4
            || PART_NUMBER.is_match(text)
            || self.lexicon.has_material(text)
        {
            return false;
        }

        SHIPPING_CHARGE.is_match(&WHITESPACE_RUN.replace_all(text, " "))
    }

    /// Strong evidence that a line describes a product even with few numbers.
    pub fn has_product_indicator(&self, line: &str) -> bool {
        if PART_NUMBER.is_match(line) || ITEM_START.is_match(line.trim_start()) {
            return true;
        }

        let has_currency = line
            .chars()
            .any(|c| super::numbers::CURRENCY_SYMBOLS.contains(&c));
        has_currency && (self.lexicon.has_product_keyword(line) || self.lexicon.has_material(line))
    }
}

/// Whether `pattern` matches a ZIP that is not the integer part of an
/// amount such as `12500.00`.
fn has_zip(pattern: &Regex, line: &str) -> bool {
    pattern.find_iter(line).any(|m| {
        let mut after = line[m.end()..].chars();
        !matches!(
            (after.next(), after.next()),
            (Some('.' | ','), Some(d)) if d.is_ascii_digit()
        )
    })
}

/// Line text with numeric tokens, currency and separators removed.
fn strip_numbers(line: &str) -> String {
    let stripped = NUMBER_TOKEN.replace_all(line, " ");
    let words: String = stripped
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '&' { c } else { ' ' })
        .collect();
    WHITESPACE_RUN.replace_all(words.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> LineClassifier<'static> {
        LineClassifier::new(&super::super::lexicon::DEFAULT_LEXICON)
    }

    #[test]
    fn test_address_requires_structure() {
        let c = classifier();

        assert!(c.is_address("123 Main Street, Suite 400"));
        assert!(c.is_address("San Jose, CA 95112"));
        assert!(c.is_address("P.O. Box 1234"));
        assert!(!c.is_address("Tool Box 2 15.00 30.00"));
        assert!(!c.is_address("TOOLING 1 10000 10000"));
        assert!(!c.is_address("Servo Drive 2 150.00 300.00"));
    }

    #[test]
    fn test_five_digit_amounts_are_not_zips() {
        let c = classifier();

        assert!(!c.is_address("Tool Box 1 12500.00 12500.00"));
        assert!(!c.is_address("Floor Panel 2 12500.00 25000.00"));
        assert!(!c.is_address("Control Cabinet, made in USA 1 18250.00 18250.00"));
        assert!(!c.is_address("Crate CA 12500.00"));
        assert!(c.is_address("Shipping address 95112"));
        assert!(c.is_address("Austin, TX 78701."));
    }

    #[test]
    fn test_terms_words_only_reject_unpriced_lines() {
        let c = classifier();

        assert_eq!(c.non_item_reason("Extended warranty 1 500.00 500.00", 3), None);
        assert_eq!(c.non_item_reason("Lead time reduction 1 250.00 250.00", 3), None);
        assert_eq!(
            c.non_item_reason("Warranty: 12 months from delivery", 1),
            Some(RejectReason::TermsAndConditions)
        );
        assert_eq!(
            c.non_item_reason("Terms and Conditions apply 2 5.00 10.00", 3),
            Some(RejectReason::TermsAndConditions)
        );
        assert_eq!(c.description_reason("Extended warranty"), None);
    }

    #[test]
    fn test_contact_info() {
        let c = classifier();

        assert!(c.is_contact("Phone: (408) 555-1234"));
        assert!(c.is_contact("sales@acme.com"));
        assert!(c.is_contact("www.acme.com"));
        assert!(!c.is_contact("BASE MATERIAL 6 240.92 1445.52"));
    }

    #[test]
    fn test_non_item_lines() {
        let c = classifier();

        assert_eq!(
            c.non_item_reason("SUBTOTAL $100.00", 1),
            Some(RejectReason::FinancialSummary)
        );
        assert_eq!(c.non_item_reason("TAX 10%", 1), Some(RejectReason::FinancialSummary));
        assert_eq!(
            c.non_item_reason("Quote #: Q-2024-001", 0),
            Some(RejectReason::DocumentMetadata)
        );
        assert_eq!(
            c.non_item_reason("Page 1 of 2", 2),
            Some(RejectReason::DocumentMetadata)
        );
        assert_eq!(
            c.non_item_reason("Description Qty Unit Price Amount", 0),
            Some(RejectReason::HeaderRow)
        );
        assert_eq!(
            c.non_item_reason("Freight Shipping 1 150.00 150.00", 3),
            Some(RejectReason::ShippingCharge)
        );
        assert_eq!(
            c.non_item_reason("ACME Manufacturing Inc.", 0),
            Some(RejectReason::CompanyName)
        );
        assert_eq!(c.non_item_reason("BASE MATERIAL 6 240.92 1445.52", 3), None);
        assert_eq!(c.non_item_reason("TOOLING SETUP 1 2000.00 2000.00", 3), None);
    }

    #[test]
    fn test_shipping_charge_rule() {
        let c = classifier();

        assert!(c.is_shipping_charge("Freight Shipping"));
        assert!(c.is_shipping_charge("Handling Fee"));
        assert!(c.is_shipping_charge("Shipping:"));
        assert!(!c.is_shipping_charge("Shipping Container Latch Assembly"));
        assert!(!c.is_shipping_charge("Shipping Steel"));
        assert!(!c.is_shipping_charge("FRT-100 Freight"));
    }

    #[test]
    fn test_product_indicator() {
        let c = classifier();

        assert!(c.has_product_indicator("ESTOP-GEN2-4 Emergency stop"));
        assert!(c.has_product_indicator("Mounting bracket $45.00"));
        assert!(c.has_product_indicator("19_5-basebalancer-05: Clear PC"));
        assert!(!c.has_product_indicator("Mounting bracket"));
    }
}
