//! Rule-based building blocks for quote line item discovery.

pub mod adjustments;
pub mod classifier;
pub mod currency;
pub mod description;
pub mod grouping;
pub mod lexicon;
pub mod numbers;
pub mod patterns;
pub mod roles;
pub mod scanner;

pub use adjustments::{apply, extract_adjustments, reconcile, AdjustmentExtractor, Reconciliation};
pub use classifier::{LineClassifier, RejectReason};
pub use currency::{detect_currency, format_money, Currency, CurrencyDetector};
pub use description::{extract_description, DescriptionExtractor};
pub use grouping::{group, summarize};
pub use lexicon::{Lexicon, DEFAULT_LEXICON};
pub use numbers::{money, normalize, parse_amount};
pub use roles::{assign_roles, RoleAssignment, RoleEngine, RoleStrategy, Tolerance};
pub use scanner::{cid_ratio, clean_text, scan, CandidateLine, LineScanner, NumericToken, TokenExtractor};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
