//! Supplier quote line item extraction.

mod parser;
pub mod rules;
mod sources;

pub use parser::{score_result, ExtractionReport, ItemDiagnostic, LineItemParser};
#[cfg(feature = "pdf")]
pub use sources::PdfText;
pub use sources::{
    AttemptOutcome, ChainAttempt, ChainOutcome, RawText, SourceChain, TextFile, TextSource,
};

use crate::models::quote::ParseResult;

/// Trait for quote parsing.
///
/// Parsing never fails: text without recognizable line items yields
/// [`ParseResult::empty`].
pub trait QuoteParser {
    /// Parse line items, groups and summary from extracted page text.
    fn parse(&self, text: &str) -> ParseResult;
}
