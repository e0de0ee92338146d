//! Core library for supplier quote parsing.
//!
//! This crate provides:
//! - PDF text acquisition (lopdf / pdf-extract)
//! - Line item discovery: candidate scanning, quantity/price/total role
//!   assignment and description recovery
//! - Grouping by quantity price break and summary adjustment reconciliation
//! - A scored fallback chain over several text sources

pub mod error;
pub mod models;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod quote;

pub use error::{QlineError, Result};
pub use models::config::QlineConfig;
pub use models::quote::{
    Adjustment, AdjustmentKind, AppliedAdjustment, LineItem, ParseResult, QuoteGroup, QuoteSummary,
};
#[cfg(feature = "pdf")]
pub use pdf::{PdfContent, PdfExtractor, PdfProcessor, PdfType};
pub use quote::{ExtractionReport, LineItemParser, QuoteParser, SourceChain, TextSource};
