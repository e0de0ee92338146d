//! Error types for the qline-core library.

use thiserror::Error;

/// Main error type for the qline library.
#[derive(Error, Debug)]
pub enum QlineError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Text acquisition or extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors raised while acquiring text for the line item engine.
///
/// Finding no line items is not an error; these only cover the case where
/// there is no text to look at.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// A text source produced nothing but whitespace.
    #[error("text source produced no text")]
    EmptyText,

    /// A named text source failed.
    #[error("source {name} failed: {reason}")]
    Source { name: String, reason: String },

    /// Every source in a fallback chain failed.
    #[error("no text source produced usable text")]
    NoUsableSource,
}

/// Result type for the qline library.
pub type Result<T> = std::result::Result<T, QlineError>;
