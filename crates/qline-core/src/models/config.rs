//! Configuration structures for the quote parsing pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{QlineError, Result};
use crate::quote::rules::{Currency, Lexicon};

/// Main configuration for the qline pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QlineConfig {
    /// Line item extraction configuration.
    pub extraction: ExtractionConfig,

    /// PDF text acquisition configuration.
    pub pdf: PdfConfig,

    /// Fallback chain configuration.
    pub chain: ChainConfig,
}

/// Line item extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum confidence for accepting a role assignment.
    pub min_confidence: f32,

    /// Smallest accepted per-line quantity.
    pub quantity_min: Decimal,

    /// Largest accepted per-line quantity.
    pub quantity_max: Decimal,

    /// Characters around a number searched for quantity keywords.
    pub keyword_window: usize,

    /// Longest trailing text appended to a description.
    pub max_suffix_len: usize,

    /// Emit two-number lines as quantity 1 when the quantity cannot be
    /// inferred. Such items do not satisfy the arithmetic check.
    pub allow_unit_quantity_fallback: bool,

    /// Currency code assumed when none is detected.
    pub default_currency: String,

    /// Keyword lists used by the scanner, engine and description extractor.
    pub lexicon: Lexicon,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            quantity_min: Decimal::ONE,
            quantity_max: Decimal::from(100_000),
            keyword_window: 20,
            max_suffix_len: 100,
            allow_unit_quantity_fallback: false,
            default_currency: "USD".to_string(),
            lexicon: Lexicon::default(),
        }
    }
}

/// PDF text acquisition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Minimum text length to consider a PDF as text-based.
    pub min_text_length: usize,

    /// Ratio of `cid:` artifacts to characters above which text is degraded.
    pub cid_ratio_threshold: f32,

    /// Insert `=== PAGE n ===` markers between pages.
    pub page_markers: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            min_text_length: 50,
            cid_ratio_threshold: 0.05,
            page_markers: true,
        }
    }
}

/// Fallback chain configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Quality score (0-100) at which the chain stops trying further sources.
    pub accept_score: f32,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self { accept_score: 70.0 }
    }
}

impl QlineConfig {
    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let extraction = &self.extraction;
        if !(0.0..=1.0).contains(&extraction.min_confidence) {
            return Err(QlineError::Config(format!(
                "extraction.min_confidence must be within 0..=1, got {}",
                extraction.min_confidence
            )));
        }
        if extraction.quantity_min <= Decimal::ZERO
            || extraction.quantity_min > extraction.quantity_max
        {
            return Err(QlineError::Config(format!(
                "extraction quantity range {}..={} is empty or not positive",
                extraction.quantity_min, extraction.quantity_max
            )));
        }
        if Currency::from_code(&extraction.default_currency).is_none() {
            return Err(QlineError::Config(format!(
                "unknown default currency {:?}",
                extraction.default_currency
            )));
        }
        if !(0.0..=1.0).contains(&self.pdf.cid_ratio_threshold) {
            return Err(QlineError::Config(format!(
                "pdf.cid_ratio_threshold must be within 0..=1, got {}",
                self.pdf.cid_ratio_threshold
            )));
        }
        Ok(())
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> std::io::Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
