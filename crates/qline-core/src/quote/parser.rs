//! Line item parsing pipeline: scan, assign roles, describe, group and
//! reconcile.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::models::config::{ExtractionConfig, PdfConfig, QlineConfig};
use crate::models::quote::ParseResult;

use super::rules::{
    clean_text, cid_ratio, detect_currency, extract_adjustments, group, reconcile, summarize,
    Currency, DescriptionExtractor, LineScanner, NumericToken, RoleEngine,
};
use super::QuoteParser;

/// How one emitted line item was found.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDiagnostic {
    /// 1-based line the item starts on.
    pub line_number: usize,
    pub description: String,
    /// Name of the role strategy that won.
    pub strategy: &'static str,
    pub confidence: f32,
}

/// Result of a detailed parse.
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    /// Parsed quote.
    pub result: ParseResult,
    /// One entry per emitted line item, in document order.
    pub items: Vec<ItemDiagnostic>,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Candidate lines handed to the role engine.
    pub candidates_scanned: usize,
    /// Detected document currency.
    pub currency: Currency,
    /// Share of `cid:` glyph artifacts in the input.
    pub cid_ratio: f32,
    /// Whether the input looked like a broken font extraction.
    pub degraded: bool,
    /// Whether a stated subtotal/total was found and agreed.
    pub reconciled: bool,
    /// Number of summary adjustments found.
    pub adjustments_found: usize,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Quality score (0-100) used to compare results from different sources.
pub fn score_result(report: &ExtractionReport) -> f32 {
    if report.result.is_empty() {
        return 0.0;
    }

    let items = report.result.item_count();
    let mut score = 20.0 + (15.0 * items as f32).min(75.0);
    if items == 1 {
        score -= 30.0;
    }
    if report.reconciled {
        score += 10.0;
    }
    score += (5.0 * report.adjustments_found as f32).min(15.0);
    if report.degraded {
        score -= 50.0;
    }

    score.clamp(0.0, 100.0)
}

/// Rule-based line item parser.
pub struct LineItemParser {
    config: ExtractionConfig,
    engine: RoleEngine,
    cid_threshold: f32,
}

impl LineItemParser {
    /// Create a parser with default settings.
    pub fn new() -> Self {
        Self::with_config(ExtractionConfig::default())
    }

    pub fn with_config(config: ExtractionConfig) -> Self {
        Self {
            engine: RoleEngine::new(&config),
            config,
            cid_threshold: PdfConfig::default().cid_ratio_threshold,
        }
    }

    pub fn from_config(config: &QlineConfig) -> Self {
        Self::with_config(config.extraction.clone())
            .with_cid_threshold(config.pdf.cid_ratio_threshold)
    }

    /// Set minimum confidence threshold.
    pub fn with_min_confidence(mut self, confidence: f32) -> Self {
        self.config.min_confidence = confidence;
        self.engine = RoleEngine::new(&self.config);
        self
    }

    /// Set the `cid:` ratio above which input counts as degraded.
    pub fn with_cid_threshold(mut self, threshold: f32) -> Self {
        self.cid_threshold = threshold;
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    fn default_currency(&self) -> Currency {
        Currency::from_code(&self.config.default_currency).unwrap_or_else(|| {
            warn!(
                "Unknown default currency {:?}, using USD",
                self.config.default_currency
            );
            Currency::Usd
        })
    }

    /// Parse text and report how every item was found.
    pub fn parse_detailed(&self, text: &str) -> ExtractionReport {
        let start = Instant::now();
        let mut warnings = Vec::new();

        let ratio = cid_ratio(text);
        let degraded = ratio > self.cid_threshold;
        if degraded {
            warn!("Text looks degraded: cid ratio {:.3}", ratio);
            warnings.push(format!("degraded text: cid ratio {:.3}", ratio));
        }

        let currency = detect_currency(text, self.default_currency());

        let scanner = LineScanner::new(&self.config.lexicon)
            .with_keyword_window(self.config.keyword_window);
        let describer = DescriptionExtractor::new(&self.config.lexicon, self.config.max_suffix_len);

        let candidates = scanner.scan(text);
        let mut items = Vec::new();
        let mut diagnostics = Vec::new();

        for candidate in &candidates {
            let Some(found) = self.engine.assign(&candidate.text, &candidate.tokens) else {
                debug!(
                    "Line {}: no valid role assignment: {}",
                    candidate.line_number, candidate.text
                );
                continue;
            };

            let consumed: Vec<NumericToken> = found
                .value
                .consumed
                .iter()
                .filter_map(|i| candidate.tokens.get(*i).cloned())
                .collect();

            let Some(description) = describer.extract(&candidate.text, &consumed) else {
                debug!(
                    "Line {}: no usable description: {}",
                    candidate.line_number, candidate.text
                );
                continue;
            };

            if !found.value.verified {
                warnings.push(format!(
                    "line {}: quantity defaulted to 1 for {:?}",
                    candidate.line_number, description
                ));
            }

            diagnostics.push(ItemDiagnostic {
                line_number: candidate.line_number,
                description: description.clone(),
                strategy: found.value.strategy,
                confidence: found.confidence,
            });
            items.push(found.value.into_line_item(description));
        }

        let result = summarize(group(items));
        let adjustments = extract_adjustments(&clean_text(text));
        let reconciliation = reconcile(result, &adjustments);
        let reconciled = reconciliation.is_consistent();
        warnings.extend(reconciliation.mismatches.iter().cloned());

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Parsed {} line items in {} groups from {} candidates ({} ms)",
            diagnostics.len(),
            reconciliation.result.groups.len(),
            candidates.len(),
            processing_time_ms
        );

        ExtractionReport {
            result: reconciliation.result,
            items: diagnostics,
            warnings,
            candidates_scanned: candidates.len(),
            currency,
            cid_ratio: ratio,
            degraded,
            reconciled,
            adjustments_found: adjustments.len(),
            processing_time_ms,
        }
    }
}

impl Default for LineItemParser {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteParser for LineItemParser {
    fn parse(&self, text: &str) -> ParseResult {
        self.parse_detailed(text).result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTE: &str = "ACME Manufacturing Inc.\n\
                         Quote #: Q-2024-001\n\
                         Description Qty Unit Price Amount\n\
                         BASE MATERIAL    6    240.92    1445.52\n\
                         SOLDER ASSEMBLY  6    213.42    1280.52\n\
                         TOOLING SETUP    1    2000.00   2000.00\n\
                         Subtotal: $4,726.04";

    #[test]
    fn test_parse_detailed() {
        let report = LineItemParser::new().parse_detailed(QUOTE);

        assert_eq!(report.items.len(), 3);
        assert_eq!(report.items[0].line_number, 4);
        assert_eq!(report.items[0].description, "BASE MATERIAL");
        assert!(report.items.iter().all(|d| d.confidence >= 0.5));
        assert_eq!(report.candidates_scanned, 3);
        assert_eq!(report.currency, Currency::Usd);
        assert!(report.reconciled);
        assert!(!report.degraded);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_score_result() {
        let parser = LineItemParser::new();

        let report = parser.parse_detailed(QUOTE);
        // 20 + 45 + 10 (reconciled) + 5 (one adjustment)
        assert_eq!(score_result(&report), 80.0);

        let single = parser.parse_detailed("Widget Assembly 2 50.00 100.00");
        assert_eq!(score_result(&single), 5.0);

        let empty = parser.parse_detailed("nothing to see");
        assert_eq!(score_result(&empty), 0.0);
    }

    #[test]
    fn test_degraded_text_is_flagged() {
        let text = "(cid:3)(cid:4)(cid:5) Widget 2 50.00 100.00";
        let report = LineItemParser::new().parse_detailed(text);

        assert!(report.degraded);
        assert_eq!(report.result.item_count(), 1);
        assert!(report.warnings[0].starts_with("degraded text"));
        assert_eq!(score_result(&report), 0.0);
    }

    #[test]
    fn test_default_currency_from_config() {
        let config = ExtractionConfig {
            default_currency: "EUR".to_string(),
            ..Default::default()
        };
        let report = LineItemParser::with_config(config).parse_detailed("Bolt 4 2.50 10.00");
        assert_eq!(report.currency, Currency::Eur);
    }

    #[test]
    fn test_min_confidence_filters_weak_assignments() {
        let text = "Mounting bracket $45.00 $90.00";

        assert_eq!(LineItemParser::new().parse(text).item_count(), 1);
        assert!(LineItemParser::new().with_min_confidence(0.8).parse(text).is_empty());
    }
}
