//! Summary adjustments (subtotal, tax, charges, discounts, total) and their
//! application to the computed line item total.

use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::numbers::{money, parse_amount};
use super::patterns::{
    DISCOUNT_AMOUNT, DISCOUNT_PERCENT, FREIGHT, HANDLING, SHIPPING, SUBTOTAL, TAX_AMOUNT,
    TAX_PERCENT, TOTAL,
};
use super::{ExtractionMatch, FieldExtractor};
use crate::models::quote::{Adjustment, AdjustmentKind, AppliedAdjustment, ParseResult};

/// Pattern table in match order. The first pattern matching a line wins.
fn pattern_table() -> [(&'static Regex, AdjustmentKind); 9] {
    [
        (&*SUBTOTAL, AdjustmentKind::Subtotal),
        (&*TAX_AMOUNT, AdjustmentKind::TaxAmount),
        (&*TAX_PERCENT, AdjustmentKind::TaxPercentage),
        (&*SHIPPING, AdjustmentKind::Shipping),
        (&*HANDLING, AdjustmentKind::Handling),
        (&*FREIGHT, AdjustmentKind::Freight),
        (&*DISCOUNT_AMOUNT, AdjustmentKind::DiscountAmount),
        (&*DISCOUNT_PERCENT, AdjustmentKind::DiscountPercentage),
        (&*TOTAL, AdjustmentKind::Total),
    ]
}

/// Line-anchored adjustment extractor.
#[derive(Debug, Clone, Default)]
pub struct AdjustmentExtractor;

impl AdjustmentExtractor {
    pub fn new() -> Self {
        Self
    }

    fn match_line(&self, line: &str) -> Option<ExtractionMatch<Adjustment>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        for (pattern, kind) in pattern_table() {
            let Some(caps) = pattern.captures(trimmed) else {
                continue;
            };
            let Some(amount) = caps.name("amount") else {
                continue;
            };
            let Some(mut value) = parse_amount(amount.as_str()) else {
                continue;
            };
            if matches!(
                kind,
                AdjustmentKind::DiscountAmount | AdjustmentKind::DiscountPercentage
            ) {
                value = value.abs();
            }

            let adjustment = Adjustment {
                kind,
                value,
                is_percentage: kind.is_percentage(),
                raw_text: trimmed.to_string(),
            };
            return Some(
                ExtractionMatch::new(adjustment, 0.9, trimmed)
                    .with_position(amount.start(), amount.end()),
            );
        }

        None
    }
}

impl FieldExtractor for AdjustmentExtractor {
    type Output = Adjustment;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        text.lines()
            .find_map(|line| self.match_line(line))
            .map(|m| m.value)
    }

    /// All adjustments in document order, without repeated (kind, value)
    /// pairs such as a total printed on every page.
    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut found: Vec<Adjustment> = Vec::new();
        for m in text.lines().filter_map(|line| self.match_line(line)) {
            let adjustment = m.value;
            if found
                .iter()
                .any(|a| a.kind == adjustment.kind && a.value == adjustment.value)
            {
                continue;
            }
            debug!("Adjustment {}: {}", adjustment.kind, adjustment.raw_text);
            found.push(adjustment);
        }
        found
    }
}

pub fn extract_adjustments(text: &str) -> Vec<Adjustment> {
    AdjustmentExtractor::new().extract_all(text)
}

/// Outcome of applying adjustments to a result.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub result: ParseResult,
    /// Stated subtotal/total figures that disagreed with the computation.
    pub mismatches: Vec<String>,
    /// Number of stated subtotal/total figures compared.
    pub checked: usize,
}

impl Reconciliation {
    /// Every stated figure that was compared agreed with the computation.
    pub fn is_consistent(&self) -> bool {
        self.checked > 0 && self.mismatches.is_empty()
    }
}

/// Apply adjustments and return the updated result.
pub fn apply(result: ParseResult, adjustments: &[Adjustment]) -> ParseResult {
    reconcile(result, adjustments).result
}

/// Apply adjustments in stage order (subtotal, tax, charges, discount,
/// total) to a running total seeded with the computed line item total.
///
/// A stated subtotal or total more than one cent away from the running
/// figure replaces it; the disagreement is logged and reported. An
/// adjustment whose arithmetic overflows is skipped.
pub fn reconcile(mut result: ParseResult, adjustments: &[Adjustment]) -> Reconciliation {
    if result.is_empty() {
        return Reconciliation {
            result,
            mismatches: Vec::new(),
            checked: 0,
        };
    }

    let cent = Decimal::new(1, 2);

    let mut ordered: Vec<&Adjustment> = adjustments.iter().collect();
    ordered.sort_by_key(|a| a.kind.stage());

    let computed = result.summary.total_cost;
    let mut running = computed;
    let mut steps = Vec::new();
    let mut applied = Vec::new();
    let mut mismatches = Vec::new();
    let mut checked = 0;

    if !ordered.iter().any(|a| a.kind == AdjustmentKind::Subtotal) {
        steps.push(format!("Subtotal: {}", running));
    }
    let mut subtotal = running;

    for adjustment in ordered {
        let value = money(adjustment.value);
        let rate = adjustment.value.normalize();

        let applied_amount = match adjustment.kind {
            AdjustmentKind::Subtotal | AdjustmentKind::Total => {
                checked += 1;
                let label = adjustment.kind.label();
                let agrees = value
                    .checked_sub(running)
                    .is_some_and(|diff| diff.abs() <= cent);
                if !agrees {
                    warn!(
                        "{} mismatch: document states {}, computed {}",
                        label, value, running
                    );
                    mismatches.push(format!(
                        "{}: document {}, computed {}",
                        label, value, running
                    ));
                    steps.push(format!("{} (document): {}, computed {}", label, value, running));
                    running = value;
                } else if adjustment.kind == AdjustmentKind::Subtotal {
                    steps.push(format!("Subtotal: {}", running));
                }
                if adjustment.kind == AdjustmentKind::Subtotal {
                    subtotal = running;
                }
                Some(value)
            }
            AdjustmentKind::TaxAmount
            | AdjustmentKind::Shipping
            | AdjustmentKind::Handling
            | AdjustmentKind::Freight => running.checked_add(value).map(|next| {
                running = next;
                steps.push(format!("+ {}: {}", adjustment.kind.label(), value));
                value
            }),
            AdjustmentKind::TaxPercentage => percent_of(running, adjustment.value).and_then(|amount| {
                let next = running.checked_add(amount)?;
                running = next;
                steps.push(format!("+ Tax ({}%): {}", rate, amount));
                Some(amount)
            }),
            AdjustmentKind::DiscountAmount => running.checked_sub(value).map(|next| {
                running = next;
                steps.push(format!("- Discount: {}", value));
                value
            }),
            AdjustmentKind::DiscountPercentage => percent_of(running, adjustment.value).and_then(|amount| {
                let next = running.checked_sub(amount)?;
                running = next;
                steps.push(format!("- Discount ({}%): {}", rate, amount));
                Some(amount)
            }),
        };

        let Some(amount) = applied_amount else {
            warn!("Skipping {}: amount overflows the running total", adjustment.raw_text);
            continue;
        };

        applied.push(AppliedAdjustment {
            kind: adjustment.kind,
            description: adjustment.raw_text.clone(),
            amount,
        });
    }

    let final_total = money(running);
    steps.push(format!("= Final Total: {}", final_total));

    result.summary.subtotal = money(subtotal);
    result.summary.final_total = final_total;
    result.summary.adjustments = applied;
    result.summary.calculation_steps = steps;

    Reconciliation {
        result,
        mismatches,
        checked,
    }
}

/// `rate` percent of `base`, in cents.
fn percent_of(base: Decimal, rate: Decimal) -> Option<Decimal> {
    rate.checked_div(Decimal::ONE_HUNDRED)
        .and_then(|fraction| base.checked_mul(fraction))
        .map(money)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quote::{QuoteGroup, QuoteSummary};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn result_with_total(total: &str) -> ParseResult {
        ParseResult {
            summary: QuoteSummary {
                total_quantity: dec("2"),
                total_cost: dec(total),
                number_of_groups: 1,
                subtotal: dec(total),
                final_total: dec(total),
                ..Default::default()
            },
            groups: vec![QuoteGroup {
                quantity: dec("2"),
                unit_price: dec("50.00"),
                total_price: dec(total),
                line_items: Vec::new(),
            }],
        }
    }

    #[test]
    fn test_extract_adjustments() {
        let text = "Widget 2 50.00 100.00\n\
                    SUBTOTAL $100.00\n\
                    TAX 10%\n\
                    Shipping & Handling: $25.00\n\
                    Discount (5%): 6.75\n\
                    Less Discount 5%\n\
                    TOTAL €1.234,56";
        let found = extract_adjustments(text);
        let kinds: Vec<AdjustmentKind> = found.iter().map(|a| a.kind).collect();

        assert_eq!(
            kinds,
            vec![
                AdjustmentKind::Subtotal,
                AdjustmentKind::TaxPercentage,
                AdjustmentKind::Shipping,
                AdjustmentKind::DiscountAmount,
                AdjustmentKind::DiscountPercentage,
                AdjustmentKind::Total,
            ]
        );
        assert_eq!(found[1].value, dec("10"));
        assert!(found[1].is_percentage);
        assert_eq!(found[5].value, dec("1234.56"));
        assert_eq!(found[5].raw_text, "TOTAL €1.234,56");
    }

    #[test]
    fn test_repeated_totals_are_deduplicated() {
        let found = extract_adjustments("Total: $100.00\nPage 2\nTotal: $100.00");
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_tax_percentage_trail() {
        let adjustments = extract_adjustments("SUBTOTAL $100.00\nTAX 10%");
        let reconciled = reconcile(result_with_total("100.00"), &adjustments);
        let summary = &reconciled.result.summary;

        assert_eq!(summary.final_total.to_string(), "110.00");
        assert_eq!(summary.subtotal.to_string(), "100.00");
        assert_eq!(
            summary.calculation_steps,
            vec!["Subtotal: 100.00", "+ Tax (10%): 10.00", "= Final Total: 110.00"]
        );
        assert_eq!(summary.adjustments[1].amount.to_string(), "10.00");
        assert!(reconciled.is_consistent());
    }

    #[test]
    fn test_fixed_order_regardless_of_document_order() {
        let adjustments = extract_adjustments("Discount: 10.00\nShipping: 20.00\nTax: 8.00");
        let result = apply(result_with_total("100.00"), &adjustments);

        assert_eq!(
            result.summary.calculation_steps,
            vec![
                "Subtotal: 100.00",
                "+ Tax: 8.00",
                "+ Shipping: 20.00",
                "- Discount: 10.00",
                "= Final Total: 118.00"
            ]
        );
    }

    #[test]
    fn test_document_total_wins() {
        let adjustments = extract_adjustments("Subtotal: 105.00\nTotal: 120.00");
        let reconciled = reconcile(result_with_total("100.00"), &adjustments);
        let summary = &reconciled.result.summary;

        assert_eq!(reconciled.mismatches.len(), 2);
        assert_eq!(summary.subtotal.to_string(), "105.00");
        assert_eq!(summary.final_total.to_string(), "120.00");
        assert_eq!(summary.total_cost.to_string(), "100.00");
        assert_eq!(
            summary.calculation_steps[0],
            "Subtotal (document): 105.00, computed 100.00"
        );
        assert!(!reconciled.is_consistent());
    }

    #[test]
    fn test_one_cent_difference_is_not_a_mismatch() {
        let adjustments = extract_adjustments("Total: 100.01");
        let reconciled = reconcile(result_with_total("100.00"), &adjustments);
        assert!(reconciled.mismatches.is_empty());
        assert_eq!(reconciled.result.summary.final_total.to_string(), "100.00");
    }

    #[test]
    fn test_overflowing_adjustment_is_skipped() {
        let huge = "70000000000000000000000000000";
        let adjustments = extract_adjustments(&format!("Shipping: {}\nDiscount: 10", huge));
        assert_eq!(adjustments.len(), 2);

        let reconciled = reconcile(result_with_total(huge), &adjustments);
        let summary = &reconciled.result.summary;

        assert_eq!(summary.adjustments.len(), 1);
        assert_eq!(summary.adjustments[0].kind, AdjustmentKind::DiscountAmount);
        assert!(summary.final_total < dec(huge));
        assert!(summary.calculation_steps.iter().all(|s| !s.starts_with("+ Shipping")));
        assert!(summary
            .calculation_steps
            .contains(&"- Discount: 10.00".to_string()));
    }

    #[test]
    fn test_empty_result_is_unchanged() {
        let adjustments = extract_adjustments("TOTAL $100.00");
        let result = apply(ParseResult::empty(), &adjustments);
        assert_eq!(result, ParseResult::empty());
    }
}
