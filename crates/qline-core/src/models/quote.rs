//! Quote data models.
//!
//! All decimals serialize as strings (`rust_decimal`'s serde default), so
//! downstream consumers never see binary floating point values.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single validated line item.
///
/// `quantity * unit_price` is within the tolerance of the strategy that
/// produced it of `cost`. `cost` is always the figure stated on the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Human readable description recovered from the line.
    pub description: String,

    /// Per-line quantity.
    pub quantity: Decimal,

    /// Unit price, two decimal places.
    pub unit_price: Decimal,

    /// Extended cost as stated on the document, two decimal places.
    pub cost: Decimal,
}

/// Line items sharing one quantity price break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteGroup {
    /// Total item count: per-line quantity times the number of items.
    pub quantity: Decimal,

    /// Total price divided by `quantity`, quantized to cents.
    pub unit_price: Decimal,

    /// Sum of the line item costs.
    pub total_price: Decimal,

    /// Items in document order.
    pub line_items: Vec<LineItem>,
}

/// Kind of a document-level summary adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Subtotal,
    TaxAmount,
    TaxPercentage,
    Shipping,
    Handling,
    Freight,
    DiscountAmount,
    DiscountPercentage,
    Total,
}

impl AdjustmentKind {
    /// Position in the fixed application order
    /// (subtotal, tax, shipping/handling/freight, discount, total).
    pub fn stage(&self) -> u8 {
        match self {
            AdjustmentKind::Subtotal => 0,
            AdjustmentKind::TaxAmount | AdjustmentKind::TaxPercentage => 1,
            AdjustmentKind::Shipping | AdjustmentKind::Handling | AdjustmentKind::Freight => 2,
            AdjustmentKind::DiscountAmount | AdjustmentKind::DiscountPercentage => 3,
            AdjustmentKind::Total => 4,
        }
    }

    pub fn is_percentage(&self) -> bool {
        matches!(
            self,
            AdjustmentKind::TaxPercentage | AdjustmentKind::DiscountPercentage
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentKind::Subtotal => "subtotal",
            AdjustmentKind::TaxAmount => "tax_amount",
            AdjustmentKind::TaxPercentage => "tax_percentage",
            AdjustmentKind::Shipping => "shipping",
            AdjustmentKind::Handling => "handling",
            AdjustmentKind::Freight => "freight",
            AdjustmentKind::DiscountAmount => "discount_amount",
            AdjustmentKind::DiscountPercentage => "discount_percentage",
            AdjustmentKind::Total => "total",
        }
    }

    /// Label used in calculation steps.
    pub fn label(&self) -> &'static str {
        match self {
            AdjustmentKind::Subtotal => "Subtotal",
            AdjustmentKind::TaxAmount | AdjustmentKind::TaxPercentage => "Tax",
            AdjustmentKind::Shipping => "Shipping",
            AdjustmentKind::Handling => "Handling",
            AdjustmentKind::Freight => "Freight",
            AdjustmentKind::DiscountAmount | AdjustmentKind::DiscountPercentage => "Discount",
            AdjustmentKind::Total => "Total",
        }
    }
}

impl fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An adjustment as found in the document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adjustment {
    /// Adjustment kind.
    #[serde(rename = "type")]
    pub kind: AdjustmentKind,

    /// Stated value: an amount, or a percentage rate for percentage kinds.
    pub value: Decimal,

    /// Whether `value` is a percentage rate.
    pub is_percentage: bool,

    /// The trimmed source line.
    pub raw_text: String,
}

/// An adjustment after it was applied to the running total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedAdjustment {
    #[serde(rename = "type")]
    pub kind: AdjustmentKind,

    /// Source line the adjustment came from.
    pub description: String,

    /// Monetary effect (percentages resolved against the running total).
    pub amount: Decimal,
}

/// Document level summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
    /// Sum of group quantities.
    pub total_quantity: Decimal,

    /// Sum of line item costs.
    pub total_cost: Decimal,

    pub number_of_groups: usize,

    /// Effective subtotal (the document's figure when it states one).
    pub subtotal: Decimal,

    /// Running total after all adjustments.
    pub final_total: Decimal,

    pub adjustments: Vec<AppliedAdjustment>,

    /// Human readable calculation trail.
    pub calculation_steps: Vec<String>,
}

impl Default for QuoteSummary {
    fn default() -> Self {
        Self {
            total_quantity: Decimal::ZERO,
            total_cost: Decimal::new(0, 2),
            number_of_groups: 0,
            subtotal: Decimal::new(0, 2),
            final_total: Decimal::new(0, 2),
            adjustments: Vec::new(),
            calculation_steps: Vec::new(),
        }
    }
}

/// Top-level parse output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    pub summary: QuoteSummary,
    pub groups: Vec<QuoteGroup>,
}

impl ParseResult {
    /// The well-formed empty result: no groups, zeroed summary.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// All line items across groups.
    pub fn line_items(&self) -> impl Iterator<Item = &LineItem> {
        self.groups.iter().flat_map(|g| g.line_items.iter())
    }

    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|g| g.line_items.len()).sum()
    }
}
