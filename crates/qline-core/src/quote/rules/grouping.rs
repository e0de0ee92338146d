//! Domain-aware grouping of line items into quantity price breaks.
//!
//! A manufacturing quote lists one row per part at a given quantity. The
//! summary-level quantity of a price break is the number of physical units
//! across all of its rows: per-line quantity times the number of rows.

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};

use super::numbers::{money, quantity};
use crate::models::quote::{LineItem, ParseResult, QuoteGroup, QuoteSummary};

/// Decimal places kept before a group unit price is quantized to cents.
const UNIT_PRICE_PRECISION: u32 = 4;

/// Group items by their per-line quantity, ordered by total quantity.
///
/// An item whose cost would overflow its group's totals is dropped.
pub fn group(items: Vec<LineItem>) -> Vec<QuoteGroup> {
    let mut buckets: Vec<Bucket> = Vec::new();

    for item in items {
        let key = quantity(item.quantity);
        let index = match buckets.iter().position(|b| b.per_line == key) {
            Some(index) => index,
            None => {
                buckets.push(Bucket::new(key));
                buckets.len() - 1
            }
        };
        if let Err(item) = buckets[index].push(item) {
            warn!(
                "Dropping line item {:?}: group totals overflow",
                item.description
            );
        }
    }

    let mut groups: Vec<QuoteGroup> = buckets
        .into_iter()
        .filter(|b| !b.line_items.is_empty())
        .map(build_group)
        .collect();

    groups.sort_by(|a, b| a.quantity.cmp(&b.quantity));
    groups
}

struct Bucket {
    per_line: Decimal,
    total_quantity: Decimal,
    total_price: Decimal,
    line_items: Vec<LineItem>,
}

impl Bucket {
    fn new(per_line: Decimal) -> Self {
        Self {
            per_line,
            total_quantity: Decimal::ZERO,
            total_price: Decimal::ZERO,
            line_items: Vec::new(),
        }
    }

    /// Add an item, handing it back when a running total would overflow.
    fn push(&mut self, item: LineItem) -> Result<(), LineItem> {
        let sums = self
            .total_quantity
            .checked_add(self.per_line)
            .zip(self.total_price.checked_add(item.cost));
        let Some((total_quantity, total_price)) = sums else {
            return Err(item);
        };
        self.total_quantity = total_quantity;
        self.total_price = total_price;
        self.line_items.push(item);
        Ok(())
    }
}

fn build_group(bucket: Bucket) -> QuoteGroup {
    let Bucket {
        per_line,
        total_quantity,
        total_price,
        line_items,
    } = bucket;
    let total_quantity = quantity(total_quantity);
    let total_price = money(total_price);

    let unit_price = total_price
        .checked_div(total_quantity)
        .map(|precise| {
            money(precise.round_dp_with_strategy(
                UNIT_PRICE_PRECISION,
                RoundingStrategy::MidpointAwayFromZero,
            ))
        })
        .unwrap_or(Decimal::new(0, 2));

    debug!(
        "Group: {} x {} items = {} units, total {}, unit {}",
        per_line,
        line_items.len(),
        total_quantity,
        total_price,
        unit_price
    );

    QuoteGroup {
        quantity: total_quantity,
        unit_price,
        total_price,
        line_items,
    }
}

/// Wrap groups in a result with the computed summary. Subtotal and final
/// total start out equal to the total cost.
pub fn summarize(groups: Vec<QuoteGroup>) -> ParseResult {
    if groups.is_empty() {
        return ParseResult::empty();
    }

    // Groups whose totals would overflow the summary are left out of it.
    let mut total_quantity = Decimal::ZERO;
    let mut total_cost = Decimal::ZERO;
    let mut kept = Vec::with_capacity(groups.len());
    for group in groups {
        match total_quantity
            .checked_add(group.quantity)
            .zip(total_cost.checked_add(group.total_price))
        {
            Some((q, c)) => {
                total_quantity = q;
                total_cost = c;
                kept.push(group);
            }
            None => warn!("Dropping quantity {} group: summary totals overflow", group.quantity),
        }
    }
    let groups = kept;
    let total_quantity = quantity(total_quantity);
    let total_cost = money(total_cost);

    ParseResult {
        summary: QuoteSummary {
            total_quantity,
            total_cost,
            number_of_groups: groups.len(),
            subtotal: total_cost,
            final_total: total_cost,
            ..Default::default()
        },
        groups,
    }
}
