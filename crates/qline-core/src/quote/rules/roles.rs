//! Role assignment: deciding which numbers on a line are the quantity, the
//! unit price and the total.
//!
//! Each [`RoleStrategy`] proposes at most one confidence-scored assignment.
//! The [`RoleEngine`] drops implausible proposals and keeps the most
//! confident one. Looser arithmetic tolerance always maps to lower
//! confidence, so a tight match found by any strategy outranks a loose one.

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};

use super::lexicon::Lexicon;
use super::numbers::{is_whole, money, quantity};
use super::scanner::NumericToken;
use super::ExtractionMatch;
use crate::models::config::ExtractionConfig;
use crate::models::quote::LineItem;

/// Arithmetic tolerance for `quantity * unit_price ≈ total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tolerance {
    pub abs: Decimal,
    pub rel: Decimal,
}

impl Tolerance {
    pub fn new(abs: Decimal, rel: Decimal) -> Self {
        Self { abs, rel }
    }

    /// One cent.
    pub fn exact() -> Self {
        Self::new(Decimal::new(1, 2), Decimal::ZERO)
    }

    pub fn close() -> Self {
        Self::new(Decimal::new(1, 2), Decimal::new(1, 2))
    }

    pub fn loose() -> Self {
        Self::new(Decimal::new(2, 2), Decimal::new(2, 2))
    }

    /// Used when the quantity was derived from the total.
    pub fn inferred() -> Self {
        Self::new(Decimal::new(1, 2), Decimal::new(5, 2))
    }

    /// OCR-degraded rows anchored by a quantity keyword.
    pub fn degraded() -> Self {
        Self::new(Decimal::new(1, 2), Decimal::new(15, 2))
    }

    /// `|q * p - t| <= max(abs, rel * |t|)`
    pub fn accepts(&self, quantity: Decimal, unit_price: Decimal, total: Decimal) -> bool {
        let Some(product) = quantity.checked_mul(unit_price) else {
            return false;
        };
        let Some(rel) = self.rel.checked_mul(total.abs()) else {
            return false;
        };
        product
            .checked_sub(total)
            .is_some_and(|diff| diff.abs() <= self.abs.max(rel))
    }
}

/// A proposed reading of a line's numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleAssignment {
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total: Decimal,
    /// Indices into the line's tokens that were used, in line order.
    pub consumed: Vec<usize>,
    pub tolerance: Tolerance,
    pub strategy: &'static str,
    /// Whether `quantity * unit_price ≈ total` actually holds.
    pub verified: bool,
}

impl RoleAssignment {
    fn new(
        strategy: &'static str,
        (quantity, unit_price, total): (&Slot<'_>, &Slot<'_>, &Slot<'_>),
        tolerance: Tolerance,
    ) -> Self {
        let mut consumed = vec![quantity.index, unit_price.index, total.index];
        consumed.sort_unstable();
        Self {
            quantity: quantity.value,
            unit_price: unit_price.value,
            total: total.value,
            consumed,
            tolerance,
            strategy,
            verified: true,
        }
    }

    /// Finish the assignment as a line item. The total is kept as stated.
    pub fn into_line_item(self, description: String) -> LineItem {
        LineItem {
            description,
            quantity: quantity(self.quantity),
            unit_price: money(self.unit_price),
            cost: money(self.total),
        }
    }
}

/// A usable number on the line.
#[derive(Debug, Clone, Copy)]
pub struct Slot<'t> {
    /// Index into the line's token list.
    pub index: usize,
    pub value: Decimal,
    pub token: &'t NumericToken,
}

impl Slot<'_> {
    fn is_whole_count(&self) -> bool {
        is_whole(self.value) && !self.token.has_currency
    }

    fn looks_like_price(&self) -> bool {
        self.token.has_currency || !is_whole(self.value) || self.token.raw.contains(['.', ','])
    }
}

/// Inputs shared by all strategies for one line.
pub struct RoleContext<'t> {
    pub line: &'t str,
    /// Parsed, non-percentage tokens in line order.
    pub slots: Vec<Slot<'t>>,
    pub quantity_min: Decimal,
    pub quantity_max: Decimal,
}

impl<'t> RoleContext<'t> {
    pub fn new(line: &'t str, tokens: &'t [NumericToken], config: &ExtractionConfig) -> Self {
        let slots = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_percentage)
            .filter_map(|(index, token)| {
                token.normalized.map(|value| Slot {
                    index,
                    value,
                    token,
                })
            })
            .collect();

        Self {
            line,
            slots,
            quantity_min: config.quantity_min,
            quantity_max: config.quantity_max,
        }
    }

    /// Quantity in range, price and total positive. Credit rows are not
    /// line items.
    pub fn plausible(&self, quantity: Decimal, unit_price: Decimal, total: Decimal) -> bool {
        quantity >= self.quantity_min
            && quantity <= self.quantity_max
            && unit_price > Decimal::ZERO
            && total > Decimal::ZERO
    }

    /// Tightest tolerance band among `bands` that accepts the triple.
    fn band(
        &self,
        (q, p, t): (&Slot<'_>, &Slot<'_>, &Slot<'_>),
        bands: &[(Tolerance, f32)],
    ) -> Option<(Tolerance, f32)> {
        if !self.plausible(q.value, p.value, t.value) {
            return None;
        }
        bands
            .iter()
            .copied()
            .find(|(tolerance, _)| tolerance.accepts(q.value, p.value, t.value))
    }
}

/// A way of reading quantity, unit price and total off a line.
pub trait RoleStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn propose(&self, ctx: &RoleContext<'_>) -> Option<ExtractionMatch<RoleAssignment>>;
}

fn proposal(
    ctx: &RoleContext<'_>,
    assignment: RoleAssignment,
    confidence: f32,
) -> ExtractionMatch<RoleAssignment> {
    let start = assignment
        .consumed
        .first()
        .and_then(|i| ctx.slots.iter().find(|s| s.index == *i))
        .map(|s| s.token.start());
    let end = assignment
        .consumed
        .last()
        .and_then(|i| ctx.slots.iter().find(|s| s.index == *i))
        .map(|s| s.token.end());

    let found = ExtractionMatch::new(assignment, confidence, ctx.line);
    match (start, end) {
        (Some(start), Some(end)) => found.with_position(start, end),
        _ => found,
    }
}

/// A whole number next to a quantity keyword, followed by price and total.
pub struct KeywordAnchored {
    pattern: Option<Regex>,
    window: usize,
}

impl KeywordAnchored {
    pub fn new(lexicon: &Lexicon, window: usize) -> Self {
        let alternatives: Vec<String> = lexicon
            .quantity_keywords
            .iter()
            .filter(|k| !k.trim().is_empty())
            .map(|k| regex::escape(k.trim()))
            .collect();

        let pattern = if alternatives.is_empty() {
            None
        } else {
            Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))
                .map_err(|e| warn!("Quantity keyword pattern rejected: {}", e))
                .ok()
        };

        Self { pattern, window }
    }

    fn bands() -> [(Tolerance, f32); 4] {
        [
            (Tolerance::exact(), 0.95),
            (Tolerance::close(), 0.85),
            (Tolerance::loose(), 0.75),
            (Tolerance::degraded(), 0.55),
        ]
    }
}

impl RoleStrategy for KeywordAnchored {
    fn name(&self) -> &'static str {
        "keyword_anchored"
    }

    fn propose(&self, ctx: &RoleContext<'_>) -> Option<ExtractionMatch<RoleAssignment>> {
        let pattern = self.pattern.as_ref()?;

        for keyword in pattern.find_iter(ctx.line) {
            let nearest = ctx
                .slots
                .iter()
                .enumerate()
                .filter(|(_, s)| s.is_whole_count())
                .map(|(pos, s)| {
                    let distance = if s.token.start() >= keyword.end() {
                        s.token.start() - keyword.end()
                    } else {
                        keyword.start().saturating_sub(s.token.end())
                    };
                    (pos, distance)
                })
                .filter(|(_, distance)| *distance <= self.window)
                .min_by_key(|(_, distance)| *distance);

            let Some((pos, _)) = nearest else { continue };
            let (Some(price), Some(total)) = (ctx.slots.get(pos + 1), ctx.slots.get(pos + 2))
            else {
                continue;
            };

            let triple = (&ctx.slots[pos], price, total);
            if let Some((tolerance, confidence)) = ctx.band(triple, &Self::bands()) {
                let assignment = RoleAssignment::new(self.name(), triple, tolerance);
                return Some(proposal(ctx, assignment, confidence));
            }
        }

        None
    }
}

/// Every ordering of the last three numbers.
pub struct LastThreePermutation;

impl LastThreePermutation {
    const ORDERS: [(usize, usize, usize); 6] = [
        (0, 1, 2),
        (1, 0, 2),
        (0, 2, 1),
        (2, 0, 1),
        (1, 2, 0),
        (2, 1, 0),
    ];

    fn bands() -> [(Tolerance, f32); 3] {
        [
            (Tolerance::exact(), 0.9),
            (Tolerance::close(), 0.8),
            (Tolerance::loose(), 0.7),
        ]
    }
}

impl RoleStrategy for LastThreePermutation {
    fn name(&self) -> &'static str {
        "last_three_permutation"
    }

    fn propose(&self, ctx: &RoleContext<'_>) -> Option<ExtractionMatch<RoleAssignment>> {
        let n = ctx.slots.len();
        if n < 3 {
            return None;
        }
        let last = &ctx.slots[n - 3..];

        // Rank: confidence, whole quantity, total in last position, quantity first.
        let mut best: Option<((f32, bool, bool, bool), RoleAssignment)> = None;
        for (qi, pi, ti) in Self::ORDERS {
            let triple = (&last[qi], &last[pi], &last[ti]);
            let Some((tolerance, confidence)) = ctx.band(triple, &Self::bands()) else {
                continue;
            };
            let rank = (confidence, last[qi].is_whole_count(), ti == 2, qi < pi);
            if best.as_ref().is_none_or(|(b, _)| rank > *b) {
                best = Some((rank, RoleAssignment::new(self.name(), triple, tolerance)));
            }
        }

        best.map(|((confidence, ..), assignment)| proposal(ctx, assignment, confidence))
    }
}

/// Three-number windows that skip a leading part-number token.
pub struct SlidingWindow;

impl SlidingWindow {
    fn bands() -> [(Tolerance, f32); 3] {
        [
            (Tolerance::exact(), 0.8),
            (Tolerance::close(), 0.7),
            (Tolerance::loose(), 0.6),
        ]
    }
}

impl RoleStrategy for SlidingWindow {
    fn name(&self) -> &'static str {
        "sliding_window"
    }

    fn propose(&self, ctx: &RoleContext<'_>) -> Option<ExtractionMatch<RoleAssignment>> {
        let n = ctx.slots.len();
        if n < 4 {
            return None;
        }

        let mut best: Option<(f32, RoleAssignment)> = None;
        for start in 1..=n - 3 {
            let w = &ctx.slots[start..start + 3];
            for triple in [(&w[0], &w[1], &w[2]), (&w[1], &w[0], &w[2])] {
                let Some((tolerance, confidence)) = ctx.band(triple, &Self::bands()) else {
                    continue;
                };
                if best.as_ref().is_none_or(|(c, _)| confidence > *c) {
                    best = Some((confidence, RoleAssignment::new(self.name(), triple, tolerance)));
                }
            }
        }

        best.map(|(confidence, assignment)| proposal(ctx, assignment, confidence))
    }
}

/// A free-standing whole number directly followed by a price and a total.
pub struct StandaloneQuantity;

impl StandaloneQuantity {
    fn bands() -> [(Tolerance, f32); 2] {
        [(Tolerance::exact(), 0.9), (Tolerance::close(), 0.85)]
    }

    fn is_standalone(line: &str, slot: &Slot<'_>) -> bool {
        let (start, end) = slot.token.position;
        let before_ok = line[..start]
            .chars()
            .next_back()
            .is_none_or(|c| c.is_whitespace());
        let after_ok = line[end..].chars().next().is_none_or(|c| c.is_whitespace());
        before_ok && after_ok && slot.is_whole_count()
    }
}

impl RoleStrategy for StandaloneQuantity {
    fn name(&self) -> &'static str {
        "standalone_quantity"
    }

    fn propose(&self, ctx: &RoleContext<'_>) -> Option<ExtractionMatch<RoleAssignment>> {
        for w in ctx.slots.windows(3) {
            if !Self::is_standalone(ctx.line, &w[0]) || !w[1].looks_like_price() {
                continue;
            }
            let triple = (&w[0], &w[1], &w[2]);
            if let Some((tolerance, confidence)) = ctx.band(triple, &Self::bands()) {
                let assignment = RoleAssignment::new(self.name(), triple, tolerance);
                return Some(proposal(ctx, assignment, confidence));
            }
        }
        None
    }
}

/// First number as quantity, last two as unit price and total.
pub struct FirstAsQuantity;

impl RoleStrategy for FirstAsQuantity {
    fn name(&self) -> &'static str {
        "first_as_quantity"
    }

    fn propose(&self, ctx: &RoleContext<'_>) -> Option<ExtractionMatch<RoleAssignment>> {
        let n = ctx.slots.len();
        if n < 3 {
            return None;
        }

        let triple = (&ctx.slots[0], &ctx.slots[n - 2], &ctx.slots[n - 1]);
        if !triple.0.is_whole_count() {
            return None;
        }
        let bands = [(Tolerance::exact(), 0.95), (Tolerance::close(), 0.8)];
        let (tolerance, confidence) = ctx.band(triple, &bands)?;
        Some(proposal(
            ctx,
            RoleAssignment::new(self.name(), triple, tolerance),
            confidence,
        ))
    }
}

/// Unit price and total only; the quantity is inferred from their ratio.
///
/// When the ratio gives no valid quantity the line can still be read as a
/// single unit, but only with `allow_unit_fallback`. That reading does not
/// satisfy `quantity * unit_price ≈ cost`, so it is off by default and an
/// unverified proposal never outranks a verified one.
pub struct TwoNumber {
    allow_unit_fallback: bool,
}

impl TwoNumber {
    pub fn new(allow_unit_fallback: bool) -> Self {
        Self { allow_unit_fallback }
    }
}

impl RoleStrategy for TwoNumber {
    fn name(&self) -> &'static str {
        "two_number"
    }

    fn propose(&self, ctx: &RoleContext<'_>) -> Option<ExtractionMatch<RoleAssignment>> {
        let [price, total] = ctx.slots.as_slice() else {
            return None;
        };

        // "2 $50.00" is a quantity and a price, not a price and a total.
        if price.is_whole_count() && total.token.has_currency {
            return None;
        }
        if price.value <= Decimal::ZERO || total.value <= Decimal::ZERO {
            return None;
        }

        let mut consumed = vec![price.index, total.index];
        consumed.sort_unstable();
        let mut assignment = RoleAssignment {
            quantity: Decimal::ONE,
            unit_price: price.value,
            total: total.value,
            consumed,
            tolerance: Tolerance::exact(),
            strategy: self.name(),
            verified: true,
        };

        let inferred = total
            .value
            .checked_div(price.value)
            .map(|q| q.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero));

        if let Some(q) = inferred.filter(|q| ctx.plausible(*q, price.value, total.value)) {
            for (tolerance, confidence) in [(Tolerance::exact(), 0.7), (Tolerance::inferred(), 0.5)] {
                if tolerance.accepts(q, price.value, total.value) {
                    assignment.quantity = q;
                    assignment.tolerance = tolerance;
                    return Some(proposal(ctx, assignment, confidence));
                }
            }
        }

        if self.allow_unit_fallback {
            assignment.verified = false;
            return Some(proposal(ctx, assignment, 0.3));
        }

        None
    }
}

/// Assign roles with the default configuration.
pub fn assign_roles(line: &str, tokens: &[NumericToken]) -> Option<LineItem> {
    let config = ExtractionConfig::default();
    let engine = RoleEngine::new(&config);
    engine
        .assign(line, tokens)
        .map(|found| found.value.into_line_item(String::new()))
}

/// Runs every strategy over a line and keeps the best plausible proposal.
pub struct RoleEngine {
    strategies: Vec<Box<dyn RoleStrategy>>,
    config: ExtractionConfig,
}

impl RoleEngine {
    /// Engine with the built-in strategies in priority order.
    pub fn new(config: &ExtractionConfig) -> Self {
        let strategies: Vec<Box<dyn RoleStrategy>> = vec![
            Box::new(KeywordAnchored::new(&config.lexicon, config.keyword_window)),
            Box::new(LastThreePermutation),
            Box::new(SlidingWindow),
            Box::new(StandaloneQuantity),
            Box::new(FirstAsQuantity),
            Box::new(TwoNumber::new(config.allow_unit_quantity_fallback)),
        ];

        Self {
            strategies,
            config: config.clone(),
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.config.min_confidence = min_confidence;
        self
    }

    /// Append a strategy; it ranks below the built-in ones on ties.
    pub fn push_strategy(&mut self, strategy: Box<dyn RoleStrategy>) {
        self.strategies.push(strategy);
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Best assignment for the line, or `None` when no strategy finds a
    /// plausible one. Unverified proposals are only used when nothing
    /// verified exists.
    pub fn assign(
        &self,
        line: &str,
        tokens: &[NumericToken],
    ) -> Option<ExtractionMatch<RoleAssignment>> {
        let ctx = RoleContext::new(line, tokens, &self.config);
        if ctx.slots.len() < 2 {
            return None;
        }

        let mut best: Option<ExtractionMatch<RoleAssignment>> = None;
        let mut fallback: Option<ExtractionMatch<RoleAssignment>> = None;

        for strategy in &self.strategies {
            let Some(found) = strategy.propose(&ctx) else {
                continue;
            };
            let a = &found.value;
            if !ctx.plausible(a.quantity, a.unit_price, a.total) {
                debug!("{} proposal out of range: {}", strategy.name(), line);
                continue;
            }

            if !a.verified {
                if fallback.is_none() {
                    fallback = Some(found);
                }
                continue;
            }
            if found.confidence < self.config.min_confidence {
                continue;
            }
            if best.as_ref().is_none_or(|b| found.confidence > b.confidence) {
                best = Some(found);
            }
        }

        if let Some(found) = &best {
            debug!(
                "Line assigned by {} ({:.2}): q={} p={} t={}",
                found.value.strategy,
                found.confidence,
                found.value.quantity,
                found.value.unit_price,
                found.value.total
            );
        }

        best.or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::rules::scanner::TokenExtractor;
    use crate::quote::rules::FieldExtractor;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn assign(line: &str) -> Option<ExtractionMatch<RoleAssignment>> {
        let tokens = TokenExtractor::new().extract_all(line);
        RoleEngine::new(&ExtractionConfig::default()).assign(line, &tokens)
    }

    #[test]
    fn test_tolerance_bands() {
        assert!(Tolerance::exact().accepts(dec("6"), dec("240.92"), dec("1445.52")));
        assert!(!Tolerance::exact().accepts(dec("3"), dec("33.33"), dec("100.05")));
        assert!(Tolerance::close().accepts(dec("3"), dec("33.33"), dec("100.05")));
        assert!(Tolerance::degraded().accepts(dec("10"), dec("9.00"), dec("100.00")));
        assert!(!Tolerance::loose().accepts(dec("10"), dec("9.00"), dec("100.00")));
    }

    #[test]
    fn test_plain_row() {
        let found = assign("BASE MATERIAL 6 240.92 1445.52").unwrap();
        let a = found.value;

        assert_eq!(a.quantity, dec("6"));
        assert_eq!(a.unit_price, dec("240.92"));
        assert_eq!(a.total, dec("1445.52"));
        assert_eq!(a.consumed, vec![0, 1, 2]);
        assert!(found.confidence >= 0.9);
    }

    #[test]
    fn test_price_before_quantity() {
        let a = assign("Hex bolt $2.50 40 $100.00").unwrap().value;
        assert_eq!(a.quantity, dec("40"));
        assert_eq!(a.unit_price, dec("2.50"));
        assert_eq!(a.total, dec("100.00"));
    }

    #[test]
    fn test_keyword_anchored_quantity() {
        let found = assign("Qty: 12 Bracket 4.50 54.00").unwrap();
        assert_eq!(found.value.quantity, dec("12"));
        assert_eq!(found.value.strategy, "keyword_anchored");
        assert_eq!(found.confidence, 0.95);
    }

    #[test]
    fn test_leading_part_number_is_skipped() {
        let a = assign("4471 Servo Drive 2 150.00 300.00").unwrap().value;
        assert_eq!(a.quantity, dec("2"));
        assert_eq!(a.unit_price, dec("150.00"));
        assert_eq!(a.consumed, vec![1, 2, 3]);
    }

    #[test]
    fn test_two_numbers_infer_quantity() {
        let a = assign("Mounting bracket $45.00 $90.00").unwrap().value;
        assert_eq!(a.quantity, dec("2"));
        assert!(a.verified);
    }

    #[test]
    fn test_quantity_and_price_only_is_dropped() {
        assert!(assign("Widget 2 $50.00").is_none());
    }

    #[test]
    fn test_unit_fallback_is_opt_in() {
        let line = "Setup charge $45.00 $100.00";
        let tokens = TokenExtractor::new().extract_all(line);

        assert!(RoleEngine::new(&ExtractionConfig::default())
            .assign(line, &tokens)
            .is_none());

        let config = ExtractionConfig {
            allow_unit_quantity_fallback: true,
            ..Default::default()
        };
        let found = RoleEngine::new(&config).assign(line, &tokens).unwrap();
        assert_eq!(found.value.quantity, Decimal::ONE);
        assert!(!found.value.verified);
    }

    #[test]
    fn test_no_valid_reading_is_dropped() {
        assert!(assign("Widget 3 7.00 50.00").is_none());
        assert!(assign("Widget 0 7.00 0.00").is_none());
    }

    #[test]
    fn test_quantity_limit() {
        assert!(assign("Rivet 200000 0.01 2000.00").is_none());
    }

    fn propose(
        strategy: &dyn RoleStrategy,
        line: &str,
    ) -> Option<ExtractionMatch<RoleAssignment>> {
        let config = ExtractionConfig::default();
        let tokens = TokenExtractor::new().extract_all(line);
        let ctx = RoleContext::new(line, &tokens, &config);
        strategy.propose(&ctx)
    }

    #[test]
    fn test_sliding_window_reads_between_part_number_and_trailing_number() {
        let line = "PN 4471 2 150.00 300.00 12";
        assert!(propose(&LastThreePermutation, line).is_none());

        let found = propose(&SlidingWindow, line).unwrap();
        assert_eq!(found.value.strategy, "sliding_window");
        assert_eq!(found.value.quantity, dec("2"));
        assert_eq!(found.value.unit_price, dec("150.00"));
        assert_eq!(found.value.total, dec("300.00"));
        assert_eq!(found.value.consumed, vec![1, 2, 3]);
        assert_eq!(found.confidence, 0.8);

        let found = propose(&SlidingWindow, "PN 4471 3 33.33 101.50 12").unwrap();
        assert_eq!(found.value.tolerance, Tolerance::loose());
        assert_eq!(found.confidence, 0.6);

        // Three numbers leave nothing to skip.
        assert!(propose(&SlidingWindow, "Widget 2 50.00 100.00").is_none());
    }

    #[test]
    fn test_standalone_quantity_needs_a_price_after_it() {
        let line = "PN 4471 2 150.00 300.00 12";
        let found = propose(&StandaloneQuantity, line).unwrap();
        assert_eq!(found.value.strategy, "standalone_quantity");
        assert_eq!(found.value.quantity, dec("2"));
        assert_eq!(found.value.consumed, vec![1, 2, 3]);
        assert_eq!(found.confidence, 0.9);

        let found = propose(&StandaloneQuantity, "Gasket 3 33.33 100.05").unwrap();
        assert_eq!(found.value.tolerance, Tolerance::close());
        assert_eq!(found.confidence, 0.85);

        // The number after the quantity is a whole count, not a price.
        assert!(propose(&StandaloneQuantity, "Gasket 3 5 15").is_none());

        let found = assign(line).unwrap();
        assert_eq!(found.value.strategy, "standalone_quantity");
        assert_eq!(found.value.quantity, dec("2"));
    }

    #[test]
    fn test_first_as_quantity_spans_the_line() {
        let line = "5 Bracket rev 3 12.00 60.00";
        assert!(propose(&LastThreePermutation, line).is_none());
        assert!(propose(&SlidingWindow, line).is_none());
        assert!(propose(&StandaloneQuantity, line).is_none());

        let found = propose(&FirstAsQuantity, line).unwrap();
        assert_eq!(found.value.strategy, "first_as_quantity");
        assert_eq!(found.value.quantity, dec("5"));
        assert_eq!(found.value.unit_price, dec("12.00"));
        assert_eq!(found.value.consumed, vec![0, 2, 3]);
        assert_eq!(found.confidence, 0.95);

        let found = propose(&FirstAsQuantity, "4 Cable 33.33 133.35").unwrap();
        assert_eq!(found.confidence, 0.8);

        assert!(propose(&FirstAsQuantity, "$5.00 Bracket 12.00 60.00").is_none());

        let found = assign(line).unwrap();
        assert_eq!(found.value.strategy, "first_as_quantity");
    }

    #[test]
    fn test_credit_rows_are_dropped() {
        assert!(assign("Returned housing 2 -25.00 -50.00").is_none());
        assert!(assign("Returned housing -25.00 -50.00").is_none());

        let config = ExtractionConfig::default();
        let ctx = RoleContext::new("", &[], &config);
        assert!(!ctx.plausible(dec("2"), dec("-25.00"), dec("-50.00")));
        assert!(ctx.plausible(dec("2"), dec("25.00"), dec("50.00")));
    }

    #[test]
    fn test_tolerance_does_not_overflow() {
        let max = Decimal::MAX;
        assert!(!Tolerance::exact().accepts(Decimal::ONE, max, -max));
        assert!(Tolerance::exact().accepts(Decimal::ONE, max, max));
    }

    #[test]
    fn test_free_function_builds_line_item() {
        let line = "Widget Assembly 2 50.00 100.00";
        let tokens = TokenExtractor::new().extract_all(line);
        let item = assign_roles(line, &tokens).unwrap();
        assert_eq!(item.quantity.to_string(), "2");
        assert_eq!(item.unit_price.to_string(), "50.00");
        assert_eq!(item.cost.to_string(), "100.00");
    }
}
