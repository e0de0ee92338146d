//! Keyword vocabulary shared by the scanner, role engine and description
//! extractor.
//!
//! A [`Lexicon`] is plain data so it can be overridden from the config file;
//! components take it by reference and never mutate it.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// Built-in vocabulary used by the free-function entry points.
    pub static ref DEFAULT_LEXICON: Lexicon = Lexicon::default();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    /// Words that mark the adjacent number as a quantity.
    pub quantity_keywords: Vec<String>,

    /// Words that mark a number-free line as the tail of the previous row.
    pub continuation_words: Vec<String>,

    /// Material names. A description mentioning one is always a product.
    pub material_keywords: Vec<String>,

    /// Generic product nouns used as product-indicator context.
    pub product_keywords: Vec<String>,

    /// Address vocabulary counted by the address classifier.
    pub address_keywords: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            quantity_keywords: words(&[
                "qty", "quantity", "ea", "each", "units", "pcs", "pieces",
            ]),
            continuation_words: words(&[
                "material", "materials", "machine", "machining", "machined", "de-burr",
                "deburr", "deburring", "finish", "finishing", "anodize", "anodized",
                "plating", "plated", "polish", "polished", "coating", "coated", "painted",
                "heat treat", "passivate", "steel", "aluminum", "polypropylene",
                "polycarbonate", "clear pc",
            ]),
            material_keywords: words(&[
                "steel", "stainless", "aluminum", "aluminium", "brass", "copper", "bronze",
                "titanium", "plastic", "polycarbonate", "polypropylene", "nylon", "acetal",
                "delrin", "abs", "pvc", "ptfe", "rubber", "silicone", "alloy", "metal",
                "material",
            ]),
            product_keywords: words(&[
                "assembly", "component", "part", "module", "bracket", "mount", "plate",
                "housing", "cover", "panel", "shaft", "bearing", "bushing", "gasket", "seal",
                "fastener", "screw", "bolt", "nut", "washer", "spring", "clip", "pin", "plug",
                "rod", "tube", "pipe", "fitting", "valve", "sensor", "cable", "harness",
                "widget", "kit", "tooling", "fixture",
            ]),
            address_keywords: words(&[
                "street", "avenue", "road", "boulevard", "lane", "suite", "building",
                "floor", "address", "city", "state", "zip", "country", "usa", "box",
            ]),
        }
    }
}

impl Lexicon {
    /// Whether any term of `list` occurs in `text` as a whole word.
    pub fn mentions(list: &[String], text: &str) -> bool {
        Self::count(list, text) > 0
    }

    /// Number of distinct terms of `list` occurring in `text` as whole words.
    pub fn count(list: &[String], text: &str) -> usize {
        let lower = text.to_lowercase();
        list.iter()
            .filter(|term| contains_term(&lower, &term.to_lowercase()))
            .count()
    }

    pub fn has_quantity_keyword(&self, text: &str) -> bool {
        Self::mentions(&self.quantity_keywords, text)
    }

    pub fn has_continuation_word(&self, text: &str) -> bool {
        Self::mentions(&self.continuation_words, text)
    }

    pub fn has_material(&self, text: &str) -> bool {
        Self::mentions(&self.material_keywords, text)
    }

    pub fn has_product_keyword(&self, text: &str) -> bool {
        Self::mentions(&self.product_keywords, text)
    }

    pub fn address_keyword_count(&self, text: &str) -> usize {
        Self::count(&self.address_keywords, text)
    }
}

/// Whole-word containment on already lowercased input.
fn contains_term(haystack: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }

    haystack.match_indices(term).any(|(start, _)| {
        let end = start + term.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(|c| c.is_alphanumeric()) && !after.is_some_and(|c| c.is_alphanumeric())
    })
}
