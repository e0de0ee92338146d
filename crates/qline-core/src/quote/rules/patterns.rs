//! Common regex patterns for quote line scanning.
//!
//! Everything here is compiled once and only ever read.

use lazy_static::lazy_static;
use regex::Regex;

/// Separator between a summary label and its amount: punctuation, currency
/// markers and an optional currency code, but no other words.
const LABEL_SEP: &str =
    r"[\s:=#@\-\(\)\$€£¥₹]*(?:(?:USD|EUR|GBP|CAD|AUD|CHF|JPY)\b[\s:=\-\(\)\$€£¥₹]*)?";

/// A summary amount in US or European grouping.
const SUMMARY_AMOUNT: &str = r"(?P<amount>\d+(?:[.,\u{00a0} ]\d{3})*(?:[.,]\d{1,2})?)";

/// Whatever may trail a summary amount before the end of the line.
const SUMMARY_END: &str = r"\s*\)?\s*(?:USD|EUR|GBP|CAD|AUD|CHF|JPY|[$€£])?\s*$";

/// An optional "(10%)" / "8.25%" rate between a label and its amount.
const INLINE_RATE: &str = r"(?:\s*\(?\s*@?\s*\d+(?:[.,]\d+)?\s*%\s*\)?)?";

fn summary_amount(label: &str) -> Regex {
    Regex::new(&format!(
        r"(?i)^\s*(?:{label}){LABEL_SEP}{SUMMARY_AMOUNT}{SUMMARY_END}"
    ))
    .unwrap()
}

fn summary_rated_amount(label: &str) -> Regex {
    Regex::new(&format!(
        r"(?i)^\s*(?:{label}){INLINE_RATE}{LABEL_SEP}{SUMMARY_AMOUNT}{SUMMARY_END}"
    ))
    .unwrap()
}

fn summary_rate(label: &str) -> Regex {
    Regex::new(&format!(
        r"(?i)^\s*(?:{label})[\s:=@\-\(]*(?P<amount>\d+(?:[.,]\d+)?)\s*%"
    ))
    .unwrap()
}

const TAX_LABEL: &str = r"(?:sales\s+)?(?:tax|vat|gst|hst)\b";
const DISCOUNT_LABEL: &str = r"(?:less\s+)?discount\b";

lazy_static! {
    // Text cleanup
    pub static ref CID_ARTIFACT: Regex = Regex::new(r"\(?cid:\d+\)?").unwrap();

    pub static ref PAGE_MARKER: Regex = Regex::new(
        r"(?im)^\s*=+\s*page\s+\d+\s*=+\s*$"
    ).unwrap();

    // Numbers
    pub static ref CURRENCY_CODE: Regex = Regex::new(
        r"(?i)\b(?:USD|EUR|GBP|JPY|CNY|CAD|AUD|CHF|INR|SEK|NOK|DKK|PLN|MXN|NZD)\b|\b(?:US|CA|C|A|NZ|HK)\$|\bkr\b|zł"
    ).unwrap();

    /// Candidate numeric token. Boundaries are checked by the tokenizer since
    /// the regex crate has no look-around.
    pub static ref NUMBER_TOKEN: Regex = Regex::new(
        r"(?P<neg>-)?(?:(?P<cur>[$€£¥₹₽₩₪₦₫₱₺])\s?)?(?P<num>-?\d(?:[\d,.\u{00a0}\u{202f}]*\d)?)(?P<pct>\s?%)?"
    ).unwrap();

    // Product indicators
    pub static ref PART_NUMBER: Regex = Regex::new(r"\b[A-Z][A-Z0-9]*-[A-Z0-9\-]*\d").unwrap();

    pub static ref ITEM_START: Regex = Regex::new(
        r"^(?:[A-Za-z0-9]+[_-])+[A-Za-z0-9]+\s*:|^\d{1,3}[.)]\s"
    ).unwrap();

    pub static ref LINE_NUMBER_PREFIX: Regex = Regex::new(r"^\d{1,3}[.)]?\s+").unwrap();

    pub static ref TRAILING_QUANTITY_LABEL: Regex = Regex::new(
        r"(?i)[\s,;:|]*\b(?:qty|quantity|pcs|ea|each|units?|x)\b[\s.:#]*$|\s*@\s*$"
    ).unwrap();

    pub static ref LEADING_QUANTITY_LABEL: Regex = Regex::new(
        r"(?i)^[\s,;:|]*\b(?:qty|quantity)\b[\s.:#]*"
    ).unwrap();

    // Non-item lines
    pub static ref FINANCIAL_TERM: Regex = Regex::new(
        r"(?i)\b(?:sub\s*-?\s*total|grand\s+total|total|amount\s+due|balance\s+due)\b"
    ).unwrap();

    pub static ref FINANCIAL_LINE_START: Regex = Regex::new(
        r"(?i)^\s*(?:(?:sales\s+)?(?:tax|vat|gst|hst)|(?:less\s+)?discount|deposit|payment|amount|sum|balance|credit)\b"
    ).unwrap();

    pub static ref DOCUMENT_METADATA: Regex = Regex::new(
        r"(?i)\b(?:quote|quotation|invoice|estimate|order|po|p\.o\.|ref(?:erence)?|rfq|account|customer|job)\s*(?:#|no\b\.?|num(?:ber)?\b|id\b)|^\s*(?:date|issued|valid\s+(?:until|through|for)|expir\w*|prepared\s+(?:by|for)|sales\s*(?:rep|person)|ship\s+to|bill\s+to|sold\s+to|attn|attention)\b|\bpage\s+\d+(?:\s+of\s+\d+)?\b"
    ).unwrap();

    pub static ref TERMS_AND_CONDITIONS: Regex = Regex::new(
        r"(?i)\b(?:terms(?:\s+and\s+conditions)?|net\s*\d+\s*days?|thank\s+you|signature|authori[sz]ed\s+by|f\.o\.b\.?|prices?\s+(?:are|valid|subject)|subject\s+to|please\s+(?:note|remit|contact))\b"
    ).unwrap();

    // Also sold as priced items, so only a terms note without prices.
    pub static ref TERMS_NOTE: Regex = Regex::new(
        r"(?i)\b(?:conditions|warranty|lead\s*time)\b"
    ).unwrap();

    pub static ref HEADER_WORD: Regex = Regex::new(
        r"(?i)\b(?:description|qty|quantity|unit\s+price|unit\s+cost|price|amount|total|item|part\s*(?:no|number|#)|uom|ext(?:ended)?\.?\s+price)\b"
    ).unwrap();

    // Address and contact classifier
    pub static ref ZIP_CODE: Regex = Regex::new(r"\b\d{5}(?:-\d{4})?\b").unwrap();

    pub static ref STATE_ZIP: Regex = Regex::new(r"\b[A-Z]{2}\s+\d{5}(?:-\d{4})?\b").unwrap();

    pub static ref CITY_STATE_ZIP: Regex = Regex::new(
        r"\b[A-Z][a-zA-Z]+,\s*[A-Z]{2}\s+\d{5}\b"
    ).unwrap();

    pub static ref STREET_ADDRESS: Regex = Regex::new(
        r"(?i)\b\d+\s+(?:[a-z]+\.?\s+){0,3}(?:street|st|avenue|ave|road|rd|drive|dr|lane|ln|boulevard|blvd|parkway|pkwy|highway|hwy)\b"
    ).unwrap();

    pub static ref SUITE_NUMBER: Regex = Regex::new(
        r"(?i)\b(?:suite|ste|apt|bldg|building|floor)\s*#?\s*\d+"
    ).unwrap();

    pub static ref PO_BOX: Regex = Regex::new(r"(?i)\bp\.?\s*o\.?\s+box\s+\d+").unwrap();

    pub static ref PHONE: Regex = Regex::new(
        r"(?:\+?1[\s.\-]?)?\(?\d{3}\)?[\s.\-]\d{3}[\s.\-]\d{4}\b"
    ).unwrap();

    pub static ref EMAIL: Regex = Regex::new(r"[\w.+\-]+@[\w\-]+\.[\w.\-]+").unwrap();

    pub static ref WEBSITE: Regex = Regex::new(
        r"(?i)\b(?:https?://|www\.)\S+|\b[\w\-]+\.(?:com|net|org|io|biz)\b"
    ).unwrap();

    pub static ref CONTACT_LABEL: Regex = Regex::new(
        r"(?i)^\s*(?:phone|ph|tel|telephone|fax|email|e-mail|web|website|mobile|cell|contact)\b\s*[:.#]?"
    ).unwrap();

    pub static ref COMPANY_SUFFIX: Regex = Regex::new(
        r"(?i)\b(?:inc|llc|ltd|corp|corporation|company|gmbh|limited)\b\.?"
    ).unwrap();

    // Shipping-charge-only descriptions
    pub static ref SHIPPING_CHARGE: Regex = Regex::new(
        r"(?i)^(?:(?:freight|shipping|delivery|handling|postage|carriage)(?:\s+(?:and|&)\s+handling)?(?:\s+(?:shipping|delivery|charges?|fees?|costs?|service))?|(?:rush|expedited|standard|ground|overnight|express)\s+(?:shipping|delivery|freight)|s\s*&\s*h)$"
    ).unwrap();

    // Description cleanup
    pub static ref DESCRIPTION_NOISE: Regex = Regex::new(r"[^\w\s\-:/().&#+]").unwrap();

    pub static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();

    pub static ref TRAILING_CONJUNCTION: Regex = Regex::new(r"(?i)\s+(?:and|&)\s*\d*$").unwrap();

    // Summary adjustments, tried in this order per line
    pub static ref SUBTOTAL: Regex = summary_amount(r"sub[\s\-]*total");

    pub static ref TAX_AMOUNT: Regex = summary_rated_amount(TAX_LABEL);

    pub static ref TAX_PERCENT: Regex = summary_rate(TAX_LABEL);

    pub static ref SHIPPING: Regex = summary_amount(
        r"(?:shipping(?:\s*(?:&|and)\s*handling|\s+(?:charges?|costs?|fees?))?|s\s*&\s*h|delivery(?:\s+(?:charges?|fees?))?)\b"
    );

    pub static ref HANDLING: Regex = summary_amount(r"handling(?:\s+(?:charges?|fees?))?\b");

    pub static ref FREIGHT: Regex = summary_amount(
        r"freight(?:\s+(?:shipping|charges?|costs?))?\b"
    );

    pub static ref DISCOUNT_AMOUNT: Regex = summary_rated_amount(DISCOUNT_LABEL);

    pub static ref DISCOUNT_PERCENT: Regex = summary_rate(DISCOUNT_LABEL);

    pub static ref TOTAL: Regex = summary_amount(
        r"(?:grand\s+total|total(?:\s+(?:due|amount|price|cost|quote))?|amount\s+due|balance\s+due|quote\s+total)\b"
    );
}
