//! Common regex patterns for invoice documents.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // EU VAT identifiers: country prefix followed by 8-12 alphanumerics
    pub static ref EU_VAT_ID: Regex = Regex::new(
        r"\b(AT|BE|BG|CY|CZ|DE|DK|EE|EL|ES|FI|FR|HR|HU|IE|IT|LT|LU|LV|MT|NL|PL|PT|RO|SE|SI|SK)U?[0-9A-Z]{8,12}\b"
    ).unwrap();

    pub static ref VAT_ID_LABEL: Regex = Regex::new(
        r"(?i)\bVAT(?:\s*(?:ID|number|No|reg(?:istration)?(?:\s+No)?))?\b\.?"
    ).unwrap();

    // US employer identification number
    pub static ref US_EIN: Regex = Regex::new(
        r"(?i)\b(?:EIN|TIN|federal\s+tax\s+id)[\s:#]*(\d{2}-\d{7})\b"
    ).unwrap();

    pub static ref SALES_TAX: Regex = Regex::new(
        r"(?i)\bsales\s+tax\b"
    ).unwrap();

    // Currencies
    pub static ref CURRENCY_CODE: Regex = Regex::new(
        r"\b(USD|EUR|GBP|CHF|PLN|JPY|CAD|AUD|SEK|NOK|DKK|CZK)\b"
    ).unwrap();

    pub static ref CURRENCY_SYMBOL: Regex = Regex::new(
        r"[$€£¥]"
    ).unwrap();

    // Dates
    pub static ref ISO_DATE: Regex = Regex::new(
        r"^(\d{4})-(\d{2})-(\d{2})$"
    ).unwrap();

    pub static ref DATE_DMY: Regex = Regex::new(
        r"^(\d{1,2})[./](\d{1,2})[./](\d{4})$"
    ).unwrap();

    // Free-text layout
    pub static ref TITLE: Regex = Regex::new(
        r"(?i)^\s*((?:tax\s+|commercial\s+|pro[- ]?forma\s+)?invoice)\b"
    ).unwrap();

    pub static ref LABELED_LINE: Regex = Regex::new(
        r"^\s*([A-Za-z][A-Za-z .#/-]*?)\s*:\s*(.+?)\s*$"
    ).unwrap();

    pub static ref TABLE_HEADER: Regex = Regex::new(
        r"(?i)\b(?:description|item)\b.*[|\t]"
    ).unwrap();
}

/// Symbol-to-code mapping for currency symbols found in text.
pub fn currency_code_for_symbol(symbol: &str) -> Option<&'static str> {
    match symbol {
        "$" => Some("USD"),
        "€" => Some("EUR"),
        "£" => Some("GBP"),
        "¥" => Some("JPY"),
        _ => None,
    }
}

/// Whether an EU VAT identifier follows a VAT label somewhere in `text`.
///
/// Bare identifiers are not accepted: uppercase words such as "DESCRIPTION"
/// have the same shape as a country prefix plus alphanumerics.
pub fn has_labeled_eu_vat_id(text: &str) -> bool {
    VAT_ID_LABEL.find_iter(text).any(|label| {
        let rest = text[label.end()..]
            .trim_start_matches(|c: char| c.is_whitespace() || c == ':' || c == '#');
        EU_VAT_ID.find(rest).is_some_and(|m| m.start() == 0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eu_vat_id() {
        assert!(EU_VAT_ID.is_match("VAT: DE123456789"));
        assert!(EU_VAT_ID.is_match("ATU12345678"));
        assert!(!EU_VAT_ID.is_match("INV-2023-0002"));
    }

    #[test]
    fn test_labeled_eu_vat_id() {
        assert!(has_labeled_eu_vat_id("VAT ID: DE123456789"));
        assert!(has_labeled_eu_vat_id("Seller\nVAT No.: FR12345678901"));
        assert!(has_labeled_eu_vat_id("VAT reg no #ATU12345678"));
        assert!(has_labeled_eu_vat_id("vat DE123456789"));
    }

    #[test]
    fn test_bare_uppercase_words_are_not_vat_ids() {
        assert!(EU_VAT_ID.is_match("DESCRIPTION"));
        assert!(!has_labeled_eu_vat_id("DESCRIPTION | QTY | UNIT PRICE | TOTAL"));
        assert!(!has_labeled_eu_vat_id("ITEMIZATION OF SERVICES"));
        assert!(!has_labeled_eu_vat_id("Reference DE123456789"));
        assert!(!has_labeled_eu_vat_id("VAT Amount: 20.00"));
    }

    #[test]
    fn test_us_ein() {
        let caps = US_EIN.captures("EIN: 12-3456789").unwrap();
        assert_eq!(&caps[1], "12-3456789");
    }

    #[test]
    fn test_iso_date() {
        assert!(ISO_DATE.is_match("2023-11-01"));
        assert!(!ISO_DATE.is_match("2023-1-1"));
        assert!(!ISO_DATE.is_match("01/11/2023"));
    }

    #[test]
    fn test_labeled_line() {
        let caps = LABELED_LINE.captures("  Invoice No: INV-7 ").unwrap();
        assert_eq!(&caps[1], "Invoice No");
        assert_eq!(&caps[2], "INV-7");
    }
}
