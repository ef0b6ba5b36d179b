//! Document parsers feeding the analysis path.
//!
//! Parsing raw input is the job of a collaborator behind [`DocumentParser`];
//! the engines only ever see the resulting [`ParsedDocument`]. Two parsers are
//! provided: one for keyed JSON records and one for labeled plain text.

mod json;
pub mod patterns;
mod text;

pub use json::JsonDocumentParser;
pub use text::TextDocumentParser;

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::ParseError;
use crate::models::document::ParsedDocument;

use patterns::{DATE_DMY, ISO_DATE};

/// Result type for parsing operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Trait for document parsers.
///
/// Implementations must report a region they cannot find as absent instead
/// of failing; errors are reserved for input that cannot be read at all.
pub trait DocumentParser {
    /// Parse a raw document.
    fn parse(&self, raw: &str) -> Result<ParsedDocument>;
}

/// Parse a monetary or numeric amount such as "1,234.56", "$ 85.00" or "1 234,56".
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let negative = s.trim_start().starts_with('-') || s.trim().starts_with('(');
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    // The separator that comes last is the decimal one, unless a lone comma
    // is followed by exactly three digits (a thousands separator).
    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(c), None) => {
            let decimals = cleaned.len() - c - 1;
            if decimals == 3 || cleaned.matches(',').count() > 1 {
                cleaned.replace(',', "")
            } else {
                cleaned.replace(',', ".")
            }
        }
        (None, _) => cleaned,
    };

    let value = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -value } else { value })
}

/// Parse a document date. ISO `YYYY-MM-DD` is tried first, then
/// `DD.MM.YYYY` / `DD/MM/YYYY`.
pub fn parse_document_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Some(caps) = ISO_DATE.captures(s) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = DATE_DMY.captures(s) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}
