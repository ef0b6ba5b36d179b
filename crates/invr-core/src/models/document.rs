//! Parsed document contract for the analysis path.
//!
//! A [`ParsedDocument`] is what a document parser hands to the engines. The
//! engines only require that each of the three regions is either located
//! (with the strategy that found it) or explicitly absent.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::invoice::Party;

/// Strategy a parser used to locate a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    /// Found under named keys of a structured record.
    Keyed,
    /// Found as "Label: value" lines of free text.
    Labeled,
    /// Found as rows of a delimited table.
    Tabular,
}

/// A region of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Region<T> {
    Located { locator: Locator, content: T },
    Absent,
}

impl<T> Region<T> {
    pub fn located(locator: Locator, content: T) -> Self {
        Region::Located { locator, content }
    }

    pub fn content(&self) -> Option<&T> {
        match self {
            Region::Located { content, .. } => Some(content),
            Region::Absent => None,
        }
    }

    pub fn locator(&self) -> Option<Locator> {
        match self {
            Region::Located { locator, .. } => Some(*locator),
            Region::Absent => None,
        }
    }

    pub fn is_located(&self) -> bool {
        matches!(self, Region::Located { .. })
    }
}

impl<T> Default for Region<T> {
    fn default() -> Self {
        Region::Absent
    }
}

/// Fields a parser may find in the header region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    /// Issue date exactly as it appears in the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<Party>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<Party>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<String>,
}

impl HeaderFields {
    /// Whether nothing at all was found.
    pub fn is_empty(&self) -> bool {
        *self == HeaderFields::default()
    }
}

/// A single row of the line-items region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Decimal>,
    /// Row total as stated in the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
}

/// Fields a parser may find in the summary region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl SummaryFields {
    pub fn is_empty(&self) -> bool {
        *self == SummaryFields::default()
    }
}

/// Structured representation of an existing invoice document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub header: Region<HeaderFields>,
    pub line_items: Region<Vec<DocumentLine>>,
    pub summary: Region<SummaryFields>,
    /// Whole document text, used for identifier and currency detection.
    #[serde(default)]
    pub raw_text: String,
}

impl ParsedDocument {
    pub fn header_fields(&self) -> Option<&HeaderFields> {
        self.header.content()
    }

    pub fn lines(&self) -> Option<&[DocumentLine]> {
        self.line_items.content().map(Vec::as_slice)
    }

    pub fn summary_fields(&self) -> Option<&SummaryFields> {
        self.summary.content()
    }

    /// Iterate over the parties found in the header.
    pub fn parties(&self) -> impl Iterator<Item = &Party> {
        self.header_fields()
            .into_iter()
            .flat_map(|h| h.vendor.iter().chain(h.customer.iter()))
    }
}
