//! Parser for keyed JSON invoice records.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::models::document::{
    DocumentLine, HeaderFields, Locator, ParsedDocument, Region, SummaryFields,
};
use crate::models::invoice::Party;

use super::{parse_amount, DocumentParser, Result};

/// Parses documents given as JSON objects.
///
/// Header and summary fields are read from nested `header` / `summary`
/// objects when present, otherwise from the top level. Line items are read
/// from `line_items` (or `items`).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDocumentParser;

impl JsonDocumentParser {
    pub fn new() -> Self {
        Self
    }

    /// Build a document from an already-decoded JSON value.
    pub fn parse_value(&self, value: &Value, raw_text: &str) -> Result<ParsedDocument> {
        let root = value
            .as_object()
            .ok_or_else(|| ParseError::Shape("top-level value must be an object".to_string()))?;

        let document = ParsedDocument {
            header: locate_header(root),
            line_items: locate_line_items(root),
            summary: locate_summary(root),
            raw_text: raw_text.to_string(),
        };

        debug!(
            "JSON document regions: header={} line_items={} summary={}",
            document.header.is_located(),
            document.line_items.is_located(),
            document.summary.is_located()
        );

        Ok(document)
    }
}

impl DocumentParser for JsonDocumentParser {
    fn parse(&self, raw: &str) -> Result<ParsedDocument> {
        if raw.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        let value: Value = serde_json::from_str(raw)?;
        self.parse_value(&value, raw)
    }
}

/// Prefer a nested object under `key`, falling back to the root.
fn section<'a>(root: &'a Map<String, Value>, key: &str) -> &'a Map<String, Value> {
    root.get(key).and_then(Value::as_object).unwrap_or(root)
}

fn locate_header(root: &Map<String, Value>) -> Region<HeaderFields> {
    let header = section(root, "header");
    // The title is often kept at the top level even when a header object exists.
    let lookup = |key: &str| header.get(key).or_else(|| root.get(key));

    let fields = HeaderFields {
        title: lookup("title").and_then(text),
        invoice_number: lookup("invoice_number").and_then(text),
        date: lookup("date").and_then(text),
        due_date: lookup("due_date").and_then(text),
        vendor: lookup("vendor").and_then(party),
        customer: lookup("customer").and_then(party),
        payment_terms: lookup("payment_terms").and_then(text),
    };

    if fields.is_empty() {
        Region::Absent
    } else {
        Region::located(Locator::Keyed, fields)
    }
}

fn locate_line_items(root: &Map<String, Value>) -> Region<Vec<DocumentLine>> {
    let Some(value) = root.get("line_items").or_else(|| root.get("items")) else {
        return Region::Absent;
    };

    let Some(rows) = value.as_array() else {
        warn!("line items are not a list, treating region as absent");
        return Region::Absent;
    };

    let lines = rows
        .iter()
        .map(|row| match row.as_object() {
            Some(obj) => DocumentLine {
                description: obj.get("description").and_then(text),
                quantity: obj.get("quantity").and_then(amount),
                unit_price: obj.get("unit_price").and_then(amount),
                total: obj
                    .get("total")
                    .or_else(|| obj.get("line_total"))
                    .or_else(|| obj.get("amount"))
                    .and_then(amount),
            },
            // A row that is not a record carries no locatable fields.
            None => DocumentLine::default(),
        })
        .collect();

    Region::located(Locator::Keyed, lines)
}

fn locate_summary(root: &Map<String, Value>) -> Region<SummaryFields> {
    let summary = section(root, "summary");

    let fields = SummaryFields {
        subtotal: summary.get("subtotal").and_then(amount),
        tax: summary
            .get("tax")
            .or_else(|| summary.get("tax_amount"))
            .and_then(amount),
        total: summary.get("total").and_then(amount),
        currency: summary
            .get("currency")
            .or_else(|| root.get("currency"))
            .and_then(text),
    };

    if fields.is_empty() {
        Region::Absent
    } else {
        Region::located(Locator::Keyed, fields)
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

fn party(value: &Value) -> Option<Party> {
    match value {
        Value::String(name) if !name.trim().is_empty() => Some(Party::new(name.trim())),
        Value::Object(obj) => {
            let field = |keys: &[&str]| keys.iter().find_map(|k| obj.get(*k).and_then(text));
            Some(Party {
                name: field(&["name"]).unwrap_or_default(),
                address: field(&["address"]),
                contact: field(&["contact", "email", "phone"]),
                tax_id: field(&["tax_id", "vat_id", "vat_number", "ein"]),
            })
        }
        _ => None,
    }
}
