//! Invoice data models for the generation path.
//!
//! Input arrives as an [`InvoiceDraft`] whose fields are all optional, so that
//! validation (not deserialization) decides what is missing. A successful
//! validation yields an [`InvoiceRecord`]; computing totals yields a
//! [`CalculatedInvoice`], which is the only thing templates render.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::analysis::financial::line_total;

/// A party (vendor or customer) on the invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Full name.
    #[serde(default)]
    pub name: String,

    /// Postal address as a single string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Email, phone or any other contact line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,

    /// Tax identifier (VAT number, EIN, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
}

impl Party {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    pub fn with_tax_id(mut self, tax_id: impl Into<String>) -> Self {
        self.tax_id = Some(tax_id.into());
        self
    }

    /// Whether the party carries a non-blank name.
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// Invoice date as supplied by the caller: either already a calendar date,
/// or text that still has to be checked.
///
/// Deserialized input is always `Text`, so that the strict `YYYY-MM-DD`
/// check in validation applies to everything read from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DateInput {
    Calendar(NaiveDate),
    Text(String),
}

impl<'de> Deserialize<'de> for DateInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(DateInput::Text)
    }
}

impl From<NaiveDate> for DateInput {
    fn from(date: NaiveDate) -> Self {
        DateInput::Calendar(date)
    }
}

impl From<&str> for DateInput {
    fn from(text: &str) -> Self {
        DateInput::Text(text.to_string())
    }
}

/// A line item as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItemDraft {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub discount_percentage: Option<Decimal>,
}

impl LineItemDraft {
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            description: Some(description.into()),
            quantity: Some(quantity),
            unit_price: Some(unit_price),
            discount_percentage: None,
        }
    }

    pub fn with_discount(mut self, percentage: Decimal) -> Self {
        self.discount_percentage = Some(percentage);
        self
    }
}

/// Generation input before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub date: Option<DateInput>,
    #[serde(default)]
    pub vendor: Option<Party>,
    #[serde(default)]
    pub customer: Option<Party>,
    #[serde(default)]
    pub line_items: Option<Vec<LineItemDraft>>,
    /// Tax rate in percent (8.5 means 8.5 %).
    #[serde(default)]
    pub tax_rate: Option<Decimal>,
    /// Invoice-level discount in percent.
    #[serde(default)]
    pub discount_percentage: Option<Decimal>,
    #[serde(default)]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Currency code or symbol, reported as given.
    #[serde(default)]
    pub currency: Option<String>,
}

impl InvoiceDraft {
    /// Parse a draft from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A validated line item. `line_total` is always derived from the other
/// fields and cannot be set directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<Decimal>,
    line_total: Decimal,
}

impl LineItem {
    /// `None` when the line total does not fit in a `Decimal`.
    pub fn new(
        description: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
        discount_percentage: Option<Decimal>,
    ) -> Option<Self> {
        Some(Self {
            description: description.into(),
            quantity,
            unit_price,
            discount_percentage,
            line_total: line_total(quantity, unit_price, discount_percentage)?,
        })
    }

    /// `quantity * unit_price`, reduced by the line discount if present.
    pub fn line_total(&self) -> Decimal {
        self.line_total
    }

    /// Rebuild the item with its derived total recomputed.
    pub fn recalculated(&self) -> Option<Self> {
        Self::new(
            self.description.clone(),
            self.quantity,
            self.unit_price,
            self.discount_percentage,
        )
    }
}

/// Validated generation input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceRecord {
    pub invoice_number: String,
    pub date: NaiveDate,
    pub vendor: Party,
    pub customer: Party,
    pub line_items: Vec<LineItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Totals derived from an [`InvoiceRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<Decimal>,
    pub subtotal_after_discount: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// An invoice record together with its computed totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculatedInvoice {
    #[serde(flatten)]
    pub record: InvoiceRecord,
    #[serde(flatten)]
    pub totals: InvoiceTotals,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_line_item_total_is_derived() {
        let item = LineItem::new("Consulting", Decimal::new(5, 0), Decimal::new(20000, 2), None)
            .unwrap();
        assert_eq!(item.line_total(), Decimal::new(100000, 2));

        let discounted = LineItem::new(
            "Consulting",
            Decimal::new(2, 0),
            Decimal::new(100, 0),
            Some(Decimal::new(10, 0)),
        )
        .unwrap();
        assert_eq!(discounted.line_total(), Decimal::new(180, 0));
    }

    #[test]
    fn test_line_item_out_of_range() {
        let huge = Decimal::from_str("1000000000000000").unwrap();
        assert_eq!(LineItem::new("Bulk", huge, huge, None), None);
    }

    #[test]
    fn test_draft_from_json_accepts_numbers_and_strings() {
        let draft = InvoiceDraft::from_json(
            r#"{
                "invoice_number": "INV-1",
                "date": "2023-11-01",
                "vendor": {"name": "Acme"},
                "customer": {"name": "Globex"},
                "line_items": [{"description": "Widget", "quantity": 2, "unit_price": "12.50"}],
                "tax_rate": 8.5
            }"#,
        )
        .unwrap();

        assert_eq!(draft.invoice_number.as_deref(), Some("INV-1"));
        assert_eq!(draft.date, Some(DateInput::Text("2023-11-01".to_string())));
        assert_eq!(draft.tax_rate, Some(Decimal::from_str("8.5").unwrap()));
        let items = draft.line_items.unwrap();
        assert_eq!(items[0].unit_price, Some(Decimal::from_str("12.50").unwrap()));
    }

    #[test]
    fn test_malformed_date_text_is_kept_as_text() {
        let draft = InvoiceDraft::from_json(r#"{"date": "01/11/2023"}"#).unwrap();
        assert_eq!(draft.date, Some(DateInput::Text("01/11/2023".to_string())));
    }

    #[test]
    fn test_party_has_name() {
        assert!(Party::new("Acme").has_name());
        assert!(!Party::new("   ").has_name());
    }
}
