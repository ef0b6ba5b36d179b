//! Rendering of computed invoices into section-keyed documents.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::invoice::{CalculatedInvoice, LineItem, Party};

use super::Template;

pub const DEFAULT_PAYMENT_TERMS: &str = "Due on receipt";
pub const THANK_YOU_MESSAGE: &str = "Thank you for your business!";

/// A rendered invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedDocument {
    /// Always "invoice".
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub template: Template,
    pub content: RenderedContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedContent {
    pub header: RenderedHeader,
    pub line_items_section: LineItemsSection,
    pub summary: RenderedSummary,
    pub footer: RenderedFooter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedHeader {
    pub title: &'static str,
    pub invoice_number: String,
    /// ISO `YYYY-MM-DD`.
    pub date: String,
    pub vendor: RenderedParty,
    pub customer: RenderedParty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedParty {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItemsSection {
    pub items: Vec<RenderedLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    pub description: String,
    pub quantity: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<Decimal>,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal_after_discount: Option<Decimal>,
    pub tax: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedFooter {
    pub payment_terms: String,
    pub notes: String,
    pub thank_you_message: &'static str,
}

pub(super) fn render(template: Template, invoice: &CalculatedInvoice) -> RenderedDocument {
    RenderedDocument {
        kind: "invoice",
        template,
        content: RenderedContent {
            header: header(template, invoice),
            line_items_section: line_items(template, &invoice.record.line_items),
            summary: summary(template, invoice),
            footer: footer(invoice),
        },
    }
}

fn header(template: Template, invoice: &CalculatedInvoice) -> RenderedHeader {
    let record = &invoice.record;
    RenderedHeader {
        title: match template {
            Template::Simple => "Invoice",
            _ => "INVOICE",
        },
        invoice_number: record.invoice_number.clone(),
        date: record.date.format("%Y-%m-%d").to_string(),
        vendor: party(template, &record.vendor),
        customer: party(template, &record.customer),
        currency: match template {
            Template::Professional | Template::Detailed => record.currency.clone(),
            _ => None,
        },
    }
}

fn party(template: Template, party: &Party) -> RenderedParty {
    let name = party.name.clone();
    match template {
        Template::Simple => RenderedParty {
            name,
            address: None,
            contact: None,
            tax_id: None,
        },
        Template::Standard | Template::Detailed => RenderedParty {
            name,
            address: Some(party.address.clone().unwrap_or_default()),
            contact: Some(party.contact.clone().unwrap_or_default()),
            tax_id: None,
        },
        Template::Professional => RenderedParty {
            name,
            address: Some(party.address.clone().unwrap_or_default()),
            contact: Some(party.contact.clone().unwrap_or_default()),
            tax_id: party.tax_id.clone(),
        },
    }
}

fn line_items(template: Template, items: &[LineItem]) -> LineItemsSection {
    let items = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let detailed = template == Template::Detailed;
            RenderedLine {
                position: detailed.then_some(i + 1),
                description: item.description.clone(),
                quantity: item.quantity,
                unit_price: (template != Template::Simple).then_some(item.unit_price),
                discount_percentage: if detailed { item.discount_percentage } else { None },
                total: item.line_total(),
            }
        })
        .collect();

    LineItemsSection { items }
}

fn summary(template: Template, invoice: &CalculatedInvoice) -> RenderedSummary {
    let totals = &invoice.totals;
    let discounted = totals.discount_amount.is_some();

    RenderedSummary {
        item_count: (template == Template::Detailed).then_some(invoice.record.line_items.len()),
        subtotal: (template != Template::Simple).then_some(totals.subtotal),
        discount: totals.discount_amount,
        subtotal_after_discount: discounted.then_some(totals.subtotal_after_discount),
        tax: totals.tax_amount,
        total: totals.total,
    }
}

fn footer(invoice: &CalculatedInvoice) -> RenderedFooter {
    let record = &invoice.record;
    RenderedFooter {
        payment_terms: record
            .payment_terms
            .clone()
            .unwrap_or_else(|| DEFAULT_PAYMENT_TERMS.to_string()),
        notes: record.notes.clone().unwrap_or_default(),
        thank_you_message: THANK_YOU_MESSAGE,
    }
}
