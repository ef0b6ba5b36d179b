//! Parser for plain-text invoices.
//!
//! Recognizes "Label: value" lines for header and summary fields, and a
//! pipe- or tab-delimited table whose first row names the columns.

use tracing::debug;

use crate::error::ParseError;
use crate::models::document::{
    DocumentLine, HeaderFields, Locator, ParsedDocument, Region, SummaryFields,
};
use crate::models::invoice::Party;

use super::patterns::{LABELED_LINE, TABLE_HEADER, TITLE};
use super::{parse_amount, DocumentParser, Result};

/// Parses labeled plain-text invoices.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDocumentParser;

impl TextDocumentParser {
    pub fn new() -> Self {
        Self
    }
}

/// Which field a label refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    InvoiceNumber,
    Date,
    DueDate,
    Vendor,
    VendorAddress,
    Customer,
    CustomerAddress,
    Contact,
    TaxId,
    PaymentTerms,
    Subtotal,
    Tax,
    Total,
    Currency,
}

fn classify_label(label: &str) -> Option<Field> {
    let label = label.trim().trim_end_matches('.').to_lowercase();
    let field = match label.as_str() {
        "invoice number" | "invoice no" | "invoice #" | "invoice id" | "number" | "no" => {
            Field::InvoiceNumber
        }
        "date" | "invoice date" | "issue date" | "date of issue" => Field::Date,
        "due date" | "payment due" => Field::DueDate,
        "vendor" | "from" | "seller" | "supplier" | "bill from" => Field::Vendor,
        "vendor address" | "seller address" | "supplier address" => Field::VendorAddress,
        "customer" | "to" | "bill to" | "buyer" | "client" => Field::Customer,
        "customer address" | "buyer address" | "client address" => Field::CustomerAddress,
        "contact" | "email" | "phone" => Field::Contact,
        "vat id" | "vat no" | "vat number" | "tax id" | "ein" | "vat reg no" => Field::TaxId,
        "payment terms" | "terms" => Field::PaymentTerms,
        "subtotal" | "sub-total" | "sub total" | "net" | "net amount" => Field::Subtotal,
        "tax" | "vat" | "sales tax" | "tax amount" | "vat amount" => Field::Tax,
        "total" | "grand total" | "total due" | "amount due" | "balance due" => Field::Total,
        "currency" => Field::Currency,
        _ => return None,
    };
    Some(field)
}

/// Column roles in a line-item table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Description,
    Quantity,
    UnitPrice,
    Total,
    Other,
}

fn classify_column(name: &str) -> Column {
    let name = name.trim().to_lowercase();
    if name.contains("desc") || name == "item" || name.contains("service") {
        Column::Description
    } else if name.starts_with("qty") || name.contains("quantity") || name == "hours" {
        Column::Quantity
    } else if name.contains("price") || name.contains("rate") {
        Column::UnitPrice
    } else if name.contains("total") || name.contains("amount") {
        Column::Total
    } else {
        Column::Other
    }
}

/// Cells of a table row. Pipe-delimited cells keep their position, so a
/// blank cell stays blank instead of shifting later values left; only the
/// edge pipes of a boxed row are dropped. Runs of tabs count as one
/// separator.
fn split_cells(line: &str) -> Vec<&str> {
    let line = line.trim();
    if line.contains('|') {
        let line = line.strip_prefix('|').unwrap_or(line);
        let line = line.strip_suffix('|').unwrap_or(line);
        line.split('|').map(str::trim).collect()
    } else {
        line.split('\t')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect()
    }
}

#[derive(Default)]
struct TableState {
    columns: Vec<Column>,
    rows: Vec<DocumentLine>,
    open: bool,
}

impl TableState {
    fn push_row(&mut self, line: &str) {
        let mut row = DocumentLine::default();
        for (cell, column) in split_cells(line).into_iter().zip(self.columns.iter()) {
            match column {
                Column::Description => row.description = Some(cell.to_string()),
                Column::Quantity => row.quantity = parse_amount(cell),
                Column::UnitPrice => row.unit_price = parse_amount(cell),
                Column::Total => row.total = parse_amount(cell),
                Column::Other => {}
            }
        }
        self.rows.push(row);
    }
}

impl DocumentParser for TextDocumentParser {
    fn parse(&self, raw: &str) -> Result<ParsedDocument> {
        if raw.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        let mut header = HeaderFields::default();
        let mut summary = SummaryFields::default();
        let mut table: Option<TableState> = None;

        for line in raw.lines() {
            let trimmed = line.trim();

            if let Some(state) = table.as_mut().filter(|t| t.open) {
                if trimmed.is_empty() {
                    state.open = false;
                } else if trimmed.chars().all(|c| matches!(c, '-' | '|' | '+' | '=' | ' ')) {
                    // rule line
                    continue;
                } else if trimmed.contains('|') || trimmed.contains('\t') {
                    state.push_row(trimmed);
                    continue;
                } else {
                    state.open = false;
                }
            }

            if trimmed.is_empty() {
                continue;
            }

            if table.is_none() && TABLE_HEADER.is_match(trimmed) {
                table = Some(TableState {
                    columns: split_cells(trimmed).into_iter().map(classify_column).collect(),
                    rows: Vec::new(),
                    open: true,
                });
                continue;
            }

            if let Some(caps) = LABELED_LINE.captures(trimmed) {
                if let Some(field) = classify_label(&caps[1]) {
                    apply_field(&mut header, &mut summary, field, &caps[2]);
                    continue;
                }
            }

            if header.title.is_none() {
                if let Some(caps) = TITLE.captures(trimmed) {
                    header.title = Some(caps[1].to_string());
                }
            }
        }

        let document = ParsedDocument {
            header: if header.is_empty() {
                Region::Absent
            } else {
                Region::located(Locator::Labeled, header)
            },
            line_items: match table {
                Some(state) => Region::located(Locator::Tabular, state.rows),
                None => Region::Absent,
            },
            summary: if summary.is_empty() {
                Region::Absent
            } else {
                Region::located(Locator::Labeled, summary)
            },
            raw_text: raw.to_string(),
        };

        debug!(
            "Text document regions: header={} line_items={} summary={}",
            document.header.is_located(),
            document.line_items.is_located(),
            document.summary.is_located()
        );

        Ok(document)
    }
}

fn apply_field(header: &mut HeaderFields, summary: &mut SummaryFields, field: Field, value: &str) {
    let value = value.trim().to_string();
    match field {
        Field::InvoiceNumber => header.invoice_number = Some(value),
        Field::Date => header.date = Some(value),
        Field::DueDate => header.due_date = Some(value),
        Field::PaymentTerms => header.payment_terms = Some(value),
        Field::Vendor => header.vendor.get_or_insert_with(Party::default).name = value,
        Field::Customer => header.customer.get_or_insert_with(Party::default).name = value,
        Field::VendorAddress => {
            header.vendor.get_or_insert_with(Party::default).address = Some(value)
        }
        Field::CustomerAddress => {
            header.customer.get_or_insert_with(Party::default).address = Some(value)
        }
        // Unqualified contact and tax id lines belong to the vendor until it
        // has one, then to the customer.
        Field::Contact => {
            let party = next_party(header, |p| p.contact.is_none());
            party.contact = Some(value);
        }
        Field::TaxId => {
            let party = next_party(header, |p| p.tax_id.is_none());
            party.tax_id = Some(value);
        }
        Field::Subtotal => summary.subtotal = parse_amount(&value),
        Field::Tax => summary.tax = parse_amount(&value),
        Field::Total => summary.total = parse_amount(&value),
        Field::Currency => summary.currency = Some(value),
    }
}

fn next_party(header: &mut HeaderFields, is_free: impl Fn(&Party) -> bool) -> &mut Party {
    let vendor_free = header.vendor.as_ref().is_none_or(&is_free);
    if vendor_free {
        header.vendor.get_or_insert_with(Party::default)
    } else {
        header.customer.get_or_insert_with(Party::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const TEXT_INVOICE: &str = r#"
        INVOICE

        Invoice Number: INV-2023-0002
        Date: 2023-10-15
        Vendor: Northwind Services
        VAT ID: DE123456789
        Customer: TechCorp Solutions
        Customer Address: 1 Main Street, Springfield

        Description        | Qty | Unit Price | Total
        -------------------+-----+------------+---------
        Consulting         | 20  | 150.00     | 3,000.00

        Subtotal: 3,000.00
        Tax: 255.00
        Total: 3,255.00 EUR
    "#;

    #[test]
    fn test_parse_labeled_invoice() {
        let document = TextDocumentParser::new().parse(TEXT_INVOICE).unwrap();

        let header = document.header_fields().unwrap();
        assert_eq!(header.title.as_deref(), Some("INVOICE"));
        assert_eq!(header.invoice_number.as_deref(), Some("INV-2023-0002"));
        assert_eq!(header.date.as_deref(), Some("2023-10-15"));

        let vendor = header.vendor.as_ref().unwrap();
        assert_eq!(vendor.name, "Northwind Services");
        assert_eq!(vendor.tax_id.as_deref(), Some("DE123456789"));

        let customer = header.customer.as_ref().unwrap();
        assert_eq!(customer.address.as_deref(), Some("1 Main Street, Springfield"));

        let lines = document.lines().unwrap();
        assert_eq!(
            lines,
            &[DocumentLine {
                description: Some("Consulting".to_string()),
                quantity: Some(Decimal::new(20, 0)),
                unit_price: Some(Decimal::from_str("150.00").unwrap()),
                total: Some(Decimal::from_str("3000.00").unwrap()),
            }]
        );

        let summary = document.summary_fields().unwrap();
        assert_eq!(summary.subtotal, Some(Decimal::from_str("3000.00").unwrap()));
        assert_eq!(summary.total, Some(Decimal::from_str("3255.00").unwrap()));

        assert_eq!(document.header.locator(), Some(Locator::Labeled));
        assert_eq!(document.line_items.locator(), Some(Locator::Tabular));
    }

    #[test]
    fn test_blank_cells_keep_column_positions() {
        let document = TextDocumentParser::new()
            .parse(
                "| Description | Qty | Unit Price | Total |\n\
                 | Setup fee   |     |            | 250.00 |\n\
                 | Hosting     | 2   | 10.00      |        |\n",
            )
            .unwrap();

        assert_eq!(
            document.lines().unwrap(),
            &[
                DocumentLine {
                    description: Some("Setup fee".to_string()),
                    quantity: None,
                    unit_price: None,
                    total: Some(Decimal::from_str("250.00").unwrap()),
                },
                DocumentLine {
                    description: Some("Hosting".to_string()),
                    quantity: Some(Decimal::new(2, 0)),
                    unit_price: Some(Decimal::from_str("10.00").unwrap()),
                    total: None,
                },
            ]
        );
    }

    #[test]
    fn test_text_without_table_has_absent_line_items() {
        let document = TextDocumentParser::new()
            .parse("Invoice Number: 17\nTotal: 10.00")
            .unwrap();

        assert!(document.header.is_located());
        assert_eq!(document.line_items, Region::Absent);
        assert!(document.summary.is_located());
    }

    #[test]
    fn test_unlabeled_text_locates_nothing() {
        let document = TextDocumentParser::new()
            .parse("Dear customer,\nthanks for your order.")
            .unwrap();

        assert_eq!(document.header, Region::Absent);
        assert_eq!(document.summary, Region::Absent);
    }
}
