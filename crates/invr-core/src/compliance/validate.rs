//! Validation of generation input.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::document::patterns::ISO_DATE;
use crate::error::ValidationError;
use crate::models::invoice::{DateInput, InvoiceDraft, InvoiceRecord, LineItem, LineItemDraft, Party};

type Result<T> = std::result::Result<T, ValidationError>;

/// Validate a draft and turn it into an [`InvoiceRecord`].
///
/// Checks run in a fixed order and stop at the first failure: invoice
/// number, date, vendor, customer, line items, each item's fields, the date
/// format, then the percentage and amount ranges.
pub fn validate(draft: InvoiceDraft) -> Result<InvoiceRecord> {
    let InvoiceDraft {
        invoice_number,
        date,
        vendor,
        customer,
        line_items,
        tax_rate,
        discount_percentage,
        payment_terms,
        notes,
        currency,
    } = draft;

    let invoice_number = invoice_number
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ValidationError::MissingField("invoice_number".to_string()))?;

    let date = date
        .filter(|d| !matches!(d, DateInput::Text(t) if t.trim().is_empty()))
        .ok_or_else(|| ValidationError::MissingField("date".to_string()))?;

    let vendor = required_party(vendor, "vendor")?;
    let customer = required_party(customer, "customer")?;

    let drafts = line_items.unwrap_or_default();
    if drafts.is_empty() {
        return Err(ValidationError::NoLineItems);
    }

    for (i, item) in drafts.iter().enumerate() {
        check_item_fields(i + 1, item)?;
    }

    let date = parse_iso_date(&date)?;

    if let Some(rate) = tax_rate {
        check_percentage("tax_rate", rate)?;
    }
    if let Some(pct) = discount_percentage {
        check_percentage("discount_percentage", pct)?;
    }

    let line_items = drafts
        .into_iter()
        .enumerate()
        .map(|(i, item)| build_item(i + 1, item))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Validated invoice {} with {} line items",
        invoice_number,
        line_items.len()
    );

    Ok(InvoiceRecord {
        invoice_number,
        date,
        vendor,
        customer,
        line_items,
        tax_rate,
        discount_percentage,
        payment_terms,
        notes,
        currency,
    })
}

fn required_party(party: Option<Party>, field: &str) -> Result<Party> {
    party
        .filter(Party::has_name)
        .ok_or_else(|| ValidationError::MissingField(field.to_string()))
}

fn check_item_fields(index: usize, item: &LineItemDraft) -> Result<()> {
    let missing = |field| ValidationError::LineItemMissingField { index, field };

    if item.description.as_deref().is_none_or(|d| d.trim().is_empty()) {
        return Err(missing("description"));
    }
    if item.quantity.is_none() {
        return Err(missing("quantity"));
    }
    if item.unit_price.is_none() {
        return Err(missing("unit_price"));
    }
    Ok(())
}

fn parse_iso_date(date: &DateInput) -> Result<NaiveDate> {
    let text = match date {
        DateInput::Calendar(date) => return Ok(*date),
        DateInput::Text(text) => text.trim(),
    };

    let malformed = |reason: &str| ValidationError::Malformed {
        field: "date".to_string(),
        value: text.to_string(),
        reason: reason.to_string(),
    };

    let caps = ISO_DATE
        .captures(text)
        .ok_or_else(|| malformed("expected YYYY-MM-DD"))?;

    let year: i32 = caps[1].parse().map_err(|_| malformed("invalid year"))?;
    let month: u32 = caps[2].parse().map_err(|_| malformed("invalid month"))?;
    let day: u32 = caps[3].parse().map_err(|_| malformed("invalid day"))?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| malformed("not a calendar date"))
}

fn check_percentage(field: &str, value: Decimal) -> Result<()> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::Malformed {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be between 0 and 100".to_string(),
        });
    }
    Ok(())
}

fn check_non_negative(field: String, value: Decimal) -> Result<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::Malformed {
            field,
            value: value.to_string(),
            reason: "must not be negative".to_string(),
        });
    }
    Ok(())
}

fn build_item(index: usize, item: LineItemDraft) -> Result<LineItem> {
    let missing = |field| ValidationError::LineItemMissingField { index, field };

    let description = item.description.ok_or_else(|| missing("description"))?;
    let quantity = item.quantity.ok_or_else(|| missing("quantity"))?;
    let unit_price = item.unit_price.ok_or_else(|| missing("unit_price"))?;

    check_non_negative(format!("line_items[{}].quantity", index), quantity)?;
    check_non_negative(format!("line_items[{}].unit_price", index), unit_price)?;
    if let Some(pct) = item.discount_percentage {
        check_percentage(&format!("line_items[{}].discount_percentage", index), pct)?;
    }

    LineItem::new(description.trim(), quantity, unit_price, item.discount_percentage)
        .ok_or_else(|| {
            ValidationError::out_of_range(
                format!("line_items[{}]", index),
                format!("{} x {}", quantity, unit_price),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn draft() -> InvoiceDraft {
        InvoiceDraft {
            invoice_number: Some("INV-2023-0001".to_string()),
            date: Some("2023-11-01".into()),
            vendor: Some(Party::new("Northwind Services")),
            customer: Some(Party::new("Data Insights Inc.")),
            line_items: Some(vec![LineItemDraft::new("Training", dec("5"), dec("200.00"))]),
            tax_rate: Some(dec("8.5")),
            ..InvoiceDraft::default()
        }
    }

    #[test]
    fn test_valid_draft() {
        let record = validate(draft()).unwrap();
        assert_eq!(record.invoice_number, "INV-2023-0001");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2023, 11, 1).unwrap());
        assert_eq!(record.line_items.len(), 1);
        assert_eq!(record.line_items[0].line_total(), dec("1000.00"));
    }

    #[test]
    fn test_calendar_date_is_accepted() {
        let mut input = draft();
        input.date = Some(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap().into());
        assert_eq!(
            validate(input).unwrap().date,
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_missing_invoice_number() {
        let mut input = draft();
        input.invoice_number = None;
        assert_eq!(
            validate(input),
            Err(ValidationError::MissingField("invoice_number".to_string()))
        );

        let mut blank = draft();
        blank.invoice_number = Some("   ".to_string());
        assert_eq!(
            validate(blank),
            Err(ValidationError::MissingField("invoice_number".to_string()))
        );
    }

    #[test]
    fn test_first_failure_wins() {
        let input = InvoiceDraft {
            vendor: Some(Party::new("   ")),
            ..InvoiceDraft::default()
        };
        assert_eq!(
            validate(input),
            Err(ValidationError::MissingField("invoice_number".to_string()))
        );

        let mut input = draft();
        input.vendor = Some(Party::new(""));
        input.line_items = None;
        assert_eq!(
            validate(input),
            Err(ValidationError::MissingField("vendor".to_string()))
        );
    }

    #[test]
    fn test_empty_line_items() {
        let mut input = draft();
        input.line_items = Some(Vec::new());
        assert_eq!(validate(input), Err(ValidationError::NoLineItems));

        let mut input = draft();
        input.line_items = None;
        assert_eq!(validate(input), Err(ValidationError::NoLineItems));
    }

    #[test]
    fn test_line_item_missing_field() {
        let mut input = draft();
        input.line_items = Some(vec![
            LineItemDraft::new("Training", dec("1"), dec("1")),
            LineItemDraft {
                description: Some("Support".to_string()),
                quantity: Some(dec("2")),
                ..LineItemDraft::default()
            },
        ]);

        let err = validate(input).unwrap_err();
        assert_eq!(
            err,
            ValidationError::LineItemMissingField {
                index: 2,
                field: "unit_price"
            }
        );
        assert_eq!(err.field(), "line_items[2].unit_price");
    }

    #[test]
    fn test_line_item_missing_description_or_quantity() {
        let cases = [
            (
                LineItemDraft {
                    quantity: Some(dec("1")),
                    unit_price: Some(dec("10")),
                    ..LineItemDraft::default()
                },
                "description",
            ),
            (LineItemDraft::new("   ", dec("1"), dec("10")), "description"),
            (
                LineItemDraft {
                    description: Some("Support".to_string()),
                    unit_price: Some(dec("10")),
                    ..LineItemDraft::default()
                },
                "quantity",
            ),
        ];

        for (item, field) in cases {
            let mut input = draft();
            input.line_items = Some(vec![item]);
            assert_eq!(
                validate(input).unwrap_err(),
                ValidationError::LineItemMissingField { index: 1, field }
            );
        }
    }

    #[test]
    fn test_malformed_date() {
        for text in ["01/11/2023", "2023-13-01", "2023-02-30", "2023-1-1"] {
            let mut input = draft();
            input.date = Some(text.into());
            let err = validate(input).unwrap_err();
            assert!(
                matches!(&err, ValidationError::Malformed { field, value, .. } if field == "date" && value == text),
                "{}: {:?}",
                text,
                err
            );
        }
    }

    #[test]
    fn test_out_of_range_percentages() {
        let mut input = draft();
        input.tax_rate = Some(dec("120"));
        assert!(matches!(
            validate(input),
            Err(ValidationError::Malformed { field, .. }) if field == "tax_rate"
        ));

        let mut input = draft();
        input.line_items = Some(vec![
            LineItemDraft::new("Training", dec("1"), dec("1")).with_discount(dec("-5")),
        ]);
        assert!(matches!(
            validate(input),
            Err(ValidationError::Malformed { field, .. }) if field == "line_items[1].discount_percentage"
        ));
    }

    #[test]
    fn test_negative_quantity() {
        let mut input = draft();
        input.line_items = Some(vec![LineItemDraft::new("Refund", dec("-1"), dec("10"))]);
        assert!(matches!(
            validate(input),
            Err(ValidationError::Malformed { field, .. }) if field == "line_items[1].quantity"
        ));
    }

    #[test]
    fn test_line_total_out_of_range() {
        let mut input = draft();
        input.line_items = Some(vec![
            LineItemDraft::new("Training", dec("1"), dec("1")),
            LineItemDraft::new("Bulk", dec("1000000000000000"), dec("1000000000000000")),
        ]);

        let err = validate(input).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Malformed {
                field: "line_items[2]".to_string(),
                value: "1000000000000000 x 1000000000000000".to_string(),
                reason: "amount out of range".to_string(),
            }
        );
    }

    #[test]
    fn test_draft_from_json() {
        let input = InvoiceDraft::from_json(
            r#"{
                "invoice_number": "INV-7",
                "date": "2023-11-01",
                "vendor": {"name": "Acme"},
                "customer": {"name": "Globex", "address": "1 Main St"},
                "line_items": [{"description": "Widget", "quantity": 3, "unit_price": "9.99"}]
            }"#,
        )
        .unwrap();

        let record = validate(input).unwrap();
        assert_eq!(record.customer.address.as_deref(), Some("1 Main St"));
        assert_eq!(record.line_items[0].line_total(), dec("29.97"));
    }
}
