//! Financial calculations: reconciliation of existing documents and totals
//! for new invoices.
//!
//! All arithmetic is done on [`Decimal`] without intermediate rounding, so
//! compounding discounts and tax over many lines never drifts. Every operation
//! is checked: amounts beyond the `Decimal` range are reported, never wrapped
//! or panicked on.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::document::patterns::{currency_code_for_symbol, CURRENCY_CODE, CURRENCY_SYMBOL};
use crate::error::ValidationError;
use crate::models::config::FinancialConfig;
use crate::models::document::ParsedDocument;
use crate::models::invoice::{CalculatedInvoice, InvoiceRecord, InvoiceTotals, LineItem};

use super::structure::SectionModel;

/// `amount * percentage / 100`, or `None` on overflow.
pub fn percent_of(amount: Decimal, percentage: Decimal) -> Option<Decimal> {
    amount
        .checked_mul(percentage)?
        .checked_div(Decimal::ONE_HUNDRED)
}

/// Total of a single line: `quantity * unit_price`, less the line discount.
/// `None` when the amount does not fit in a `Decimal`.
pub fn line_total(
    quantity: Decimal,
    unit_price: Decimal,
    discount: Option<Decimal>,
) -> Option<Decimal> {
    let gross = quantity.checked_mul(unit_price)?;
    match discount {
        Some(percentage) => gross.checked_sub(percent_of(gross, percentage)?),
        None => Some(gross),
    }
}

/// Sum of `values`, or `None` on overflow.
pub fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values.into_iter().try_fold(Decimal::ZERO, Decimal::checked_add)
}

/// Kind of a detected discrepancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyKind {
    /// Stated total differs from subtotal + tax.
    TotalMismatch,
}

/// A mismatch between a stated and a recomputed amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    #[serde(rename = "type")]
    pub kind: DiscrepancyKind,
    pub stated: Decimal,
    pub calculated: Decimal,
    /// `stated - calculated`.
    pub difference: Decimal,
}

/// Financial summary of an existing document.
///
/// `None` marks an amount that could not be located, as opposed to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinancialInsights {
    pub line_items_count: usize,
    /// Sum of the located line totals.
    pub subtotal: Option<Decimal>,
    /// Tax amount taken from the summary.
    pub tax_amount: Option<Decimal>,
    /// Recalculated total: subtotal + tax.
    pub total: Option<Decimal>,
    /// Total as stated in the summary.
    pub stated_total: Option<Decimal>,
    pub currency: Option<String>,
    pub discrepancies: Vec<Discrepancy>,
}

impl FinancialInsights {
    pub fn has_discrepancies(&self) -> bool {
        !self.discrepancies.is_empty()
    }
}

/// Financial calculation engine.
#[derive(Debug, Clone)]
pub struct FinancialEngine {
    tolerance: Decimal,
}

impl FinancialEngine {
    pub fn new(config: &FinancialConfig) -> Self {
        Self {
            tolerance: config.tolerance,
        }
    }

    /// Recompute the totals of an existing document and compare them with
    /// what the document states.
    pub fn reconcile(&self, document: &ParsedDocument, structure: &SectionModel) -> FinancialInsights {
        let rows = structure.line_rows();

        let subtotal = rows.and_then(|rows| {
            let sum = checked_sum(rows.iter().filter_map(|r| r.line_total));
            if sum.is_none() {
                warn!("Line totals exceed the representable range, subtotal left out");
            }
            sum
        });
        let tax_amount = structure.summary().and_then(|s| s.tax);
        let stated_total = structure.summary().and_then(|s| s.total);
        let mut total = subtotal.and_then(|s| s.checked_add(tax_amount.unwrap_or(Decimal::ZERO)));

        let mut discrepancies = Vec::new();
        if let (Some(stated), Some(calculated)) = (stated_total, total) {
            match stated.checked_sub(calculated) {
                Some(difference) if difference.abs() > self.tolerance => {
                    info!(
                        "Total mismatch: stated {} vs calculated {} (difference {})",
                        stated, calculated, difference
                    );
                    discrepancies.push(Discrepancy {
                        kind: DiscrepancyKind::TotalMismatch,
                        stated,
                        calculated,
                        difference,
                    });
                }
                Some(_) => {}
                None => {
                    warn!("Stated total {} not comparable with {}", stated, calculated);
                    total = None;
                }
            }
        }

        let insights = FinancialInsights {
            line_items_count: rows.map_or(0, <[_]>::len),
            subtotal,
            tax_amount,
            total,
            stated_total,
            currency: identify_currency(document),
            discrepancies,
        };

        debug!(
            "Reconciled {} line items, {} discrepancies",
            insights.line_items_count,
            insights.discrepancies.len()
        );

        insights
    }

    /// Compute line totals, discount, tax and grand total of a new invoice.
    ///
    /// Idempotent: feeding the resulting record back in yields the same
    /// totals. Fails only when an amount leaves the `Decimal` range.
    pub fn compute_totals(
        &self,
        record: &InvoiceRecord,
    ) -> Result<CalculatedInvoice, ValidationError> {
        let line_items = record
            .line_items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.recalculated().ok_or_else(|| {
                    ValidationError::out_of_range(
                        format!("line_items[{}]", index),
                        format!("{} x {}", item.quantity, item.unit_price),
                    )
                })
            })
            .collect::<Result<Vec<LineItem>, _>>()?;

        let subtotal = checked_sum(line_items.iter().map(LineItem::line_total)).ok_or_else(|| {
            ValidationError::out_of_range("subtotal", format!("{} line items", line_items.len()))
        })?;

        let discount_amount = record
            .discount_percentage
            .map(|pct| {
                percent_of(subtotal, pct)
                    .ok_or_else(|| ValidationError::out_of_range("discount_percentage", pct))
            })
            .transpose()?;
        let subtotal_after_discount = subtotal
            .checked_sub(discount_amount.unwrap_or(Decimal::ZERO))
            .ok_or_else(|| ValidationError::out_of_range("subtotal", subtotal))?;

        let tax_amount = match record.tax_rate {
            Some(rate) => percent_of(subtotal_after_discount, rate)
                .ok_or_else(|| ValidationError::out_of_range("tax_rate", rate))?,
            None => Decimal::ZERO,
        };
        let total = subtotal_after_discount
            .checked_add(tax_amount)
            .ok_or_else(|| ValidationError::out_of_range("total", subtotal_after_discount))?;

        let totals = InvoiceTotals {
            subtotal,
            discount_amount,
            subtotal_after_discount,
            tax_amount,
            total,
        };

        debug!(
            "Invoice {}: subtotal {} tax {} total {}",
            record.invoice_number, totals.subtotal, totals.tax_amount, totals.total
        );

        Ok(CalculatedInvoice {
            record: InvoiceRecord {
                line_items,
                ..record.clone()
            },
            totals,
        })
    }
}

impl Default for FinancialEngine {
    fn default() -> Self {
        Self::new(&FinancialConfig::default())
    }
}

/// Currency as stated in the summary, else the first ISO code or symbol in
/// the document text.
fn identify_currency(document: &ParsedDocument) -> Option<String> {
    if let Some(currency) = document.summary_fields().and_then(|s| s.currency.clone()) {
        return Some(currency);
    }

    if let Some(m) = CURRENCY_CODE.find(&document.raw_text) {
        return Some(m.as_str().to_string());
    }

    CURRENCY_SYMBOL
        .find(&document.raw_text)
        .and_then(|m| currency_code_for_symbol(m.as_str()))
        .map(str::to_string)
}
