//! Invoice templates: layout matching for existing documents and rendering
//! for new ones.

mod catalog;
mod render;

pub use catalog::{TemplateCatalog, TemplateMatch};
pub use render::{
    LineItemsSection, RenderedContent, RenderedDocument, RenderedFooter, RenderedHeader,
    RenderedLine, RenderedParty, RenderedSummary,
};

use serde::Serialize;

use crate::models::document::ParsedDocument;
use crate::models::invoice::{CalculatedInvoice, Party};

/// A layout variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    Standard,
    Detailed,
    Simple,
    Professional,
}

/// Structural features a document may show. Each template weighs them
/// differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    /// Header title contains "INVOICE".
    InvoiceTitle,
    /// Header has both an invoice number and a date.
    NumberAndDate,
    /// Line-items region located and every row has a description and an amount.
    WellFormedLines,
    /// Summary has both subtotal and total.
    SummaryTotals,
    /// Every row has quantity and unit price.
    ItemizedLines,
    /// More rows than a short invoice would have.
    ManyLines,
    /// Few rows and a stated total.
    Brief,
    /// Both parties carry an address.
    PartyDetails,
    /// A party carries a tax identifier.
    TaxIdentifiers,
}

const MANY_LINES: usize = 10;
const BRIEF_LINES: usize = 3;

impl Signal {
    fn present(&self, document: &ParsedDocument) -> bool {
        let header = document.header_fields();
        let lines = document.lines();
        let summary = document.summary_fields();

        match self {
            Signal::InvoiceTitle => header
                .and_then(|h| h.title.as_deref())
                .is_some_and(|t| t.to_uppercase().contains("INVOICE")),
            Signal::NumberAndDate => {
                header.is_some_and(|h| h.invoice_number.is_some() && h.date.is_some())
            }
            Signal::WellFormedLines => lines.is_some_and(|rows| {
                rows.iter().all(|r| {
                    r.description.is_some()
                        && (r.total.is_some() || (r.quantity.is_some() && r.unit_price.is_some()))
                })
            }),
            Signal::SummaryTotals => {
                summary.is_some_and(|s| s.subtotal.is_some() && s.total.is_some())
            }
            Signal::ItemizedLines => lines.is_some_and(|rows| {
                !rows.is_empty()
                    && rows.iter().all(|r| r.quantity.is_some() && r.unit_price.is_some())
            }),
            Signal::ManyLines => lines.is_some_and(|rows| rows.len() > MANY_LINES),
            Signal::Brief => {
                lines.is_some_and(|rows| rows.len() <= BRIEF_LINES)
                    && summary.is_some_and(|s| s.total.is_some())
            }
            Signal::PartyDetails => header.is_some_and(|h| {
                let has_address = |p: Option<&Party>| p.is_some_and(|p| p.address.is_some());
                has_address(h.vendor.as_ref()) && has_address(h.customer.as_ref())
            }),
            Signal::TaxIdentifiers => document.parties().any(|p| p.tax_id.is_some()),
        }
    }
}

impl Template {
    /// Catalog registration order.
    pub const ALL: [Template; 4] = [
        Template::Standard,
        Template::Detailed,
        Template::Simple,
        Template::Professional,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Template::Standard => "standard",
            Template::Detailed => "detailed",
            Template::Simple => "simple",
            Template::Professional => "professional",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Template::Standard => "Header, itemized lines, summary and footer",
            Template::Detailed => "Numbered lines with discounts and an item count",
            Template::Simple => "Names, line totals and amount due only",
            Template::Professional => "Full party details with tax identifiers and currency",
        }
    }

    /// Signal weights in hundredths. Scores are capped at 100.
    fn weights(&self) -> &'static [(Signal, u32)] {
        match self {
            Template::Standard => &[
                (Signal::InvoiceTitle, 20),
                (Signal::NumberAndDate, 20),
                (Signal::WellFormedLines, 30),
                (Signal::SummaryTotals, 30),
            ],
            Template::Detailed => &[
                (Signal::InvoiceTitle, 10),
                (Signal::NumberAndDate, 10),
                (Signal::WellFormedLines, 20),
                (Signal::ItemizedLines, 30),
                (Signal::SummaryTotals, 20),
                (Signal::ManyLines, 10),
            ],
            Template::Simple => &[
                (Signal::InvoiceTitle, 20),
                (Signal::NumberAndDate, 20),
                (Signal::WellFormedLines, 20),
                (Signal::Brief, 40),
            ],
            Template::Professional => &[
                (Signal::InvoiceTitle, 10),
                (Signal::NumberAndDate, 20),
                (Signal::WellFormedLines, 20),
                (Signal::SummaryTotals, 20),
                (Signal::PartyDetails, 20),
                (Signal::TaxIdentifiers, 10),
            ],
        }
    }

    /// How closely a document matches this layout, in `[0, 1]`.
    pub fn similarity_score(&self, document: &ParsedDocument) -> f64 {
        let points: u32 = self
            .weights()
            .iter()
            .filter(|(signal, _)| signal.present(document))
            .map(|(_, weight)| weight)
            .sum();
        f64::from(points.min(100)) / 100.0
    }

    /// Render a computed invoice in this layout.
    pub fn render(&self, invoice: &CalculatedInvoice) -> RenderedDocument {
        render::render(*self, invoice)
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
