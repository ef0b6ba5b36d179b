//! Structural analysis: maps a parsed document onto header, line-item and
//! summary sections.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::document::parse_document_date;
use crate::models::document::{DocumentLine, ParsedDocument, Region};
use crate::models::invoice::Party;

/// A section of the model. Absent sections are explicit, never defaulted.
pub type Section<T> = Region<T>;

/// Header elements located in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeaderElements {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    /// Issue date, when it could be read as a calendar date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Issue date text exactly as found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
}

impl HeaderElements {
    fn element_names(&self) -> Vec<&'static str> {
        [
            ("title", self.title.is_some()),
            ("invoice_number", self.invoice_number.is_some()),
            ("date", self.date_text.is_some()),
            ("vendor", self.vendor.is_some()),
            ("customer", self.customer.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}

/// A classified line-item row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineRow {
    /// 1-based position in the document.
    pub position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Decimal>,
    /// The row's total: as stated, else `quantity * unit_price`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_total: Option<Decimal>,
}

impl LineRow {
    fn classify(position: usize, line: &DocumentLine) -> Self {
        let computed = match (line.quantity, line.unit_price) {
            (Some(quantity), Some(unit_price)) => quantity.checked_mul(unit_price),
            _ => None,
        };
        Self {
            position,
            description: line.description.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.total.or(computed),
        }
    }

    /// A row with a description and an amount.
    pub fn is_well_formed(&self) -> bool {
        self.description.is_some() && self.line_total.is_some()
    }
}

/// Summary elements located in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryElements {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
}

impl SummaryElements {
    fn element_names(&self) -> Vec<&'static str> {
        [
            ("subtotal", self.subtotal.is_some()),
            ("tax", self.tax.is_some()),
            ("total", self.total.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}

/// The three sections of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sections {
    pub header: Section<HeaderElements>,
    pub line_items: Section<Vec<LineRow>>,
    pub summary: Section<SummaryElements>,
}

/// Node of the document hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyNode {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    fn branch<I, S>(name: &str, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            children: children.into_iter().map(Self::leaf).collect(),
        }
    }
}

/// Structural model of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionModel {
    pub sections: Sections,
    pub hierarchy: HierarchyNode,
    /// Whether every located region was found by the same locator strategy.
    pub format_consistency: bool,
}

impl SectionModel {
    /// Rows of the line-items section, if it was located.
    pub fn line_rows(&self) -> Option<&[LineRow]> {
        self.sections.line_items.content().map(Vec::as_slice)
    }

    pub fn summary(&self) -> Option<&SummaryElements> {
        self.sections.summary.content()
    }

    pub fn header(&self) -> Option<&HeaderElements> {
        self.sections.header.content()
    }
}

/// Classifies the regions of a parsed document.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralAnalyzer;

impl StructuralAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Build the section model of a document. Regions the parser could not
    /// locate become absent sections.
    pub fn analyze(&self, document: &ParsedDocument) -> SectionModel {
        let sections = Sections {
            header: self.locate_header_elements(document),
            line_items: self.locate_line_items(document),
            summary: self.locate_summary_elements(document),
        };

        let hierarchy = self.map_hierarchy(&sections);
        let format_consistency = self.check_formatting_consistency(document);

        debug!(
            "Structure: header={} line_items={} summary={} consistent={}",
            sections.header.is_located(),
            sections.line_items.is_located(),
            sections.summary.is_located(),
            format_consistency
        );

        SectionModel {
            sections,
            hierarchy,
            format_consistency,
        }
    }

    fn locate_header_elements(&self, document: &ParsedDocument) -> Section<HeaderElements> {
        let Region::Located { locator, content } = &document.header else {
            warn!("Header region could not be located");
            return Region::Absent;
        };

        let party_name = |party: Option<&Party>| party.filter(|p| p.has_name()).map(|p| p.name.clone());

        let elements = HeaderElements {
            title: content.title.clone(),
            invoice_number: content.invoice_number.clone(),
            date: content.date.as_deref().and_then(parse_document_date),
            date_text: content.date.clone(),
            vendor: party_name(content.vendor.as_ref()),
            customer: party_name(content.customer.as_ref()),
        };

        Region::located(*locator, elements)
    }

    fn locate_line_items(&self, document: &ParsedDocument) -> Section<Vec<LineRow>> {
        let Region::Located { locator, content } = &document.line_items else {
            warn!("Line-item region could not be located");
            return Region::Absent;
        };

        let rows = content
            .iter()
            .enumerate()
            .map(|(i, line)| LineRow::classify(i + 1, line))
            .collect();

        Region::located(*locator, rows)
    }

    fn locate_summary_elements(&self, document: &ParsedDocument) -> Section<SummaryElements> {
        let Region::Located { locator, content } = &document.summary else {
            warn!("Summary region could not be located");
            return Region::Absent;
        };

        Region::located(
            *locator,
            SummaryElements {
                subtotal: content.subtotal,
                tax: content.tax,
                total: content.total,
            },
        )
    }

    fn map_hierarchy(&self, sections: &Sections) -> HierarchyNode {
        let mut children = Vec::new();

        if let Some(header) = sections.header.content() {
            children.push(HierarchyNode::branch("header", header.element_names()));
        }
        if let Some(rows) = sections.line_items.content() {
            children.push(HierarchyNode::branch(
                "line_items",
                rows.iter().map(|r| format!("line_item_{}", r.position)),
            ));
        }
        if let Some(summary) = sections.summary.content() {
            children.push(HierarchyNode::branch("summary", summary.element_names()));
        }

        HierarchyNode {
            name: "invoice".to_string(),
            children,
        }
    }

    fn check_formatting_consistency(&self, document: &ParsedDocument) -> bool {
        let mut locators = [
            document.header.locator(),
            document.line_items.locator(),
            document.summary.locator(),
        ]
        .into_iter()
        .flatten();

        match locators.next() {
            Some(first) => locators.all(|l| l == first),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentParser, JsonDocumentParser, TextDocumentParser};
    use crate::models::document::Locator;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_analyze_keyed_document() {
        let document = JsonDocumentParser::new()
            .parse(
                r#"{
                    "title": "INVOICE", "invoice_number": "INV-1", "date": "2023-10-15",
                    "vendor": {"name": "Acme"}, "customer": {"name": "Globex"},
                    "line_items": [{"description": "Work", "quantity": 2, "unit_price": 50}],
                    "summary": {"subtotal": 100, "total": 100}
                }"#,
            )
            .unwrap();

        let model = StructuralAnalyzer::new().analyze(&document);

        let header = model.header().unwrap();
        assert_eq!(header.date, NaiveDate::from_ymd_opt(2023, 10, 15));
        assert_eq!(header.vendor.as_deref(), Some("Acme"));

        let rows = model.line_rows().unwrap();
        assert_eq!(rows[0].line_total, Some(Decimal::new(100, 0)));
        assert!(rows[0].is_well_formed());

        assert!(model.format_consistency);
        assert_eq!(model.hierarchy.name, "invoice");
        let names: Vec<&str> = model.hierarchy.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["header", "line_items", "summary"]);
        assert_eq!(
            model.hierarchy.children[2].children,
            vec![HierarchyNode::leaf("subtotal"), HierarchyNode::leaf("total")]
        );
    }

    #[test]
    fn test_missing_regions_become_absent_sections() {
        let document = ParsedDocument::default();
        let model = StructuralAnalyzer::new().analyze(&document);

        assert_eq!(model.sections.header, Region::Absent);
        assert_eq!(model.sections.line_items, Region::Absent);
        assert_eq!(model.sections.summary, Region::Absent);
        assert!(model.hierarchy.children.is_empty());
        assert!(!model.format_consistency);
    }

    #[test]
    fn test_mixed_locators_are_inconsistent() {
        let document = TextDocumentParser::new()
            .parse("Invoice Number: 5\nDescription | Total\nWidget | 10.00\n\nTotal: 10.00")
            .unwrap();

        let model = StructuralAnalyzer::new().analyze(&document);

        assert_eq!(model.sections.header.locator(), Some(Locator::Labeled));
        assert_eq!(model.sections.line_items.locator(), Some(Locator::Tabular));
        assert!(!model.format_consistency);
    }

    #[test]
    fn test_unparseable_date_keeps_text() {
        let document = JsonDocumentParser::new()
            .parse(r#"{"invoice_number": "1", "date": "mid October"}"#)
            .unwrap();

        let header = StructuralAnalyzer::new().analyze(&document);
        let header = header.header().unwrap();
        assert_eq!(header.date, None);
        assert_eq!(header.date_text.as_deref(), Some("mid October"));
    }
}
