//! The invoice engine: the two top-level pipelines.
//!
//! Analysis: parse, structure, reconcile, check compliance, match templates.
//! Generation: validate, compute totals, pick a template, render.

use serde::Serialize;
use tracing::info;

use crate::analysis::financial::{FinancialEngine, FinancialInsights};
use crate::analysis::structure::{SectionModel, StructuralAnalyzer};
use crate::compliance::{ComplianceEngine, ComplianceReport, ComplianceStatus, RuleSet};
use crate::document::DocumentParser;
use crate::error::Result;
use crate::models::config::EngineConfig;
use crate::models::document::ParsedDocument;
use crate::models::invoice::InvoiceDraft;
use crate::templates::{RenderedDocument, Template, TemplateCatalog, TemplateMatch};

/// Everything learned about one existing document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnderstandingResult {
    pub document_structure: SectionModel,
    pub financial_summary: FinancialInsights,
    pub compliance_status: ComplianceStatus,
    pub compliance: ComplianceReport,
    pub template_matches: Vec<TemplateMatch>,
    pub best_match: Option<Template>,
    pub suggested_improvements: Vec<String>,
}

/// Invoice understanding and generation engine.
///
/// Holds the rule set and template catalog built from configuration; both
/// are read-only after construction, so one engine can serve many threads.
#[derive(Debug, Clone)]
pub struct InvoiceEngine {
    structure: StructuralAnalyzer,
    financial: FinancialEngine,
    rules: RuleSet,
    catalog: TemplateCatalog,
}

impl InvoiceEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            structure: StructuralAnalyzer::new(),
            financial: FinancialEngine::new(&config.financial),
            rules: RuleSet::from_config(&config.compliance),
            catalog: TemplateCatalog::new(config.templates),
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Parse a raw document and analyze it.
    pub fn analyze_invoice(
        &self,
        parser: &dyn DocumentParser,
        raw: &str,
    ) -> Result<UnderstandingResult> {
        info!("Analyzing document of {} characters", raw.len());
        let document = parser.parse(raw)?;
        Ok(self.analyze_document(&document))
    }

    /// Analyze an already parsed document.
    pub fn analyze_document(&self, document: &ParsedDocument) -> UnderstandingResult {
        let structure = self.structure.analyze(document);
        let financial = self.financial.reconcile(document, &structure);
        let compliance = ComplianceEngine::new(&self.rules).check_compliance(document, &financial);
        let template_matches = self.catalog.identify_templates(document);
        let best_match = template_matches.first().map(|m| m.template);

        info!(
            "Analysis complete: {} line items, {} discrepancies, {}",
            financial.line_items_count,
            financial.discrepancies.len(),
            compliance.status
        );

        UnderstandingResult {
            document_structure: structure,
            financial_summary: financial,
            compliance_status: compliance.status,
            suggested_improvements: compliance.improvement_suggestions.clone(),
            compliance,
            template_matches,
            best_match,
        }
    }

    /// Validate a draft, compute its totals and render it.
    ///
    /// An explicitly named template must exist; otherwise one is suggested.
    pub fn generate_invoice(
        &self,
        draft: InvoiceDraft,
        template_name: Option<&str>,
    ) -> Result<RenderedDocument> {
        let record = ComplianceEngine::new(&self.rules).validate_invoice_data(draft)?;
        let calculated = self.financial.compute_totals(&record)?;

        let template = match template_name {
            Some(name) => self.catalog.get_template(name)?,
            None => self.catalog.suggest_template(&calculated.record),
        };

        info!(
            "Generating invoice {} with the {} template",
            calculated.record.invoice_number, template
        );

        Ok(template.render(&calculated))
    }
}

impl Default for InvoiceEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{JsonDocumentParser, TextDocumentParser};
    use crate::error::{InvrError, ParseError, ValidationError};
    use crate::models::invoice::{LineItemDraft, Party};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const EXISTING_INVOICE: &str = r#"{
        "title": "INVOICE",
        "invoice_number": "INV-2023-0002",
        "date": "2023-10-15",
        "vendor": {"name": "Northwind Services", "address": "42 Harbour Road"},
        "customer": {"name": "TechCorp Solutions", "address": "1 Main Street"},
        "line_items": [
            {"description": "AI Consulting", "quantity": 20, "unit_price": 150.00, "total": 3000.00}
        ],
        "summary": {"subtotal": 3000.00, "tax": 255.00, "total": 3255.00, "currency": "USD"}
    }"#;

    fn draft() -> InvoiceDraft {
        InvoiceDraft {
            invoice_number: Some("INV-2023-0001".to_string()),
            date: Some("2023-11-01".into()),
            vendor: Some(Party::new("Northwind Services")),
            customer: Some(Party::new("Data Insights Inc.")),
            line_items: Some(vec![LineItemDraft::new(
                "AI Model Training",
                dec("5"),
                dec("200.00"),
            )]),
            tax_rate: Some(dec("8.5")),
            ..InvoiceDraft::default()
        }
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InvoiceEngine>();
    }

    #[test]
    fn test_analyze_existing_invoice() {
        let engine = InvoiceEngine::default();
        let result = engine
            .analyze_invoice(&JsonDocumentParser::new(), EXISTING_INVOICE)
            .unwrap();

        assert_eq!(result.financial_summary.subtotal, Some(dec("3000.00")));
        assert_eq!(result.financial_summary.total, Some(dec("3255.00")));
        assert!(result.financial_summary.discrepancies.is_empty());
        assert_eq!(result.financial_summary.currency.as_deref(), Some("USD"));

        assert_eq!(result.compliance_status, result.compliance.status);
        assert_eq!(result.suggested_improvements, result.compliance.improvement_suggestions);

        assert_eq!(result.best_match, Some(Template::Standard));
        assert_eq!(result.template_matches[0].score, 1.0);
        assert!(result.document_structure.format_consistency);
    }

    #[test]
    fn test_analyze_text_invoice() {
        let engine = InvoiceEngine::default();
        let result = engine
            .analyze_invoice(
                &TextDocumentParser::new(),
                "INVOICE\nInvoice Number: 9\nDate: 15.10.2023\n\
                 Description | Qty | Unit Price | Total\nWork | 2 | 50.00 | 100.00\n\n\
                 Subtotal: 100.00\nTax: 20.00\nTotal: 125.00",
            )
            .unwrap();

        let discrepancies = &result.financial_summary.discrepancies;
        assert_eq!(discrepancies.len(), 1);
        assert_eq!(discrepancies[0].difference, dec("5.00"));
        assert_eq!(result.compliance_status, ComplianceStatus::NonCompliant);
    }

    #[test]
    fn test_analyze_reports_parse_errors() {
        let engine = InvoiceEngine::default();
        let err = engine
            .analyze_invoice(&JsonDocumentParser::new(), "not json")
            .unwrap_err();
        assert!(matches!(err, InvrError::Parse(ParseError::Syntax(_))));
    }

    #[test]
    fn test_generate_invoice() {
        let engine = InvoiceEngine::default();
        let doc = engine.generate_invoice(draft(), None).unwrap();

        assert_eq!(doc.template, Template::Standard);
        assert_eq!(doc.content.line_items_section.items[0].total, dec("1000.00"));
        assert_eq!(doc.content.summary.tax, dec("85.00"));
        assert_eq!(doc.content.summary.total, dec("1085.00"));
    }

    #[test]
    fn test_generate_with_named_template() {
        let engine = InvoiceEngine::default();
        let doc = engine.generate_invoice(draft(), Some("simple")).unwrap();
        assert_eq!(doc.template, Template::Simple);

        let err = engine.generate_invoice(draft(), Some("fancy")).unwrap_err();
        assert!(matches!(err, InvrError::TemplateNotFound(name) if name == "fancy"));
    }

    #[test]
    fn test_generate_suggests_detailed_for_many_items() {
        let mut input = draft();
        input.line_items = Some(
            (1..=11)
                .map(|i| LineItemDraft::new(format!("Item {}", i), dec("1"), dec("10")))
                .collect(),
        );

        let doc = InvoiceEngine::default().generate_invoice(input, None).unwrap();
        assert_eq!(doc.template, Template::Detailed);
        assert_eq!(doc.content.summary.item_count, Some(11));
    }

    #[test]
    fn test_validation_failure_stops_generation() {
        let mut input = draft();
        input.date = Some("01/11/2023".into());

        let err = InvoiceEngine::default()
            .generate_invoice(input, Some("fancy"))
            .unwrap_err();
        assert!(matches!(
            err,
            InvrError::Validation(ValidationError::Malformed { .. })
        ));
    }

    #[test]
    fn test_amounts_out_of_range_are_rejected() {
        let huge = dec("1000000000000000");
        let mut input = draft();
        input.line_items = Some(vec![LineItemDraft::new("Bulk", huge, huge)]);

        let err = InvoiceEngine::default().generate_invoice(input, None).unwrap_err();
        assert!(matches!(
            err,
            InvrError::Validation(ValidationError::Malformed { ref reason, .. })
                if reason == "amount out of range"
        ));

        let half_max = dec("50000000000000000000000000000");
        let mut input = draft();
        input.line_items = Some(vec![
            LineItemDraft::new("A", Decimal::ONE, half_max),
            LineItemDraft::new("B", Decimal::ONE, half_max),
        ]);

        let err = InvoiceEngine::default().generate_invoice(input, None).unwrap_err();
        assert!(matches!(
            err,
            InvrError::Validation(ValidationError::Malformed { ref field, .. }) if field == "subtotal"
        ));
    }

    #[test]
    fn test_analyze_tolerates_amounts_out_of_range() {
        let result = InvoiceEngine::default()
            .analyze_invoice(
                &JsonDocumentParser::new(),
                r#"{"line_items": [{"description": "Bulk", "quantity": 1e15, "unit_price": 1e15}],
                    "summary": {"total": 100}}"#,
            )
            .unwrap();

        assert_eq!(result.financial_summary.line_items_count, 1);
        assert_eq!(result.financial_summary.subtotal, Some(Decimal::ZERO));
        assert_eq!(result.financial_summary.discrepancies.len(), 1);
    }
}
