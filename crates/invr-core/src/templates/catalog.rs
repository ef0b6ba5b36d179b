//! The template catalog: lookup, ranking and selection.

use serde::Serialize;
use tracing::debug;

use crate::error::{InvrError, Result};
use crate::models::config::TemplateConfig;
use crate::models::document::ParsedDocument;
use crate::models::invoice::InvoiceRecord;

use super::Template;

/// A template and how closely a document matches it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateMatch {
    pub template: Template,
    pub score: f64,
}

/// Registered templates plus the policy for picking one.
///
/// Built once and only read afterwards.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
    config: TemplateConfig,
}

impl TemplateCatalog {
    pub fn new(config: TemplateConfig) -> Self {
        Self {
            templates: Template::ALL.to_vec(),
            config,
        }
    }

    /// Templates in registration order.
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Look up a template by name.
    pub fn get_template(&self, name: &str) -> Result<&Template> {
        self.templates
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| InvrError::TemplateNotFound(name.to_string()))
    }

    /// Score every template against a document, best first. Equal scores keep
    /// registration order.
    pub fn identify_templates(&self, document: &ParsedDocument) -> Vec<TemplateMatch> {
        let mut matches: Vec<TemplateMatch> = self
            .templates
            .iter()
            .map(|t| TemplateMatch {
                template: *t,
                score: t.similarity_score(document),
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));

        debug!(
            "Template ranking: {}",
            matches
                .iter()
                .map(|m| format!("{}={:.2}", m.template, m.score))
                .collect::<Vec<_>>()
                .join(", ")
        );

        matches
    }

    /// Pick a template for a new invoice. Rules are tried in order: many line
    /// items, then the vendor keyword, then the default.
    pub fn suggest_template(&self, record: &InvoiceRecord) -> &Template {
        let keyword = self.config.professional_keyword.to_lowercase();

        let wanted = if record.line_items.len() > self.config.detailed_line_item_threshold {
            Template::Detailed
        } else if !keyword.is_empty() && record.vendor.name.to_lowercase().contains(&keyword) {
            Template::Professional
        } else {
            Template::Standard
        };

        self.templates
            .iter()
            .find(|t| **t == wanted)
            .unwrap_or(&self.templates[0])
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::new(TemplateConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentParser, JsonDocumentParser};
    use crate::models::invoice::{LineItem, Party};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn record(vendor: &str, items: usize) -> InvoiceRecord {
        InvoiceRecord {
            invoice_number: "INV-1".to_string(),
            date: NaiveDate::from_ymd_opt(2023, 11, 1).unwrap(),
            vendor: Party::new(vendor),
            customer: Party::new("Globex"),
            line_items: (0..items)
                .map(|i| LineItem::new(format!("Item {}", i), Decimal::ONE, Decimal::TEN, None).unwrap())
                .collect(),
            tax_rate: None,
            discount_percentage: None,
            payment_terms: None,
            notes: None,
            currency: None,
        }
    }

    #[test]
    fn test_get_template() {
        let catalog = TemplateCatalog::default();

        let first = catalog.get_template("detailed").unwrap();
        let second = catalog.get_template("detailed").unwrap();
        assert_eq!(*first, Template::Detailed);
        assert!(std::ptr::eq(first, second));

        assert!(matches!(
            catalog.get_template("fancy"),
            Err(InvrError::TemplateNotFound(name)) if name == "fancy"
        ));
    }

    #[test]
    fn test_suggest_template_priority() {
        let catalog = TemplateCatalog::default();

        assert_eq!(*catalog.suggest_template(&record("Acme", 11)), Template::Detailed);
        assert_eq!(*catalog.suggest_template(&record("Acme", 10)), Template::Standard);
        assert_eq!(
            *catalog.suggest_template(&record("Acme Professional Services", 2)),
            Template::Professional
        );
        // more items wins over the keyword
        assert_eq!(
            *catalog.suggest_template(&record("PROFESSIONAL Ltd", 12)),
            Template::Detailed
        );
    }

    #[test]
    fn test_suggest_template_uses_config() {
        let catalog = TemplateCatalog::new(TemplateConfig {
            detailed_line_item_threshold: 2,
            professional_keyword: "consulting".to_string(),
        });

        assert_eq!(*catalog.suggest_template(&record("Acme", 3)), Template::Detailed);
        assert_eq!(
            *catalog.suggest_template(&record("Acme Consulting", 1)),
            Template::Professional
        );
        assert_eq!(*catalog.suggest_template(&record("Professional", 1)), Template::Standard);
    }

    #[test]
    fn test_identify_templates_ranking() {
        let document = JsonDocumentParser::new()
            .parse(
                r#"{
                    "title": "INVOICE", "invoice_number": "INV-1", "date": "2023-10-15",
                    "line_items": [{"description": "Work", "total": 10}],
                    "summary": {"subtotal": 10, "total": 10}
                }"#,
            )
            .unwrap();

        let matches = TemplateCatalog::default().identify_templates(&document);

        assert_eq!(matches.len(), 4);
        assert_eq!(matches[0].template, Template::Standard);
        assert_eq!(matches[0].score, 1.0);
        assert!(matches.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_ties_keep_registration_order() {
        let document = JsonDocumentParser::new().parse(r#"{"notes": "nothing"}"#).unwrap();

        let order: Vec<Template> = TemplateCatalog::default()
            .identify_templates(&document)
            .into_iter()
            .map(|m| m.template)
            .collect();

        assert_eq!(order, Template::ALL.to_vec());
    }
}
