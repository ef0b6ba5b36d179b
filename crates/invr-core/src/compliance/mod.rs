//! Compliance checking of existing documents and validation of new input.

pub mod rules;
mod validate;

pub use rules::{ComplianceRule, FailureClass, Jurisdiction, RuleCheck, RuleSet, Severity};
pub use validate::validate;

use serde::Serialize;
use tracing::{debug, warn};

use crate::analysis::financial::FinancialInsights;
use crate::document::patterns::{has_labeled_eu_vat_id, SALES_TAX, US_EIN};
use crate::error::ValidationError;
use crate::models::document::ParsedDocument;
use crate::models::invoice::{InvoiceDraft, InvoiceRecord};

/// Overall compliance verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    FullyCompliant,
    PartiallyCompliant,
    NonCompliant,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::FullyCompliant => "fully_compliant",
            ComplianceStatus::PartiallyCompliant => "partially_compliant",
            ComplianceStatus::NonCompliant => "non_compliant",
        }
    }
}

impl std::fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceResult {
    pub rule: &'static str,
    pub region: Jurisdiction,
    pub passed: bool,
    pub severity: Severity,
    pub description: &'static str,
}

/// Compliance report of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceReport {
    pub status: ComplianceStatus,
    /// Jurisdictions whose rules were applied.
    pub regions: Vec<Jurisdiction>,
    pub rule_results: Vec<ComplianceResult>,
    pub improvement_suggestions: Vec<String>,
}

impl ComplianceReport {
    pub fn failed(&self) -> impl Iterator<Item = &ComplianceResult> {
        self.rule_results.iter().filter(|r| !r.passed)
    }
}

/// Evaluates documents against a [`RuleSet`].
#[derive(Debug, Clone, Copy)]
pub struct ComplianceEngine<'a> {
    rules: &'a RuleSet,
}

impl<'a> ComplianceEngine<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self { rules }
    }

    /// Evaluate every rule of every applicable jurisdiction.
    pub fn check_compliance(
        &self,
        document: &ParsedDocument,
        insights: &FinancialInsights,
    ) -> ComplianceReport {
        let regions = self.determine_applicable_regions(document, insights);

        let mut rule_results = Vec::new();
        let mut failed_classes: Vec<FailureClass> = Vec::new();

        for region in &regions {
            for rule in self.rules.for_region(*region) {
                let passed = rule.check.evaluate(document, insights);

                if !passed {
                    if rule.severity == Severity::Critical {
                        warn!("Critical compliance rule failed: {}", rule.id);
                    }
                    let class = rule.check.failure_class();
                    if !failed_classes.contains(&class) {
                        failed_classes.push(class);
                    }
                }

                rule_results.push(ComplianceResult {
                    rule: rule.id,
                    region: rule.region,
                    passed,
                    severity: rule.severity,
                    description: rule.description,
                });
            }
        }

        let status = derive_status(&rule_results);
        let improvement_suggestions = failed_classes
            .iter()
            .map(|c| c.suggestion().to_string())
            .collect();

        debug!(
            "Compliance: {} rules over {:?}, status {}",
            rule_results.len(),
            regions,
            status
        );

        ComplianceReport {
            status,
            regions,
            rule_results,
            improvement_suggestions,
        }
    }

    /// Validate generation input.
    pub fn validate_invoice_data(
        &self,
        draft: InvoiceDraft,
    ) -> Result<InvoiceRecord, ValidationError> {
        validate(draft)
    }

    /// International rules always apply; EU and US rules apply when the
    /// document carries their markers.
    pub fn determine_applicable_regions(
        &self,
        document: &ParsedDocument,
        insights: &FinancialInsights,
    ) -> Vec<Jurisdiction> {
        let currency = insights.currency.as_deref().map(str::to_uppercase);
        let currency = currency.as_deref();

        let eu_vat_id = document
            .parties()
            .filter_map(|p| p.tax_id.as_deref())
            .any(rules::is_eu_vat_id)
            || has_labeled_eu_vat_id(&document.raw_text);
        let eu = eu_vat_id
            || (self.rules.eur_implies_eu() && matches!(currency, Some("EUR") | Some("€")));

        let us = matches!(currency, Some("USD") | Some("$"))
            || US_EIN.is_match(&document.raw_text)
            || SALES_TAX.is_match(&document.raw_text);

        let mut regions = vec![Jurisdiction::International];
        if eu {
            regions.push(Jurisdiction::Eu);
        }
        if us {
            regions.push(Jurisdiction::Us);
        }
        regions
    }
}

fn derive_status(results: &[ComplianceResult]) -> ComplianceStatus {
    let mut failed = results.iter().filter(|r| !r.passed).peekable();
    if failed.peek().is_none() {
        ComplianceStatus::FullyCompliant
    } else if failed.any(|r| r.severity == Severity::Critical) {
        ComplianceStatus::NonCompliant
    } else {
        ComplianceStatus::PartiallyCompliant
    }
}
