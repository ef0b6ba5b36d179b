//! Compliance rule catalog.
//!
//! Rules are plain data: a jurisdiction, a severity and the id of the check
//! that decides them. The catalog is fixed at compile time; a [`RuleSet`] is
//! the catalog minus whatever the configuration disables.

use serde::Serialize;

use crate::analysis::financial::FinancialInsights;
use crate::document::parse_document_date;
use crate::document::patterns::EU_VAT_ID;
use crate::models::config::ComplianceConfig;
use crate::models::document::ParsedDocument;
use crate::models::invoice::Party;

use Jurisdiction::{Eu, International, Us};
use Severity::{Critical, Info, Warning};

/// Jurisdiction a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Jurisdiction {
    International,
    Eu,
    Us,
}

impl Jurisdiction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Jurisdiction::International => "international",
            Jurisdiction::Eu => "eu",
            Jurisdiction::Us => "us",
        }
    }
}

/// Severity of a failed rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// Broad reason a rule failed. Suggestions are issued once per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    MissingIdentification,
    MissingPartyDetails,
    MissingLineItems,
    MissingTotals,
    FinancialDiscrepancy,
    MissingTaxIdentifier,
    MissingCurrency,
    MissingPaymentTerms,
}

impl FailureClass {
    /// Improvement suggestion for this class of failure.
    pub fn suggestion(&self) -> &'static str {
        match self {
            FailureClass::MissingIdentification => {
                "Add a unique invoice number and a readable issue date"
            }
            FailureClass::MissingPartyDetails => {
                "Include the full name and address of both vendor and customer"
            }
            FailureClass::MissingLineItems => "List the goods or services supplied as line items",
            FailureClass::MissingTotals => "State the tax amount and the total amount due",
            FailureClass::FinancialDiscrepancy => {
                "Correct the stated total so it equals subtotal plus tax"
            }
            FailureClass::MissingTaxIdentifier => {
                "Show the VAT identification numbers required for EU invoices"
            }
            FailureClass::MissingCurrency => "State the invoice currency explicitly",
            FailureClass::MissingPaymentTerms => "Add payment terms or a due date",
        }
    }
}

/// Predicate a rule is decided by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCheck {
    InvoiceNumberPresent,
    IssueDatePresent,
    VendorIdentified,
    CustomerIdentified,
    LineItemsPresent,
    TotalStated,
    TotalsReconcile,
    CurrencyStated,
    VendorEuVatId,
    CustomerVatId,
    TaxAmountShown,
    VendorAddressPresent,
    CustomerAddressPresent,
    PaymentTermsPresent,
}

impl RuleCheck {
    /// Evaluate the check against a document and its financial insights.
    pub fn evaluate(&self, document: &ParsedDocument, insights: &FinancialInsights) -> bool {
        let header = document.header_fields();
        let vendor = header.and_then(|h| h.vendor.as_ref());
        let customer = header.and_then(|h| h.customer.as_ref());

        match self {
            RuleCheck::InvoiceNumberPresent => header.is_some_and(|h| h.invoice_number.is_some()),
            RuleCheck::IssueDatePresent => header
                .and_then(|h| h.date.as_deref())
                .and_then(parse_document_date)
                .is_some(),
            RuleCheck::VendorIdentified => vendor.is_some_and(Party::has_name),
            RuleCheck::CustomerIdentified => customer.is_some_and(Party::has_name),
            RuleCheck::LineItemsPresent => insights.line_items_count > 0,
            RuleCheck::TotalStated => insights.stated_total.is_some(),
            RuleCheck::TotalsReconcile => {
                insights.stated_total.is_some()
                    && insights.total.is_some()
                    && !insights.has_discrepancies()
            }
            RuleCheck::CurrencyStated => insights.currency.is_some(),
            RuleCheck::VendorEuVatId => vendor
                .and_then(|p| p.tax_id.as_deref())
                .is_some_and(is_eu_vat_id),
            RuleCheck::CustomerVatId => customer.is_some_and(|p| p.tax_id.is_some()),
            RuleCheck::TaxAmountShown => insights.tax_amount.is_some(),
            RuleCheck::VendorAddressPresent => vendor.is_some_and(|p| p.address.is_some()),
            RuleCheck::CustomerAddressPresent => customer.is_some_and(|p| p.address.is_some()),
            RuleCheck::PaymentTermsPresent => {
                header.is_some_and(|h| h.payment_terms.is_some() || h.due_date.is_some())
            }
        }
    }

    pub fn failure_class(&self) -> FailureClass {
        match self {
            RuleCheck::InvoiceNumberPresent | RuleCheck::IssueDatePresent => {
                FailureClass::MissingIdentification
            }
            RuleCheck::VendorIdentified
            | RuleCheck::CustomerIdentified
            | RuleCheck::VendorAddressPresent
            | RuleCheck::CustomerAddressPresent => FailureClass::MissingPartyDetails,
            RuleCheck::LineItemsPresent => FailureClass::MissingLineItems,
            RuleCheck::TotalStated | RuleCheck::TaxAmountShown => FailureClass::MissingTotals,
            RuleCheck::TotalsReconcile => FailureClass::FinancialDiscrepancy,
            RuleCheck::VendorEuVatId | RuleCheck::CustomerVatId => {
                FailureClass::MissingTaxIdentifier
            }
            RuleCheck::CurrencyStated => FailureClass::MissingCurrency,
            RuleCheck::PaymentTermsPresent => FailureClass::MissingPaymentTerms,
        }
    }
}

/// Whether `tax_id` is an EU VAT identifier, ignoring spaces.
pub fn is_eu_vat_id(tax_id: &str) -> bool {
    let compact: String = tax_id.chars().filter(|c| !c.is_whitespace()).collect();
    EU_VAT_ID.is_match(&compact.to_uppercase())
}

/// A single compliance requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComplianceRule {
    pub id: &'static str,
    pub region: Jurisdiction,
    pub severity: Severity,
    pub check: RuleCheck,
    pub description: &'static str,
}

const fn rule(
    id: &'static str,
    region: Jurisdiction,
    severity: Severity,
    check: RuleCheck,
    description: &'static str,
) -> ComplianceRule {
    ComplianceRule {
        id,
        region,
        severity,
        check,
        description,
    }
}

/// Every known rule, in evaluation order.
pub const CATALOG: &[ComplianceRule] = &[
    rule(
        "intl.invoice_number",
        International,
        Critical,
        RuleCheck::InvoiceNumberPresent,
        "Invoice carries an identifying number",
    ),
    rule(
        "intl.issue_date",
        International,
        Critical,
        RuleCheck::IssueDatePresent,
        "Invoice carries a readable issue date",
    ),
    rule(
        "intl.vendor_identified",
        International,
        Critical,
        RuleCheck::VendorIdentified,
        "Vendor is named",
    ),
    rule(
        "intl.customer_identified",
        International,
        Warning,
        RuleCheck::CustomerIdentified,
        "Customer is named",
    ),
    rule(
        "intl.line_items",
        International,
        Critical,
        RuleCheck::LineItemsPresent,
        "At least one line item is listed",
    ),
    rule(
        "intl.total_stated",
        International,
        Critical,
        RuleCheck::TotalStated,
        "Total amount due is stated",
    ),
    rule(
        "intl.totals_reconcile",
        International,
        Critical,
        RuleCheck::TotalsReconcile,
        "Stated total equals subtotal plus tax",
    ),
    rule(
        "intl.currency_stated",
        International,
        Warning,
        RuleCheck::CurrencyStated,
        "Currency is identifiable",
    ),
    rule(
        "eu.vendor_vat_id",
        Eu,
        Critical,
        RuleCheck::VendorEuVatId,
        "Vendor VAT identification number is shown",
    ),
    rule(
        "eu.vat_amount_shown",
        Eu,
        Critical,
        RuleCheck::TaxAmountShown,
        "VAT amount is shown separately",
    ),
    rule(
        "eu.vendor_address",
        Eu,
        Warning,
        RuleCheck::VendorAddressPresent,
        "Vendor address is shown",
    ),
    rule(
        "eu.customer_address",
        Eu,
        Warning,
        RuleCheck::CustomerAddressPresent,
        "Customer address is shown",
    ),
    rule(
        "eu.customer_vat_id",
        Eu,
        Info,
        RuleCheck::CustomerVatId,
        "Customer VAT identification number is shown",
    ),
    rule(
        "us.vendor_address",
        Us,
        Warning,
        RuleCheck::VendorAddressPresent,
        "Vendor address is shown",
    ),
    rule(
        "us.sales_tax_shown",
        Us,
        Warning,
        RuleCheck::TaxAmountShown,
        "Sales tax is shown as a separate amount",
    ),
    rule(
        "us.payment_terms",
        Us,
        Info,
        RuleCheck::PaymentTermsPresent,
        "Payment terms or a due date are given",
    ),
];

/// The rules in force, built once from configuration and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<ComplianceRule>,
    eur_implies_eu: bool,
}

impl RuleSet {
    pub fn from_config(config: &ComplianceConfig) -> Self {
        let rules = CATALOG
            .iter()
            .filter(|r| !config.disabled_rules.iter().any(|id| id == r.id))
            .copied()
            .collect();

        Self {
            rules,
            eur_implies_eu: config.eur_implies_eu,
        }
    }

    /// Rules of one jurisdiction, in catalog order.
    pub fn for_region(&self, region: Jurisdiction) -> impl Iterator<Item = &ComplianceRule> {
        self.rules.iter().filter(move |r| r.region == region)
    }

    pub fn rules(&self) -> &[ComplianceRule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&ComplianceRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn eur_implies_eu(&self) -> bool {
        self.eur_implies_eu
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::from_config(&ComplianceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_are_unique() {
        let ids: HashSet<&str> = CATALOG.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), CATALOG.len());
    }

    #[test]
    fn test_catalog_ids_are_prefixed_by_region() {
        for rule in CATALOG {
            let prefix = match rule.region {
                International => "intl.",
                Eu => "eu.",
                Us => "us.",
            };
            assert!(rule.id.starts_with(prefix), "{}", rule.id);
        }
    }

    #[test]
    fn test_disabled_rules_are_dropped() {
        let config = ComplianceConfig {
            disabled_rules: vec!["us.sales_tax_shown".to_string()],
            ..ComplianceConfig::default()
        };
        let rules = RuleSet::from_config(&config);

        assert!(rules.get("us.sales_tax_shown").is_none());
        assert!(rules.get("us.vendor_address").is_some());
        assert_eq!(rules.rules().len(), CATALOG.len() - 1);
    }

    #[test]
    fn test_for_region_keeps_catalog_order() {
        let rules = RuleSet::default();
        let ids: Vec<&str> = rules.for_region(Us).map(|r| r.id).collect();
        assert_eq!(ids, vec!["us.vendor_address", "us.sales_tax_shown", "us.payment_terms"]);
    }

    #[test]
    fn test_is_eu_vat_id() {
        assert!(is_eu_vat_id("DE123456789"));
        assert!(is_eu_vat_id("de 123 456 789"));
        assert!(!is_eu_vat_id("12-3456789"));
    }
}
