//! Core library for rule-based invoice understanding and generation.
//!
//! This crate provides:
//! - Document parsers for keyed JSON and labeled plain-text invoices
//! - Structural analysis of parsed documents (header, line items, summary)
//! - Financial reconciliation and totals computation on exact decimals
//! - Jurisdiction-aware compliance checks (international, EU, US)
//! - Template matching and rendering (standard, detailed, simple, professional)

pub mod analysis;
pub mod compliance;
pub mod document;
pub mod engine;
pub mod error;
pub mod models;
pub mod templates;

pub use analysis::{Discrepancy, FinancialEngine, FinancialInsights, SectionModel, StructuralAnalyzer};
pub use compliance::{ComplianceEngine, ComplianceReport, ComplianceStatus, RuleSet};
pub use document::{DocumentParser, JsonDocumentParser, TextDocumentParser};
pub use engine::{InvoiceEngine, UnderstandingResult};
pub use error::{InvrError, ParseError, Result, ValidationError};
pub use models::config::EngineConfig;
pub use models::document::{Locator, ParsedDocument, Region};
pub use models::invoice::{CalculatedInvoice, InvoiceDraft, InvoiceRecord, LineItem, Party};
pub use templates::{RenderedDocument, Template, TemplateCatalog, TemplateMatch};
