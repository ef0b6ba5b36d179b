//! Analysis of existing documents: structure first, then money.

pub mod financial;
pub mod structure;

pub use financial::{Discrepancy, DiscrepancyKind, FinancialEngine, FinancialInsights};
pub use structure::{SectionModel, StructuralAnalyzer};
