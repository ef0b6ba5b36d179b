//! Configuration structures for the invoice engine.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{InvrError, Result};

/// Main configuration for the invr engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Financial reconciliation configuration.
    pub financial: FinancialConfig,

    /// Compliance rule set configuration.
    pub compliance: ComplianceConfig,

    /// Template selection configuration.
    pub templates: TemplateConfig,
}

/// Financial reconciliation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialConfig {
    /// Largest stated-vs-calculated total difference that is not reported.
    pub tolerance: Decimal,
}

impl Default for FinancialConfig {
    fn default() -> Self {
        Self {
            tolerance: Decimal::new(1, 2),
        }
    }
}

/// Compliance rule set configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    /// Rule ids to leave out of the rule set.
    pub disabled_rules: Vec<String>,

    /// Treat EUR-denominated documents as falling under EU rules.
    pub eur_implies_eu: bool,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            disabled_rules: Vec::new(),
            eur_implies_eu: true,
        }
    }
}

/// Template selection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Invoices with more line items than this get the detailed template.
    pub detailed_line_item_threshold: usize,

    /// Vendor-name keyword (case-insensitive) selecting the professional template.
    pub professional_keyword: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            detailed_line_item_threshold: 10,
            professional_keyword: "professional".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| InvrError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| InvrError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"templates": {"detailed_line_item_threshold": 5}}"#).unwrap();

        assert_eq!(config.templates.detailed_line_item_threshold, 5);
        assert_eq!(config.templates.professional_keyword, "professional");
        assert_eq!(config.financial.tolerance, Decimal::new(1, 2));
        assert!(config.compliance.eur_implies_eu);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = EngineConfig::default();
        config.compliance.disabled_rules.push("us.sales_tax_shown".to_string());
        config.save(&path).unwrap();

        let loaded = EngineConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = EngineConfig::from_file(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(InvrError::Io(_))));

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(EngineConfig::from_file(&path), Err(InvrError::Config(_))));
    }
}
