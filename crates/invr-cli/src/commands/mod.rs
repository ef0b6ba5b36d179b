//! CLI subcommands and the helpers they share.

pub mod analyze;
pub mod batch;
pub mod config;
pub mod generate;
pub mod templates;

use std::path::Path;

use invr_core::document::{DocumentParser, JsonDocumentParser, TextDocumentParser};
use invr_core::models::config::EngineConfig;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

/// Load the configuration given with `--config`, else the user config file
/// if one exists, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<EngineConfig> {
    if let Some(path) = config_path {
        return Ok(EngineConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        Ok(EngineConfig::from_file(&default_path)?)
    } else {
        Ok(EngineConfig::default())
    }
}

/// `.json` files go to the JSON parser, everything else is read as text.
pub fn parser_for(path: &Path) -> &'static dyn DocumentParser {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "json" => &JsonDocumentParser,
        _ => &TextDocumentParser,
    }
}
