//! Analyze command - understand a single existing invoice.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use invr_core::engine::{InvoiceEngine, UnderstandingResult};

use super::{load_config, parser_for, OutputFormat};

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input file (.json for keyed records, anything else is read as text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

pub async fn run(args: AnalyzeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Analyzing file: {}", args.input.display());

    let raw = fs::read_to_string(&args.input)?;
    let engine = InvoiceEngine::new(config);
    let result = engine.analyze_invoice(parser_for(&args.input), &raw)?;

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_result(result: &UnderstandingResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn amount(value: Option<impl std::fmt::Display>) -> String {
    value.map_or_else(|| "unknown".to_string(), |v| v.to_string())
}

fn format_text(result: &UnderstandingResult) -> String {
    let financial = &result.financial_summary;
    let currency = financial.currency.as_deref().unwrap_or("");
    let mut output = String::new();

    output.push_str("Financial summary:\n");
    output.push_str(&format!("  Line items: {}\n", financial.line_items_count));
    output.push_str(&format!("  Subtotal:   {} {}\n", amount(financial.subtotal), currency));
    output.push_str(&format!("  Tax:        {} {}\n", amount(financial.tax_amount), currency));
    output.push_str(&format!("  Total:      {} {}\n", amount(financial.total), currency));
    if let Some(stated) = financial.stated_total {
        output.push_str(&format!("  Stated:     {} {}\n", stated, currency));
    }
    for discrepancy in &financial.discrepancies {
        output.push_str(&format!(
            "  ! Total mismatch: stated {} vs calculated {} ({})\n",
            discrepancy.stated, discrepancy.calculated, discrepancy.difference
        ));
    }
    output.push('\n');

    output.push_str(&format!("Compliance: {}\n", result.compliance_status));
    for rule in result.compliance.failed() {
        output.push_str(&format!(
            "  - [{:?}] {}: {}\n",
            rule.severity, rule.rule, rule.description
        ));
    }
    output.push('\n');

    output.push_str("Template matches:\n");
    for m in &result.template_matches {
        output.push_str(&format!("  {:<13} {:.2}\n", m.template.name(), m.score));
    }

    if !result.suggested_improvements.is_empty() {
        output.push('\n');
        output.push_str("Suggestions:\n");
        for suggestion in &result.suggested_improvements {
            output.push_str(&format!("  - {}\n", suggestion));
        }
    }

    output
}
