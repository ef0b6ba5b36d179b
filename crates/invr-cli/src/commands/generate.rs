//! Generate command - render a new invoice from draft data.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use invr_core::engine::InvoiceEngine;
use invr_core::models::invoice::InvoiceDraft;
use invr_core::templates::RenderedDocument;

use super::{load_config, OutputFormat};

/// Arguments for the generate command.
#[derive(Args)]
pub struct GenerateArgs {
    /// Invoice draft as JSON
    #[arg(required = true)]
    input: PathBuf,

    /// Template name (default: chosen from the invoice)
    #[arg(short, long)]
    template: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

pub async fn run(args: GenerateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let draft = InvoiceDraft::from_json(&fs::read_to_string(&args.input)?)?;
    let engine = InvoiceEngine::new(config);
    let document = engine.generate_invoice(draft, args.template.as_deref())?;

    info!("Rendered with template {}", document.template);

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&document)?,
        OutputFormat::Text => format_text(&document),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Invoice written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    Ok(())
}

fn format_text(document: &RenderedDocument) -> String {
    let content = &document.content;
    let header = &content.header;
    let currency = header.currency.as_deref().unwrap_or("");
    let mut output = String::new();

    output.push_str(&format!("{}\n", header.title));
    output.push_str(&format!("Invoice: {}\n", header.invoice_number));
    output.push_str(&format!("Date: {}\n", header.date));
    output.push('\n');

    output.push_str(&format!("From: {}\n", header.vendor.name));
    if let Some(address) = header.vendor.address.as_deref().filter(|a| !a.is_empty()) {
        output.push_str(&format!("      {}\n", address));
    }
    output.push_str(&format!("To:   {}\n", header.customer.name));
    if let Some(address) = header.customer.address.as_deref().filter(|a| !a.is_empty()) {
        output.push_str(&format!("      {}\n", address));
    }
    output.push('\n');

    for item in &content.line_items_section.items {
        match item.unit_price {
            Some(price) => output.push_str(&format!(
                "  {} x {} @ {} = {}\n",
                item.quantity, item.description, price, item.total
            )),
            None => output.push_str(&format!(
                "  {} x {} = {}\n",
                item.quantity, item.description, item.total
            )),
        }
    }
    output.push('\n');

    let summary = &content.summary;
    if let Some(subtotal) = summary.subtotal {
        output.push_str(&format!("Subtotal: {} {}\n", subtotal, currency));
    }
    if let Some(discount) = summary.discount {
        output.push_str(&format!("Discount: -{} {}\n", discount, currency));
    }
    output.push_str(&format!("Tax:      {} {}\n", summary.tax, currency));
    output.push_str(&format!("Total:    {} {}\n", summary.total, currency));
    output.push('\n');

    let footer = &content.footer;
    output.push_str(&format!("Payment terms: {}\n", footer.payment_terms));
    if !footer.notes.is_empty() {
        output.push_str(&format!("{}\n", footer.notes));
    }
    output.push_str(footer.thank_you_message);
    output.push('\n');

    output
}
