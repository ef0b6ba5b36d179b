//! Batch command - analyze many invoice documents concurrently.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use invr_core::engine::{InvoiceEngine, UnderstandingResult};

use super::{load_config, parser_for};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory for per-file results
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of analyzing a single file.
struct AnalyzeResult {
    path: PathBuf,
    result: Option<UnderstandingResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let engine = Arc::new(InvoiceEngine::new(load_config(config_path)?));

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to analyze",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let jobs = args.jobs.max(1);
    let mut tasks = JoinSet::new();
    let mut results: Vec<(usize, AnalyzeResult)> = Vec::with_capacity(files.len());

    for (index, path) in files.into_iter().enumerate() {
        if tasks.len() >= jobs {
            if let Some(joined) = tasks.join_next().await {
                let (i, result) = joined?;
                collect(&mut results, i, result, &args, &overall_pb)?;
            }
        }

        let engine = Arc::clone(&engine);
        tasks.spawn(async move {
            let worker_path = path.clone();
            let result =
                tokio::task::spawn_blocking(move || analyze_file(&engine, worker_path)).await;
            // A worker that died still yields a per-file error.
            let result = result.unwrap_or_else(|e| AnalyzeResult {
                path,
                result: None,
                error: Some(format!("worker failed: {}", e)),
                processing_time_ms: 0,
            });
            (index, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (i, result) = joined?;
        collect(&mut results, i, result, &args, &overall_pb)?;
    }

    overall_pb.finish_with_message("Complete");

    results.sort_by_key(|(i, _)| *i);
    let results: Vec<AnalyzeResult> = results.into_iter().map(|(_, r)| r).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &results {
            if let Some(understanding) = &result.result {
                let output_name = result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("invoice");
                let output_path = output_dir.join(format!("{}.json", output_name));

                fs::write(&output_path, serde_json::to_string_pretty(understanding)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();
    let successful = results.len() - failed.len();

    println!();
    println!(
        "{} Analyzed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn collect(
    results: &mut Vec<(usize, AnalyzeResult)>,
    index: usize,
    result: AnalyzeResult,
    args: &BatchArgs,
    pb: &ProgressBar,
) -> anyhow::Result<()> {
    pb.inc(1);

    if let Some(error_msg) = &result.error {
        if args.continue_on_error {
            warn!("Failed to analyze {}: {}", result.path.display(), error_msg);
        } else {
            error!("Failed to analyze {}: {}", result.path.display(), error_msg);
            anyhow::bail!("Analysis failed for {}: {}", result.path.display(), error_msg);
        }
    }

    results.push((index, result));
    Ok(())
}

fn analyze_file(engine: &InvoiceEngine, path: PathBuf) -> AnalyzeResult {
    let file_start = Instant::now();

    let outcome = fs::read_to_string(&path)
        .map_err(anyhow::Error::from)
        .and_then(|raw| Ok(engine.analyze_invoice(parser_for(&path), &raw)?));

    let processing_time_ms = file_start.elapsed().as_millis() as u64;

    match outcome {
        Ok(result) => AnalyzeResult {
            path,
            result: Some(result),
            error: None,
            processing_time_ms,
        },
        Err(e) => AnalyzeResult {
            path,
            result: None,
            error: Some(e.to_string()),
            processing_time_ms,
        },
    }
}

fn write_summary(path: &Path, results: &[AnalyzeResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "invoice_number",
        "line_items",
        "subtotal",
        "tax",
        "total",
        "stated_total",
        "currency",
        "discrepancies",
        "compliance_status",
        "best_match",
        "processing_time_ms",
        "error",
    ])?;

    let opt = |v: Option<String>| v.unwrap_or_default();

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();
        let processing_time_ms = result.processing_time_ms.to_string();

        let record = if let Some(understanding) = &result.result {
            let financial = &understanding.financial_summary;
            let invoice_number = understanding
                .document_structure
                .header()
                .and_then(|h| h.invoice_number.clone());

            vec![
                filename,
                "success".to_string(),
                opt(invoice_number),
                financial.line_items_count.to_string(),
                opt(financial.subtotal.map(|v| v.to_string())),
                opt(financial.tax_amount.map(|v| v.to_string())),
                opt(financial.total.map(|v| v.to_string())),
                opt(financial.stated_total.map(|v| v.to_string())),
                opt(financial.currency.clone()),
                financial.discrepancies.len().to_string(),
                understanding.compliance_status.to_string(),
                understanding
                    .best_match
                    .map(|t| t.name().to_string())
                    .unwrap_or_default(),
                processing_time_ms,
                String::new(),
            ]
        } else {
            let mut record = vec![filename, "error".to_string()];
            record.resize(12, String::new());
            record.push(processing_time_ms);
            record.push(result.error.clone().unwrap_or_default());
            record
        };

        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}
