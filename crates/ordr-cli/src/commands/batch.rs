//! Batch processing command for multiple purchase-order files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use futures::stream::{self, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use ordr_core::{ExtractionResult, ImportCoordinator, ImportReport, MemoryStore, TracingAudit, Vendor};

use super::process::{apply_import_overrides, render, OutputFormat};
use super::{load_config, parse_vendor, OnConflict};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input glob pattern
    #[arg(required = true)]
    input: String,

    /// Vendor layout of every document
    #[arg(long, value_parser = parse_vendor)]
    vendor: Vendor,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of documents extracted in parallel
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Upsert the extracted records into the record store
    #[arg(long)]
    import: bool,

    /// Record store file (default: import.store_path from the config)
    #[arg(long)]
    store: Option<PathBuf>,

    /// What to do with records whose key is already stored
    #[arg(long, value_enum)]
    on_conflict: Option<OnConflict>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    extraction: Option<ExtractionResult>,
    report: Option<ImportReport>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    apply_import_overrides(&mut config, args.store.as_deref(), args.on_conflict);
    let coordinator = ImportCoordinator::new(config)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!("{} Found {} files to process", style("ℹ").blue(), files.len());

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let mut store = if args.import {
        Some(MemoryStore::load(&coordinator.config().import.store_path)?)
    } else {
        None
    };

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // Extraction runs on the blocking pool; results arrive in input order so
    // the store sees documents sequentially.
    let vendor = args.vendor;
    let mut extractions = stream::iter(files)
        .map(|path| {
            let coordinator = coordinator.clone();
            async move {
                let file_start = Instant::now();
                let task_path = path.clone();
                let outcome = tokio::task::spawn_blocking(move || {
                    coordinator.extract_path(&task_path, vendor)
                })
                .await;
                let outcome = match outcome {
                    Ok(Ok(extraction)) => Ok(extraction),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(e) => Err(format!("extraction task failed: {}", e)),
                };
                (path, outcome, file_start.elapsed().as_millis() as u64)
            }
        })
        .buffered(args.jobs.max(1));

    let mut results = Vec::new();
    while let Some((path, outcome, processing_time_ms)) = extractions.next().await {
        match outcome {
            Ok(extraction) => {
                if let Some(output_dir) = &args.output_dir {
                    write_output(output_dir, &path, &extraction, args.format)?;
                }
                let report = store
                    .as_mut()
                    .map(|store| coordinator.import(&extraction, store, &TracingAudit));
                results.push(ProcessResult {
                    path,
                    extraction: Some(extraction),
                    report,
                    error: None,
                    processing_time_ms,
                });
            }
            Err(error_msg) => {
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        extraction: None,
                        report: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    pb.abandon();
                    save_store(store.as_ref(), &coordinator)?;
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message("Complete");
    save_store(store.as_ref(), &coordinator)?;

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let successful = results.iter().filter(|r| r.extraction.is_some()).count();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();
    let records: usize = results
        .iter()
        .filter_map(|r| r.extraction.as_ref())
        .map(ExtractionResult::success_count)
        .sum();

    eprintln!();
    eprintln!(
        "{} Processed {} files ({} records) in {:?}",
        style("✓").green(),
        results.len(),
        records,
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed",
        style(successful).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for result in &failed {
            eprintln!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn save_store(store: Option<&MemoryStore>, coordinator: &ImportCoordinator) -> anyhow::Result<()> {
    if let Some(store) = store {
        store.save(&coordinator.config().import.store_path)?;
    }
    Ok(())
}

fn write_output(
    output_dir: &Path,
    path: &Path,
    extraction: &ExtractionResult,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let output_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("order");
    let output_path = output_dir.join(format!("{}.{}", output_name, format.extension()));

    fs::write(&output_path, render(extraction, format)?)?;
    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "po",
        "pages",
        "records",
        "errors",
        "warnings",
        "inserted",
        "updated",
        "skipped",
        "rejected",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(extraction) = &result.extraction {
            let count = |f: fn(&ImportReport) -> usize| {
                result.report.as_ref().map(f).map(|n| n.to_string()).unwrap_or_default()
            };
            wtr.write_record([
                filename,
                "success",
                extraction.context.po.as_deref().unwrap_or(""),
                &extraction.page_count.to_string(),
                &extraction.success_count().to_string(),
                &extraction.error_count().to_string(),
                &extraction.warning_count().to_string(),
                &count(|r| r.inserted),
                &count(|r| r.updated),
                &count(|r| r.skipped),
                &count(|r| r.rejected),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");

        let mut extraction = ExtractionResult::empty(Vendor::MagicFx);
        extraction.context.po = Some("PO-77".to_string());
        extraction.page_count = 2;

        let results = vec![
            ProcessResult {
                path: PathBuf::from("a.pdf"),
                extraction: Some(extraction),
                report: None,
                error: None,
                processing_time_ms: 5,
            },
            ProcessResult {
                path: PathBuf::from("b.pdf"),
                extraction: None,
                report: None,
                error: Some("PDF error: failed to parse PDF".to_string()),
                processing_time_ms: 1,
            },
        ];
        write_summary(&path, &results).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "a.pdf,success,PO-77,2,0,0,0,,,,,5,");
        assert_eq!(lines[2], "b.pdf,error,,,,,,,,,,1,PDF error: failed to parse PDF");
    }
}
