//! Process command - extract records from a single purchase-order PDF.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use ordr_core::{
    ExtractionResult, ImportCoordinator, ImportReport, MemoryStore, OrdrConfig, TracingAudit,
    Vendor,
};

use super::{load_config, parse_vendor, OnConflict};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Vendor layout of the document
    #[arg(long, value_parser = parse_vendor)]
    vendor: Vendor,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Upsert the extracted records into the record store
    #[arg(long)]
    import: bool,

    /// Record store file (default: import.store_path from the config)
    #[arg(long)]
    store: Option<PathBuf>,

    /// What to do with records whose key is already stored
    #[arg(long, value_enum)]
    on_conflict: Option<OnConflict>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per record
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    apply_import_overrides(&mut config, args.store.as_deref(), args.on_conflict);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let coordinator = ImportCoordinator::new(config)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Extracting {}", args.input.display()));

    let extraction = match coordinator.extract_path(&args.input, args.vendor) {
        Ok(extraction) => extraction,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e.into());
        }
    };
    pb.finish_and_clear();

    info!(
        "Extracted {} records from {} pages in {}ms",
        extraction.success_count(),
        extraction.page_count,
        extraction.processing_time_ms
    );

    let rendered = render(&extraction, args.format)?;
    match &args.output {
        Some(path) => {
            fs::write(path, &rendered)?;
            eprintln!("{} Output written to {}", style("✓").green(), path.display());
        }
        None => println!("{}", rendered),
    }

    print_diagnostics(&extraction);

    if args.import {
        let report = import_into_store(&coordinator, &extraction)?;
        print_report(&report);
    }

    eprintln!(
        "{} {} records, {} errors, {} warnings in {:?}",
        style("✓").green(),
        extraction.success_count(),
        style(extraction.error_count()).red(),
        style(extraction.warning_count()).yellow(),
        start.elapsed()
    );

    Ok(())
}

/// Command-line import settings win over the config file.
pub fn apply_import_overrides(
    config: &mut OrdrConfig,
    store: Option<&Path>,
    on_conflict: Option<OnConflict>,
) {
    if let Some(store) = store {
        config.import.store_path = store.to_path_buf();
    }
    if let Some(policy) = on_conflict {
        config.import.conflict_policy = policy.into();
    }
}

/// Load the configured store, import one extraction and save it back.
pub fn import_into_store(
    coordinator: &ImportCoordinator,
    extraction: &ExtractionResult,
) -> anyhow::Result<ImportReport> {
    let store_path = &coordinator.config().import.store_path;
    let mut store = MemoryStore::load(store_path)?;
    let report = coordinator.import(extraction, &mut store, &TracingAudit);
    store.save(store_path)?;
    debug!("Store saved to {}", store_path.display());
    Ok(report)
}

pub fn render(extraction: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(extraction)?),
        OutputFormat::Csv => format_csv(extraction),
        OutputFormat::Text => Ok(format_text(extraction)),
    }
}

fn print_diagnostics(extraction: &ExtractionResult) {
    for diagnostic in &extraction.diagnostics {
        if diagnostic.is_error() {
            eprintln!("{} {}", style("✗").red(), diagnostic);
        } else {
            eprintln!("{} {}", style("⚠").yellow(), diagnostic);
        }
    }
}

fn print_report(report: &ImportReport) {
    eprintln!(
        "{} Imported into {}: {} inserted, {} updated, {} unchanged, {} skipped, {} rejected, {} failed",
        style("✓").green(),
        report.table,
        report.inserted,
        report.updated,
        report.unchanged,
        report.skipped,
        report.rejected,
        report.failed
    );
    for diagnostic in &report.diagnostics {
        eprintln!("{} {}", style("✗").red(), diagnostic);
    }
}

const CSV_COLUMNS: [&str; 11] = [
    "po",
    "line",
    "pn",
    "po_line",
    "description",
    "qty",
    "net_price",
    "total_price",
    "req_date",
    "po_placed_date",
    "purchaser",
];

fn format_csv(extraction: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(CSV_COLUMNS)?;

    fn opt<T: ToString>(value: &Option<T>) -> String {
        value.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    for record in &extraction.records {
        wtr.write_record([
            record.po.clone(),
            opt(&record.line),
            opt(&record.pn),
            record.po_line.clone(),
            record.description.clone(),
            opt(&record.qty),
            opt(&record.net_price),
            opt(&record.total_price),
            opt(&record.req_date),
            opt(&record.po_placed_date),
            opt(&record.purchaser),
        ])?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(extraction: &ExtractionResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Vendor: {}\n", extraction.vendor));
    if let Some(po) = &extraction.context.po {
        output.push_str(&format!("PO: {}\n", po));
    }
    if let Some(date) = extraction.context.po_placed_date {
        output.push_str(&format!("Placed: {}\n", date));
    }
    if let Some(purchaser) = &extraction.context.purchaser {
        output.push_str(&format!("Purchaser: {}\n", purchaser));
    }
    output.push_str(&format!("Pages: {}\n\n", extraction.page_count));

    for record in &extraction.records {
        output.push_str(&format!(
            "{:<16} {:<18} {:>10} x {:>10} = {:>12}  {}\n",
            record.po_line,
            record.pn.as_deref().unwrap_or("-"),
            record.qty.map(|q| q.to_string()).unwrap_or_else(|| "-".to_string()),
            record.net_price.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
            record.total_price.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string()),
            record.req_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
        ));
        output.push_str(&format!("    {}\n", record.description));
    }

    output.push_str(&format!(
        "\n{} records, {} errors, {} warnings\n",
        extraction.success_count(),
        extraction.error_count(),
        extraction.warning_count()
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordr_core::{Diagnostic, ExtractionError, PurchaseOrderLine};

    fn extraction() -> ExtractionResult {
        let mut result = ExtractionResult::empty(Vendor::Centurion);
        result.context.po = Some("81234".to_string());
        result.page_count = 1;
        result.records.push(PurchaseOrderLine {
            po: "81234".to_string(),
            line: Some(1),
            pn: Some("100-200-300".to_string()),
            po_line: "81234/1".to_string(),
            description: "Clip, left".to_string(),
            qty: Some(12.into()),
            ..Default::default()
        });
        result.diagnostics.push(Diagnostic::warning(ExtractionError::MalformedDocument {
            reason: "test".to_string(),
        }));
        result
    }

    #[test]
    fn test_csv_quotes_descriptions() {
        let csv = format_csv(&extraction()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "po,line,pn,po_line,description,qty,net_price,total_price,req_date,po_placed_date,purchaser"
        );
        assert_eq!(lines.next().unwrap(), "81234,1,100-200-300,81234/1,\"Clip, left\",12,,,,,");
    }

    #[test]
    fn test_text_summary() {
        let text = format_text(&extraction());
        assert!(text.contains("Vendor: centurion"));
        assert!(text.contains("PO: 81234"));
        assert!(text.contains("1 records, 0 errors, 1 warnings"));
    }

    #[test]
    fn test_json_includes_diagnostics() {
        let json = render(&extraction(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["records"][0]["po_line"], "81234/1");
        assert_eq!(value["diagnostics"][0]["severity"], "warning");
    }

    #[test]
    fn test_overrides() {
        let mut config = OrdrConfig::default();
        apply_import_overrides(&mut config, Some(Path::new("s.json")), Some(OnConflict::Skip));
        assert_eq!(config.import.store_path, PathBuf::from("s.json"));
        assert_eq!(
            config.import.conflict_policy,
            ordr_core::ConflictPolicy::Skip
        );
    }
}
