//! Fingerprint command - print row fingerprints for correction entries.

use std::path::PathBuf;

use clap::Args;
use console::style;

use ordr_core::pdf::{PdfExtractor, PdfProcessor};
use ordr_core::{ImportCoordinator, RowFingerprint, Vendor};

use super::{load_config, parse_vendor};

/// Arguments for the fingerprint command.
#[derive(Args)]
pub struct FingerprintArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Vendor layout of the document
    #[arg(long, value_parser = parse_vendor)]
    vendor: Vendor,

    /// Print JSON instead of one line per row
    #[arg(long)]
    json: bool,
}

pub async fn run(args: FingerprintArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let coordinator = ImportCoordinator::new(config)?;

    let data = std::fs::read(&args.input)?;
    let extractor = PdfExtractor::from_bytes(&data)?;
    let texts = extractor.page_texts()?;

    let rows = coordinator.parser(args.vendor).fingerprints(&texts);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            println!("{}", format_row(row));
        }
        eprintln!("{} {} data rows", style("ℹ").blue(), rows.len());
    }

    Ok(())
}

fn format_row(row: &RowFingerprint) -> String {
    format!(
        "p{} r{} {}  {}",
        row.page_index + 1,
        row.row_index,
        row.fingerprint,
        row.raw.replace('\n', " \u{21b5} ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_row_keeps_continuations_on_one_line() {
        let row = RowFingerprint {
            page_index: 0,
            row_index: 7,
            fingerprint: "ab12".to_string(),
            raw: "1 510-000- CLIP\n054 LEFT".to_string(),
        };
        assert_eq!(format_row(&row), "p1 r7 ab12  1 510-000- CLIP \u{21b5} 054 LEFT");
    }
}
