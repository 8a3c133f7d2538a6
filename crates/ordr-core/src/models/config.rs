//! Configuration structures for the import pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{OrdrError, Result};

/// Main configuration for ordr.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrdrConfig {
    /// Extraction configuration.
    pub extraction: ExtractionConfig,

    /// Import (storage hand-off) configuration.
    pub import: ImportConfig,
}

/// Extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Allowed absolute difference between qty * net_price and total_price.
    pub tolerance: Decimal,

    /// Maximum pages to read (0 = unlimited).
    pub max_pages: usize,

    /// Correction table applied to known-bad source rows.
    pub corrections_path: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            tolerance: Decimal::new(2, 2),
            max_pages: 0,
            corrections_path: None,
        }
    }
}

/// What to do when a record's key already exists in the destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Update the stored row.
    #[default]
    Overwrite,
    /// Leave the stored row and report a `DuplicateKey` error.
    Reject,
    /// Leave the stored row silently.
    Skip,
}

impl std::str::FromStr for ConflictPolicy {
    type Err = OrdrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" => Ok(ConflictPolicy::Overwrite),
            "reject" => Ok(ConflictPolicy::Reject),
            "skip" => Ok(ConflictPolicy::Skip),
            other => Err(OrdrError::Config(format!(
                "unknown conflict policy '{}' (expected overwrite, reject or skip)",
                other
            ))),
        }
    }
}

/// Import configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub conflict_policy: ConflictPolicy,

    /// User name recorded in audit entries.
    pub user: String,

    /// JSON file backing the record store.
    pub store_path: PathBuf,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::Overwrite,
            user: "pdf_importer".to_string(),
            store_path: PathBuf::from("ordr-store.json"),
        }
    }
}

impl OrdrConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
