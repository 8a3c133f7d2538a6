//! Correction table for known-bad source rows.
//!
//! Each entry is keyed by vendor and a fingerprint of the row's source text,
//! so a correction only ever touches the exact row it was written for. A
//! file looks like:
//!
//! ```json
//! [
//!   {
//!     "vendor": "centurion",
//!     "fingerprint": "3f0c...",
//!     "note": "part number split across lines in PO 81234",
//!     "fields": { "pn": "510-000-054", "qty": "5,000.00" }
//!   }
//! ]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use super::rules::collapse_whitespace;
use super::RawFields;
use crate::error::{Diagnostic, ExtractionError, Result};
use crate::models::{DataRow, Vendor};

/// One correction entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub vendor: Vendor,
    pub fingerprint: String,
    #[serde(default)]
    pub note: String,
    /// Raw replacement strings, by field name.
    pub fields: BTreeMap<String, String>,
}

/// Loaded correction entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrectionTable {
    entries: Vec<Correction>,
}

impl CorrectionTable {
    pub fn new(entries: Vec<Correction>) -> Self {
        Self { entries }
    }

    /// Load a JSON correction file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_json(&content)?;
        info!("Loaded {} corrections from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, vendor: Vendor, fingerprint: &str) -> Option<&Correction> {
        self.entries
            .iter()
            .find(|c| c.vendor == vendor && c.fingerprint.eq_ignore_ascii_case(fingerprint))
    }

    /// Apply the entry matching `row`, if any. Returns the diagnostic that
    /// records the change.
    pub fn apply(&self, vendor: Vendor, row: &DataRow, fields: &mut RawFields) -> Option<Diagnostic> {
        if self.entries.is_empty() {
            return None;
        }
        let fingerprint = row_fingerprint(vendor, &row.raw);
        let correction = self.find(vendor, &fingerprint)?;

        for (name, value) in &correction.fields {
            if !fields.set(name, value) {
                warn!("Correction {} names unknown field '{}'", fingerprint, name);
            }
        }

        info!(
            "Applied correction to page {} row {}: {}",
            row.page_index + 1,
            row.row_index,
            correction.note
        );
        Some(
            Diagnostic::warning(ExtractionError::CorrectionApplied {
                fingerprint,
                note: correction.note.clone(),
            })
            .at(row.page_index, row.row_index),
        )
    }
}

/// Lowercase hex SHA-256 of the vendor id, a newline and the row text with
/// whitespace collapsed.
pub fn row_fingerprint(vendor: Vendor, raw: &str) -> String {
    let input = format!("{}\n{}", vendor.id(), collapse_whitespace(raw));
    format!("{:x}", Sha256::digest(input.as_bytes()))
}
