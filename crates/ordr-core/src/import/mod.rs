//! Document extraction and hand-off to storage.
//!
//! [`ImportCoordinator`] drives a document through the extraction pipeline
//! and then writes the accepted records into a [`RecordStore`], deciding
//! insert, update, skip or reject per record from the configured
//! [`ConflictPolicy`]. A failing row or record never stops the document.

mod audit;
mod store;

pub use audit::{AuditLog, Operation, TracingAudit};
pub use store::{MemoryStore, RecordStore, StoreResult};

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Diagnostic, ExtractionError, PdfError, Result};
use crate::models::{ConflictPolicy, Destination, OrdrConfig, Vendor};
use crate::order::{CorrectionTable, ExtractionResult, OrderParser};
use crate::pdf::{PdfExtractor, PdfProcessor};

/// Outcome of handing one document's records to a store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub table: Destination,
    pub inserted: usize,
    pub updated: usize,
    /// Existing rows rewritten with identical content.
    pub unchanged: usize,
    pub skipped: usize,
    pub rejected: usize,
    pub failed: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl ImportReport {
    fn new(table: Destination) -> Self {
        Self {
            table,
            inserted: 0,
            updated: 0,
            unchanged: 0,
            skipped: 0,
            rejected: 0,
            failed: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Records now stored as extracted.
    pub fn written(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }
}

/// Extraction plus storage hand-off, configured once and shared between
/// documents.
#[derive(Debug, Clone)]
pub struct ImportCoordinator {
    config: OrdrConfig,
    corrections: Arc<CorrectionTable>,
}

impl ImportCoordinator {
    /// Create a coordinator, loading the correction table named in `config`.
    pub fn new(config: OrdrConfig) -> Result<Self> {
        let corrections = match &config.extraction.corrections_path {
            Some(path) => CorrectionTable::from_file(path)?,
            None => CorrectionTable::default(),
        };
        Ok(Self {
            config,
            corrections: Arc::new(corrections),
        })
    }

    pub fn with_corrections(mut self, corrections: CorrectionTable) -> Self {
        self.corrections = Arc::new(corrections);
        self
    }

    pub fn config(&self) -> &OrdrConfig {
        &self.config
    }

    pub fn parser(&self, vendor: Vendor) -> OrderParser {
        OrderParser::new(vendor)
            .with_tolerance(self.config.extraction.tolerance)
            .with_max_pages(self.config.extraction.max_pages)
            .with_corrections(self.corrections.as_ref().clone())
    }

    /// Extract records from a PDF file.
    pub fn extract_path(&self, path: &Path, vendor: Vendor) -> Result<ExtractionResult> {
        info!("Extracting {}", path.display());
        let data = std::fs::read(path)?;
        self.extract_bytes(&data, vendor)
    }

    /// Extract records from PDF bytes. Only an unreadable document is an
    /// `Err`; a document without pages is an empty result.
    pub fn extract_bytes(&self, data: &[u8], vendor: Vendor) -> Result<ExtractionResult> {
        let extractor = match PdfExtractor::from_bytes(data) {
            Ok(extractor) => extractor,
            Err(PdfError::NoPages) => {
                warn!("PDF has no pages");
                let mut result = ExtractionResult::empty(vendor);
                result.diagnostics.push(Diagnostic::warning(ExtractionError::MalformedDocument {
                    reason: "document has no pages".to_string(),
                }));
                return Ok(result);
            }
            Err(e) => return Err(e.into()),
        };
        let texts = extractor.page_texts()?;
        Ok(self.extract_pages(&texts, vendor))
    }

    /// Extract records from page texts.
    pub fn extract_pages(&self, page_texts: &[String], vendor: Vendor) -> ExtractionResult {
        self.parser(vendor).parse_pages(page_texts)
    }

    /// Write the records of `extraction` into `store`.
    pub fn import(
        &self,
        extraction: &ExtractionResult,
        store: &mut dyn RecordStore,
        audit: &dyn AuditLog,
    ) -> ImportReport {
        let table = extraction.vendor.destination();
        let policy = self.config.import.conflict_policy;
        let user = self.config.import.user.as_str();
        let mut report = ImportReport::new(table);

        for record in &extraction.records {
            let exists = match store.key_exists(table, &record.po_line) {
                Ok(exists) => exists,
                Err(e) => {
                    report.fail(table, &record.po_line, e.to_string());
                    continue;
                }
            };

            if exists {
                match policy {
                    ConflictPolicy::Overwrite => {}
                    ConflictPolicy::Skip => {
                        debug!("Skipping existing {}", record.po_line);
                        report.skipped += 1;
                        continue;
                    }
                    ConflictPolicy::Reject => {
                        warn!("Duplicate key {} in {}", record.po_line, table);
                        report.rejected += 1;
                        report.diagnostics.push(Diagnostic::error(ExtractionError::DuplicateKey {
                            table: table.table().to_string(),
                            po_line: record.po_line.clone(),
                        }));
                        continue;
                    }
                }
            }

            let changed = match store.upsert(table, record) {
                Ok(changed) => changed,
                Err(e) => {
                    report.fail(table, &record.po_line, e.to_string());
                    continue;
                }
            };
            if changed == 0 {
                report.unchanged += 1;
                continue;
            }

            let operation = if exists {
                report.updated += 1;
                Operation::Update
            } else {
                report.inserted += 1;
                Operation::Insert
            };
            if let Err(e) = audit.log(user, table, operation, record) {
                warn!("Audit log failed for {}: {}", record.po_line, e);
            }
        }

        info!(
            "Imported into {}: {} inserted, {} updated, {} unchanged, {} skipped, {} rejected, {} failed",
            table,
            report.inserted,
            report.updated,
            report.unchanged,
            report.skipped,
            report.rejected,
            report.failed
        );
        report
    }
}

impl ImportReport {
    fn fail(&mut self, table: Destination, po_line: &str, message: String) {
        warn!("Failed to import {} into {}: {}", po_line, table, message);
        self.failed += 1;
        self.diagnostics.push(Diagnostic::error(ExtractionError::ImportFailed {
            table: table.table().to_string(),
            po_line: po_line.to_string(),
            message,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AuditError, StoreError};
    use crate::models::PurchaseOrderLine;
    use std::sync::Mutex;

    fn extraction(po_lines: &[&str]) -> ExtractionResult {
        let mut result = ExtractionResult::empty(Vendor::Centurion);
        result.records = po_lines
            .iter()
            .map(|key| PurchaseOrderLine {
                po: "81234".to_string(),
                po_line: key.to_string(),
                description: "Clip".to_string(),
                ..Default::default()
            })
            .collect();
        result
    }

    fn coordinator(policy: ConflictPolicy) -> ImportCoordinator {
        let mut config = OrdrConfig::default();
        config.import.conflict_policy = policy;
        ImportCoordinator::new(config).unwrap()
    }

    #[derive(Default)]
    struct RecordingAudit(Mutex<Vec<(String, Operation)>>);

    impl AuditLog for RecordingAudit {
        fn log(
            &self,
            _user: &str,
            _table: Destination,
            operation: Operation,
            record: &PurchaseOrderLine,
        ) -> std::result::Result<(), AuditError> {
            self.0.lock().unwrap().push((record.po_line.clone(), operation));
            Ok(())
        }
    }

    struct FailingAudit;

    impl AuditLog for FailingAudit {
        fn log(
            &self,
            _user: &str,
            _table: Destination,
            _operation: Operation,
            _record: &PurchaseOrderLine,
        ) -> std::result::Result<(), AuditError> {
            Err(AuditError::Backend("offline".to_string()))
        }
    }

    struct BrokenStore;

    impl RecordStore for BrokenStore {
        fn key_exists(&self, _table: Destination, _po_line: &str) -> StoreResult<bool> {
            Ok(false)
        }

        fn upsert(&mut self, _table: Destination, _record: &PurchaseOrderLine) -> StoreResult<usize> {
            Err(StoreError::Backend("disk full".to_string()))
        }
    }

    #[test]
    fn test_insert_then_update() {
        let coordinator = coordinator(ConflictPolicy::Overwrite);
        let mut store = MemoryStore::new();
        let audit = RecordingAudit::default();

        let report = coordinator.import(&extraction(&["81234/1", "81234/2"]), &mut store, &audit);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.table, Destination::NonWfOpen);

        // Same records again: nothing changes
        let report = coordinator.import(&extraction(&["81234/1"]), &mut store, &audit);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.updated, 0);

        let mut changed = extraction(&["81234/1"]);
        changed.records[0].description = "Clip, left".to_string();
        let report = coordinator.import(&changed, &mut store, &audit);
        assert_eq!(report.updated, 1);

        let logged = audit.0.lock().unwrap();
        assert_eq!(logged.len(), 3);
        assert_eq!(logged[2], ("81234/1".to_string(), Operation::Update));
    }

    #[test]
    fn test_reject_policy() {
        let coordinator = coordinator(ConflictPolicy::Reject);
        let mut store = MemoryStore::new();
        coordinator.import(&extraction(&["81234/1"]), &mut store, &TracingAudit);

        let report = coordinator.import(&extraction(&["81234/1", "81234/2"]), &mut store, &TracingAudit);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.error_count(), 1);
        assert!(matches!(
            report.diagnostics[0].error,
            ExtractionError::DuplicateKey { .. }
        ));
    }

    #[test]
    fn test_skip_policy() {
        let coordinator = coordinator(ConflictPolicy::Skip);
        let mut store = MemoryStore::new();
        coordinator.import(&extraction(&["81234/1"]), &mut store, &TracingAudit);

        let report = coordinator.import(&extraction(&["81234/1"]), &mut store, &TracingAudit);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.error_count(), 0);
    }

    #[test]
    fn test_audit_failure_does_not_fail_import() {
        let coordinator = coordinator(ConflictPolicy::Overwrite);
        let mut store = MemoryStore::new();
        let report = coordinator.import(&extraction(&["81234/1"]), &mut store, &FailingAudit);
        assert_eq!(report.inserted, 1);
        assert_eq!(store.len(Destination::NonWfOpen), 1);
    }

    #[test]
    fn test_store_failure_counted() {
        let coordinator = coordinator(ConflictPolicy::Overwrite);
        let report = coordinator.import(&extraction(&["81234/1", "81234/2"]), &mut BrokenStore, &TracingAudit);
        assert_eq!(report.failed, 2);
        assert_eq!(report.written(), 0);
        assert_eq!(report.error_count(), 2);
    }

    #[test]
    fn test_missing_corrections_file_is_error() {
        let mut config = OrdrConfig::default();
        config.extraction.corrections_path = Some("/nonexistent/corrections.json".into());
        assert!(ImportCoordinator::new(config).is_err());
    }

    #[test]
    fn test_garbage_bytes_are_an_error() {
        let coordinator = coordinator(ConflictPolicy::Overwrite);
        assert!(coordinator.extract_bytes(b"not a pdf", Vendor::MagicFx).is_err());
    }
}
