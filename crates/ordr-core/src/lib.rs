//! Core library for purchase-order PDF import.
//!
//! This crate provides:
//! - PDF page text extraction and row tokenizing
//! - Vendor grammars for Wefabricate, Centurion and MAGIC FX orders
//! - Cross-page schedule-date stitching, numeric normalization and
//!   arithmetic validation
//! - Import into a keyed record store with conflict policies and auditing

pub mod error;
pub mod import;
pub mod models;
pub mod order;
pub mod pdf;

pub use error::{Diagnostic, ExtractionError, OrdrError, Result, Severity};
pub use import::{AuditLog, ImportCoordinator, ImportReport, MemoryStore, RecordStore, TracingAudit};
pub use models::{
    ConflictPolicy, Destination, DocumentContext, OrdrConfig, PurchaseOrderLine, Vendor,
};
pub use order::{CorrectionTable, ExtractionResult, OrderParser, RowFingerprint};
pub use pdf::{PdfExtractor, PdfProcessor};
