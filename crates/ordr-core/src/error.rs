//! Error types for the ordr-core library.
//!
//! Two layers, mirroring how the import pipeline tolerates failures:
//!
//! * [`OrdrError`] is fatal for one `extract` call: the document could not be
//!   opened or read at all, or the caller asked for a vendor that does not
//!   exist.
//! * [`ExtractionError`] describes a single row or field that went wrong.
//!   These never leave `extract` as `Err`; they are wrapped in a
//!   [`Diagnostic`] and returned next to the records.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Main error type for the ordr library.
#[derive(Error, Debug)]
pub enum OrdrError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Storage collaborator error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The vendor identifier does not name a modeled vendor.
    #[error("unknown vendor: {0}")]
    UnknownVendor(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Row- and field-level extraction failures.
///
/// All of these are local to one row (or, for [`MalformedDocument`], to one
/// document that simply has nothing to extract).
///
/// [`MalformedDocument`]: ExtractionError::MalformedDocument
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionError {
    /// No extractable text or table anywhere in the document.
    #[error("malformed document: {reason}")]
    MalformedDocument { reason: String },

    /// Row failed grammar or identifier checks.
    #[error("unrecognized row ({reason}): {raw}")]
    UnrecognizedRow { reason: String, raw: String },

    /// qty * net_price differs from total_price beyond tolerance.
    #[error(
        "validation mismatch: qty ({qty}) * net_price ({net_price}) differs from total_price ({total_price}) by {difference}"
    )]
    ValidationMismatch {
        qty: Decimal,
        net_price: Decimal,
        total_price: Decimal,
        difference: Decimal,
    },

    /// A single field could not be parsed; the field becomes null.
    #[error("failed to parse {field}: {value:?}")]
    NumericParseFailure { field: String, value: String },

    /// The destination already holds this key and the policy rejects overwrites.
    #[error("duplicate key {po_line} in {table}")]
    DuplicateKey { table: String, po_line: String },

    /// The storage collaborator failed to write a record.
    #[error("import of {po_line} into {table} failed: {message}")]
    ImportFailed {
        table: String,
        po_line: String,
        message: String,
    },

    /// A correction table entry replaced raw fields of a row.
    #[error("correction applied ({fingerprint}): {note}")]
    CorrectionApplied { fingerprint: String, note: String },
}

/// How a diagnostic counts toward the document totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Reported, but the record (if any) was still emitted.
    Warning,
    /// The row was dropped; counts toward `error_count`.
    Error,
}

/// A located extraction problem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
    pub error: ExtractionError,
}

impl Diagnostic {
    pub fn error(error: ExtractionError) -> Self {
        Self {
            severity: Severity::Error,
            page_index: None,
            row_index: None,
            error,
        }
    }

    pub fn warning(error: ExtractionError) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(error)
        }
    }

    pub fn at(mut self, page_index: usize, row_index: usize) -> Self {
        self.page_index = Some(page_index);
        self.row_index = Some(row_index);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.page_index, self.row_index) {
            (Some(page), Some(row)) => write!(f, "page {} row {}: {}", page + 1, row, self.error),
            _ => write!(f, "{}", self.error),
        }
    }
}

/// Errors raised by a storage collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Errors raised by an audit collaborator. Never fatal to an import.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("audit backend error: {0}")]
    Backend(String),
}

/// Result type for the ordr library.
pub type Result<T> = std::result::Result<T, OrdrError>;
