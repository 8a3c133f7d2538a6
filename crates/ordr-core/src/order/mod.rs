//! Purchase-order extraction: vendor grammars, classification, stitching,
//! validation and record assembly.

pub mod assembler;
pub mod classifier;
pub mod corrections;
mod parser;
pub mod rules;
pub mod stitcher;
pub mod validator;
pub mod vendors;

pub use assembler::RecordAssembler;
pub use classifier::{ClassifiedDocument, ElementClassifier};
pub use corrections::{row_fingerprint, Correction, CorrectionTable};
pub use parser::{ExtractionResult, OrderParser, RowFingerprint};
pub use stitcher::{CrossPageStitcher, StitchedRow};
pub use validator::{NormalizedFields, RecordValidator};
pub use vendors::{adapter_for, CenturionAdapter, MagicFxAdapter, WefabricateAdapter};

use std::collections::BTreeMap;

use crate::models::{ClassifiedElement, DataRow, DocumentContext, RawPageElement, Vendor};
use crate::pdf::TokenizedPage;
use rules::{DateOrder, NumericLocale};

/// Where a vendor's item header is searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderScope {
    /// Every page repeats the header; rows above it on a page are skipped.
    PerPage,
    /// One header for the whole document, rows of all pages flattened.
    Document,
}

/// Result of classifying the row at one position.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub element: ClassifiedElement,
    /// Physical rows used, at least one.
    pub consumed: usize,
}

impl Classified {
    pub fn single(element: ClassifiedElement) -> Self {
        Self {
            element,
            consumed: 1,
        }
    }

    pub fn noise() -> Self {
        Self::single(ClassifiedElement::Noise)
    }

    pub fn spanning(element: ClassifiedElement, consumed: usize) -> Self {
        Self {
            element,
            consumed: consumed.max(1),
        }
    }
}

/// Raw field strings of one data row, before normalization.
///
/// Every field is optional; presence is decided by the validator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields {
    pub po: Option<String>,
    pub line: Option<String>,
    pub pn: Option<String>,
    /// Key used for `po_line` when there is no line number.
    pub fallback_key: Option<String>,
    pub description: Option<String>,
    pub qty: Option<String>,
    pub net_price: Option<String>,
    pub total_price: Option<String>,
    /// Date written on the item row itself; wins over a stitched date.
    pub req_date: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

impl RawFields {
    /// Replace a field by name; used by correction entries.
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        let value = Some(value.to_string());
        match name {
            "line" => self.line = value,
            "pn" => self.pn = value,
            "description" => self.description = value,
            "qty" => self.qty = value,
            "net_price" => self.net_price = value,
            "total_price" => self.total_price = value,
            "req_date" => self.req_date = value,
            _ => return false,
        }
        true
    }
}

/// Per-vendor parsing knowledge.
///
/// Adapters never fail: a missing cell becomes `None` and a row that does not
/// fit the grammar is classified as noise or rejected.
pub trait VendorAdapter: Send + Sync {
    fn vendor(&self) -> Vendor;

    /// Number format used in quantity and price cells.
    fn locale(&self) -> NumericLocale;

    /// Order of numeric day/month dates.
    fn date_order(&self) -> DateOrder;

    fn header_scope(&self) -> HeaderScope;

    /// Document-level fields, read once.
    fn document_context(&self, pages: &[TokenizedPage]) -> DocumentContext;

    /// Index of the item header row in `rows`.
    fn detect_header(&self, rows: &[RawPageElement]) -> Option<usize>;

    /// Rows after this one are not part of the item table.
    fn is_table_end(&self, _row: &RawPageElement) -> bool {
        false
    }

    /// Classify the row at `rows[at]`, possibly consuming following rows.
    fn classify_row(&self, rows: &[RawPageElement], at: usize) -> Classified;

    /// Map a data row's raw strings onto record fields.
    fn extract_fields(&self, row: &DataRow, context: &DocumentContext) -> RawFields;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_fields_set() {
        let mut fields = RawFields::default();
        assert!(fields.set("pn", "510-000-054"));
        assert!(fields.set("qty", "5,000.00"));
        assert!(!fields.set("po", "123"));
        assert_eq!(fields.pn.as_deref(), Some("510-000-054"));
        assert_eq!(fields.qty.as_deref(), Some("5,000.00"));
        assert_eq!(fields.po, None);
    }

    #[test]
    fn test_classified_spanning_consumes_at_least_one() {
        assert_eq!(Classified::spanning(ClassifiedElement::Noise, 0).consumed, 1);
        assert_eq!(Classified::spanning(ClassifiedElement::Noise, 3).consumed, 3);
    }
}
