//! Transient per-row values produced while scanning a document.
//!
//! Nothing here outlives one `extract` call. The `(page_index, row_index)`
//! pair of every element orders a document; it never decreases in scan
//! order.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

/// One physical row read from a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawPageElement {
    pub page_index: usize,
    pub row_index: usize,
    /// Cells in reading order. Short rows are normal; index defensively.
    pub cells: Vec<String>,
    /// The source line the cells were split from.
    pub text: String,
}

impl RawPageElement {
    /// Cell at `index`, trimmed, or `""` when the row is too short.
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(|c| c.trim()).unwrap_or("")
    }

    /// True when the row carries no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.cells.iter().all(|c| c.trim().is_empty())
    }

    /// Cells joined by a single space.
    pub fn joined(&self) -> String {
        self.cells
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn position(&self) -> (usize, usize) {
        (self.page_index, self.row_index)
    }
}

/// A row recognised as a purchase-order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataRow {
    /// Raw strings keyed by field name (`line`, `pn`, `qty`, ...).
    pub fields: BTreeMap<String, String>,
    pub page_index: usize,
    pub row_index: usize,
    /// 1-based position among the document's data rows, set by the stitcher.
    pub ordinal: usize,
    /// Source text of every physical row that made up this item.
    pub raw: String,
}

impl DataRow {
    pub fn new(page_index: usize, row_index: usize, raw: impl Into<String>) -> Self {
        Self {
            fields: BTreeMap::new(),
            page_index,
            row_index,
            ordinal: 0,
            raw: raw.into(),
        }
    }

    /// Builder-style field insert; empty values are not stored.
    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        let value = value.trim();
        if !value.is_empty() {
            self.fields.insert(name.to_string(), value.to_string());
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Classification of one row (or a short run of rows).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifiedElement {
    DataRow(DataRow),

    /// A delivery-schedule annotation. The date is `None` when its date row
    /// was not found on the same page.
    ScheduleMarker {
        raw_date_text: String,
        resolved_date: Option<NaiveDate>,
        page_index: usize,
        row_index: usize,
    },

    /// A bare date row with no marker before it on its page. Used to bind a
    /// marker left open at the end of the previous page.
    ScheduleDate {
        raw_date_text: String,
        date: NaiveDate,
        page_index: usize,
        row_index: usize,
    },

    /// Looked like an item but failed the vendor grammar.
    Rejected {
        reason: String,
        raw: String,
        page_index: usize,
        row_index: usize,
    },

    Noise,
}

impl ClassifiedElement {
    /// Position in the document, `None` for noise.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            ClassifiedElement::DataRow(row) => Some((row.page_index, row.row_index)),
            ClassifiedElement::ScheduleMarker {
                page_index,
                row_index,
                ..
            }
            | ClassifiedElement::ScheduleDate {
                page_index,
                row_index,
                ..
            }
            | ClassifiedElement::Rejected {
                page_index,
                row_index,
                ..
            } => Some((*page_index, *row_index)),
            ClassifiedElement::Noise => None,
        }
    }

    pub fn is_noise(&self) -> bool {
        matches!(self, ClassifiedElement::Noise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(cells: &[&str]) -> RawPageElement {
        RawPageElement {
            page_index: 0,
            row_index: 3,
            cells: cells.iter().map(|c| c.to_string()).collect(),
            text: cells.join("  "),
        }
    }

    #[test]
    fn test_cell_pads_short_rows() {
        let row = element(&["10", " Bracket "]);
        assert_eq!(row.cell(1), "Bracket");
        assert_eq!(row.cell(7), "");
    }

    #[test]
    fn test_blank_row() {
        assert!(element(&["", "  "]).is_blank());
        assert!(!element(&["", "x"]).is_blank());
    }

    #[test]
    fn test_data_row_skips_empty_fields() {
        let row = DataRow::new(1, 2, "raw")
            .with_field("line", "10")
            .with_field("pn", "   ");
        assert_eq!(row.get("line"), Some("10"));
        assert_eq!(row.get("pn"), None);
    }

    #[test]
    fn test_element_position() {
        let marker = ClassifiedElement::ScheduleMarker {
            raw_date_text: String::new(),
            resolved_date: None,
            page_index: 2,
            row_index: 5,
        };
        assert_eq!(marker.position(), Some((2, 5)));
        assert_eq!(ClassifiedElement::Noise.position(), None);
    }
}
