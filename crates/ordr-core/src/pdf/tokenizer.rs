//! Page text to rows of cells.
//!
//! Extracted PDF text keeps table columns apart with tabs, `|` rules or wide
//! runs of spaces. Every non-empty line becomes one row, split into cells on
//! those separators. Lines that are not table rows (page headers, wrapped
//! descriptions, schedule annotations) come out as single-cell rows and are
//! left to the vendor grammar.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::models::RawPageElement;

lazy_static! {
    static ref CELL_SEPARATOR: Regex = Regex::new(r"\s*[\t|]\s*|\s{2,}").unwrap();
}

/// One page after tokenizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedPage {
    pub page_index: usize,
    /// Raw page text, used for document-level fields.
    pub text: String,
    /// Non-empty lines, right-trimmed.
    pub lines: Vec<String>,
}

impl TokenizedPage {
    /// One row per line. `row_index` is the line index on the page.
    pub fn rows(&self) -> Vec<RawPageElement> {
        self.lines
            .iter()
            .enumerate()
            .map(|(row_index, line)| RawPageElement {
                page_index: self.page_index,
                row_index,
                cells: split_cells(line),
                text: line.clone(),
            })
            .collect()
    }

    /// Number of lines that split into two or more cells.
    pub fn table_rows(&self) -> usize {
        self.lines.iter().filter(|l| split_cells(l).len() >= 2).count()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Splits page text into lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageTokenizer;

impl PageTokenizer {
    pub fn new() -> Self {
        Self
    }

    pub fn tokenize(&self, page_index: usize, text: &str) -> TokenizedPage {
        let lines: Vec<String> = text
            .lines()
            .map(|l| l.trim_end().to_string())
            .filter(|l| !l.trim().is_empty())
            .collect();

        let page = TokenizedPage {
            page_index,
            text: text.to_string(),
            lines,
        };
        trace!(
            "Page {}: {} lines, {} table rows",
            page_index + 1,
            page.lines.len(),
            page.table_rows()
        );
        page
    }
}

/// Split one line into trimmed cells. Outer `|` rules do not produce cells.
pub fn split_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let body = trimmed.trim_start_matches('|').trim_end_matches('|');
    CELL_SEPARATOR
        .split(body)
        .map(|cell| cell.trim().to_string())
        .collect()
}
