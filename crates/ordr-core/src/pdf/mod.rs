//! PDF reading and page tokenizing.

mod extractor;
mod tokenizer;

pub use extractor::PdfExtractor;
pub use tokenizer::{split_cells, PageTokenizer, TokenizedPage};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF text sources.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text from a specific page (1-indexed).
    fn extract_page_text(&self, page: u32) -> Result<String>;

    /// Text of every page, in page order.
    fn page_texts(&self) -> Result<Vec<String>>;
}
