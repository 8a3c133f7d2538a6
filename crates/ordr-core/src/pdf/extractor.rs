//! Per-page text extraction using pdf-extract with a lopdf fallback.

use lopdf::Document;
use tracing::{debug, trace, warn};

use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// PDF text extractor.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    /// Create an extractor and load `data` into it.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut extractor = Self::new();
        extractor.load(data)?;
        Ok(extractor)
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("No document loaded".to_string()))
    }

    /// Per-page text through lopdf only; unreadable pages come back empty.
    fn lopdf_page_texts(&self) -> Result<Vec<String>> {
        let doc = self.document()?;
        let texts = doc
            .get_pages()
            .keys()
            .map(|&page| match doc.extract_text(&[page]) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to read text of page {}: {}", page, e);
                    String::new()
                }
            })
            .collect();
        Ok(texts)
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract needs the decrypted bytes
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        if page == 0 || page > self.page_count() {
            return Err(PdfError::InvalidPage(page));
        }
        let texts = self.page_texts()?;
        Ok(texts.into_iter().nth(page as usize - 1).unwrap_or_default())
    }

    fn page_texts(&self) -> Result<Vec<String>> {
        let page_count = self.page_count() as usize;
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        match pdf_extract::extract_text_from_mem_by_pages(&self.raw_data) {
            Ok(pages) if pages.len() == page_count => {
                trace!("pdf-extract returned {} pages", pages.len());
                Ok(pages)
            }
            Ok(pages) => {
                debug!(
                    "pdf-extract returned {} pages, document has {}; using lopdf",
                    pages.len(),
                    page_count
                );
                self.lopdf_page_texts()
            }
            Err(e) => {
                debug!("pdf-extract failed ({}), using lopdf", e);
                self.lopdf_page_texts()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let result = PdfExtractor::from_bytes(b"definitely not a pdf");
        assert!(matches!(result, Err(PdfError::Parse(_))));
    }

    #[test]
    fn test_page_texts_without_document() {
        let extractor = PdfExtractor::new();
        assert!(matches!(extractor.page_texts(), Err(PdfError::NoPages)));
        assert!(matches!(
            extractor.extract_page_text(1),
            Err(PdfError::InvalidPage(1))
        ));
    }
}
