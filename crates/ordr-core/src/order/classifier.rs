//! Drives a vendor grammar over the rows of a whole document.

use tracing::{debug, trace, warn};

use super::{HeaderScope, VendorAdapter};
use crate::error::{Diagnostic, ExtractionError};
use crate::models::{ClassifiedElement, RawPageElement};
use crate::pdf::TokenizedPage;

/// Classified elements of one document, in scan order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedDocument {
    /// Data rows, schedule markers and schedule dates. No noise.
    pub elements: Vec<ClassifiedElement>,
    /// Rejected rows and header problems.
    pub diagnostics: Vec<Diagnostic>,
}

/// Applies a [`VendorAdapter`]'s row grammar to tokenized pages.
pub struct ElementClassifier<'a> {
    adapter: &'a dyn VendorAdapter,
}

impl<'a> ElementClassifier<'a> {
    pub fn new(adapter: &'a dyn VendorAdapter) -> Self {
        Self { adapter }
    }

    pub fn classify(&self, pages: &[TokenizedPage]) -> ClassifiedDocument {
        let mut doc = ClassifiedDocument::default();

        match self.adapter.header_scope() {
            HeaderScope::PerPage => {
                for page in pages {
                    let rows = page.rows();
                    let start = match self.adapter.detect_header(&rows) {
                        Some(header) => {
                            trace!("Page {}: header at row {}", page.page_index + 1, header);
                            // Schedule rows carried over from the previous
                            // page can sit above the repeated header
                            self.classify_run(&rows[..header], &mut doc, true);
                            header + 1
                        }
                        None => 0,
                    };
                    self.classify_run(&rows[start..], &mut doc, false);
                }
            }
            HeaderScope::Document => {
                let rows: Vec<RawPageElement> =
                    pages.iter().flat_map(TokenizedPage::rows).collect();
                match self.adapter.detect_header(&rows) {
                    Some(header) => {
                        trace!("Document header at row {}", header);
                        self.classify_run(&rows[header + 1..], &mut doc, false);
                    }
                    None => {
                        warn!("No item header found in {} document", self.adapter.vendor());
                        doc.diagnostics.push(Diagnostic::warning(
                            ExtractionError::MalformedDocument {
                                reason: "no item header found".to_string(),
                            },
                        ));
                    }
                }
            }
        }

        doc
    }

    fn classify_run(&self, rows: &[RawPageElement], doc: &mut ClassifiedDocument, schedule_only: bool) {
        let mut at = 0;
        while at < rows.len() {
            let row = &rows[at];
            if !schedule_only && self.adapter.is_table_end(row) {
                debug!("Table ends at page {} row {}", row.page_index + 1, row.row_index);
                break;
            }
            if row.is_blank() {
                at += 1;
                continue;
            }

            let classified = self.adapter.classify_row(rows, at);
            match classified.element {
                ClassifiedElement::Noise => {
                    trace!("Noise: {}", row.text);
                }
                ClassifiedElement::ScheduleDate { .. } | ClassifiedElement::ScheduleMarker { .. } => {
                    debug!(
                        "{} at page {} row {}",
                        kind(&classified.element),
                        row.page_index + 1,
                        row.row_index
                    );
                    doc.elements.push(classified.element);
                }
                _ if schedule_only => {}
                ClassifiedElement::Rejected {
                    reason,
                    raw,
                    page_index,
                    row_index,
                } => {
                    warn!("Rejected row at page {} row {}: {} ({})", page_index + 1, row_index, raw, reason);
                    doc.diagnostics.push(
                        Diagnostic::error(ExtractionError::UnrecognizedRow { reason, raw })
                            .at(page_index, row_index),
                    );
                }
                element => {
                    debug!("{} at page {} row {}", kind(&element), row.page_index + 1, row.row_index);
                    doc.elements.push(element);
                }
            }
            at += classified.consumed.max(1);
        }
    }
}

fn kind(element: &ClassifiedElement) -> &'static str {
    match element {
        ClassifiedElement::DataRow(_) => "DataRow",
        ClassifiedElement::ScheduleMarker { .. } => "ScheduleMarker",
        ClassifiedElement::ScheduleDate { .. } => "ScheduleDate",
        ClassifiedElement::Rejected { .. } => "Rejected",
        ClassifiedElement::Noise => "Noise",
    }
}
