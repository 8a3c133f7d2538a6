//! We Fabricate purchase orders.
//!
//! A table with item, identifier, description, quantity, price and value
//! columns, repeated under a header on every page. A delivery date is
//! written as a "Schedule Lines:" row followed by a row holding the
//! scheduled quantity and a month-name date.

use chrono::NaiveDate;
use tracing::debug;

use super::first_page;
use crate::models::{ClassifiedElement, DataRow, DocumentContext, RawPageElement, Vendor};
use crate::order::rules::patterns::{
    WF_CONTACT_PERSON, WF_CREATED_ON, WF_IDENTIFIER, WF_IDENTIFIER_SHAPE, WF_ITEM_NUMBER,
    WF_PO_FALLBACK, WF_PO_NUMBER, WF_SCHEDULE_DATE, WF_SCHEDULE_MARKER,
};
use crate::order::rules::{capture, parse_date, DateOrder, NumericLocale};
use crate::order::{Classified, HeaderScope, RawFields, VendorAdapter};
use crate::pdf::TokenizedPage;

/// Page furniture that can share a line with table cells.
const NOISE_MARKERS: &[&str] = &["Page:", "We Fabricate", "Incoterms:"];

/// Fewer cells than this may be a bare schedule date row.
const MIN_ITEM_CELLS: usize = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct WefabricateAdapter;

impl WefabricateAdapter {
    pub fn new() -> Self {
        Self
    }

    /// First cell of `row` that starts with a month-name date.
    fn schedule_date_in(&self, row: &RawPageElement) -> Option<(String, NaiveDate)> {
        row.cells.iter().find_map(|cell| {
            let text = WF_SCHEDULE_DATE.find(cell.trim())?.as_str();
            let date = parse_date(text, DateOrder::MonthFirst)?;
            Some((text.to_string(), date))
        })
    }

    fn classify_marker(&self, rows: &[RawPageElement], at: usize) -> Classified {
        let row = &rows[at];
        let marker = |raw_date_text: String, resolved_date: Option<NaiveDate>| {
            ClassifiedElement::ScheduleMarker {
                raw_date_text,
                resolved_date,
                page_index: row.page_index,
                row_index: row.row_index,
            }
        };

        if let Some((raw, date)) = self.schedule_date_in(row) {
            return Classified::single(marker(raw, Some(date)));
        }
        match rows.get(at + 1).and_then(|next| self.schedule_date_in(next)) {
            Some((raw, date)) => Classified::spanning(marker(raw, Some(date)), 2),
            None => {
                debug!(
                    "Schedule marker at page {} row {} has no date on its page",
                    row.page_index + 1,
                    row.row_index
                );
                Classified::single(marker(String::new(), None))
            }
        }
    }

    fn classify_item(&self, row: &RawPageElement) -> Classified {
        let item = row.cell(0);

        // The identifier column is often blank and then vanishes from the
        // split line; only a code-shaped cell is taken as an identifier.
        let (id, rest) = match row.cells.get(1).map(|c| c.trim()) {
            Some("") => ("", 2),
            Some(cell) if is_identifier_attempt(cell) => (cell, 2),
            _ => ("", 1),
        };

        if !id.is_empty() && !WF_IDENTIFIER.is_match(id) {
            return Classified::single(ClassifiedElement::Rejected {
                reason: format!("invalid identifier '{}'", id),
                raw: row.text.clone(),
                page_index: row.page_index,
                row_index: row.row_index,
            });
        }

        let data = DataRow::new(row.page_index, row.row_index, row.text.clone())
            .with_field("item", item)
            .with_field("id", id)
            .with_field("description", row.cell(rest))
            .with_field("qty", row.cell(rest + 1))
            .with_field("price", row.cell(rest + 2))
            .with_field("value", row.cell(rest + 3));
        Classified::single(ClassifiedElement::DataRow(data))
    }
}

impl VendorAdapter for WefabricateAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::Wefabricate
    }

    fn locale(&self) -> NumericLocale {
        NumericLocale::Us
    }

    fn date_order(&self) -> DateOrder {
        DateOrder::MonthFirst
    }

    fn header_scope(&self) -> HeaderScope {
        HeaderScope::PerPage
    }

    fn document_context(&self, pages: &[TokenizedPage]) -> DocumentContext {
        let text = first_page(pages);
        DocumentContext {
            po: capture(&WF_PO_NUMBER, text).or_else(|| capture(&WF_PO_FALLBACK, text)),
            po_placed_date: capture(&WF_CREATED_ON, text)
                .and_then(|d| parse_date(&d, DateOrder::MonthFirst)),
            purchaser: capture(&WF_CONTACT_PERSON, text),
            currency: None,
        }
    }

    fn detect_header(&self, rows: &[RawPageElement]) -> Option<usize> {
        rows.iter().position(|row| {
            row.cells.iter().any(|cell| {
                let cell = cell.trim();
                cell.starts_with("Item") || cell == "ID"
            })
        })
    }

    fn classify_row(&self, rows: &[RawPageElement], at: usize) -> Classified {
        let row = &rows[at];
        let joined = row.joined();

        if NOISE_MARKERS.iter().any(|m| joined.contains(m)) {
            return Classified::noise();
        }
        if WF_SCHEDULE_MARKER.is_match(&joined) {
            return self.classify_marker(rows, at);
        }
        // Quantity and date only: a schedule date row whose marker is on
        // the previous page
        if row.cells.len() < MIN_ITEM_CELLS {
            if let Some((raw_date_text, date)) = self.schedule_date_in(row) {
                return Classified::single(ClassifiedElement::ScheduleDate {
                    raw_date_text,
                    date,
                    page_index: row.page_index,
                    row_index: row.row_index,
                });
            }
        }
        // Short item rows keep their missing trailing cells as nulls
        if WF_ITEM_NUMBER.is_match(row.cell(0)) {
            return self.classify_item(row);
        }
        Classified::noise()
    }

    fn extract_fields(&self, row: &DataRow, context: &DocumentContext) -> RawFields {
        let item = row.get("item").map(str::to_string);
        let id = row.get("id").map(str::to_string);
        RawFields {
            po: context.po.clone(),
            line: item.clone(),
            fallback_key: id.clone().or(item),
            pn: id,
            description: row.get("description").map(str::to_string),
            qty: row.get("qty").map(str::to_string),
            net_price: row.get("price").map(str::to_string),
            total_price: row.get("value").map(str::to_string),
            ..Default::default()
        }
    }
}

/// Any code-shaped cell counts as an identifier; it must also contain a
/// digit so hyphenated words stay descriptions.
fn is_identifier_attempt(cell: &str) -> bool {
    WF_IDENTIFIER_SHAPE.is_match(cell) && cell.bytes().any(|b| b.is_ascii_digit())
}
