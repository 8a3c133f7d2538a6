//! MAGIC FX purchase orders.
//!
//! Every item starts with two product codes (`PROTO (..)` or `VARIOUS`)
//! followed by `description date qty [pcs] price total`. Short items fit on
//! one line; long descriptions push the date and amounts to a later line.
//! Amounts use the European format. There is no part number, so one is
//! made up from the order number and the item's position.

use tracing::trace;

use super::first_page;
use crate::models::{ClassifiedElement, Currency, DataRow, DocumentContext, RawPageElement, Vendor};
use crate::order::rules::patterns::{
    MFX_DATE, MFX_DATE_CELL, MFX_DATE_LINE, MFX_ITEM_START, MFX_PO_NUMBER, MFX_QTY_PRICE_TOTAL,
    MFX_SINGLE_LINE,
};
use crate::order::rules::{capture, parse_date, DateOrder, NumericLocale};
use crate::order::{Classified, HeaderScope, RawFields, VendorAdapter};
use crate::pdf::TokenizedPage;

/// Two codes, description, date, quantity, price and total.
const MIN_TABLE_CELLS: usize = 7;

#[derive(Debug, Clone, Copy, Default)]
pub struct MagicFxAdapter;

impl MagicFxAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Rows that can never continue an item block.
    fn ends_block(text: &str) -> bool {
        MFX_ITEM_START.is_match(text) || text.contains("Total Amount") || text.contains("Delivery")
    }

    /// A table row with the date and amounts in the last four cells.
    fn from_cells(row: &RawPageElement) -> Option<DataRow> {
        let n = row.cells.len();
        if n < MIN_TABLE_CELLS || !MFX_DATE_CELL.is_match(row.cell(n - 4)) {
            return None;
        }
        let description = row.cells[2..n - 4]
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Some(
            DataRow::new(row.page_index, row.row_index, row.text.clone())
                .with_field("description", description)
                .with_field("req_date", row.cell(n - 4))
                .with_field("qty", row.cell(n - 3))
                .with_field("price", row.cell(n - 2))
                .with_field("total", row.cell(n - 1)),
        )
    }

    fn single_line(rows: &[RawPageElement], at: usize, data_part: &str) -> Option<Classified> {
        let row = &rows[at];
        let caps = MFX_SINGLE_LINE.captures(data_part)?;
        let mut description = caps[1].trim().to_string();
        let mut raw = row.text.trim().to_string();
        let mut consumed = 1;

        if let Some(next) = rows.get(at + 1).filter(|n| n.page_index == row.page_index) {
            let next_text = next.text.trim();
            if !next_text.is_empty() && !Self::ends_block(next_text) {
                description.push(' ');
                description.push_str(next_text);
                raw.push('\n');
                raw.push_str(next_text);
                consumed = 2;
            }
        }

        let data = DataRow::new(row.page_index, row.row_index, raw)
            .with_field("description", description)
            .with_field("req_date", &caps[2])
            .with_field("qty", &caps[3])
            .with_field("price", &caps[4])
            .with_field("total", &caps[5]);
        Some(Classified::spanning(ClassifiedElement::DataRow(data), consumed))
    }

    /// Description lines until a line that starts with the delivery date.
    fn multi_line(rows: &[RawPageElement], at: usize, data_part: &str) -> Option<Classified> {
        let row = &rows[at];
        let mut description = vec![data_part.to_string()];
        let mut raw = vec![row.text.trim().to_string()];

        for (offset, next) in rows[at + 1..].iter().enumerate() {
            let next_text = next.text.trim();
            if next.page_index != row.page_index || Self::ends_block(next_text) {
                break;
            }
            raw.push(next_text.to_string());

            let amounts = MFX_DATE_LINE.captures(next_text).and_then(|date| {
                let rest = next_text[date.get(0)?.end()..].trim();
                MFX_QTY_PRICE_TOTAL
                    .captures(rest)
                    .map(|amounts| (date[1].to_string(), amounts))
            });
            match amounts {
                Some((date, amounts)) => {
                    trace!("Item block at page {} row {} spans {} rows", row.page_index + 1, row.row_index, offset + 2);
                    let data = DataRow::new(row.page_index, row.row_index, raw.join("\n"))
                        .with_field("description", description.join(" "))
                        .with_field("req_date", date)
                        .with_field("qty", &amounts[1])
                        .with_field("price", &amounts[2])
                        .with_field("total", &amounts[3]);
                    return Some(Classified::spanning(ClassifiedElement::DataRow(data), offset + 2));
                }
                None => description.push(next_text.to_string()),
            }
        }
        None
    }
}

impl VendorAdapter for MagicFxAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::MagicFx
    }

    fn locale(&self) -> NumericLocale {
        NumericLocale::Eu
    }

    fn date_order(&self) -> DateOrder {
        DateOrder::DayFirst
    }

    fn header_scope(&self) -> HeaderScope {
        HeaderScope::Document
    }

    fn document_context(&self, pages: &[TokenizedPage]) -> DocumentContext {
        let text = first_page(pages);
        DocumentContext {
            po: capture(&MFX_PO_NUMBER, text),
            po_placed_date: capture(&MFX_DATE, text).and_then(|d| parse_date(&d, DateOrder::DayFirst)),
            purchaser: None,
            currency: Some(Currency::Eur),
        }
    }

    fn detect_header(&self, rows: &[RawPageElement]) -> Option<usize> {
        rows.iter()
            .position(|row| row.text.contains("Code") && row.text.contains("Description"))
    }

    fn is_table_end(&self, row: &RawPageElement) -> bool {
        row.text.contains("Total Amount") || row.text.contains("Delivery address")
    }

    fn classify_row(&self, rows: &[RawPageElement], at: usize) -> Classified {
        let row = &rows[at];
        if let Some(data) = Self::from_cells(row) {
            return Classified::single(ClassifiedElement::DataRow(data));
        }

        let text = row.text.trim();
        let Some(codes) = MFX_ITEM_START.find(text) else {
            return Classified::noise();
        };
        let data_part = text[codes.end()..].trim();

        Self::single_line(rows, at, data_part)
            .or_else(|| Self::multi_line(rows, at, data_part))
            .unwrap_or_else(|| {
                Classified::single(ClassifiedElement::Rejected {
                    reason: "incomplete item block".to_string(),
                    raw: text.to_string(),
                    page_index: row.page_index,
                    row_index: row.row_index,
                })
            })
    }

    fn extract_fields(&self, row: &DataRow, context: &DocumentContext) -> RawFields {
        let pn = match &context.po {
            Some(po) => format!("{}-{:02}", po, row.ordinal),
            None => format!("MFX-{:02}", row.ordinal),
        };
        RawFields {
            po: context.po.clone(),
            line: Some(row.ordinal.to_string()),
            pn: Some(pn.clone()),
            fallback_key: Some(pn),
            description: row.get("description").map(str::to_string),
            qty: row.get("qty").map(str::to_string),
            net_price: row.get("price").map(str::to_string),
            total_price: row.get("total").map(str::to_string),
            req_date: row.get("req_date").map(str::to_string),
            ..Default::default()
        }
    }
}
