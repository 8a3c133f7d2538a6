//! Centurion purchase orders.
//!
//! Plain text lines, one item per line after the item header:
//!
//! `line pn description... dd/mm/yyyy qty unit price disc disc total`
//!
//! A long part number or description wraps onto the next line.

use tracing::trace;

use super::first_page_then_all;
use crate::models::{ClassifiedElement, Currency, DataRow, DocumentContext, RawPageElement, Vendor};
use crate::order::rules::patterns::{
    CENTURION_CURRENCY, CENTURION_DATE, CENTURION_ITEM_LINE, CENTURION_ITEM_WITH_TOKEN,
    CENTURION_NUMBER, CENTURION_PN_TAIL, CENTURION_PO_NUMBER, DATE_TOKEN,
};
use crate::order::rules::{capture, parse_date, DateOrder, NumericLocale};
use crate::order::{Classified, HeaderScope, RawFields, VendorAdapter};
use crate::pdf::TokenizedPage;

const NOISE_WORDS: &[&str] = &["Total", "Subtotal", "Delivery", "This order"];

/// Line, part number, one description word, date, quantity, unit, price
/// and at least one more amount.
const MIN_ITEM_TOKENS: usize = 8;

// Offsets from the date token
const QTY_OFFSET: usize = 1;
const UNIT_OFFSET: usize = 2;
const PRICE_OFFSET: usize = 3;
// Two discount columns sit between price and total
const TOTAL_OFFSET: usize = 6;

#[derive(Debug, Clone, Copy, Default)]
pub struct CenturionAdapter;

impl CenturionAdapter {
    pub fn new() -> Self {
        Self
    }

    fn is_noise_line(text: &str) -> bool {
        text.is_empty() || NOISE_WORDS.iter().any(|w| text.contains(w))
    }
}

impl VendorAdapter for CenturionAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::Centurion
    }

    fn locale(&self) -> NumericLocale {
        NumericLocale::Us
    }

    fn date_order(&self) -> DateOrder {
        DateOrder::DayFirst
    }

    fn header_scope(&self) -> HeaderScope {
        HeaderScope::Document
    }

    fn document_context(&self, pages: &[TokenizedPage]) -> DocumentContext {
        let po = first_page_then_all(pages, |text| {
            capture(&CENTURION_PO_NUMBER, text).or_else(|| {
                capture(&CENTURION_NUMBER, text).filter(|n| n.chars().any(|c| c.is_ascii_digit()))
            })
        });
        let po_placed_date = first_page_then_all(pages, |text| {
            capture(&CENTURION_DATE, text).and_then(|d| parse_date(&d, DateOrder::DayFirst))
        });
        let currency = first_page_then_all(pages, |text| {
            capture(&CENTURION_CURRENCY, text).and_then(|c| Currency::from_marker(&c))
        })
        .unwrap_or(Currency::Usd);

        DocumentContext {
            po,
            po_placed_date,
            purchaser: None,
            currency: Some(currency),
        }
    }

    fn detect_header(&self, rows: &[RawPageElement]) -> Option<usize> {
        rows.iter().position(|row| {
            let t = &row.text;
            (t.contains("Line") && t.contains("Item") && t.contains("Description") && t.contains("Quantity"))
                || (t.contains("number") && t.contains("Description") && t.contains("Quantity"))
        })
    }

    fn classify_row(&self, rows: &[RawPageElement], at: usize) -> Classified {
        let row = &rows[at];
        let text = row.text.trim();
        if Self::is_noise_line(text) || !CENTURION_ITEM_LINE.is_match(text) {
            return Classified::noise();
        }

        let parts: Vec<&str> = text.split_whitespace().collect();
        let date_at = parts
            .iter()
            .skip(2)
            .position(|p| DATE_TOKEN.is_match(p))
            .map(|p| p + 2);

        if parts.len() < MIN_ITEM_TOKENS {
            // Addresses and phone numbers also start with digits
            if date_at.is_none() {
                return Classified::noise();
            }
            return Classified::single(ClassifiedElement::Rejected {
                reason: format!("expected at least {} tokens, found {}", MIN_ITEM_TOKENS, parts.len()),
                raw: text.to_string(),
                page_index: row.page_index,
                row_index: row.row_index,
            });
        }

        let mut pn = parts[1].to_string();
        let mut description: Vec<&str> = parts[2..date_at.unwrap_or(parts.len())].to_vec();
        let mut data = DataRow::new(row.page_index, row.row_index, text).with_field("line", parts[0]);

        if let Some(j) = date_at {
            let token = |offset: usize| parts.get(j + offset).copied().unwrap_or("");
            data.set("req_date", parts[j]);
            data.set("qty", token(QTY_OFFSET));
            data.set("unit", token(UNIT_OFFSET));
            data.set("price", token(PRICE_OFFSET));
            data.set("total", token(TOTAL_OFFSET));
        }

        let mut consumed = 1;
        if let Some(next) = rows.get(at + 1).filter(|n| n.page_index == row.page_index) {
            let next_text = next.text.trim();
            let next_parts: Vec<&str> = next_text.split_whitespace().collect();
            if let Some(first) = next_parts.first().filter(|_| !Self::is_noise_line(next_text)) {
                if pn.ends_with('-') && CENTURION_PN_TAIL.is_match(first) {
                    trace!("Part number {} continues with {}", pn, first);
                    pn.push_str(first);
                    description.extend(&next_parts[1..]);
                    consumed = 2;
                } else if !CENTURION_ITEM_WITH_TOKEN.is_match(next_text) {
                    description.extend(&next_parts);
                    consumed = 2;
                }
            }
            if consumed == 2 {
                data.raw = format!("{}\n{}", text, next_text);
            }
        }

        data.set("pn", pn);
        data.set("description", description.join(" "));
        Classified::spanning(ClassifiedElement::DataRow(data), consumed)
    }

    fn extract_fields(&self, row: &DataRow, context: &DocumentContext) -> RawFields {
        let pn = row.get("pn").map(str::to_string);
        let mut fields = RawFields {
            po: context.po.clone(),
            line: row.get("line").map(str::to_string),
            fallback_key: pn.clone(),
            pn,
            description: row.get("description").map(str::to_string),
            qty: row.get("qty").map(str::to_string),
            net_price: row.get("price").map(str::to_string),
            total_price: row.get("total").map(str::to_string),
            req_date: row.get("req_date").map(str::to_string),
            ..Default::default()
        };
        if let Some(unit) = row.get("unit") {
            fields.attributes.insert("unit".to_string(), unit.to_string());
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::PageTokenizer;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    const PAGE: &str = "Centurion Safety Products\n\
        Purchase Order PO-81234\n\
        Date: 15/09/2025\n\
        Currency USD\n\
        Line Item number Description Date Quantity Unit Price Disc Disc Total\n\
        1 510-000- ARMIS ELITE T2 TORCH CLIPS 11/10/2025 5,000.00 Each 0.11 0.00 0.00 550.00\n\
        054 FRONT LEFT\n\
        2 610-200-017 VISOR CLIP 11/10/2025 200.00 Each 1.50 0.00 0.00 300.00\n\
        with retaining pin\n\
        3 610-200-018 HOOK 01/11/2025\n\
        4 Main Street\n\
        Subtotal 850.00\n";

    fn rows() -> Vec<RawPageElement> {
        PageTokenizer::new().tokenize(0, PAGE).rows()
    }

    fn data_row(classified: Classified) -> DataRow {
        match classified.element {
            ClassifiedElement::DataRow(row) => row,
            other => panic!("expected data row, got {:?}", other),
        }
    }

    #[test]
    fn test_document_context() {
        let page = PageTokenizer::new().tokenize(0, PAGE);
        let ctx = CenturionAdapter::new().document_context(&[page]);
        assert_eq!(ctx.po.as_deref(), Some("81234"));
        assert_eq!(ctx.po_placed_date, NaiveDate::from_ymd_opt(2025, 9, 15));
        assert_eq!(ctx.currency, Some(Currency::Usd));
    }

    #[test]
    fn test_po_from_later_page() {
        let tokenizer = PageTokenizer::new();
        let pages = vec![
            tokenizer.tokenize(0, "Centurion\nCurrency GBP\n"),
            tokenizer.tokenize(1, "Order PO 777\n"),
        ];
        let ctx = CenturionAdapter::new().document_context(&pages);
        assert_eq!(ctx.po.as_deref(), Some("777"));
        assert_eq!(ctx.currency, Some(Currency::Gbp));
    }

    #[test]
    fn test_header() {
        assert_eq!(CenturionAdapter::new().detect_header(&rows()), Some(4));
    }

    #[test]
    fn test_split_part_number_merged() {
        let rows = rows();
        let classified = CenturionAdapter::new().classify_row(&rows, 5);
        assert_eq!(classified.consumed, 2);

        let row = data_row(classified);
        assert_eq!(row.get("line"), Some("1"));
        assert_eq!(row.get("pn"), Some("510-000-054"));
        assert_eq!(row.get("description"), Some("ARMIS ELITE T2 TORCH CLIPS FRONT LEFT"));
        assert_eq!(row.get("req_date"), Some("11/10/2025"));
        assert_eq!(row.get("qty"), Some("5,000.00"));
        assert_eq!(row.get("price"), Some("0.11"));
        assert_eq!(row.get("total"), Some("550.00"));
        assert!(row.raw.ends_with("\n054 FRONT LEFT"));
    }

    #[test]
    fn test_description_continuation() {
        let rows = rows();
        let row = data_row(CenturionAdapter::new().classify_row(&rows, 7));
        assert_eq!(row.get("pn"), Some("610-200-017"));
        assert_eq!(row.get("description"), Some("VISOR CLIP with retaining pin"));

        let fields = CenturionAdapter::new().extract_fields(&row, &DocumentContext::default());
        assert_eq!(fields.attributes.get("unit").map(String::as_str), Some("Each"));
        assert_eq!(fields.net_price.as_deref(), Some("1.50"));
    }

    #[test]
    fn test_short_item_line_with_date_rejected() {
        let rows = rows();
        let classified = CenturionAdapter::new().classify_row(&rows, 9);
        assert!(matches!(classified.element, ClassifiedElement::Rejected { .. }));
    }

    #[test]
    fn test_short_line_without_date_is_noise() {
        let rows = rows();
        assert!(CenturionAdapter::new().classify_row(&rows, 10).element.is_noise());
        assert!(CenturionAdapter::new().classify_row(&rows, 11).element.is_noise());
    }

    #[test]
    fn test_next_item_not_swallowed() {
        let page = PageTokenizer::new().tokenize(
            0,
            "1 A-1 BOLT 01/10/2025 10 Each 1.00 0.00 0.00 10.00\n\
             2 A-2 NUT 01/10/2025 10 Each 1.00 0.00 0.00 10.00\n",
        );
        let rows = page.rows();
        let classified = CenturionAdapter::new().classify_row(&rows, 0);
        assert_eq!(classified.consumed, 1);
        assert_eq!(data_row(classified).get("description"), Some("BOLT"));
    }
}
