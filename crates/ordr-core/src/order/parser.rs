//! Whole-document purchase-order extraction.

use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Diagnostic, ExtractionError, Severity};
use crate::models::{ClassifiedElement, Currency, DocumentContext, PurchaseOrderLine, Vendor};
use crate::pdf::{PageTokenizer, TokenizedPage};

use super::rules::{parse_date, AmountKind, NormalizedAmount, NumericNormalizer};
use super::{
    adapter_for, row_fingerprint, CorrectionTable, CrossPageStitcher, ElementClassifier,
    NormalizedFields, RawFields, RecordAssembler, RecordValidator, StitchedRow, VendorAdapter,
};

/// Records and diagnostics of one document.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub vendor: Vendor,
    /// Document-level fields shared by every record.
    pub context: DocumentContext,
    /// Accepted records in document order.
    pub records: Vec<PurchaseOrderLine>,
    pub diagnostics: Vec<Diagnostic>,
    pub page_count: usize,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    /// An empty result for a document with nothing to read.
    pub fn empty(vendor: Vendor) -> Self {
        Self {
            vendor,
            context: DocumentContext::default(),
            records: Vec::new(),
            diagnostics: Vec::new(),
            page_count: 0,
            processing_time_ms: 0,
        }
    }

    pub fn success_count(&self) -> usize {
        self.records.len()
    }

    /// Rejected rows and records.
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }
}

/// Source fingerprint of one data row, for writing correction entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFingerprint {
    pub page_index: usize,
    pub row_index: usize,
    pub fingerprint: String,
    pub raw: String,
}

/// Runs one vendor grammar over a document's page texts.
pub struct OrderParser {
    adapter: Box<dyn VendorAdapter>,
    validator: RecordValidator,
    corrections: CorrectionTable,
    /// 0 reads every page.
    max_pages: usize,
}

impl OrderParser {
    pub fn new(vendor: Vendor) -> Self {
        Self {
            adapter: adapter_for(vendor),
            validator: RecordValidator::default(),
            corrections: CorrectionTable::default(),
            max_pages: 0,
        }
    }

    /// Set the arithmetic tolerance of `qty * net_price` against `total_price`.
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.validator = RecordValidator::new(tolerance);
        self
    }

    pub fn with_corrections(mut self, corrections: CorrectionTable) -> Self {
        self.corrections = corrections;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn vendor(&self) -> Vendor {
        self.adapter.vendor()
    }

    fn tokenize(&self, page_texts: &[String]) -> Vec<TokenizedPage> {
        let limit = match self.max_pages {
            0 => page_texts.len(),
            n => n.min(page_texts.len()),
        };
        let tokenizer = PageTokenizer::new();
        page_texts[..limit]
            .iter()
            .enumerate()
            .map(|(i, text)| tokenizer.tokenize(i, text))
            .collect()
    }

    /// Data rows of the document after classification and stitching.
    fn data_rows(&self, pages: &[TokenizedPage], diagnostics: &mut Vec<Diagnostic>) -> Vec<StitchedRow> {
        let classified = ElementClassifier::new(self.adapter.as_ref()).classify(pages);
        diagnostics.extend(classified.diagnostics);
        CrossPageStitcher::new().stitch(classified.elements)
    }

    /// Extract every record of a document given as page texts.
    pub fn parse_pages(&self, page_texts: &[String]) -> ExtractionResult {
        let start = Instant::now();
        let vendor = self.vendor();
        let pages = self.tokenize(page_texts);
        let mut result = ExtractionResult::empty(vendor);
        result.page_count = pages.len();

        info!("Extracting {} purchase order from {} pages", vendor, pages.len());

        if pages.iter().all(TokenizedPage::is_empty) {
            warn!("No text found in {} document", vendor);
            result.diagnostics.push(Diagnostic::warning(ExtractionError::MalformedDocument {
                reason: "no extractable text".to_string(),
            }));
            result.processing_time_ms = start.elapsed().as_millis() as u64;
            return result;
        }

        let context = self.adapter.document_context(&pages);
        debug!("Document context: {:?}", context);
        if context.po.is_none() {
            warn!("No purchase-order number found in {} document", vendor);
        }

        let rows = self.data_rows(&pages, &mut result.diagnostics);
        let assembler = RecordAssembler::new();

        for stitched in rows {
            let row = &stitched.row;
            let mut raw = self.adapter.extract_fields(row, &context);
            if let Some(applied) = self.corrections.apply(vendor, row, &mut raw) {
                result.diagnostics.push(applied);
            }

            let fields = self.normalize(raw, &stitched, &mut result.diagnostics);
            match self.validator.validate(&fields) {
                Ok(()) => {
                    let record = assembler.assemble(fields, &context);
                    debug!("Accepted {}", record.po_line);
                    result.records.push(record);
                }
                Err(error) => {
                    warn!(
                        "Dropped row at page {} row {}: {}",
                        row.page_index + 1,
                        row.row_index,
                        error
                    );
                    result
                        .diagnostics
                        .push(Diagnostic::error(error).at(row.page_index, row.row_index));
                }
            }
        }

        result.context = context;
        result.processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Extracted {} records from {} document ({} errors, {} warnings) in {}ms",
            result.success_count(),
            vendor,
            result.error_count(),
            result.warning_count(),
            result.processing_time_ms
        );
        result
    }

    /// Numbers and dates of one row. A value that fails to parse becomes
    /// `None` with a warning.
    fn normalize(
        &self,
        raw: RawFields,
        stitched: &StitchedRow,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> NormalizedFields {
        let row = &stitched.row;
        let normalizer = NumericNormalizer::new(self.adapter.locale());
        let mut currency: Option<Currency> = None;

        let mut amount = |field: &str,
                          value: &Option<String>,
                          kind: AmountKind|
         -> Option<NormalizedAmount> {
            let value = value.as_deref().map(str::trim).filter(|v| !v.is_empty())?;
            match normalizer.normalize(value, kind) {
                Some(parsed) => {
                    currency = currency.or(parsed.currency);
                    Some(parsed)
                }
                None => {
                    diagnostics.push(parse_failure(field, value).at(row.page_index, row.row_index));
                    None
                }
            }
        };

        let qty = amount("qty", &raw.qty, AmountKind::Quantity).map(|a| a.value);
        let net_price = amount("net_price", &raw.net_price, AmountKind::UnitPrice);
        let total_price = amount("total_price", &raw.total_price, AmountKind::TotalPrice);

        // Prices as the vendor systems print them, symbol included
        let mut attributes = raw.attributes;
        let printed = [
            ("net_price_formatted", &net_price),
            ("total_price_formatted", &total_price),
        ];
        for (name, price) in printed {
            if let Some(price) = price {
                attributes.entry(name.to_string()).or_insert_with(|| price.formatted());
            }
        }

        let req_date = match raw.req_date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(text) => {
                let parsed: Option<NaiveDate> = parse_date(text, self.adapter.date_order());
                if parsed.is_none() {
                    diagnostics.push(parse_failure("req_date", text).at(row.page_index, row.row_index));
                }
                parsed.or(stitched.schedule_date)
            }
            None => stitched.schedule_date,
        };

        NormalizedFields {
            po: raw.po,
            line: raw.line,
            pn: raw.pn,
            fallback_key: raw.fallback_key,
            description: raw.description.unwrap_or_default(),
            qty,
            net_price: net_price.map(|a| a.value),
            total_price: total_price.map(|a| a.value),
            req_date,
            currency,
            attributes,
            raw: row.raw.clone(),
        }
    }

    /// Fingerprints of every data row, in document order.
    pub fn fingerprints(&self, page_texts: &[String]) -> Vec<RowFingerprint> {
        let pages = self.tokenize(page_texts);
        let classified = ElementClassifier::new(self.adapter.as_ref()).classify(&pages);
        classified
            .elements
            .into_iter()
            .filter_map(|element| match element {
                ClassifiedElement::DataRow(row) => Some(RowFingerprint {
                    page_index: row.page_index,
                    row_index: row.row_index,
                    fingerprint: row_fingerprint(self.vendor(), &row.raw),
                    raw: row.raw,
                }),
                _ => None,
            })
            .collect()
    }
}

fn parse_failure(field: &str, value: &str) -> Diagnostic {
    warn!("Could not parse {} from '{}'", field, value);
    Diagnostic::warning(ExtractionError::NumericParseFailure {
        field: field.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Correction;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    const WF_PAGE_1: &str = "Purchase Order 4500010647\n\
        Created on: Sep 1, 2025\n\
        Contact Person: Jane Doe\n\
        Item   ID   Description   Quantity   Price   Value\n\
        10   1234-5678-9012   Bracket, steel   480 PC   $0.033   $15.84\n\
        Schedule Lines:\n\
        480 PC   Oct 7, 2025\n\
        20      Cover plate   5 PC   $12.00 per 5   $12.00\n\
        Page: 1 of 2\n";

    const WF_PAGE_2: &str = "Purchase Order 4500010647\n\
        Item   ID   Description   Quantity   Price   Value\n\
        Schedule Lines:\n\
        5 PC   Nov 3, 2025\n\
        30   1234-5678-9014   Spacer   480 PC   $0.030   $15.84\n\
        Page: 2 of 2\n";

    #[test]
    fn test_wefabricate_document() {
        let result = OrderParser::new(Vendor::Wefabricate).parse_pages(&pages(&[WF_PAGE_1, WF_PAGE_2]));

        assert_eq!(result.page_count, 2);
        assert_eq!(result.success_count(), 2);
        assert_eq!(result.error_count(), 1);

        let first = &result.records[0];
        assert_eq!(first.po_line, "4500010647/10");
        assert_eq!(first.pn.as_deref(), Some("1234-5678-9012"));
        assert_eq!(first.qty, Some(dec("480")));
        assert_eq!(first.net_price, Some(dec("0.033")));
        assert_eq!(first.req_date, NaiveDate::from_ymd_opt(2025, 10, 7));
        assert_eq!(first.purchaser.as_deref(), Some("Jane Doe"));
        assert_eq!(first.attributes.get("currency").map(String::as_str), Some("USD"));
        assert_eq!(
            first.attributes.get("net_price_formatted").map(String::as_str),
            Some("$0.033")
        );
        assert_eq!(
            first.attributes.get("total_price_formatted").map(String::as_str),
            Some("$15.84")
        );

        // Marker at the top of page 2 applies to the last item of page 1
        let second = &result.records[1];
        assert_eq!(second.po_line, "4500010647/20");
        assert_eq!(second.net_price, Some(dec("2.4")));
        assert_eq!(second.req_date, NaiveDate::from_ymd_opt(2025, 11, 3));

        // 480 * 0.030 != 15.84
        assert!(matches!(
            result.diagnostics.iter().find(|d| d.is_error()).map(|d| &d.error),
            Some(ExtractionError::ValidationMismatch { .. })
        ));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let parser = OrderParser::new(Vendor::Wefabricate);
        let input = pages(&[WF_PAGE_1, WF_PAGE_2]);
        let a = serde_json::to_string(&parser.parse_pages(&input).records).unwrap();
        let b = serde_json::to_string(&parser.parse_pages(&input).records).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_document() {
        let result = OrderParser::new(Vendor::Centurion).parse_pages(&pages(&["", "  \n"]));
        assert!(result.records.is_empty());
        assert_eq!(result.success_count(), 0);
        assert_eq!(result.error_count(), 0);
        assert_eq!(result.warning_count(), 1);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["diagnostics"][0]["severity"], "warning");
        assert_eq!(json["diagnostics"][0]["error"]["kind"], "malformed_document");
        assert_eq!(json["diagnostics"][0]["error"]["reason"], "no extractable text");
    }

    #[test]
    fn test_max_pages() {
        let result = OrderParser::new(Vendor::Wefabricate)
            .with_max_pages(1)
            .parse_pages(&pages(&[WF_PAGE_1, WF_PAGE_2]));
        assert_eq!(result.page_count, 1);
        assert_eq!(result.success_count(), 2);
        // No marker follows item 20 within the pages read
        assert_eq!(result.records[1].req_date, None);
    }

    #[test]
    fn test_unparsable_amount_is_warning() {
        let page = "Purchase Order 4500010647\n\
            Item   ID   Description   Quantity   Price   Value\n\
            10   1234-5678-9012   Bracket   lots   $1.00   n/a\n";
        let result = OrderParser::new(Vendor::Wefabricate).parse_pages(&pages(&[page]));
        assert_eq!(result.success_count(), 1);
        assert_eq!(result.records[0].qty, None);
        assert_eq!(result.warning_count(), 2);
        assert_eq!(result.error_count(), 0);
    }

    #[test]
    fn test_correction_applied() {
        let centurion = "Purchase Order PO-81234\n\
            Date: 15/09/2025\n\
            Line Item number Description Date Quantity Unit Price Disc Disc Total\n\
            1 510-000-054 ARMIS CLIPS 11/10/2025 5,000.00 Each 0.10 0.00 0.00 550.00\n";
        let parser = OrderParser::new(Vendor::Centurion);
        let input = pages(&[centurion]);

        let before = parser.parse_pages(&input);
        assert_eq!(before.success_count(), 0);
        assert_eq!(before.error_count(), 1);

        let fingerprints = parser.fingerprints(&input);
        assert_eq!(fingerprints.len(), 1);

        let corrections = CorrectionTable::new(vec![Correction {
            vendor: Vendor::Centurion,
            fingerprint: fingerprints[0].fingerprint.clone(),
            note: "price misprinted".to_string(),
            fields: BTreeMap::from([("net_price".to_string(), "0.11".to_string())]),
        }]);
        let after = OrderParser::new(Vendor::Centurion)
            .with_corrections(corrections)
            .parse_pages(&input);
        assert_eq!(after.success_count(), 1);
        assert_eq!(after.error_count(), 0);
        assert_eq!(after.records[0].po_line, "81234/1");
        assert_eq!(after.records[0].net_price, Some(dec("0.11")));
        assert_eq!(after.records[0].req_date, NaiveDate::from_ymd_opt(2025, 10, 11));
    }
}
