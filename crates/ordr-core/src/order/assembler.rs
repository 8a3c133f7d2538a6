//! Builds the final [`PurchaseOrderLine`] from validated fields.

use crate::models::{DocumentContext, PurchaseOrderLine};

use super::rules::{collapse_whitespace, strip_leading_zeros};
use super::validator::NormalizedFields;

#[derive(Debug, Clone, Copy, Default)]
pub struct RecordAssembler;

impl RecordAssembler {
    pub fn new() -> Self {
        Self
    }

    /// `po_line` is `"{po}/{line}"` with leading zeros stripped from the
    /// line, or the fallback key without a line.
    /// Document-level fields come from `context`.
    pub fn assemble(&self, fields: NormalizedFields, context: &DocumentContext) -> PurchaseOrderLine {
        let po = fields.po.unwrap_or_default().trim().to_string();
        let line_key = fields
            .line
            .map(|l| strip_leading_zeros(&l))
            .filter(|l| !l.is_empty());

        let po_line = match (&line_key, &fields.fallback_key) {
            (Some(line), _) => format!("{}/{}", po, line),
            (None, Some(fallback)) => fallback.trim().to_string(),
            (None, None) => po.clone(),
        };

        let mut attributes = fields.attributes;
        if let Some(currency) = fields.currency.or(context.currency) {
            attributes
                .entry("currency".to_string())
                .or_insert_with(|| currency.code().to_string());
        }

        PurchaseOrderLine {
            po,
            line: line_key.as_deref().and_then(|l| l.parse().ok()),
            pn: fields.pn.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
            po_line,
            description: collapse_whitespace(&fields.description),
            qty: fields.qty,
            net_price: fields.net_price,
            total_price: fields.total_price,
            req_date: fields.req_date,
            po_placed_date: context.po_placed_date,
            purchaser: context.purchaser.clone(),
            attributes,
        }
    }
}
