//! Mandatory-field and arithmetic checks.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::ExtractionError;
use crate::models::Currency;

/// Field values after numeric and date normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedFields {
    pub po: Option<String>,
    /// Line number text with leading zeros stripped.
    pub line: Option<String>,
    pub pn: Option<String>,
    pub fallback_key: Option<String>,
    pub description: String,
    pub qty: Option<Decimal>,
    pub net_price: Option<Decimal>,
    pub total_price: Option<Decimal>,
    pub req_date: Option<NaiveDate>,
    pub currency: Option<Currency>,
    pub attributes: BTreeMap<String, String>,
    /// Source text, for diagnostics.
    pub raw: String,
}

/// Checks a field map before it becomes a record.
#[derive(Debug, Clone, Copy)]
pub struct RecordValidator {
    tolerance: Decimal,
}

impl RecordValidator {
    pub fn new(tolerance: Decimal) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> Decimal {
        self.tolerance
    }

    /// Identity fields first, then `qty * net_price` against `total_price`
    /// when all three are known.
    pub fn validate(&self, fields: &NormalizedFields) -> Result<(), ExtractionError> {
        if is_blank(&fields.po) {
            return Err(ExtractionError::UnrecognizedRow {
                reason: "missing purchase-order number".to_string(),
                raw: fields.raw.clone(),
            });
        }
        if is_blank(&fields.line) && is_blank(&fields.fallback_key) {
            return Err(ExtractionError::UnrecognizedRow {
                reason: "missing line number and fallback key".to_string(),
                raw: fields.raw.clone(),
            });
        }

        if let (Some(qty), Some(net_price), Some(total_price)) =
            (fields.qty, fields.net_price, fields.total_price)
        {
            let difference = qty
                .checked_mul(net_price)
                .and_then(|product| product.checked_sub(total_price))
                .map(|d| d.abs())
                .unwrap_or(Decimal::MAX);
            if difference > self.tolerance {
                return Err(ExtractionError::ValidationMismatch {
                    qty,
                    net_price,
                    total_price,
                    difference,
                });
            }
        }

        Ok(())
    }
}

impl Default for RecordValidator {
    fn default() -> Self {
        // 0.02 currency units
        Self::new(Decimal::new(2, 2))
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).is_none_or(str::is_empty)
}
