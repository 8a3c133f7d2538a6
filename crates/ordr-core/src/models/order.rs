//! Purchase-order line records and the document-level values shared by them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::OrdrError;

/// Vendors with a modeled purchase-order layout.
///
/// Chosen explicitly by the caller for every document, never sniffed from
/// content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
    /// We Fabricate internal purchase orders (table layout, schedule lines).
    Wefabricate,
    /// Centurion purchase orders (text lines, inline delivery dates).
    Centurion,
    /// MAGIC FX purchase orders (European number format).
    #[serde(rename = "magicfx", alias = "magic_fx", alias = "magic-fx")]
    MagicFx,
}

impl Vendor {
    /// All modeled vendors.
    pub const ALL: [Vendor; 3] = [Vendor::Wefabricate, Vendor::Centurion, Vendor::MagicFx];

    /// Stable identifier used on the command line and in correction tables.
    pub fn id(&self) -> &'static str {
        match self {
            Vendor::Wefabricate => "wefabricate",
            Vendor::Centurion => "centurion",
            Vendor::MagicFx => "magicfx",
        }
    }

    /// Collection the vendor's records are imported into.
    pub fn destination(&self) -> Destination {
        match self {
            Vendor::Wefabricate => Destination::WfOpen,
            Vendor::Centurion | Vendor::MagicFx => Destination::NonWfOpen,
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Vendor {
    type Err = OrdrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wefabricate" | "we_fabricate" | "we-fabricate" | "wf" => Ok(Vendor::Wefabricate),
            "centurion" => Ok(Vendor::Centurion),
            "magicfx" | "magic_fx" | "magic-fx" | "magic fx" => Ok(Vendor::MagicFx),
            other => Err(OrdrError::UnknownVendor(other.to_string())),
        }
    }
}

/// Destination collection for imported records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    WfOpen,
    NonWfOpen,
}

const WF_OPEN_COLUMNS: &[&str] = &[
    "po",
    "pn",
    "line",
    "po_line",
    "description",
    "qty",
    "net_price",
    "total_price",
    "req_date_wf",
    "po_placed_date",
    "purchaser",
];

const NON_WF_OPEN_COLUMNS: &[&str] = &[
    "po",
    "pn",
    "line",
    "po_line",
    "description",
    "qty",
    "net_price",
    "total_price",
    "req_date",
    "eta_wfsz",
    "shipping_mode",
    "comment",
    "po_placed_date",
    "qc_result",
    "shipping_cost",
    "tracking_no",
    "so_number",
    "company",
];

impl Destination {
    /// Table name in the destination store.
    pub fn table(&self) -> &'static str {
        match self {
            Destination::WfOpen => "wf_open",
            Destination::NonWfOpen => "non_wf_open",
        }
    }

    /// Columns the destination accepts.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Destination::WfOpen => WF_OPEN_COLUMNS,
            Destination::NonWfOpen => NON_WF_OPEN_COLUMNS,
        }
    }

    /// Column holding the requirement date.
    pub fn req_date_column(&self) -> &'static str {
        match self {
            Destination::WfOpen => "req_date_wf",
            Destination::NonWfOpen => "req_date",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Currencies recognised in price cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "GBP")]
    Gbp,
}

impl Currency {
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Eur => "€",
            Currency::Usd => "$",
            Currency::Gbp => "£",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
        }
    }

    /// Parse a symbol or ISO code.
    pub fn from_marker(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "€" | "EUR" => Some(Currency::Eur),
            "$" | "USD" => Some(Currency::Usd),
            "£" | "GBP" => Some(Currency::Gbp),
            _ => None,
        }
    }
}

/// Document-level fields read once from the first page.
///
/// Immutable once built; the assembler copies these into every line of the
/// document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContext {
    /// Purchase-order number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub po: Option<String>,

    /// Date the order was placed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub po_placed_date: Option<NaiveDate>,

    /// Purchaser / contact person.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchaser: Option<String>,

    /// Document currency when the layout states one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
}

/// One normalized, validated purchase-order line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    /// Purchase-order number.
    pub po: String,

    /// Line sequence number.
    pub line: Option<u32>,

    /// Part number.
    pub pn: Option<String>,

    /// Unique key, `"{po}/{line}"` when both are known.
    pub po_line: String,

    pub description: String,

    pub qty: Option<Decimal>,

    /// Unit price (already divided by any "per N" pack size).
    pub net_price: Option<Decimal>,

    pub total_price: Option<Decimal>,

    /// Requirement / delivery date.
    pub req_date: Option<NaiveDate>,

    pub po_placed_date: Option<NaiveDate>,

    pub purchaser: Option<String>,

    /// Vendor-specific optional attributes (currency, unit, shipping mode...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl PurchaseOrderLine {
    /// Project the record onto a destination's columns.
    ///
    /// Null fields are omitted and attributes without a matching column are
    /// dropped.
    pub fn to_row(&self, destination: Destination) -> serde_json::Map<String, serde_json::Value> {
        use serde_json::Value;

        let mut candidates: Vec<(&str, Value)> = vec![
            ("po", Value::from(self.po.clone())),
            ("po_line", Value::from(self.po_line.clone())),
            ("description", Value::from(self.description.clone())),
        ];
        if let Some(pn) = &self.pn {
            candidates.push(("pn", Value::from(pn.clone())));
        }
        if let Some(line) = self.line {
            candidates.push(("line", Value::from(line)));
        }
        for (column, amount) in [
            ("qty", self.qty),
            ("net_price", self.net_price),
            ("total_price", self.total_price),
        ] {
            if let Some(amount) = amount {
                candidates.push((column, Value::from(amount.to_string())));
            }
        }
        if let Some(date) = self.req_date {
            candidates.push((destination.req_date_column(), Value::from(date.to_string())));
        }
        if let Some(date) = self.po_placed_date {
            candidates.push(("po_placed_date", Value::from(date.to_string())));
        }
        if let Some(purchaser) = &self.purchaser {
            candidates.push(("purchaser", Value::from(purchaser.clone())));
        }
        for (key, value) in &self.attributes {
            candidates.push((key.as_str(), Value::from(value.clone())));
        }

        let columns = destination.columns();
        let mut row = serde_json::Map::new();
        for (column, value) in candidates {
            if columns.contains(&column) && !row.contains_key(column) {
                row.insert(column.to_string(), value);
            }
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample_line() -> PurchaseOrderLine {
        PurchaseOrderLine {
            po: "4500010647".to_string(),
            line: Some(30),
            pn: Some("1234-5678-9012".to_string()),
            po_line: "4500010647/30".to_string(),
            description: "Bracket".to_string(),
            qty: Some(Decimal::from(480)),
            net_price: Some(Decimal::from_str("0.033").unwrap()),
            total_price: Some(Decimal::from_str("15.84").unwrap()),
            req_date: NaiveDate::from_ymd_opt(2025, 10, 7),
            po_placed_date: NaiveDate::from_ymd_opt(2025, 9, 1),
            purchaser: Some("Jane Doe".to_string()),
            attributes: BTreeMap::from([
                ("currency".to_string(), "EUR".to_string()),
                ("shipping_mode".to_string(), "sea".to_string()),
            ]),
        }
    }

    #[test]
    fn test_vendor_parsing() {
        assert_eq!(Vendor::from_str("Wefabricate").unwrap(), Vendor::Wefabricate);
        assert_eq!(Vendor::from_str("centurion").unwrap(), Vendor::Centurion);
        assert_eq!(Vendor::from_str("MAGIC-FX").unwrap(), Vendor::MagicFx);
        assert!(matches!(
            Vendor::from_str("acme"),
            Err(OrdrError::UnknownVendor(v)) if v == "acme"
        ));
    }

    #[test]
    fn test_vendor_destination() {
        assert_eq!(Vendor::Wefabricate.destination().table(), "wf_open");
        assert_eq!(Vendor::Centurion.destination().table(), "non_wf_open");
        assert_eq!(Vendor::MagicFx.destination().table(), "non_wf_open");
    }

    #[test]
    fn test_to_row_filters_by_destination() {
        let line = sample_line();

        let wf = line.to_row(Destination::WfOpen);
        assert_eq!(wf["req_date_wf"], "2025-10-07");
        assert_eq!(wf["purchaser"], "Jane Doe");
        assert!(!wf.contains_key("shipping_mode"));
        assert!(!wf.contains_key("currency"));

        let non_wf = line.to_row(Destination::NonWfOpen);
        assert_eq!(non_wf["req_date"], "2025-10-07");
        assert_eq!(non_wf["shipping_mode"], "sea");
        assert!(!non_wf.contains_key("purchaser"));
        assert_eq!(non_wf["qty"], "480");
        assert_eq!(non_wf["line"], 30);
    }

    #[test]
    fn test_to_row_omits_nulls() {
        let mut line = sample_line();
        line.pn = None;
        line.req_date = None;
        let row = line.to_row(Destination::WfOpen);
        assert!(!row.contains_key("pn"));
        assert!(!row.contains_key("req_date_wf"));
    }

    #[test]
    fn test_currency_markers() {
        assert_eq!(Currency::from_marker("€"), Some(Currency::Eur));
        assert_eq!(Currency::from_marker("usd"), Some(Currency::Usd));
        assert_eq!(Currency::from_marker("£"), Some(Currency::Gbp));
        assert_eq!(Currency::from_marker("PLN"), None);
    }
}
