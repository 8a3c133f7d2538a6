//! Data models for purchase-order import.

pub mod config;
pub mod element;
pub mod order;

pub use config::{ConflictPolicy, ExtractionConfig, ImportConfig, OrdrConfig};
pub use element::{ClassifiedElement, DataRow, RawPageElement};
pub use order::{Currency, Destination, DocumentContext, PurchaseOrderLine, Vendor};
