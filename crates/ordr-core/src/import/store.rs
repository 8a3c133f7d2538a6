//! Destination storage for imported records.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::{Destination, PurchaseOrderLine};

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Storage collaborator of the import coordinator.
///
/// Implementations serialize writes per key; the coordinator only asks
/// whether a key exists before writing.
pub trait RecordStore: Send {
    /// True when `po_line` is already stored in `table`.
    fn key_exists(&self, table: Destination, po_line: &str) -> StoreResult<bool>;

    /// Insert or replace the record keyed by its `po_line`. Returns the
    /// number of rows changed; writing an identical record changes none.
    fn upsert(&mut self, table: Destination, record: &PurchaseOrderLine) -> StoreResult<usize>;
}

type Table = BTreeMap<String, Map<String, Value>>;

/// Ordered in-memory store of schema-filtered rows, saved as one JSON file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    tables: BTreeMap<String, Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store file; a missing file is an empty store.
    pub fn load(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            debug!("Store {} does not exist yet", path.display());
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        let tables: BTreeMap<String, Table> = serde_json::from_str(&content)?;
        info!(
            "Loaded store {} ({} rows)",
            path.display(),
            tables.values().map(BTreeMap::len).sum::<usize>()
        );
        Ok(Self { tables })
    }

    pub fn save(&self, path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&self.tables)?)?;
        debug!("Saved store {}", path.display());
        Ok(())
    }

    /// Stored row for `po_line`.
    pub fn get(&self, table: Destination, po_line: &str) -> Option<&Map<String, Value>> {
        self.tables.get(table.table())?.get(po_line)
    }

    /// Number of rows in `table`.
    pub fn len(&self, table: Destination) -> usize {
        self.tables.get(table.table()).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(BTreeMap::is_empty)
    }
}

impl RecordStore for MemoryStore {
    fn key_exists(&self, table: Destination, po_line: &str) -> StoreResult<bool> {
        Ok(self.get(table, po_line).is_some())
    }

    fn upsert(&mut self, table: Destination, record: &PurchaseOrderLine) -> StoreResult<usize> {
        if record.po_line.trim().is_empty() {
            return Err(StoreError::Backend("record has an empty po_line".to_string()));
        }
        let row = record.to_row(table);
        let rows = self.tables.entry(table.table().to_string()).or_default();
        if rows.get(&record.po_line) == Some(&row) {
            return Ok(0);
        }
        rows.insert(record.po_line.clone(), row);
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn record(po_line: &str, qty: i64) -> PurchaseOrderLine {
        PurchaseOrderLine {
            po: "4500010647".to_string(),
            line: Some(10),
            po_line: po_line.to_string(),
            description: "Bracket".to_string(),
            qty: Some(Decimal::from(qty)),
            ..Default::default()
        }
    }

    #[test]
    fn test_upsert_and_exists() {
        let mut store = MemoryStore::new();
        assert!(!store.key_exists(Destination::WfOpen, "4500010647/10").unwrap());

        assert_eq!(store.upsert(Destination::WfOpen, &record("4500010647/10", 480)).unwrap(), 1);
        assert!(store.key_exists(Destination::WfOpen, "4500010647/10").unwrap());
        assert!(!store.key_exists(Destination::NonWfOpen, "4500010647/10").unwrap());

        // Identical rewrite is a no-op
        assert_eq!(store.upsert(Destination::WfOpen, &record("4500010647/10", 480)).unwrap(), 0);
        assert_eq!(store.upsert(Destination::WfOpen, &record("4500010647/10", 500)).unwrap(), 1);
        assert_eq!(store.len(Destination::WfOpen), 1);
        assert_eq!(
            store.get(Destination::WfOpen, "4500010647/10").unwrap()["qty"],
            Value::from("500")
        );
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            store.upsert(Destination::WfOpen, &record(" ", 1)),
            Err(StoreError::Backend(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut store = MemoryStore::new();
        store.upsert(Destination::NonWfOpen, &record("81234/1", 5)).unwrap();
        store.save(&path).unwrap();

        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded, store);
        assert!(MemoryStore::load(&dir.path().join("missing.json")).unwrap().is_empty());
    }
}
