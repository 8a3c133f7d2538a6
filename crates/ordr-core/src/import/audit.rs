//! Audit trail of store writes.

use serde::Serialize;
use tracing::info;

use crate::error::AuditError;
use crate::models::{Destination, PurchaseOrderLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Insert,
    Update,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "insert",
            Operation::Update => "update",
        }
    }
}

/// Fire-and-forget record of who wrote what.
pub trait AuditLog: Send + Sync {
    fn log(
        &self,
        user: &str,
        table: Destination,
        operation: Operation,
        record: &PurchaseOrderLine,
    ) -> Result<(), AuditError>;
}

/// Audit entries as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAudit;

impl AuditLog for TracingAudit {
    fn log(
        &self,
        user: &str,
        table: Destination,
        operation: Operation,
        record: &PurchaseOrderLine,
    ) -> Result<(), AuditError> {
        let data = serde_json::to_string(record).map_err(|e| AuditError::Backend(e.to_string()))?;
        info!(
            user,
            table = table.table(),
            operation = operation.as_str(),
            po_line = %record.po_line,
            "audit {}",
            data
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_audit_never_fails() {
        let record = PurchaseOrderLine {
            po: "1".to_string(),
            po_line: "1/1".to_string(),
            ..Default::default()
        };
        assert!(TracingAudit
            .log("pdf_importer", Destination::NonWfOpen, Operation::Update, &record)
            .is_ok());
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(Operation::Insert.as_str(), "insert");
        assert_eq!(serde_json::to_string(&Operation::Update).unwrap(), "\"update\"");
    }
}
