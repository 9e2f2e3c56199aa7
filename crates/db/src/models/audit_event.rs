//! Audit journal row model.

use beacon_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the append-only `audit_events` journal.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditEvent {
    pub id: i64,
    pub contact_method_id: DbId,
    pub action: String,
    pub details: String,
    /// SHA-256 chained over the previous entry's hash and this entry's
    /// content.
    pub integrity_hash: String,
    pub created_at: Timestamp,
}
