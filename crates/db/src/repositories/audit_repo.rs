//! Repository for the append-only `audit_events` journal.

use beacon_core::audit::compute_integrity_hash;
use beacon_core::types::DbId;
use sqlx::PgPool;

use crate::models::audit_event::AuditEvent;

/// Column list for `audit_events` queries.
const COLUMNS: &str = "id, contact_method_id, action, details, integrity_hash, created_at";

/// Append and read operations on the audit journal. Rows are never
/// updated or deleted.
pub struct AuditRepo;

impl AuditRepo {
    /// Append an event, chaining its integrity hash over the previous
    /// entry. Runs inside the caller's transaction so the record commits
    /// together with the state change it attests to.
    pub async fn append(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        contact_method_id: DbId,
        action: &str,
        details: &str,
    ) -> Result<AuditEvent, sqlx::Error> {
        let prev_hash: Option<String> = sqlx::query_scalar(
            "SELECT integrity_hash FROM audit_events ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&mut **tx)
        .await?;

        let entry_data = format!("{contact_method_id}|{action}|{details}");
        let hash = compute_integrity_hash(prev_hash.as_deref(), &entry_data);

        let query = format!(
            "INSERT INTO audit_events (contact_method_id, action, details, integrity_hash) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditEvent>(&query)
            .bind(contact_method_id)
            .bind(action)
            .bind(details)
            .bind(&hash)
            .fetch_one(&mut **tx)
            .await
    }

    /// All events for a contact method, oldest first.
    pub async fn list_for_contact_method(
        pool: &PgPool,
        contact_method_id: DbId,
    ) -> Result<Vec<AuditEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_events WHERE contact_method_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, AuditEvent>(&query)
            .bind(contact_method_id)
            .fetch_all(pool)
            .await
    }
}
