//! Repository for the `outgoing_messages` table.

use beacon_core::types::{AlertId, DbId, Timestamp};
use sqlx::PgPool;

use crate::models::outgoing_message::{InsertOutgoingMessage, MessageStatusRow, OutgoingMessage};

/// Column list for full-row `outgoing_messages` queries.
const COLUMNS: &str = "\
    id, message_type, contact_method_id, channel_id, user_id, alert_id, \
    created_at, sent_at, next_retry_at, last_status, status_details, \
    provider_msg_id, provider_seq";

/// Column list for status projection queries.
const STATUS_COLUMNS: &str = "\
    id, last_status, status_details, provider_msg_id, provider_seq, \
    next_retry_at IS NOT NULL AS has_next_retry, created_at";

/// Provides queue and status operations for outgoing messages.
pub struct MessageRepo;

impl MessageRepo {
    /// Insert a new outgoing message. The row starts in status `pending`
    /// with sequence 0. A duplicate id fails with a unique violation the
    /// caller classifies.
    pub async fn insert(pool: &PgPool, input: &InsertOutgoingMessage) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO outgoing_messages \
                 (id, message_type, contact_method_id, channel_id, user_id, alert_id) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(input.id)
        .bind(input.message_type.as_str())
        .bind(input.contact_method_id)
        .bind(input.channel_id)
        .bind(input.user_id)
        .bind(input.alert_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Lock `outgoing_messages` then `user_contact_methods` in row
    /// exclusive mode.
    ///
    /// INVARIANT: every transaction touching both tables must take the
    /// locks in this order. The dispatcher uses the same order; changing
    /// it here reintroduces the deadlock this exists to prevent.
    pub async fn lock_for_send(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("LOCK outgoing_messages, user_contact_methods IN ROW EXCLUSIVE MODE")
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Insert a test notification for a contact method, denormalizing the
    /// owning user id from `user_contact_methods`.
    pub async fn insert_test_notification(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        contact_method_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO outgoing_messages (id, message_type, contact_method_id, user_id) \
             SELECT $1, 'test_notification', $2, cm.user_id \
             FROM user_contact_methods cm \
             WHERE cm.id = $2",
        )
        .bind(id)
        .bind(contact_method_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    /// Fetch status rows for a set of message ids. Missing ids are simply
    /// absent from the result; order is unspecified.
    pub async fn find_statuses(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<MessageStatusRow>, sqlx::Error> {
        let query = format!("SELECT {STATUS_COLUMNS} FROM outgoing_messages WHERE id = ANY($1)");
        sqlx::query_as::<_, MessageStatusRow>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// The most recent message of `message_type` for a contact method
    /// created at or after `since`. Recency is by `sent_at` where present,
    /// falling back to `created_at`.
    pub async fn last_status(
        pool: &PgPool,
        message_type: &str,
        contact_method_id: DbId,
        since: Timestamp,
    ) -> Result<Option<MessageStatusRow>, sqlx::Error> {
        let query = format!(
            "SELECT {STATUS_COLUMNS} FROM outgoing_messages \
             WHERE message_type = $1 AND contact_method_id = $2 AND created_at >= $3 \
             ORDER BY COALESCE(sent_at, created_at) DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, MessageStatusRow>(&query)
            .bind(message_type)
            .bind(contact_method_id)
            .bind(since)
            .fetch_optional(pool)
            .await
    }

    /// The earliest alert notification (by `sent_at`) for an alert and
    /// destination. Exactly one of `contact_method_id` / `channel_id` is
    /// provided.
    pub async fn original_alert_message(
        pool: &PgPool,
        alert_id: AlertId,
        contact_method_id: Option<DbId>,
        channel_id: Option<DbId>,
    ) -> Result<Option<MessageStatusRow>, sqlx::Error> {
        let query = format!(
            "SELECT {STATUS_COLUMNS} FROM outgoing_messages \
             WHERE message_type = 'alert_notification' \
               AND alert_id = $1 \
               AND (contact_method_id = $2 OR channel_id = $3) \
             ORDER BY sent_at \
             LIMIT 1"
        );
        sqlx::query_as::<_, MessageStatusRow>(&query)
            .bind(alert_id)
            .bind(contact_method_id)
            .bind(channel_id)
            .fetch_optional(pool)
            .await
    }

    /// Apply a provider status update guarded by the monotonic sequence.
    ///
    /// Returns the number of rows updated: 0 means the update was stale
    /// (`seq <= provider_seq`) or the id is unknown, and nothing changed.
    /// A row that already reached `delivered` keeps its status and retry
    /// schedule; only details and the sequence advance. `sent_at` is
    /// stamped on the first transition into `sent` or `delivered`.
    pub async fn apply_provider_update(
        pool: &PgPool,
        id: DbId,
        seq: i64,
        last_status: &str,
        status_details: &str,
        provider_msg_id: Option<&str>,
        next_retry_at: Option<Timestamp>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE outgoing_messages SET \
                 last_status = CASE WHEN last_status = 'delivered' THEN last_status ELSE $3 END, \
                 status_details = $4, \
                 provider_msg_id = CASE \
                     WHEN last_status = 'delivered' THEN provider_msg_id \
                     ELSE COALESCE($5, provider_msg_id) \
                 END, \
                 next_retry_at = CASE WHEN last_status = 'delivered' THEN next_retry_at ELSE $6 END, \
                 sent_at = CASE \
                     WHEN last_status <> 'delivered' AND $3 IN ('sent', 'delivered') \
                         THEN COALESCE(sent_at, now()) \
                     ELSE sent_at \
                 END, \
                 provider_seq = $2 \
             WHERE id = $1 AND provider_seq < $2",
        )
        .bind(id)
        .bind(seq)
        .bind(last_status)
        .bind(status_details)
        .bind(provider_msg_id)
        .bind(next_retry_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Fetch a full message row by id.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<OutgoingMessage>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM outgoing_messages WHERE id = $1");
        sqlx::query_as::<_, OutgoingMessage>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
