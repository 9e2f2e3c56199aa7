//! Outgoing message entity models and DTOs.

use beacon_core::error::CoreError;
use beacon_core::message::{MessageType, SendResult};
use beacon_core::status::message_state_from_status;
use beacon_core::types::{AlertId, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A full row from the `outgoing_messages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OutgoingMessage {
    pub id: DbId,
    pub message_type: String,
    pub contact_method_id: Option<DbId>,
    pub channel_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub alert_id: Option<AlertId>,
    pub created_at: Timestamp,
    pub sent_at: Option<Timestamp>,
    pub next_retry_at: Option<Timestamp>,
    pub last_status: String,
    pub status_details: String,
    pub provider_msg_id: Option<String>,
    pub provider_seq: i64,
}

/// DTO for inserting a new outgoing message. The id is client-supplied so
/// the engine can insert idempotently.
#[derive(Debug, Clone, Deserialize)]
pub struct InsertOutgoingMessage {
    pub id: DbId,
    pub message_type: MessageType,
    pub contact_method_id: Option<DbId>,
    pub channel_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub alert_id: Option<AlertId>,
}

/// Row shape returned by the status lookup queries: the columns needed to
/// project a [`SendResult`], plus `created_at` for recency bookkeeping.
#[derive(Debug, Clone, FromRow)]
pub struct MessageStatusRow {
    pub id: DbId,
    pub last_status: String,
    pub status_details: String,
    pub provider_msg_id: Option<String>,
    pub provider_seq: i64,
    pub has_next_retry: bool,
    pub created_at: Timestamp,
}

impl TryFrom<MessageStatusRow> for SendResult {
    type Error = CoreError;

    /// Project the raw row onto the public lifecycle. This is the only
    /// place a `last_status` column value leaves the database edge.
    fn try_from(row: MessageStatusRow) -> Result<Self, CoreError> {
        let state = message_state_from_status(&row.last_status, row.has_next_retry)?;
        Ok(SendResult {
            id: row.id,
            state,
            details: row.status_details,
            provider_message_id: row.provider_msg_id,
            sequence: row.provider_seq,
        })
    }
}
