//! Ingestion of provider status callbacks from carrier adapters.

use beacon_core::permission::AuthContext;
use beacon_core::status::LastStatus;
use beacon_core::types::{DbId, Timestamp};
use beacon_db::repositories::MessageRepo;
use sqlx::PgPool;

use crate::error::StoreResult;

/// A status report from a carrier adapter about one outgoing message.
#[derive(Debug, Clone)]
pub struct ProviderUpdate {
    pub message_id: DbId,
    /// Carrier-assigned sequence, monotonically increasing per message.
    pub sequence: i64,
    /// Raw status token as reported by the carrier.
    pub last_status: String,
    pub status_details: String,
    pub provider_message_id: Option<String>,
    pub next_retry_at: Option<Timestamp>,
}

/// Applies provider updates to the message store under the monotonic
/// sequence guard.
pub struct StatusIngress {
    pool: PgPool,
}

impl StatusIngress {
    pub fn new(pool: PgPool) -> Self {
        StatusIngress { pool }
    }

    /// Apply one provider update.
    ///
    /// An unknown status token fails with `UnknownStatus` and nothing is
    /// written. A stale or duplicate sequence is a silent no-op — the
    /// contract with adapters is that redelivery of the same `(id, seq)`
    /// is always safe.
    pub async fn apply(&self, ctx: &AuthContext, update: &ProviderUpdate) -> StoreResult<()> {
        ctx.require_system()?;

        let status = LastStatus::from_db(&update.last_status).inspect_err(|_| {
            tracing::error!(
                message_id = %update.message_id,
                last_status = %update.last_status,
                "provider reported an unknown status token",
            );
        })?;

        let rows = MessageRepo::apply_provider_update(
            &self.pool,
            update.message_id,
            update.sequence,
            status.as_str(),
            &update.status_details,
            update.provider_message_id.as_deref(),
            update.next_retry_at,
        )
        .await?;

        if rows == 0 {
            tracing::debug!(
                message_id = %update.message_id,
                sequence = update.sequence,
                "stale or unknown provider update dropped",
            );
        }

        Ok(())
    }
}
