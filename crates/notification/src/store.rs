//! The durable outgoing-message store and its user-facing operations.

use std::sync::{Mutex, PoisonError};

use beacon_core::audit::actions;
use beacon_core::error::CoreError;
use beacon_core::message::{Dest, MessageType, SendResult};
use beacon_core::permission::AuthContext;
use beacon_core::types::{AlertId, DbId, Timestamp};
use beacon_core::validate;
use beacon_core::verification::{self, MIN_TIME_BETWEEN_TESTS};
use beacon_db::models::outgoing_message::InsertOutgoingMessage;
use beacon_db::repositories::{AuditRepo, ContactMethodRepo, MessageRepo, VerificationCodeRepo};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use sqlx::PgPool;

use crate::error::{classify_insert_error, StoreError, StoreResult};

/// Maximum number of ids accepted by [`NotificationStore::find_many_message_statuses`].
pub const MAX_STATUS_RESULTS: usize = 50;

/// Public surface of the notification subsystem.
///
/// Holds the connection pool and the process-wide code generator. All
/// state lives in the relational store; the struct itself is cheap to
/// share behind an `Arc`.
pub struct NotificationStore {
    pool: PgPool,
    /// Non-cryptographic generator seeded from OS entropy at
    /// construction. Guarded because `SmallRng` is not thread-safe; the
    /// lock is never held across an await point.
    rng: Mutex<SmallRng>,
}

impl NotificationStore {
    pub fn new(pool: PgPool) -> Self {
        NotificationStore {
            pool,
            rng: Mutex::new(SmallRng::from_os_rng()),
        }
    }

    /// Resolve a contact-method id string to its UUID, enforcing that the
    /// caller is the owning user or an admin.
    async fn authorized_contact_method(
        &self,
        ctx: &AuthContext,
        cm_id: &str,
    ) -> StoreResult<DbId> {
        ctx.require_user()?;
        let id = validate::uuid("ContactMethodID", cm_id)?;

        let owner = ContactMethodRepo::owner_id(&self.pool, id)
            .await?
            .ok_or_else(|| CoreError::field("ContactMethodID", "does not exist"))?;

        ctx.require_self_or_admin(owner)?;
        Ok(id)
    }

    /// Send a test notification to a contact method.
    ///
    /// Runs in a single transaction: lock both messaging tables (order is
    /// load-bearing, see [`MessageRepo::lock_for_send`]), check the
    /// disabled flag, win the rate-limit window, insert the
    /// `test_notification` row. Any failure rolls the whole thing back.
    pub async fn send_contact_method_test(
        &self,
        ctx: &AuthContext,
        cm_id: &str,
    ) -> StoreResult<()> {
        let id = self.authorized_contact_method(ctx, cm_id).await?;

        let mut tx = self.pool.begin().await?;

        MessageRepo::lock_for_send(&mut tx).await?;

        if ContactMethodRepo::is_disabled(&mut tx, id).await? {
            return Err(CoreError::field("ContactMethod", "contact method disabled").into());
        }

        let rows = ContactMethodRepo::advance_last_test_verify(
            &mut tx,
            id,
            MIN_TIME_BETWEEN_TESTS.as_secs_f64(),
        )
        .await?;
        if rows != 1 {
            return Err(
                CoreError::field("ContactMethod", "test message rate-limit exceeded").into(),
            );
        }

        MessageRepo::insert_test_notification(&mut tx, DbId::new_v4(), id).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Issue (or re-issue) a verification code for a contact method.
    ///
    /// The conditional `last_test_verify_at` update doubles as the rate
    /// gate; losing it aborts the transaction before any code is written.
    /// The dispatcher later observes the unsent code row and enqueues the
    /// actual message.
    pub async fn send_contact_method_verification(
        &self,
        ctx: &AuthContext,
        cm_id: &str,
    ) -> StoreResult<()> {
        let id = self.authorized_contact_method(ctx, cm_id).await?;

        let mut tx = self.pool.begin().await?;

        let rows = ContactMethodRepo::advance_last_test_verify(
            &mut tx,
            id,
            MIN_TIME_BETWEEN_TESTS.as_secs_f64(),
        )
        .await?;
        if rows != 1 {
            let minutes = MIN_TIME_BETWEEN_TESTS.as_secs() / 60;
            return Err(CoreError::field(
                "ContactMethod",
                format!("Too many messages! Please try again in {minutes} minute(s)"),
            )
            .into());
        }

        let code = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            verification::random_code(&mut *rng)
        };
        VerificationCodeRepo::upsert(&mut tx, DbId::new_v4(), id, code).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Verify a contact method with a previously issued code.
    ///
    /// Consuming the code and enabling the method happen in one atomic
    /// statement; expired codes are rejected there. The durable audit
    /// record — enabling a destination is a consent record — commits in
    /// the same transaction, so a method is never enabled without its
    /// journal entry.
    pub async fn verify_contact_method(
        &self,
        ctx: &AuthContext,
        cm_id: &str,
        code: i32,
    ) -> StoreResult<()> {
        let id = self.authorized_contact_method(ctx, cm_id).await?;

        let mut tx = self.pool.begin().await?;

        let rows = VerificationCodeRepo::verify_and_enable(&mut tx, id, code).await?;
        if rows != 1 {
            return Err(CoreError::field("code", "invalid code").into());
        }

        AuditRepo::append(
            &mut tx,
            id,
            actions::CONTACT_METHOD_VERIFIED,
            "contact method enabled after code verification",
        )
        .await?;

        tx.commit().await?;
        tracing::info!(contact_method_id = %id, "contact method enabled and verified");

        Ok(())
    }

    /// Look up the code value for a verification-code id. Dispatcher
    /// only.
    pub async fn code(&self, ctx: &AuthContext, id: &str) -> StoreResult<i32> {
        ctx.require_system()?;
        let id = validate::uuid("VerificationCodeID", id)?;

        VerificationCodeRepo::code(&self.pool, id)
            .await?
            .ok_or_else(|| {
                StoreError::Core(CoreError::NotFound {
                    entity: "VerificationCode",
                    id,
                })
            })
    }

    /// Fetch delivery statuses for a batch of message ids.
    ///
    /// Missing ids are silently omitted; order is unspecified. An empty
    /// input yields an empty result without touching the database.
    pub async fn find_many_message_statuses(
        &self,
        ctx: &AuthContext,
        ids: &[String],
    ) -> StoreResult<Vec<SendResult>> {
        ctx.require_user()?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = validate::many_uuid("IDs", ids, MAX_STATUS_RESULTS)?;

        let rows = MessageRepo::find_statuses(&self.pool, &ids).await?;
        rows.into_iter()
            .map(|row| SendResult::try_from(row).map_err(StoreError::from))
            .collect()
    }

    /// The most recent message of `message_type` for a contact method
    /// created at or after `since`, together with its creation time.
    pub async fn last_message_status(
        &self,
        ctx: &AuthContext,
        message_type: MessageType,
        cm_id: &str,
        since: Timestamp,
    ) -> StoreResult<Option<(SendResult, Timestamp)>> {
        ctx.require_user()?;
        let id = validate::uuid("ContactMethodID", cm_id)?;

        let Some(row) =
            MessageRepo::last_status(&self.pool, message_type.as_str(), id, since).await?
        else {
            return Ok(None);
        };

        let created_at = row.created_at;
        Ok(Some((SendResult::try_from(row)?, created_at)))
    }

    /// The status of the first alert notification sent to `dest` for the
    /// given alert. System only.
    pub async fn original_message_status(
        &self,
        ctx: &AuthContext,
        alert_id: AlertId,
        dest: &Dest,
    ) -> StoreResult<Option<SendResult>> {
        ctx.require_system()?;
        let id = validate::uuid("Dest.ID", dest.id())?;

        let (cm_id, channel_id) = if dest.is_contact_method() {
            (Some(id), None)
        } else {
            (None, Some(id))
        };

        let Some(row) =
            MessageRepo::original_alert_message(&self.pool, alert_id, cm_id, channel_id).await?
        else {
            return Ok(None);
        };

        Ok(Some(SendResult::try_from(row)?))
    }

    /// Insert a new outgoing message on behalf of the alert engine.
    ///
    /// The id is caller-supplied; inserting an id that already exists
    /// fails with [`CoreError::Conflict`] so retries stay idempotent.
    pub async fn insert_outgoing(
        &self,
        ctx: &AuthContext,
        input: &InsertOutgoingMessage,
    ) -> StoreResult<()> {
        ctx.require_system()?;

        match (input.contact_method_id, input.channel_id) {
            (Some(_), None) | (None, Some(_)) => {}
            _ => {
                return Err(
                    CoreError::field("Dest.ID", "exactly one destination must be set").into(),
                )
            }
        }

        let is_alert = input.message_type == MessageType::AlertNotification;
        if is_alert != input.alert_id.is_some() {
            return Err(CoreError::field(
                "AlertID",
                "required for alert notifications and forbidden otherwise",
            )
            .into());
        }

        MessageRepo::insert(&self.pool, input)
            .await
            .map_err(|e| classify_insert_error(e, format!("message {} already exists", input.id)))
    }
}
