//! Repository for the shared `user_contact_methods` table.
//!
//! The notification core does not own this table: it reads ownership and
//! the disabled flag, and advances `last_test_verify_at` as the send rate
//! gate. All other mutations belong to the contact-method subsystem.

use beacon_core::types::DbId;
use sqlx::PgPool;

use crate::models::contact_method::ContactMethod;

/// Read and rate-gate operations on contact methods.
pub struct ContactMethodRepo;

impl ContactMethodRepo {
    /// The owning user of a contact method, or `None` if the id is
    /// unknown.
    pub async fn owner_id(pool: &PgPool, id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT user_id FROM user_contact_methods WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether the contact method is disabled. Runs inside the caller's
    /// transaction so the flag is read under the send lock.
    pub async fn is_disabled(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT disabled FROM user_contact_methods WHERE id = $1")
            .bind(id)
            .fetch_one(&mut **tx)
            .await
    }

    /// Conditionally advance `last_test_verify_at` to now.
    ///
    /// The update only lands when the previous send is at least
    /// `min_interval_secs` old (or there was none); the returned row count
    /// is the rate-limit verdict — 1 means this caller won the window.
    pub async fn advance_last_test_verify(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        min_interval_secs: f64,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_contact_methods \
             SET last_test_verify_at = now() \
             WHERE id = $1 \
               AND (last_test_verify_at IS NULL \
                    OR last_test_verify_at + make_interval(secs => $2) < now())",
        )
        .bind(id)
        .bind(min_interval_secs)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    /// Fetch a full contact method row.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ContactMethod>, sqlx::Error> {
        sqlx::query_as::<_, ContactMethod>(
            "SELECT id, user_id, disabled, last_test_verify_at \
             FROM user_contact_methods WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
