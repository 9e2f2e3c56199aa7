//! Repository for the `user_verification_codes` table.

use beacon_core::types::DbId;
use beacon_core::verification::CODE_TTL;
use sqlx::PgPool;

use crate::models::verification_code::VerificationCode;

/// Column list for `user_verification_codes` queries.
const COLUMNS: &str = "id, contact_method_id, code, expires_at, sent";

/// Verification code persistence.
pub struct VerificationCodeRepo;

impl VerificationCodeRepo {
    /// Issue or re-issue a verification code for a contact method.
    ///
    /// A method already holding a code keeps it: only `sent` is reset and
    /// `expires_at` refreshed, so a code delivered moments ago stays
    /// valid. The generated `id` and `code` take effect on fresh insert
    /// only.
    pub async fn upsert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        contact_method_id: DbId,
        code: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_verification_codes (id, contact_method_id, code, expires_at) \
             VALUES ($1, $2, $3, now() + make_interval(secs => $4)) \
             ON CONFLICT (contact_method_id) DO UPDATE \
             SET sent = false, expires_at = EXCLUDED.expires_at",
        )
        .bind(id)
        .bind(contact_method_id)
        .bind(code)
        .bind(CODE_TTL.as_secs_f64())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Atomically consume a matching, unexpired code and re-enable the
    /// contact method. Returns the number of contact methods enabled
    /// (0 when the code is wrong, expired, or absent). Runs inside the
    /// caller's transaction so the enablement commits together with its
    /// audit record.
    pub async fn verify_and_enable(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        contact_method_id: DbId,
        code: i32,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "WITH v AS ( \
                 DELETE FROM user_verification_codes \
                 WHERE contact_method_id = $1 AND code = $2 AND expires_at > now() \
                 RETURNING contact_method_id AS id \
             ) \
             UPDATE user_contact_methods cm \
             SET disabled = false \
             FROM v \
             WHERE cm.id = v.id",
        )
        .bind(contact_method_id)
        .bind(code)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    /// Look up the code value by verification-code id. Used by the
    /// dispatcher to know what to send.
    pub async fn code(pool: &PgPool, id: DbId) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar("SELECT code FROM user_verification_codes WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The active code row for a contact method, if any.
    pub async fn find_for_contact_method(
        pool: &PgPool,
        contact_method_id: DbId,
    ) -> Result<Option<VerificationCode>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM user_verification_codes WHERE contact_method_id = $1");
        sqlx::query_as::<_, VerificationCode>(&query)
            .bind(contact_method_id)
            .fetch_optional(pool)
            .await
    }
}
