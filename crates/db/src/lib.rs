//! Persistence layer for the Beacon notification core.
//!
//! Row models live in [`models`]; query access goes through the zero-sized
//! repository structs in [`repositories`]. The notification store owns the
//! `outgoing_messages` and `user_verification_codes` tables; the
//! `user_contact_methods` table is shared with the rest of the system and
//! is only read here, apart from advancing `last_test_verify_at`.

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Cheap connectivity probe for readiness checks.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
