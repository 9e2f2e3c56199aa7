//! Error type for the notification store.

use beacon_core::error::CoreError;

/// Failures surfaced by store operations.
///
/// Domain failures (permission, validation, conflicts, unknown statuses)
/// arrive as [`CoreError`]; infrastructure failures are propagated
/// verbatim as [`StoreError::Database`]. Cancellation shows up as the
/// underlying sqlx error and leaves transactional side effects rolled
/// back.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// PostgreSQL SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// Classify an insert failure: a unique violation becomes a [`Conflict`]
/// with the given message, anything else passes through.
///
/// [`Conflict`]: CoreError::Conflict
pub(crate) fn classify_insert_error(err: sqlx::Error, conflict_msg: impl Into<String>) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::Core(CoreError::Conflict(conflict_msg.into()));
        }
    }
    StoreError::Database(err)
}
