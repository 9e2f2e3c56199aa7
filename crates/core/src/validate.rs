//! Input validation helpers.
//!
//! Ids arrive from callers as strings (the GraphQL and HTTP layers pass
//! them through opaquely). Failures surface as [`CoreError::Field`] with
//! the caller-facing field name so they short-circuit before any database
//! work.

use crate::error::CoreError;
use crate::types::DbId;

/// Parse a single UUID, attributing failure to `field`.
pub fn uuid(field: &'static str, value: &str) -> Result<DbId, CoreError> {
    value
        .parse()
        .map_err(|_| CoreError::field(field, "must be a valid UUID"))
}

/// Parse a list of UUIDs, enforcing a maximum count.
pub fn many_uuid(
    field: &'static str,
    values: &[String],
    max: usize,
) -> Result<Vec<DbId>, CoreError> {
    if values.len() > max {
        return Err(CoreError::field(
            field,
            format!("at most {max} may be provided"),
        ));
    }
    values.iter().map(|v| uuid(field, v)).collect()
}
