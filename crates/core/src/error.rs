use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Validation or business-rule failure attributable to a specific input
    /// field. Field names are stable identifiers consumed by UIs.
    #[error("{field}: {message}")]
    Field {
        field: &'static str,
        message: String,
    },

    #[error("Permission denied: {0}")]
    PermissionDenied(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("unknown last_status {0}")]
    UnknownStatus(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::Field`] with an owned message.
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        CoreError::Field {
            field,
            message: message.into(),
        }
    }
}
