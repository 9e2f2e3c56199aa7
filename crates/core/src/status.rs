//! Provider status tokens and the public lifecycle projection.
//!
//! `last_status` is a text column on the wire but a closed set in
//! behavior. [`LastStatus`] is the tagged internal form; conversion to and
//! from the column value happens here and nowhere else.

use serde::Serialize;

use crate::error::CoreError;

/// Low-level provider status token for an outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastStatus {
    QueuedRemotely,
    Sending,
    Pending,
    Sent,
    Delivered,
    Failed,
    /// Superseded by a newer message; will never be sent or retried.
    Bundled,
}

impl LastStatus {
    pub const ALL: [LastStatus; 7] = [
        LastStatus::QueuedRemotely,
        LastStatus::Sending,
        LastStatus::Pending,
        LastStatus::Sent,
        LastStatus::Delivered,
        LastStatus::Failed,
        LastStatus::Bundled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LastStatus::QueuedRemotely => "queued_remotely",
            LastStatus::Sending => "sending",
            LastStatus::Pending => "pending",
            LastStatus::Sent => "sent",
            LastStatus::Delivered => "delivered",
            LastStatus::Failed => "failed",
            LastStatus::Bundled => "bundled",
        }
    }

    /// Parse a column value. Tokens outside the known set fail with
    /// [`CoreError::UnknownStatus`].
    pub fn from_db(value: &str) -> Result<Self, CoreError> {
        match value {
            "queued_remotely" => Ok(LastStatus::QueuedRemotely),
            "sending" => Ok(LastStatus::Sending),
            "pending" => Ok(LastStatus::Pending),
            "sent" => Ok(LastStatus::Sent),
            "delivered" => Ok(LastStatus::Delivered),
            "failed" => Ok(LastStatus::Failed),
            "bundled" => Ok(LastStatus::Bundled),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

/// Public delivery lifecycle of an outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageState {
    Pending,
    Sending,
    Sent,
    Delivered,
    /// Failed, but a retry is scheduled.
    FailedTemp,
    /// Failed with no retry scheduled.
    FailedPerm,
}

/// Project a provider-level status onto the public lifecycle.
///
/// A bundled message was replaced and will not be sent; it is classified
/// as a failure so callers take the same recovery paths, with the
/// retry-scheduled flag still separating transient from permanent.
pub fn message_state_from_status(
    last_status: &str,
    has_next_retry: bool,
) -> Result<MessageState, CoreError> {
    let state = match LastStatus::from_db(last_status)? {
        LastStatus::QueuedRemotely | LastStatus::Sending => MessageState::Sending,
        LastStatus::Pending => MessageState::Pending,
        LastStatus::Sent => MessageState::Sent,
        LastStatus::Delivered => MessageState::Delivered,
        LastStatus::Failed | LastStatus::Bundled => {
            if has_next_retry {
                MessageState::FailedTemp
            } else {
                MessageState::FailedPerm
            }
        }
    };
    Ok(state)
}
