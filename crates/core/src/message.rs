//! Outgoing-message vocabulary shared by the store and its callers.

use serde::{Deserialize, Serialize};

use crate::status::MessageState;
use crate::types::DbId;

/// The kind of an outgoing message.
///
/// Stored as text in the `message_type` column; [`MessageType::as_str`] is
/// the single conversion point to the database representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    AlertNotification,
    VerificationCode,
    TestNotification,
    StatusUpdate,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::AlertNotification => "alert_notification",
            MessageType::VerificationCode => "verification_code",
            MessageType::TestNotification => "test_notification",
            MessageType::StatusUpdate => "status_update",
        }
    }
}

/// A notification destination: either a user-owned contact method or a
/// shared channel, never both.
///
/// Carries the raw id string as received from the caller; validation to a
/// UUID happens at the store boundary so that malformed ids surface as
/// field errors rather than type errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dest {
    ContactMethod(String),
    Channel(String),
}

impl Dest {
    pub fn id(&self) -> &str {
        match self {
            Dest::ContactMethod(id) | Dest::Channel(id) => id,
        }
    }

    pub fn is_contact_method(&self) -> bool {
        matches!(self, Dest::ContactMethod(_))
    }
}

/// Public projection of an outgoing message's delivery status.
#[derive(Debug, Clone, Serialize)]
pub struct SendResult {
    pub id: DbId,
    pub state: MessageState,
    pub details: String,
    pub provider_message_id: Option<String>,
    /// Monotonic sequence number of the latest applied provider update.
    pub sequence: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_type_db_tokens() {
        assert_eq!(MessageType::AlertNotification.as_str(), "alert_notification");
        assert_eq!(MessageType::VerificationCode.as_str(), "verification_code");
        assert_eq!(MessageType::TestNotification.as_str(), "test_notification");
        assert_eq!(MessageType::StatusUpdate.as_str(), "status_update");
    }

    #[test]
    fn dest_exposes_raw_id() {
        let dest = Dest::ContactMethod("abc".into());
        assert_eq!(dest.id(), "abc");
        assert!(dest.is_contact_method());
        assert!(!Dest::Channel("abc".into()).is_contact_method());
    }
}
