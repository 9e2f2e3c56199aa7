//! Verification code row model.

use beacon_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `user_verification_codes` table. At most one exists per
/// contact method.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VerificationCode {
    pub id: DbId,
    pub contact_method_id: DbId,
    pub code: i32,
    pub expires_at: Timestamp,
    /// Set by the dispatcher once the code has been handed to a carrier.
    pub sent: bool,
}
