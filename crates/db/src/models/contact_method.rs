//! Contact method row model.
//!
//! The table is owned by the contact-method subsystem; only the columns
//! the notification core reads are modeled here.

use beacon_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `user_contact_methods` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContactMethod {
    pub id: DbId,
    pub user_id: DbId,
    pub disabled: bool,
    pub last_test_verify_at: Option<Timestamp>,
}
