//! Row models and DTOs, one module per table.

pub mod audit_event;
pub mod contact_method;
pub mod outgoing_message;
pub mod verification_code;
