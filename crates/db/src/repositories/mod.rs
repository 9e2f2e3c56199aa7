//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument, or a `&mut Transaction`
//! for steps that must run inside a caller-owned transaction.

pub mod audit_repo;
pub mod contact_method_repo;
pub mod message_repo;
pub mod verification_code_repo;

pub use audit_repo::AuditRepo;
pub use contact_method_repo::ContactMethodRepo;
pub use message_repo::MessageRepo;
pub use verification_code_repo::VerificationCodeRepo;
