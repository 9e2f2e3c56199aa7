//! Audit journal vocabulary and integrity hashing.
//!
//! Contact-method verification is a consent record: enabling a destination
//! means its owner proved control of it and agreed to receive messages.
//! Entries are append-only and hash-chained so tampering is detectable.

use sha2::{Digest, Sha256};

/// Known action types for audit events.
pub mod actions {
    /// A contact method was enabled after a successful verification.
    pub const CONTACT_METHOD_VERIFIED: &str = "contact_method_verified";
}

/// Seed value for the first entry in the hash chain.
const CHAIN_SEED: &str = "BEACON_AUDIT_CHAIN_SEED_V1";

/// Compute the SHA-256 integrity hash for an audit event.
///
/// `prev_hash` is the hash of the previous entry, or `None` for the first
/// entry in the chain. `entry_data` is the canonical string form of the
/// entry's content.
pub fn compute_integrity_hash(prev_hash: Option<&str>, entry_data: &str) -> String {
    let prev = prev_hash.unwrap_or(CHAIN_SEED);
    let digest = Sha256::digest(format!("{prev}|{entry_data}").as_bytes());
    format!("{digest:x}")
}
