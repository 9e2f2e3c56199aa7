//! The Beacon notification subsystem.
//!
//! [`store::NotificationStore`] is the public surface for the message
//! queue, contact-method verification, and test sends;
//! [`ingress::StatusIngress`] ingests carrier status callbacks. Both
//! operate on the shared relational store — no per-user state is held in
//! memory, and every operation takes an explicit
//! [`beacon_core::permission::AuthContext`].

pub mod error;
pub mod ingress;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use ingress::{ProviderUpdate, StatusIngress};
pub use store::NotificationStore;
