//! # strand-types
//!
//! Data contracts shared by the Strand bootstrap crates: thread identifiers,
//! collection schemas, service credentials, wallet signatures and the names of
//! the subsystems the bootstrap brings up.

pub mod auth;
pub mod collection;
pub mod signature;
pub mod subsystem;
pub mod thread;

pub use auth::{KeyInfo, KeyType};
pub use collection::{CollectionSchema, IndexInfo, FILES_COLLECTION};
pub use signature::{PubKey, StdSignature};
pub use subsystem::Subsystem;
pub use thread::{ThreadId, ThreadInfo, ThreadVariant};

/// Keys under which the credential store keeps per-device state.
pub mod keys {
    /// Textual Ed25519 identity.
    pub const IDENTITY: &str = "user-private-identity";
    /// JSON wallet record `{address, signer}`.
    pub const WALLET: &str = "user-secret-wallet";
    /// Locally recorded canonical thread id.
    pub const CANONICAL_THREAD: &str = "canonical-thread-id";
}

/// Errors raised while parsing shared types.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    #[error("invalid thread id '{id}': {reason}")]
    InvalidThreadId { id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, TypesError>;
