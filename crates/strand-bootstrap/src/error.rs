//! Error types for the bootstrap sequence.

use strand_crypto::CryptoError;
use strand_store::StoreError;
use strand_types::{Subsystem, TypesError};

/// Failure reported by an external service.
///
/// `NotFound` is the only variant that means "the thing does not exist";
/// everything else is a real failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request rejected ({code}): {message}")]
    Rejected { code: i64, message: String },
}

/// Anything a single bootstrap step can fail with.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("credential store: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A stored credential could not be decoded, unsealed or verified.
    #[error("corrupt credential '{key}': {reason}")]
    CorruptCredential { key: String, reason: String },

    #[error(transparent)]
    InvalidThreadId(#[from] TypesError),

    #[error("thread listing is still empty after creating a database")]
    NoThread,

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StepError {
    pub(crate) fn corrupt(key: &str, reason: impl Into<String>) -> Self {
        Self::CorruptCredential {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// The single error a bootstrap run reports.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("bootstrap already ran in this process")]
    AlreadyStarted,

    #[error("{subsystem} bootstrap failed: {source}")]
    Step {
        subsystem: Subsystem,
        #[source]
        source: StepError,
    },
}

impl BootstrapError {
    /// Subsystem whose step failed, if any.
    pub fn subsystem(&self) -> Option<Subsystem> {
        match self {
            Self::AlreadyStarted => None,
            Self::Step { subsystem, .. } => Some(*subsystem),
        }
    }
}
