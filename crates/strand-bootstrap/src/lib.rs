//! # strand-bootstrap
//!
//! Startup sequencing for a Strand client.
//!
//! [`Bootstrapper::run`] brings up four external subsystems in a fixed order
//! (storage network, thread database, wallet, local daemon) and publishes one
//! "connected" event per subsystem to an [`EventSink`]. Identity and wallet
//! credentials are created on first run and recovered from the
//! [`CredentialStore`](strand_store::CredentialStore) afterwards.
//!
//! External services are reached through the object-safe traits in
//! [`service`]; [`http`] provides JSON-RPC adapters for them.

pub mod connectors;
pub mod error;
pub mod events;
pub mod http;
pub mod identity;
pub mod orchestrator;
pub mod service;
pub mod session;
pub mod wallet;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use error::{BootstrapError, ServiceError, StepError};
pub use events::{BootstrapEvent, EventBus, EventSink};
pub use identity::{obtain_identity, Identity};
pub use orchestrator::{
    BootstrapOutcome, BootstrapSettings, BootstrapState, Bootstrapper, Services,
};
pub use session::{establish_session, DbSession};
pub use wallet::{obtain_wallet, Signer, Wallet, WalletRecord};
