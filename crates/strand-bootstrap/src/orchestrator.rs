//! The bootstrap state machine.
//!
//! ```text
//! NotStarted → StorageConnecting → StorageReady → DbConnecting → DbReady
//!   → WalletConnecting → WalletReady → DaemonConnecting → AllReady
//! ```
//!
//! Any step error moves to `Failed(subsystem)`, emits one
//! [`BootstrapEvent::BootstrapFailed`] and stops. A [`Bootstrapper`] runs at
//! most once.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use strand_crypto::argon2id::KdfParams;
use strand_store::CredentialStore;
use strand_types::{KeyInfo, Subsystem};
use tokio::sync::watch;
use tracing::{error, info, warn};
use zeroize::Zeroizing;

use crate::connectors::{connect_local_daemon, connect_storage_network};
use crate::error::{BootstrapError, StepError};
use crate::events::{BootstrapEvent, EventSink};
use crate::identity::{obtain_identity, Identity};
use crate::service::{
    DaemonConnector, FileStaging, SpaceDaemon, StorageNetworkConnector, ThreadDbConnector,
};
use crate::session::{establish_session, DbSession};
use crate::wallet::{obtain_wallet, Wallet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootstrapState {
    NotStarted,
    StorageConnecting,
    StorageReady,
    DbConnecting,
    DbReady,
    WalletConnecting,
    WalletReady,
    DaemonConnecting,
    AllReady,
    Failed(Subsystem),
}

impl BootstrapState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::AllReady | Self::Failed(_))
    }
}

/// Endpoints and secrets the run needs.
#[derive(Clone)]
pub struct BootstrapSettings {
    pub storage_network_host: String,
    pub storage_network_token: String,
    pub daemon_host: String,
    pub db_keys: KeyInfo,
    /// Seals the wallet mnemonic at rest.
    pub credential_passphrase: Zeroizing<String>,
    pub kdf: KdfParams,
}

impl fmt::Debug for BootstrapSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapSettings")
            .field("storage_network_host", &self.storage_network_host)
            .field("daemon_host", &self.daemon_host)
            .field("db_keys", &self.db_keys)
            .field("kdf", &self.kdf)
            .finish_non_exhaustive()
    }
}

/// Connectors for the external services.
#[derive(Clone)]
pub struct Services {
    pub thread_db: Arc<dyn ThreadDbConnector>,
    pub storage_network: Arc<dyn StorageNetworkConnector>,
    pub daemon: Arc<dyn DaemonConnector>,
}

/// Every handle produced by a successful run.
#[derive(Clone)]
pub struct BootstrapOutcome {
    pub identity: Identity,
    pub staging: Arc<dyn FileStaging>,
    pub session: DbSession,
    pub wallet: Wallet,
    pub daemon: Arc<dyn SpaceDaemon>,
}

impl fmt::Debug for BootstrapOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapOutcome")
            .field("identity", &self.identity)
            .field("session", &self.session)
            .field("wallet", &self.wallet.address())
            .field("daemon", &self.daemon.host())
            .finish_non_exhaustive()
    }
}

pub struct Bootstrapper {
    settings: BootstrapSettings,
    services: Services,
    store: CredentialStore,
    sink: Arc<dyn EventSink>,
    started: AtomicBool,
    state: watch::Sender<BootstrapState>,
}

impl Bootstrapper {
    pub fn new(
        settings: BootstrapSettings,
        services: Services,
        store: CredentialStore,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let (state, _) = watch::channel(BootstrapState::NotStarted);
        Self {
            settings,
            services,
            store,
            sink,
            started: AtomicBool::new(false),
            state,
        }
    }

    pub fn state(&self) -> BootstrapState {
        *self.state.borrow()
    }

    /// Follow state transitions as they happen.
    pub fn watch_state(&self) -> watch::Receiver<BootstrapState> {
        self.state.subscribe()
    }

    /// Bring up every subsystem in order. Refused on a second call.
    pub async fn run(&self) -> Result<BootstrapOutcome, BootstrapError> {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("bootstrap requested again; refusing");
            return Err(BootstrapError::AlreadyStarted);
        }
        info!("bootstrap starting");

        let staging = self
            .step(
                Subsystem::StorageNetwork,
                BootstrapState::StorageConnecting,
                connect_storage_network(
                    self.services.storage_network.as_ref(),
                    &self.settings.storage_network_host,
                    &self.settings.storage_network_token,
                ),
            )
            .await?;
        self.ready(
            BootstrapState::StorageReady,
            BootstrapEvent::StorageNetworkConnected {
                staging: staging.clone(),
            },
        );

        let (identity, session) = self
            .step(
                Subsystem::Database,
                BootstrapState::DbConnecting,
                self.connect_database(),
            )
            .await?;
        self.ready(
            BootstrapState::DbReady,
            BootstrapEvent::DatabaseConnected {
                client: session.client.clone(),
                thread_id: session.thread_id.clone(),
            },
        );

        let wallet = self
            .step(
                Subsystem::Wallet,
                BootstrapState::WalletConnecting,
                obtain_wallet(
                    &self.store,
                    self.settings.credential_passphrase.as_bytes(),
                    self.settings.kdf,
                ),
            )
            .await?;
        self.ready(
            BootstrapState::WalletReady,
            BootstrapEvent::WalletConnected {
                address: wallet.address().to_string(),
            },
        );

        self.transition(BootstrapState::DaemonConnecting);
        let daemon = connect_local_daemon(self.services.daemon.as_ref(), &self.settings.daemon_host);
        self.ready(
            BootstrapState::AllReady,
            BootstrapEvent::LocalDaemonConnected {
                daemon: daemon.clone(),
            },
        );

        info!(
            thread_id = %session.thread_id,
            wallet = %wallet.address(),
            "bootstrap complete"
        );
        Ok(BootstrapOutcome {
            identity,
            staging,
            session,
            wallet,
            daemon,
        })
    }

    async fn connect_database(&self) -> Result<(Identity, DbSession), StepError> {
        let identity = obtain_identity(&self.store).await?;
        let session = establish_session(
            self.services.thread_db.as_ref(),
            &self.settings.db_keys,
            &identity,
            &self.store,
        )
        .await?;
        Ok((identity, session))
    }

    async fn step<T>(
        &self,
        subsystem: Subsystem,
        connecting: BootstrapState,
        work: impl Future<Output = Result<T, StepError>>,
    ) -> Result<T, BootstrapError> {
        self.transition(connecting);
        match work.await {
            Ok(value) => Ok(value),
            Err(source) => {
                error!(%subsystem, error = %source, "bootstrap step failed");
                self.transition(BootstrapState::Failed(subsystem));
                self.sink.emit(BootstrapEvent::BootstrapFailed {
                    subsystem,
                    message: source.to_string(),
                });
                Err(BootstrapError::Step { subsystem, source })
            }
        }
    }

    fn ready(&self, state: BootstrapState, event: BootstrapEvent) {
        self.transition(state);
        info!(event = event.name(), "subsystem connected");
        self.sink.emit(event);
    }

    fn transition(&self, next: BootstrapState) {
        tracing::debug!(state = ?next, "bootstrap state");
        self.state.send_replace(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::testing::{
        MockDaemonConnector, MockHub, MockStorageConnector, RecordingSink,
    };
    use strand_types::keys;

    struct Harness {
        hub: MockHub,
        storage: Arc<MockStorageConnector>,
        daemon: Arc<MockDaemonConnector>,
        sink: Arc<RecordingSink>,
        store: CredentialStore,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                hub: MockHub::new(),
                storage: Arc::new(MockStorageConnector::default()),
                daemon: Arc::new(MockDaemonConnector::default()),
                sink: Arc::new(RecordingSink::default()),
                store: CredentialStore::in_memory().expect("store"),
            }
        }

        fn bootstrapper(&self) -> Bootstrapper {
            let settings = BootstrapSettings {
                storage_network_host: "http://pow.local:6002".to_string(),
                storage_network_token: "pow-token".to_string(),
                daemon_host: "http://127.0.0.1:9998".to_string(),
                db_keys: KeyInfo::user("hub-key", "hub-secret"),
                credential_passphrase: Zeroizing::new("passphrase".to_string()),
                kdf: KdfParams::insecure_fast(),
            };
            let services = Services {
                thread_db: Arc::new(self.hub.connector()),
                storage_network: self.storage.clone(),
                daemon: self.daemon.clone(),
            };
            Bootstrapper::new(settings, services, self.store.clone(), self.sink.clone())
        }
    }

    #[tokio::test]
    async fn test_events_in_order() {
        let h = Harness::new();
        let outcome = h.bootstrapper().run().await.expect("bootstrap");

        assert_eq!(
            h.sink.names(),
            vec![
                "StorageNetworkConnected",
                "DatabaseConnected",
                "WalletConnected",
                "LocalDaemonConnected",
            ]
        );
        assert_eq!(outcome.daemon.host(), "http://127.0.0.1:9998");
        assert!(outcome.wallet.address().starts_with("secret1"));
    }

    #[tokio::test]
    async fn test_final_state_and_watch() {
        let h = Harness::new();
        let bootstrapper = h.bootstrapper();
        let rx = bootstrapper.watch_state();
        assert_eq!(bootstrapper.state(), BootstrapState::NotStarted);

        bootstrapper.run().await.expect("bootstrap");

        assert_eq!(bootstrapper.state(), BootstrapState::AllReady);
        assert_eq!(*rx.borrow(), BootstrapState::AllReady);
        assert!(bootstrapper.state().is_terminal());
    }

    #[tokio::test]
    async fn test_second_run_refused() {
        let h = Harness::new();
        let bootstrapper = h.bootstrapper();
        bootstrapper.run().await.expect("first run");

        let err = bootstrapper.run().await.expect_err("second run");
        assert!(matches!(err, BootstrapError::AlreadyStarted));
        assert_eq!(h.sink.names().len(), 4);
        assert_eq!(h.storage.connects(), 1);
    }

    #[tokio::test]
    async fn test_db_auth_failure_halts() {
        let h = Harness::new();
        h.hub
            .fail_token_with(ServiceError::Unauthorized("invalid api key".into()));
        let bootstrapper = h.bootstrapper();

        let err = bootstrapper.run().await.expect_err("must fail");

        assert_eq!(err.subsystem(), Some(Subsystem::Database));
        assert_eq!(
            h.sink.names(),
            vec!["StorageNetworkConnected", "BootstrapFailed"]
        );
        assert_eq!(
            bootstrapper.state(),
            BootstrapState::Failed(Subsystem::Database)
        );
        assert_eq!(h.daemon.connects(), 0);
        assert_eq!(h.store.get(keys::WALLET).await.expect("get"), None);
    }

    #[tokio::test]
    async fn test_storage_failure_emits_nothing_else() {
        let mut h = Harness::new();
        h.storage = Arc::new(MockStorageConnector::failing(ServiceError::Transport(
            "connection refused".into(),
        )));

        let err = h.bootstrapper().run().await.expect_err("must fail");

        assert_eq!(err.subsystem(), Some(Subsystem::StorageNetwork));
        assert_eq!(h.sink.names(), vec!["BootstrapFailed"]);
        assert_eq!(h.hub.calls().connect, 0);
    }

    #[tokio::test]
    async fn test_wallet_failure_after_db_ready() {
        let h = Harness::new();
        h.store
            .set(keys::WALLET, "not json")
            .await
            .expect("seed corrupt wallet");

        let err = h.bootstrapper().run().await.expect_err("must fail");

        assert_eq!(err.subsystem(), Some(Subsystem::Wallet));
        assert_eq!(
            h.sink.names(),
            vec!["StorageNetworkConnected", "DatabaseConnected", "BootstrapFailed"]
        );
        let last = h.sink.events().pop().expect("an event");
        assert!(
            matches!(
                &last,
                BootstrapEvent::BootstrapFailed { subsystem: Subsystem::Wallet, message }
                    if message.contains(keys::WALLET)
            ),
            "unexpected last event: {last:?}"
        );
    }

    #[tokio::test]
    async fn test_restart_reuses_credentials() {
        let h = Harness::new();
        let first = h.bootstrapper().run().await.expect("first run");
        let second = h.bootstrapper().run().await.expect("second process");

        assert_eq!(first.identity.public_key(), second.identity.public_key());
        assert_eq!(first.wallet.address(), second.wallet.address());
        assert_eq!(first.session.thread_id, second.session.thread_id);
        assert_eq!(h.hub.calls().new_db, 1);
        assert_eq!(h.hub.calls().new_collection, 1);
    }
}
