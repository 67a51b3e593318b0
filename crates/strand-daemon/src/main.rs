//! strand-daemon: brings up a Strand client's identity, wallet and service
//! connections, then stays up until Ctrl-C.

mod config;
mod logger;

use std::sync::Arc;

use strand_bootstrap::http::{HubConnector, PowConnector, SpaceConnector};
use strand_bootstrap::{BootstrapEvent, Bootstrapper, EventBus, Services};
use strand_store::CredentialStore;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use crate::config::DaemonConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = DaemonConfig::load()?;

    // 2. Initialize tracing
    let log_file = config.log_file();
    logger::init(&config.advanced.log_level, log_file.as_deref())?;
    info!(version = env!("CARGO_PKG_VERSION"), "strand daemon starting");

    // 3. Open credential store
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let store = CredentialStore::open(&data_dir.join(strand_store::FILE_NAME))?;

    // 4. Event bus, with a subscriber that logs every milestone
    let event_bus = EventBus::new(64);
    let mut events = event_bus.subscribe();
    let listener = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(missed)) => warn!(missed, "event listener lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    // 5. Run the bootstrap
    let services = Services {
        thread_db: Arc::new(HubConnector::new(config.database.hub_host.clone())),
        storage_network: Arc::new(PowConnector),
        daemon: Arc::new(SpaceConnector),
    };
    let bootstrapper = Bootstrapper::new(
        config.bootstrap_settings(),
        services,
        store,
        Arc::new(event_bus.clone()),
    );
    let outcome = match bootstrapper.run().await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, subsystem = ?e.subsystem(), "bootstrap failed");
            listener.abort();
            return Err(e.into());
        }
    };
    info!(
        identity = %outcome.identity.public_key_hex(),
        wallet = %outcome.wallet.address(),
        thread_id = %outcome.session.thread_id,
        daemon = %outcome.daemon.host(),
        "all subsystems ready"
    );

    // 6. Stay up until interrupted
    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received, shutting down");
    listener.abort();
    info!("daemon stopped");
    Ok(())
}

fn log_event(event: &BootstrapEvent) {
    match event {
        BootstrapEvent::BootstrapFailed { subsystem, message } => {
            error!(event = event.name(), %subsystem, %message, "bootstrap event");
        }
        BootstrapEvent::DatabaseConnected { thread_id, .. } => {
            info!(event = event.name(), %thread_id, "bootstrap event");
        }
        BootstrapEvent::WalletConnected { address } => {
            info!(event = event.name(), %address, "bootstrap event");
        }
        BootstrapEvent::LocalDaemonConnected { daemon } => {
            info!(event = event.name(), host = daemon.host(), "bootstrap event");
        }
        BootstrapEvent::StorageNetworkConnected { .. } => {
            info!(event = event.name(), "bootstrap event");
        }
    }
}
