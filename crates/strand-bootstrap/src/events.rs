//! "Connected" events published while bootstrapping.
//!
//! The bootstrap pushes events into an [`EventSink`]. [`EventBus`] is the
//! broadcast implementation the daemon uses; subscribers each get an
//! independent buffer.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use strand_types::{Subsystem, ThreadId};
use tokio::sync::broadcast;

use crate::service::{FileStaging, SpaceDaemon, ThreadDb};

/// One bootstrap milestone. Each `*Connected` event is emitted at most once
/// per run and never withdrawn.
#[derive(Clone)]
pub enum BootstrapEvent {
    StorageNetworkConnected {
        staging: Arc<dyn FileStaging>,
    },
    DatabaseConnected {
        client: Arc<dyn ThreadDb>,
        thread_id: ThreadId,
    },
    WalletConnected {
        address: String,
    },
    LocalDaemonConnected {
        daemon: Arc<dyn SpaceDaemon>,
    },
    /// Terminal; nothing follows it.
    BootstrapFailed {
        subsystem: Subsystem,
        message: String,
    },
}

impl BootstrapEvent {
    pub fn subsystem(&self) -> Subsystem {
        match self {
            Self::StorageNetworkConnected { .. } => Subsystem::StorageNetwork,
            Self::DatabaseConnected { .. } => Subsystem::Database,
            Self::WalletConnected { .. } => Subsystem::Wallet,
            Self::LocalDaemonConnected { .. } => Subsystem::LocalDaemon,
            Self::BootstrapFailed { subsystem, .. } => *subsystem,
        }
    }

    /// Event type name, e.g. for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StorageNetworkConnected { .. } => "StorageNetworkConnected",
            Self::DatabaseConnected { .. } => "DatabaseConnected",
            Self::WalletConnected { .. } => "WalletConnected",
            Self::LocalDaemonConnected { .. } => "LocalDaemonConnected",
            Self::BootstrapFailed { .. } => "BootstrapFailed",
        }
    }
}

impl fmt::Debug for BootstrapEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DatabaseConnected { thread_id, .. } => f
                .debug_struct("DatabaseConnected")
                .field("thread_id", &thread_id.to_string())
                .finish_non_exhaustive(),
            Self::WalletConnected { address } => f
                .debug_struct("WalletConnected")
                .field("address", address)
                .finish(),
            Self::LocalDaemonConnected { daemon } => f
                .debug_struct("LocalDaemonConnected")
                .field("host", &daemon.host())
                .finish(),
            Self::BootstrapFailed { subsystem, message } => f
                .debug_struct("BootstrapFailed")
                .field("subsystem", subsystem)
                .field("message", message)
                .finish(),
            Self::StorageNetworkConnected { .. } => {
                f.debug_struct("StorageNetworkConnected").finish_non_exhaustive()
            }
        }
    }
}

/// Receiver of bootstrap events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: BootstrapEvent);
}

/// Broadcasts events to any number of subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BootstrapEvent>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    /// Bus whose subscribers each buffer up to `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BootstrapEvent> {
        self.sender.subscribe()
    }

    /// Number of events emitted so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: BootstrapEvent) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        // No subscribers is not an error.
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(BootstrapEvent::WalletConnected {
            address: "secret1xyz".to_string(),
        });

        let event = rx.try_recv().expect("receive event");
        assert_eq!(event.name(), "WalletConnected");
        assert_eq!(event.subsystem(), Subsystem::Wallet);
        assert_eq!(bus.sequence(), 1);
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(4);
        bus.emit(BootstrapEvent::BootstrapFailed {
            subsystem: Subsystem::Database,
            message: "unauthorized".to_string(),
        });
        assert_eq!(bus.sequence(), 1);
    }

    #[test]
    fn test_subscribers_are_independent() {
        let bus = EventBus::new(4);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        bus.emit(BootstrapEvent::WalletConnected {
            address: "secret1abc".to_string(),
        });
        assert!(a.try_recv().is_ok());
        assert!(b.try_recv().is_ok());
        assert!(a.try_recv().is_err());
    }

    #[test]
    fn test_debug_of_failure() {
        let event = BootstrapEvent::BootstrapFailed {
            subsystem: Subsystem::StorageNetwork,
            message: "refused".to_string(),
        };
        let dbg = format!("{event:?}");
        assert!(dbg.contains("StorageNetwork"));
        assert!(dbg.contains("refused"));
    }
}
