//! In-process mock services for tests.
//!
//! Every mock counts its calls so tests can assert exactly how the bootstrap
//! talked to a service. Failures are injected per call kind.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use strand_types::{CollectionSchema, IndexInfo, KeyInfo, ThreadId, ThreadInfo, ThreadVariant};

use crate::error::ServiceError;
use crate::events::{BootstrapEvent, EventSink};
use crate::identity::Identity;
use crate::service::{
    DaemonConnector, FileStaging, SpaceDaemon, StorageNetworkConnector, ThreadDb,
    ThreadDbConnector,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Call counters of a [`MockHub`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HubCalls {
    pub connect: usize,
    pub get_token: usize,
    pub list_threads: usize,
    pub new_db: usize,
    pub get_collection_indexes: usize,
    pub new_collection: usize,
}

#[derive(Default)]
struct HubState {
    threads: Vec<ThreadInfo>,
    collections: HashSet<(String, String)>,
    created: Vec<(String, CollectionSchema)>,
    token_holders: Vec<String>,
    calls: HubCalls,
    connect_error: Option<ServiceError>,
    token_error: Option<ServiceError>,
    probe_error: Option<ServiceError>,
}

/// Shared state of a fake thread database. Clones see the same state, so
/// one hub can serve several "process runs".
#[derive(Clone, Default)]
pub struct MockHub {
    state: Arc<Mutex<HubState>>,
}

impl MockHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threads(threads: Vec<ThreadId>) -> Self {
        let hub = Self::new();
        lock(&hub.state).threads = threads
            .into_iter()
            .map(|id| ThreadInfo {
                id: id.to_string(),
                name: None,
            })
            .collect();
        hub
    }

    pub fn connector(&self) -> MockThreadDbConnector {
        MockThreadDbConnector { hub: self.clone() }
    }

    pub fn calls(&self) -> HubCalls {
        lock(&self.state).calls
    }

    pub fn thread_ids(&self) -> Vec<String> {
        lock(&self.state).threads.iter().map(|t| t.id.clone()).collect()
    }

    /// Collections created through `new_collection`, in call order.
    pub fn created_collections(&self) -> Vec<(String, CollectionSchema)> {
        lock(&self.state).created.clone()
    }

    /// Public keys (hex) that were issued tokens.
    pub fn token_holders(&self) -> Vec<String> {
        lock(&self.state).token_holders.clone()
    }

    pub fn add_collection(&self, thread: &ThreadId, name: &str) {
        lock(&self.state)
            .collections
            .insert((thread.to_string(), name.to_string()));
    }

    /// List a thread whose id is taken verbatim, valid or not.
    pub fn push_raw_thread(&self, id: &str) {
        lock(&self.state).threads.push(ThreadInfo {
            id: id.to_string(),
            name: None,
        });
    }

    pub fn fail_connect_with(&self, error: ServiceError) {
        lock(&self.state).connect_error = Some(error);
    }

    pub fn fail_token_with(&self, error: ServiceError) {
        lock(&self.state).token_error = Some(error);
    }

    pub fn fail_probe_with(&self, error: ServiceError) {
        lock(&self.state).probe_error = Some(error);
    }
}

pub struct MockThreadDbConnector {
    hub: MockHub,
}

#[async_trait]
impl ThreadDbConnector for MockThreadDbConnector {
    async fn connect(&self, _key_info: &KeyInfo) -> Result<Arc<dyn ThreadDb>, ServiceError> {
        let mut state = lock(&self.hub.state);
        state.calls.connect += 1;
        if let Some(error) = state.connect_error.clone() {
            return Err(error);
        }
        Ok(Arc::new(MockThreadDb {
            hub: self.hub.clone(),
            token: Mutex::new(None),
        }))
    }
}

struct MockThreadDb {
    hub: MockHub,
    token: Mutex<Option<String>>,
}

impl MockThreadDb {
    fn require_token(&self) -> Result<(), ServiceError> {
        if lock(&self.token).is_some() {
            Ok(())
        } else {
            Err(ServiceError::Unauthorized("no token".into()))
        }
    }
}

#[async_trait]
impl ThreadDb for MockThreadDb {
    async fn get_token(&self, identity: &Identity) -> Result<String, ServiceError> {
        let public_key = identity.public_key_hex();
        {
            let mut state = lock(&self.hub.state);
            state.calls.get_token += 1;
            if let Some(error) = state.token_error.clone() {
                return Err(error);
            }
            state.token_holders.push(public_key.clone());
        }
        let token = format!("token-{}", &public_key[..16]);
        *lock(&self.token) = Some(token.clone());
        Ok(token)
    }

    async fn list_threads(&self) -> Result<Vec<ThreadInfo>, ServiceError> {
        self.require_token()?;
        let mut state = lock(&self.hub.state);
        state.calls.list_threads += 1;
        Ok(state.threads.clone())
    }

    async fn new_db(&self) -> Result<ThreadId, ServiceError> {
        self.require_token()?;
        let id = ThreadId::random(ThreadVariant::Raw);
        let mut state = lock(&self.hub.state);
        state.calls.new_db += 1;
        state.threads.push(ThreadInfo {
            id: id.to_string(),
            name: None,
        });
        Ok(id)
    }

    async fn get_collection_indexes(
        &self,
        thread: &ThreadId,
        name: &str,
    ) -> Result<Vec<IndexInfo>, ServiceError> {
        self.require_token()?;
        let mut state = lock(&self.hub.state);
        state.calls.get_collection_indexes += 1;
        if let Some(error) = state.probe_error.clone() {
            return Err(error);
        }
        if state
            .collections
            .contains(&(thread.to_string(), name.to_string()))
        {
            Ok(vec![IndexInfo {
                path: "_id".to_string(),
                unique: true,
            }])
        } else {
            Err(ServiceError::NotFound(format!("collection '{name}'")))
        }
    }

    async fn new_collection(
        &self,
        thread: &ThreadId,
        name: &str,
        schema: &CollectionSchema,
    ) -> Result<(), ServiceError> {
        self.require_token()?;
        let mut state = lock(&self.hub.state);
        state.calls.new_collection += 1;
        state
            .collections
            .insert((thread.to_string(), name.to_string()));
        state.created.push((name.to_string(), schema.clone()));
        Ok(())
    }
}

/// Fake storage network. Hands out a staging handle that records blobs.
#[derive(Default)]
pub struct MockStorageConnector {
    error: Option<ServiceError>,
    connects: AtomicUsize,
    last_connect: Mutex<Option<(String, String)>>,
    staged: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MockStorageConnector {
    pub fn failing(error: ServiceError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// `(host, token)` of the most recent connect.
    pub fn last_connect(&self) -> Option<(String, String)> {
        lock(&self.last_connect).clone()
    }

    pub fn staged(&self) -> Vec<Vec<u8>> {
        lock(&self.staged).clone()
    }
}

#[async_trait]
impl StorageNetworkConnector for MockStorageConnector {
    async fn connect(
        &self,
        host: &str,
        token: &str,
    ) -> Result<Arc<dyn FileStaging>, ServiceError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_connect) = Some((host.to_string(), token.to_string()));
        if let Some(error) = self.error.clone() {
            return Err(error);
        }
        Ok(Arc::new(MockStaging {
            staged: self.staged.clone(),
        }))
    }
}

struct MockStaging {
    staged: Arc<Mutex<Vec<Vec<u8>>>>,
}

#[async_trait]
impl FileStaging for MockStaging {
    async fn stage(&self, data: Vec<u8>) -> Result<String, ServiceError> {
        let mut staged = lock(&self.staged);
        staged.push(data);
        Ok(format!("bafymock{}", staged.len()))
    }
}

/// Fake local daemon; `call` echoes the method and params back.
#[derive(Default)]
pub struct MockDaemonConnector {
    connects: AtomicUsize,
}

impl MockDaemonConnector {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl DaemonConnector for MockDaemonConnector {
    fn connect(&self, host: &str) -> Arc<dyn SpaceDaemon> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Arc::new(MockDaemon {
            host: host.to_string(),
        })
    }
}

struct MockDaemon {
    host: String,
}

#[async_trait]
impl SpaceDaemon for MockDaemon {
    fn host(&self) -> &str {
        &self.host
    }

    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ServiceError> {
        Ok(serde_json::json!({ "method": method, "params": params }))
    }
}

/// Sink that keeps every event it receives.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<BootstrapEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<BootstrapEvent> {
        lock(&self.events).clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        lock(&self.events).iter().map(BootstrapEvent::name).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: BootstrapEvent) {
        lock(&self.events).push(event);
    }
}
