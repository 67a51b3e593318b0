//! Contracts of the external services the bootstrap talks to.
//!
//! All traits are object safe; the orchestrator holds them as
//! `Arc<dyn ...>` so tests can swap in mocks and the daemon can plug in the
//! HTTP adapters from [`crate::http`].

use std::sync::Arc;

use async_trait::async_trait;
use strand_types::{CollectionSchema, IndexInfo, KeyInfo, ThreadId, ThreadInfo};

use crate::error::ServiceError;
use crate::identity::Identity;

/// Builds thread database clients from static API credentials.
#[async_trait]
pub trait ThreadDbConnector: Send + Sync {
    async fn connect(&self, key_info: &KeyInfo) -> Result<Arc<dyn ThreadDb>, ServiceError>;
}

/// A client of the remote multi-tenant document database.
#[async_trait]
pub trait ThreadDb: Send + Sync {
    /// Obtain an access token for `identity`; later calls are scoped to it.
    async fn get_token(&self, identity: &Identity) -> Result<String, ServiceError>;

    async fn list_threads(&self) -> Result<Vec<ThreadInfo>, ServiceError>;

    /// Create a new logical database (thread).
    async fn new_db(&self) -> Result<ThreadId, ServiceError>;

    /// Indexes of collection `name`; [`ServiceError::NotFound`] if the
    /// collection does not exist.
    async fn get_collection_indexes(
        &self,
        thread: &ThreadId,
        name: &str,
    ) -> Result<Vec<IndexInfo>, ServiceError>;

    async fn new_collection(
        &self,
        thread: &ThreadId,
        name: &str,
        schema: &CollectionSchema,
    ) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait StorageNetworkConnector: Send + Sync {
    /// Bind a client to `host` with `token` as its static credential and
    /// return the file-staging handle.
    async fn connect(&self, host: &str, token: &str)
        -> Result<Arc<dyn FileStaging>, ServiceError>;
}

/// File-staging subsystem of the storage network.
#[async_trait]
pub trait FileStaging: Send + Sync {
    /// Stage `data` for storage; returns its content id.
    async fn stage(&self, data: Vec<u8>) -> Result<String, ServiceError>;
}

/// Builds local daemon clients. Construction never touches the network.
pub trait DaemonConnector: Send + Sync {
    fn connect(&self, host: &str) -> Arc<dyn SpaceDaemon>;
}

/// Client of the locally running file-sharing daemon.
#[async_trait]
pub trait SpaceDaemon: Send + Sync {
    fn host(&self) -> &str;

    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ServiceError>;
}
