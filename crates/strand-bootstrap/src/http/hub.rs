//! Thread database gateway adapter.
//!
//! Authentication is two-layered: the static API key goes in a header on
//! every call, and [`ThreadDb::get_token`] runs a challenge-response with the
//! user identity to obtain a bearer token for everything after it.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::json;
use strand_types::{
    CollectionSchema, IndexInfo, KeyInfo, ThreadId, ThreadInfo, ThreadVariant,
};
use tokio::sync::RwLock;
use tracing::debug;

use super::rpc::{self, RpcClient};
use crate::error::ServiceError;
use crate::identity::Identity;
use crate::service::{ThreadDb, ThreadDbConnector};

/// Default gateway endpoint.
pub const DEFAULT_HUB_HOST: &str = "https://api.hub.textile.io";

pub const API_KEY_HEADER: &str = "x-textile-api-key";

#[derive(Debug, Clone)]
pub struct HubConnector {
    host: String,
}

impl HubConnector {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl Default for HubConnector {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_HOST)
    }
}

#[async_trait]
impl ThreadDbConnector for HubConnector {
    async fn connect(&self, key_info: &KeyInfo) -> Result<Arc<dyn ThreadDb>, ServiceError> {
        if key_info.key.is_empty() {
            return Err(ServiceError::Unauthorized("empty API key".into()));
        }
        // User-group keys are used without request signing, so only the key
        // itself travels with each call.
        let (name, value) = rpc::header(API_KEY_HEADER, &key_info.key)?;
        let rpc = RpcClient::new(&self.host).with_header(name, value);
        debug!(endpoint = rpc.endpoint(), key_type = key_info.kind.code(), "hub client built");
        Ok(Arc::new(HubClient {
            rpc,
            token: RwLock::new(None),
        }))
    }
}

struct HubClient {
    rpc: RpcClient,
    token: RwLock<Option<String>>,
}

#[derive(Deserialize)]
struct Challenge {
    challenge: String,
}

#[derive(Deserialize)]
struct Token {
    token: String,
}

#[derive(Deserialize)]
struct Threads {
    #[serde(default)]
    threads: Vec<ThreadInfo>,
}

#[derive(Deserialize)]
struct Indexes {
    #[serde(default)]
    indexes: Vec<IndexInfo>,
}

impl HubClient {
    async fn token(&self) -> Result<String, ServiceError> {
        self.token
            .read()
            .await
            .clone()
            .ok_or_else(|| ServiceError::Unauthorized("no session token; call get_token first".into()))
    }
}

#[async_trait]
impl ThreadDb for HubClient {
    async fn get_token(&self, identity: &Identity) -> Result<String, ServiceError> {
        let pubkey = identity.public_key_hex();
        let Challenge { challenge } = self
            .rpc
            .call("hub_getTokenChallenge", json!({ "pubkey": pubkey }), None)
            .await?;
        let challenge = STANDARD
            .decode(challenge)
            .map_err(|e| ServiceError::Malformed(format!("challenge: {e}")))?;
        let signature = identity.sign(&challenge);

        let Token { token } = self
            .rpc
            .call(
                "hub_getToken",
                json!({
                    "pubkey": pubkey,
                    "signature": STANDARD.encode(signature.to_bytes()),
                }),
                None,
            )
            .await?;
        *self.token.write().await = Some(token.clone());
        Ok(token)
    }

    async fn list_threads(&self) -> Result<Vec<ThreadInfo>, ServiceError> {
        let token = self.token().await?;
        let Threads { threads } = self
            .rpc
            .call("hub_listThreads", json!({}), Some(&token))
            .await?;
        Ok(threads)
    }

    async fn new_db(&self) -> Result<ThreadId, ServiceError> {
        let token = self.token().await?;
        let id = ThreadId::random(ThreadVariant::Raw);
        let _: serde_json::Value = self
            .rpc
            .call("hub_newDB", json!({ "dbId": id.to_string() }), Some(&token))
            .await?;
        Ok(id)
    }

    async fn get_collection_indexes(
        &self,
        thread: &ThreadId,
        name: &str,
    ) -> Result<Vec<IndexInfo>, ServiceError> {
        let token = self.token().await?;
        let Indexes { indexes } = self
            .rpc
            .call(
                "hub_getCollectionIndexes",
                json!({ "dbId": thread.to_string(), "name": name }),
                Some(&token),
            )
            .await?;
        Ok(indexes)
    }

    async fn new_collection(
        &self,
        thread: &ThreadId,
        name: &str,
        schema: &CollectionSchema,
    ) -> Result<(), ServiceError> {
        let token = self.token().await?;
        let _: serde_json::Value = self
            .rpc
            .call(
                "hub_newCollection",
                json!({
                    "dbId": thread.to_string(),
                    "config": { "name": name, "schema": schema.as_json() },
                }),
                Some(&token),
            )
            .await?;
        Ok(())
    }
}
