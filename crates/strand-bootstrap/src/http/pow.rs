//! Storage network adapter: stages files through the network's
//! file-staging subsystem with a static bearer token.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::rpc::RpcClient;
use crate::error::ServiceError;
use crate::service::{FileStaging, StorageNetworkConnector};

#[derive(Debug, Clone, Copy, Default)]
pub struct PowConnector;

#[async_trait]
impl StorageNetworkConnector for PowConnector {
    async fn connect(
        &self,
        host: &str,
        token: &str,
    ) -> Result<Arc<dyn FileStaging>, ServiceError> {
        reqwest::Url::parse(host)
            .map_err(|e| ServiceError::Transport(format!("invalid storage network host '{host}': {e}")))?;
        if token.is_empty() {
            return Err(ServiceError::Unauthorized("empty storage network token".into()));
        }
        Ok(Arc::new(PowStaging {
            rpc: RpcClient::new(host),
            token: token.to_string(),
        }))
    }
}

struct PowStaging {
    rpc: RpcClient,
    token: String,
}

#[derive(Deserialize)]
struct Staged {
    cid: String,
}

#[async_trait]
impl FileStaging for PowStaging {
    async fn stage(&self, data: Vec<u8>) -> Result<String, ServiceError> {
        let size = data.len();
        let Staged { cid } = self
            .rpc
            .call("ffs_stage", json!({ "data": STANDARD.encode(data) }), Some(&self.token))
            .await?;
        debug!(%cid, size, "staged file");
        Ok(cid)
    }
}
