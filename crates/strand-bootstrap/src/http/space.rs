//! Local file-sharing daemon adapter. The HTTP client is built eagerly but
//! nothing is sent until the first call.

use std::sync::Arc;

use async_trait::async_trait;

use super::rpc::RpcClient;
use crate::error::ServiceError;
use crate::service::{DaemonConnector, SpaceDaemon};

#[derive(Debug, Clone, Copy, Default)]
pub struct SpaceConnector;

impl DaemonConnector for SpaceConnector {
    fn connect(&self, host: &str) -> Arc<dyn SpaceDaemon> {
        Arc::new(SpaceClient {
            host: host.to_string(),
            rpc: RpcClient::new(host),
        })
    }
}

struct SpaceClient {
    host: String,
    rpc: RpcClient,
}

#[async_trait]
impl SpaceDaemon for SpaceClient {
    fn host(&self) -> &str {
        &self.host
    }

    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ServiceError> {
        self.rpc.call(method, params, None).await
    }
}
