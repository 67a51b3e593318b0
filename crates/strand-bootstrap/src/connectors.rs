//! Storage network and local daemon bring-up.

use std::sync::Arc;

use tracing::info;

use crate::error::StepError;
use crate::service::{DaemonConnector, FileStaging, SpaceDaemon, StorageNetworkConnector};

/// Default address of the local daemon.
pub const DEFAULT_DAEMON_HOST: &str = "http://127.0.0.1:9998";

/// Connect to the storage network; no retries.
pub async fn connect_storage_network(
    connector: &dyn StorageNetworkConnector,
    host: &str,
    token: &str,
) -> Result<Arc<dyn FileStaging>, StepError> {
    info!(host, "connecting to storage network");
    let staging = connector.connect(host, token).await?;
    Ok(staging)
}

/// Build the local daemon handle. Failures surface on first call.
pub fn connect_local_daemon(connector: &dyn DaemonConnector, host: &str) -> Arc<dyn SpaceDaemon> {
    info!(host, "binding local daemon client");
    connector.connect(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::testing::{MockDaemonConnector, MockStorageConnector};

    #[tokio::test]
    async fn test_storage_passes_host_and_token() {
        let connector = MockStorageConnector::default();
        let staging = connect_storage_network(&connector, "http://pow:6002", "tok")
            .await
            .expect("connect");
        assert_eq!(
            connector.last_connect(),
            Some(("http://pow:6002".to_string(), "tok".to_string()))
        );
        assert!(staging.stage(b"hello".to_vec()).await.is_ok());
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let connector =
            MockStorageConnector::failing(ServiceError::Unauthorized("bad token".into()));
        let err = connect_storage_network(&connector, "http://pow:6002", "bad")
            .await
            .err()
            .expect("must fail");
        assert!(matches!(err, StepError::Service(ServiceError::Unauthorized(_))));
    }

    #[test]
    fn test_daemon_binds_host() {
        let connector = MockDaemonConnector::default();
        let daemon = connect_local_daemon(&connector, DEFAULT_DAEMON_HOST);
        assert_eq!(daemon.host(), DEFAULT_DAEMON_HOST);
        assert_eq!(connector.connects(), 1);
    }
}
