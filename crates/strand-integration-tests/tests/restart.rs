//! Integration test: credentials across process restarts.
//!
//! Each "process" opens its own connection to the same on-disk credential
//! store and runs a fresh `Bootstrapper` against a shared mock hub.
//!
//! 1. Cold restart reuses identity, wallet and canonical thread
//! 2. Wrong passphrase on restart is fatal for the wallet step only
//! 3. A wallet record with inflated KDF costs fails the wallet step cleanly
//! 4. Two processes bootstrapping at once converge on one identity and wallet

use std::path::Path;
use std::sync::Arc;

use strand_bootstrap::testing::{
    MockDaemonConnector, MockHub, MockStorageConnector, RecordingSink,
};
use strand_bootstrap::wallet::verify_signature;
use strand_bootstrap::{BootstrapOutcome, BootstrapSettings, Bootstrapper, Services};
use strand_crypto::argon2id::KdfParams;
use strand_store::CredentialStore;
use strand_types::{keys, KeyInfo, Subsystem};
use zeroize::Zeroizing;

fn settings(passphrase: &str) -> BootstrapSettings {
    BootstrapSettings {
        storage_network_host: "http://pow.test:6002".to_string(),
        storage_network_token: "pow-token".to_string(),
        daemon_host: "http://127.0.0.1:9998".to_string(),
        db_keys: KeyInfo::user("hub-key", "hub-secret"),
        credential_passphrase: Zeroizing::new(passphrase.to_string()),
        kdf: KdfParams::insecure_fast(),
    }
}

/// One simulated process: fresh store connection, fresh bootstrapper.
fn process(hub: &MockHub, db_path: &Path, passphrase: &str) -> (Bootstrapper, Arc<RecordingSink>) {
    let store = CredentialStore::open(db_path).expect("open store");
    let sink = Arc::new(RecordingSink::default());
    let bootstrapper = Bootstrapper::new(
        settings(passphrase),
        Services {
            thread_db: Arc::new(hub.connector()),
            storage_network: Arc::new(MockStorageConnector::default()),
            daemon: Arc::new(MockDaemonConnector::default()),
        },
        store,
        sink.clone(),
    );
    (bootstrapper, sink)
}

async fn run(hub: &MockHub, db_path: &Path, passphrase: &str) -> BootstrapOutcome {
    let (bootstrapper, _sink) = process(hub, db_path, passphrase);
    bootstrapper.run().await.expect("bootstrap")
}

#[tokio::test]
async fn cold_restart_reuses_credentials() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join(strand_store::FILE_NAME);
    let hub = MockHub::new();

    let first = run(&hub, &db_path, "pw").await;
    let second = run(&hub, &db_path, "pw").await;

    assert_eq!(first.identity.public_key(), second.identity.public_key());
    assert_eq!(first.wallet.address(), second.wallet.address());
    assert_eq!(first.session.thread_id, second.session.thread_id);

    let sig = second.wallet.signer().sign(b"after restart").await.expect("sign");
    verify_signature(first.wallet.address(), b"after restart", &sig).expect("verify");

    // Remote structures were created exactly once across both runs.
    let calls = hub.calls();
    assert_eq!(calls.new_db, 1);
    assert_eq!(calls.new_collection, 1);
    assert_eq!(calls.get_collection_indexes, 2);
}

#[tokio::test]
async fn wrong_passphrase_fails_wallet_step() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join(strand_store::FILE_NAME);
    let hub = MockHub::new();

    run(&hub, &db_path, "right").await;

    let (bootstrapper, sink) = process(&hub, &db_path, "wrong");
    let err = bootstrapper.run().await.expect_err("must fail");

    assert_eq!(err.subsystem(), Some(Subsystem::Wallet));
    assert_eq!(
        sink.names(),
        vec!["StorageNetworkConnected", "DatabaseConnected", "BootstrapFailed"]
    );
}

#[tokio::test]
async fn inflated_kdf_cost_fails_wallet_step() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join(strand_store::FILE_NAME);
    let hub = MockHub::new();

    run(&hub, &db_path, "pw").await;

    {
        let store = CredentialStore::open(&db_path).expect("open store");
        let json = store.get(keys::WALLET).await.expect("get").expect("present");
        let mut record: serde_json::Value = serde_json::from_str(&json).expect("record");
        record["signer"]["sealed"]["kdf"]["m_cost"] = serde_json::json!(0x0FFF_FFFFu32);
        store
            .set(keys::WALLET, &record.to_string())
            .await
            .expect("rewrite");
    }

    let (bootstrapper, sink) = process(&hub, &db_path, "pw");
    let err = bootstrapper.run().await.expect_err("must fail");

    assert_eq!(err.subsystem(), Some(Subsystem::Wallet));
    assert!(err.to_string().contains(keys::WALLET), "unexpected error: {err}");
    assert_eq!(
        sink.names(),
        vec!["StorageNetworkConnected", "DatabaseConnected", "BootstrapFailed"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_processes_converge() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join(strand_store::FILE_NAME);
    let hub = MockHub::new();

    let (a, _) = process(&hub, &db_path, "pw");
    let (b, _) = process(&hub, &db_path, "pw");
    let a = tokio::spawn(async move { a.run().await });
    let b = tokio::spawn(async move { b.run().await });
    let ra = a.await.expect("join a").expect("process a");
    let rb = b.await.expect("join b").expect("process b");

    assert_eq!(ra.identity.public_key(), rb.identity.public_key());
    assert_eq!(ra.wallet.address(), rb.wallet.address());
    assert_eq!(ra.session.thread_id, rb.session.thread_id);

    // Later runs see the same credentials.
    let later = run(&hub, &db_path, "pw").await;
    assert_eq!(later.identity.public_key(), ra.identity.public_key());
    assert_eq!(later.wallet.address(), ra.wallet.address());
}
