//! Thread database session: authenticate, pick the canonical thread and make
//! sure the `files` collection exists.

use std::fmt;
use std::sync::Arc;

use strand_store::CredentialStore;
use strand_types::{keys, CollectionSchema, KeyInfo, ThreadId, ThreadInfo, FILES_COLLECTION};
use tracing::{debug, error, info, warn};

use crate::error::{ServiceError, StepError};
use crate::identity::Identity;
use crate::service::{ThreadDb, ThreadDbConnector};

/// An authenticated client plus the canonical thread it operates on.
#[derive(Clone)]
pub struct DbSession {
    pub client: Arc<dyn ThreadDb>,
    pub thread_id: ThreadId,
}

impl fmt::Debug for DbSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbSession")
            .field("thread_id", &self.thread_id.to_string())
            .finish_non_exhaustive()
    }
}

/// Connect, authenticate `identity` and settle on one canonical thread.
///
/// The listing is re-read every run. The thread id recorded under
/// `canonical-thread-id` is preferred when it is still listed; otherwise the
/// first listed thread is adopted and recorded.
pub async fn establish_session(
    connector: &dyn ThreadDbConnector,
    key_info: &KeyInfo,
    identity: &Identity,
    store: &CredentialStore,
) -> Result<DbSession, StepError> {
    let client = connector.connect(key_info).await?;

    client.get_token(identity).await?;
    debug!(public_key = %identity.public_key_hex(), "thread database token acquired");

    let mut threads = client.list_threads().await?;
    if threads.is_empty() {
        let created = client.new_db().await?;
        info!(thread_id = %created, "no threads found; created a new database");
        threads = client.list_threads().await?;
    }

    let thread_id = adopt_canonical(&threads, store).await?;
    ensure_files_collection(client.as_ref(), &thread_id).await?;

    Ok(DbSession { client, thread_id })
}

async fn adopt_canonical(
    threads: &[ThreadInfo],
    store: &CredentialStore,
) -> Result<ThreadId, StepError> {
    let recorded = store.get(keys::CANONICAL_THREAD).await?;

    if let Some(recorded) = recorded.as_deref() {
        if threads.iter().any(|t| t.id == recorded) {
            let thread_id: ThreadId = recorded.parse()?;
            debug!(thread_id = %thread_id, "adopted recorded canonical thread");
            return Ok(thread_id);
        }
        warn!(
            recorded,
            listed = threads.len(),
            "recorded canonical thread is no longer listed"
        );
    }

    let first = threads.first().ok_or(StepError::NoThread)?;
    let thread_id: ThreadId = first.id.parse()?;
    if recorded.is_some() {
        store.remove(keys::CANONICAL_THREAD).await?;
    }
    record_if_absent(store, thread_id).await
}

/// Record `candidate` as canonical unless another run recorded one first, in
/// which case the stored thread is returned.
async fn record_if_absent(
    store: &CredentialStore,
    candidate: ThreadId,
) -> Result<ThreadId, StepError> {
    let text = candidate.to_string();
    let stored = store.insert_if_absent(keys::CANONICAL_THREAD, &text).await?;
    if stored == text {
        info!(thread_id = %candidate, "recorded canonical thread");
        return Ok(candidate);
    }
    let winner: ThreadId = stored.parse()?;
    info!(
        thread_id = %winner,
        "canonical thread was recorded concurrently; adopting stored one"
    );
    Ok(winner)
}

/// Create the `files` collection unless the index probe finds it.
///
/// Only a not-found answer means the collection is missing; any other probe
/// failure aborts.
async fn ensure_files_collection(client: &dyn ThreadDb, thread: &ThreadId) -> Result<(), StepError> {
    match client.get_collection_indexes(thread, FILES_COLLECTION).await {
        Ok(indexes) => {
            debug!(thread_id = %thread, indexes = indexes.len(), "files collection present");
            Ok(())
        }
        Err(ServiceError::NotFound(detail)) => {
            info!(thread_id = %thread, %detail, "files collection missing; creating it");
            client
                .new_collection(thread, FILES_COLLECTION, &CollectionSchema::files())
                .await?;
            Ok(())
        }
        Err(e) => {
            error!(thread_id = %thread, error = %e, "files collection probe failed");
            Err(e.into())
        }
    }
}
