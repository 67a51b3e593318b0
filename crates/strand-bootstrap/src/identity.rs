//! The user's persistent Ed25519 identity.

use std::fmt;
use std::sync::Arc;

use strand_crypto::ed25519::{Keypair, PublicKey, Signature};
use strand_store::CredentialStore;
use strand_types::keys;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::error::StepError;

/// Identity used to obtain thread database tokens. Cheap to clone.
#[derive(Clone)]
pub struct Identity {
    keypair: Arc<Keypair>,
}

impl Identity {
    pub fn generate() -> Self {
        Self::from_keypair(Keypair::generate())
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }

    /// Parse the `ed25519:<hex seed>` form produced by [`Identity::to_text`].
    pub fn from_text(text: &str) -> strand_crypto::Result<Self> {
        Keypair::from_text(text).map(Self::from_keypair)
    }

    pub fn to_text(&self) -> Zeroizing<String> {
        self.keypair.to_text()
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public()
    }

    pub fn public_key_hex(&self) -> String {
        self.keypair.public().to_hex()
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.keypair.sign(message)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("public_key", &self.public_key_hex())
            .finish()
    }
}

/// Load the stored identity, or create and persist one on first run.
///
/// If another process stores an identity between our read and our write,
/// theirs wins and is returned.
pub async fn obtain_identity(store: &CredentialStore) -> Result<Identity, StepError> {
    if let Some(text) = store.get(keys::IDENTITY).await? {
        let identity = parse_stored(&text)?;
        debug!(public_key = %identity.public_key_hex(), "identity loaded from credential store");
        return Ok(identity);
    }

    persist_new(store, Identity::generate()).await
}

/// Store `fresh` unless an identity is already stored; the stored one wins.
async fn persist_new(store: &CredentialStore, fresh: Identity) -> Result<Identity, StepError> {
    let fresh_text = fresh.to_text();
    let stored = Zeroizing::new(store.insert_if_absent(keys::IDENTITY, &fresh_text).await?);

    if *stored == *fresh_text {
        info!(public_key = %fresh.public_key_hex(), "created new identity");
        Ok(fresh)
    } else {
        let winner = parse_stored(&stored)?;
        info!(
            public_key = %winner.public_key_hex(),
            "identity was created concurrently; adopting stored one"
        );
        Ok(winner)
    }
}

fn parse_stored(text: &str) -> Result<Identity, StepError> {
    Identity::from_text(text).map_err(|e| StepError::corrupt(keys::IDENTITY, e.to_string()))
}
