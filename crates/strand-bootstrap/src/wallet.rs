//! Secondary-chain wallet: an address plus a signer.
//!
//! The persisted record never holds executable or key material in the
//! clear. It stores the address and a [`SignerRecord`] describing how to
//! rebuild the signer: the derivation scheme, the HD path and the mnemonic
//! sealed under the credential passphrase. Reloading re-runs the derivation
//! and refuses the record if the rebuilt address differs from the stored one.

use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use strand_crypto::address::{self, ACCOUNT_PREFIX};
use strand_crypto::argon2id::KdfParams;
use strand_crypto::mnemonic::Mnemonic;
use strand_crypto::sealed::SealedSecret;
use strand_crypto::secp256k1::{WalletKey, WalletPublicKey, WalletSignature, HD_PATH};
use strand_crypto::CryptoError;
use strand_store::CredentialStore;
use strand_types::signature::SECP256K1_PUBKEY_TYPE;
use strand_types::{keys, PubKey, StdSignature};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::error::StepError;

/// Derivation scheme tag written into every record.
pub const SIGNER_SCHEME: &str = "bip39-secp256k1";

/// Persisted form of a wallet, stored as JSON under `user-secret-wallet`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub address: String,
    pub signer: SignerRecord,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerRecord {
    pub scheme: String,
    pub hd_path: String,
    /// The mnemonic phrase, with the wallet address as associated data.
    pub sealed: SealedSecret,
}

/// Produces [`StdSignature`]s with the wallet key.
#[derive(Clone)]
pub struct Signer {
    key: Arc<WalletKey>,
}

impl Signer {
    fn new(key: WalletKey) -> Self {
        Self { key: Arc::new(key) }
    }

    pub fn public_key(&self) -> WalletPublicKey {
        self.key.public_key()
    }

    /// Sign `sign_bytes`, returning the public key and base64 `r || s`.
    pub async fn sign(&self, sign_bytes: &[u8]) -> Result<StdSignature, CryptoError> {
        let signature = self.key.sign(sign_bytes)?;
        Ok(StdSignature {
            pub_key: PubKey {
                kind: SECP256K1_PUBKEY_TYPE.to_string(),
                value: STANDARD.encode(self.public_key().to_compressed()),
            },
            signature: STANDARD.encode(signature.to_bytes()),
        })
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub struct Wallet {
    address: String,
    signer: Signer,
}

impl Wallet {
    /// Derive the wallet for `mnemonic` at [`HD_PATH`].
    pub fn from_mnemonic(mnemonic: &Mnemonic) -> Result<Self, CryptoError> {
        let key = WalletKey::from_mnemonic(mnemonic)?;
        let address = key.public_key().address(ACCOUNT_PREFIX)?;
        Ok(Self {
            address,
            signer: Signer::new(key),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }
}

/// Check that `signature` was made over `sign_bytes` by the key behind `address`.
pub fn verify_signature(
    address: &str,
    sign_bytes: &[u8],
    signature: &StdSignature,
) -> Result<(), CryptoError> {
    if signature.pub_key.kind != SECP256K1_PUBKEY_TYPE {
        return Err(CryptoError::InvalidInput(format!(
            "unsupported public key type '{}'",
            signature.pub_key.kind
        )));
    }
    let pub_key = STANDARD
        .decode(&signature.pub_key.value)
        .map_err(|e| CryptoError::InvalidInput(format!("pub_key: {e}")))?;
    let pub_key = WalletPublicKey::from_sec1(&pub_key)?;
    if pub_key.address(ACCOUNT_PREFIX)? != address {
        return Err(CryptoError::Address(
            "public key does not belong to address".into(),
        ));
    }
    let sig = STANDARD
        .decode(&signature.signature)
        .map_err(|e| CryptoError::InvalidInput(format!("signature: {e}")))?;
    pub_key.verify(sign_bytes, &WalletSignature::from_bytes(&sig)?)
}

/// Load the stored wallet, or create and persist one on first run.
pub async fn obtain_wallet(
    store: &CredentialStore,
    passphrase: &[u8],
    kdf: KdfParams,
) -> Result<Wallet, StepError> {
    if let Some(json) = store.get(keys::WALLET).await? {
        let wallet = restore(&json, passphrase)?;
        debug!(address = %wallet.address, "wallet restored from credential store");
        return Ok(wallet);
    }

    let mnemonic = Mnemonic::generate()?;
    persist_new(store, &mnemonic, passphrase, kdf).await
}

/// Seal `mnemonic` into a new record and store it unless a record already
/// exists. When one does, the stored wallet is returned instead.
async fn persist_new(
    store: &CredentialStore,
    mnemonic: &Mnemonic,
    passphrase: &[u8],
    kdf: KdfParams,
) -> Result<Wallet, StepError> {
    let wallet = Wallet::from_mnemonic(mnemonic)?;
    let record = WalletRecord {
        address: wallet.address.clone(),
        signer: SignerRecord {
            scheme: SIGNER_SCHEME.to_string(),
            hd_path: HD_PATH.to_string(),
            sealed: SealedSecret::seal(
                passphrase,
                mnemonic.phrase().as_bytes(),
                wallet.address.as_bytes(),
                kdf,
            )?,
        },
    };
    let json = serde_json::to_string(&record)?;
    let stored = store.insert_if_absent(keys::WALLET, &json).await?;

    if stored == json {
        info!(address = %wallet.address, "created new wallet");
        Ok(wallet)
    } else {
        let winner = restore(&stored, passphrase)?;
        info!(
            address = %winner.address,
            "wallet was created concurrently; adopting stored one"
        );
        Ok(winner)
    }
}

fn restore(json: &str, passphrase: &[u8]) -> Result<Wallet, StepError> {
    let corrupt = |reason: String| StepError::corrupt(keys::WALLET, reason);

    let record: WalletRecord =
        serde_json::from_str(json).map_err(|e| corrupt(format!("bad record: {e}")))?;
    if record.signer.scheme != SIGNER_SCHEME {
        return Err(corrupt(format!(
            "unknown signer scheme '{}'",
            record.signer.scheme
        )));
    }
    if record.signer.hd_path != HD_PATH {
        return Err(corrupt(format!(
            "unexpected derivation path '{}'",
            record.signer.hd_path
        )));
    }
    address::validate(ACCOUNT_PREFIX, &record.address)
        .map_err(|e| corrupt(format!("bad stored address: {e}")))?;
    record
        .signer
        .sealed
        .kdf
        .check_limits()
        .map_err(|e| corrupt(e.to_string()))?;

    let phrase = record
        .signer
        .sealed
        .open(passphrase, record.address.as_bytes())
        .map_err(|e| match e {
            CryptoError::AeadDecryption => {
                corrupt("cannot unseal mnemonic (wrong passphrase or tampered record)".into())
            }
            other => corrupt(other.to_string()),
        })?;
    let phrase = std::str::from_utf8(&phrase)
        .map(|p| Zeroizing::new(p.to_string()))
        .map_err(|_| corrupt("sealed mnemonic is not utf-8".into()))?;
    let mnemonic = Mnemonic::parse(&phrase).map_err(|e| corrupt(e.to_string()))?;

    let wallet = Wallet::from_mnemonic(&mnemonic)?;
    if wallet.address != record.address {
        return Err(corrupt(format!(
            "derived address {} does not match stored {}",
            wallet.address, record.address
        )));
    }
    Ok(wallet)
}
