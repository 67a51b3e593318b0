//! secp256k1 wallet keys derived along the Secret Network BIP-44 path.
//!
//! `mnemonic → seed → m/44'/529'/0'/0/0 → secp256k1 signing key`. The same
//! derivation runs at creation and on every reload, so a wallet can always be
//! rebuilt from its phrase alone.

use std::fmt;

use bip32::{DerivationPath, XPrv};
use k256::ecdsa::signature::{Signer, Verifier};

use crate::address;
use crate::mnemonic::Mnemonic;
use crate::{CryptoError, Result};

/// BIP-44 derivation path (coin type 529).
pub const HD_PATH: &str = "m/44'/529'/0'/0/0";

/// Length of a SEC1-compressed public key.
pub const COMPRESSED_PUBKEY_LEN: usize = 33;

/// Signing key of a wallet.
#[derive(Clone)]
pub struct WalletKey {
    signing: k256::ecdsa::SigningKey,
}

/// Public half of a [`WalletKey`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletPublicKey {
    inner: k256::ecdsa::VerifyingKey,
}

/// 64-byte `r || s` ECDSA signature over SHA-256 of the message, low-S normalized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletSignature {
    inner: k256::ecdsa::Signature,
}

impl WalletKey {
    /// Derive the wallet key for `mnemonic` at [`HD_PATH`].
    pub fn from_mnemonic(mnemonic: &Mnemonic) -> Result<Self> {
        let seed = mnemonic.to_seed();
        Self::derive(&seed[..], HD_PATH)
    }

    /// Derive along an arbitrary BIP-32 path.
    pub fn derive(seed: &[u8], path: &str) -> Result<Self> {
        let path: DerivationPath = path
            .parse()
            .map_err(|e: bip32::Error| CryptoError::KeyDerivation(format!("bad path '{path}': {e}")))?;
        let xprv = XPrv::derive_from_path(seed, &path)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        Ok(Self {
            signing: xprv.private_key().clone(),
        })
    }

    pub fn public_key(&self) -> WalletPublicKey {
        WalletPublicKey {
            inner: self.signing.verifying_key().clone(),
        }
    }

    pub fn sign(&self, message: &[u8]) -> Result<WalletSignature> {
        let inner: k256::ecdsa::Signature = self
            .signing
            .try_sign(message)
            .map_err(|e| CryptoError::InvalidInput(format!("signing failed: {e}")))?;
        Ok(WalletSignature { inner })
    }
}

impl fmt::Debug for WalletKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletKey")
            .field("public", &hex::encode(self.public_key().to_compressed()))
            .finish_non_exhaustive()
    }
}

impl WalletPublicKey {
    /// Parse a SEC1-encoded point.
    pub fn from_sec1(bytes: &[u8]) -> Result<Self> {
        let inner = k256::ecdsa::VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| CryptoError::InvalidInput(format!("bad secp256k1 key: {e}")))?;
        Ok(Self { inner })
    }

    pub fn to_compressed(&self) -> Vec<u8> {
        self.inner.to_encoded_point(true).as_bytes().to_vec()
    }

    /// Account address of this key under `prefix`.
    pub fn address(&self, prefix: &str) -> Result<String> {
        address::from_public_key(prefix, &self.to_compressed())
    }

    pub fn verify(&self, message: &[u8], signature: &WalletSignature) -> Result<()> {
        self.inner
            .verify(message, &signature.inner)
            .map_err(|_| CryptoError::SignatureVerification)
    }
}

impl WalletSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let inner = k256::ecdsa::Signature::from_slice(bytes)
            .map_err(|e| CryptoError::InvalidInput(format!("bad signature: {e}")))?;
        Ok(Self { inner })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner.to_bytes().to_vec()
    }
}
