//! Ed25519 identity keys.
//!
//! The user identity presented to the thread database is an Ed25519 keypair.
//! Its textual form is `ed25519:` followed by the hex-encoded 32-byte seed,
//! which is what the credential store keeps under `user-private-identity`.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{Signer, Verifier};
use zeroize::Zeroizing;

use crate::{CryptoError, Result};

/// Scheme prefix of the textual keypair encoding.
pub const TEXT_PREFIX: &str = "ed25519:";

/// Seed length in bytes.
pub const SEED_LEN: usize = 32;

/// An Ed25519 public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey {
    inner: ed25519_dalek::VerifyingKey,
}

/// An Ed25519 signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    inner: ed25519_dalek::Signature,
}

/// An Ed25519 keypair. The secret half is zeroized on drop by `ed25519-dalek`.
#[derive(Clone)]
pub struct Keypair {
    secret: ed25519_dalek::SigningKey,
}

impl Keypair {
    /// Generate a keypair from the operating system CSPRNG.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            secret: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Rebuild a keypair from its 32-byte seed.
    pub fn from_seed(seed: &[u8; SEED_LEN]) -> Self {
        Self {
            secret: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// The 32-byte seed. Callers must not let it outlive their use.
    pub fn seed(&self) -> Zeroizing<[u8; SEED_LEN]> {
        Zeroizing::new(self.secret.to_bytes())
    }

    pub fn public(&self) -> PublicKey {
        PublicKey {
            inner: self.secret.verifying_key(),
        }
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            inner: self.secret.sign(message),
        }
    }

    /// Encode as `ed25519:<hex seed>`.
    pub fn to_text(&self) -> Zeroizing<String> {
        let seed = self.seed();
        Zeroizing::new(format!("{TEXT_PREFIX}{}", hex::encode(seed.as_slice())))
    }

    /// Decode the form produced by [`Keypair::to_text`].
    pub fn from_text(text: &str) -> Result<Self> {
        let encoded = text
            .trim()
            .strip_prefix(TEXT_PREFIX)
            .ok_or_else(|| CryptoError::InvalidInput(format!("missing '{TEXT_PREFIX}' prefix")))?;
        let bytes = Zeroizing::new(
            hex::decode(encoded).map_err(|e| CryptoError::InvalidInput(e.to_string()))?,
        );
        let seed: [u8; SEED_LEN] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: SEED_LEN,
                    actual: bytes.len(),
                })?;
        let seed = Zeroizing::new(seed);
        Ok(Self::from_seed(&seed))
    }
}

impl FromStr for Keypair {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_text(s)
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public", &self.public().to_hex())
            .finish_non_exhaustive()
    }
}

impl PublicKey {
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let inner = ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map_err(|e| CryptoError::InvalidInput(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.inner.as_bytes())
    }

    /// Verify a signature on a message.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        self.inner
            .verify(message, &signature.inner)
            .map_err(|_| CryptoError::SignatureVerification)
    }
}

impl Signature {
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self {
            inner: ed25519_dalek::Signature::from_bytes(bytes),
        }
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        self.inner.to_bytes()
    }
}
