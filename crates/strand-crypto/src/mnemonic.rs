//! BIP-39 mnemonics for wallet creation.
//!
//! Wallets are created from 16 bytes of fresh entropy, which encodes to a
//! 12-word English phrase. The phrase is the only wallet secret that is ever
//! persisted; every key is re-derived from it.

use std::fmt;

use rand::RngCore;
use zeroize::Zeroizing;

use crate::{CryptoError, Result};

/// Entropy length for a 12-word phrase.
pub const ENTROPY_LEN: usize = 16;

/// A validated BIP-39 phrase.
#[derive(Clone)]
pub struct Mnemonic {
    inner: bip39::Mnemonic,
}

impl Mnemonic {
    /// Draw fresh entropy from the OS CSPRNG and encode it.
    pub fn generate() -> Result<Self> {
        let mut entropy = Zeroizing::new([0u8; ENTROPY_LEN]);
        rand::rngs::OsRng
            .try_fill_bytes(&mut entropy[..])
            .map_err(|e| CryptoError::Mnemonic(format!("entropy source failed: {e}")))?;
        Self::from_entropy(&entropy[..])
    }

    pub fn from_entropy(entropy: &[u8]) -> Result<Self> {
        let inner =
            bip39::Mnemonic::from_entropy(entropy).map_err(|e| CryptoError::Mnemonic(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Parse and checksum-validate an English phrase.
    pub fn parse(phrase: &str) -> Result<Self> {
        let inner = bip39::Mnemonic::parse(phrase).map_err(|e| CryptoError::Mnemonic(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn phrase(&self) -> Zeroizing<String> {
        Zeroizing::new(self.inner.to_string())
    }

    pub fn word_count(&self) -> usize {
        self.inner.word_count()
    }

    /// BIP-39 seed with an empty passphrase.
    pub fn to_seed(&self) -> Zeroizing<[u8; 64]> {
        Zeroizing::new(self.inner.to_seed(""))
    }
}

impl fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mnemonic")
            .field("words", &self.word_count())
            .finish_non_exhaustive()
    }
}
