//! Secrets sealed at rest.
//!
//! A [`SealedSecret`] is self-describing: it carries the Argon2id parameters,
//! salt and nonce next to the ciphertext, base64-encoded so it can be stored
//! inside a JSON record.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::argon2id::{self, KdfParams};
use crate::chacha20::{self, NONCE_SIZE};
use crate::{CryptoError, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedSecret {
    pub kdf: KdfParams,
    pub salt: String,
    pub nonce: String,
    pub ciphertext: String,
}

impl SealedSecret {
    /// Encrypt `plaintext` under a key derived from `passphrase`; `aad` is
    /// authenticated but not stored.
    pub fn seal(passphrase: &[u8], plaintext: &[u8], aad: &[u8], kdf: KdfParams) -> Result<Self> {
        let salt = argon2id::generate_salt();
        let nonce = chacha20::random_nonce();
        let key = argon2id::derive_key(passphrase, &salt, kdf)?;
        let ciphertext = chacha20::encrypt(&key, &nonce, plaintext, aad)?;
        Ok(Self {
            kdf,
            salt: STANDARD.encode(salt),
            nonce: STANDARD.encode(nonce),
            ciphertext: STANDARD.encode(ciphertext),
        })
    }

    /// Decrypt with the same `passphrase` and `aad` used to seal.
    pub fn open(&self, passphrase: &[u8], aad: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let salt = decode_field("salt", &self.salt)?;
        let nonce_bytes = decode_field("nonce", &self.nonce)?;
        let nonce: [u8; NONCE_SIZE] =
            nonce_bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: NONCE_SIZE,
                    actual: nonce_bytes.len(),
                })?;
        let ciphertext = decode_field("ciphertext", &self.ciphertext)?;

        let key = argon2id::derive_key(passphrase, &salt, self.kdf)?;
        chacha20::decrypt(&key, &nonce, &ciphertext, aad).map(Zeroizing::new)
    }
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(value)
        .map_err(|e| CryptoError::InvalidInput(format!("{name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams::insecure_fast()
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let sealed = SealedSecret::seal(b"passphrase", b"abandon about", b"aad", fast()).expect("seal");
        let opened = sealed.open(b"passphrase", b"aad").expect("open");
        assert_eq!(opened.as_slice(), b"abandon about");
    }

    #[test]
    fn test_wrong_passphrase_fails() {
        let sealed = SealedSecret::seal(b"right", b"secret", b"", fast()).expect("seal");
        assert!(matches!(
            sealed.open(b"wrong", b""),
            Err(CryptoError::AeadDecryption)
        ));
    }

    #[test]
    fn test_aad_is_bound() {
        let sealed = SealedSecret::seal(b"pw", b"secret", b"secret1aaa", fast()).expect("seal");
        assert!(sealed.open(b"pw", b"secret1bbb").is_err());
    }

    #[test]
    fn test_each_seal_is_fresh() {
        let a = SealedSecret::seal(b"pw", b"same", b"", fast()).expect("seal");
        let b = SealedSecret::seal(b"pw", b"same", b"", fast()).expect("seal");
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_json_shape() {
        let sealed = SealedSecret::seal(b"pw", b"x", b"", fast()).expect("seal");
        let json = serde_json::to_value(&sealed).expect("serialize");
        assert_eq!(json["kdf"]["m_cost"], 8);
        assert!(json["ciphertext"].is_string());
        let back: SealedSecret = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, sealed);
    }

    #[test]
    fn test_malformed_nonce_rejected() {
        let mut sealed = SealedSecret::seal(b"pw", b"x", b"", fast()).expect("seal");
        sealed.nonce = STANDARD.encode([0u8; 4]);
        assert!(matches!(
            sealed.open(b"pw", b""),
            Err(CryptoError::InvalidKeyLength { expected: 12, actual: 4 })
        ));
    }
}
