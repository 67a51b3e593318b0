//! ChaCha20-Poly1305 AEAD encryption (RFC 8439).
//!
//! Used to seal wallet secrets before they reach the credential store.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::RngCore;

use crate::{CryptoError, Result};

/// Nonce size (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Key size (256 bits).
pub const KEY_SIZE: usize = 32;

/// Authentication tag size (128 bits).
pub const TAG_SIZE: usize = 16;

/// Fresh random nonce. Every seal draws a new one.
pub fn random_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Encrypt `plaintext`, authenticating `aad`. Returns ciphertext with the tag appended.
pub fn encrypt(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .encrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::AeadEncryption)
}

/// Decrypt and authenticate. Fails if the key, nonce, `aad` or ciphertext differ.
pub fn decrypt(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::AeadDecryption)
}
