//! # strand-crypto
//!
//! Cryptographic primitives used while bootstrapping a Strand client.
//!
//! Two independent key families live here: the Ed25519 identity that
//! authenticates the user to the thread database, and the secp256k1 wallet
//! derived from a BIP-39 mnemonic. Long-lived secrets are sealed at rest with
//! an Argon2id-derived key and ChaCha20-Poly1305.
//!
//! ## Modules
//!
//! - [`ed25519`]: identity keypairs and their textual form
//! - [`mnemonic`]: BIP-39 phrase generation and parsing
//! - [`secp256k1`]: BIP-32 wallet key derivation and signing
//! - [`address`]: bech32 account addresses
//! - [`argon2id`]: passphrase key derivation
//! - [`chacha20`]: ChaCha20-Poly1305 AEAD
//! - [`sealed`]: self-describing sealed secrets

pub mod address;
pub mod argon2id;
pub mod chacha20;
pub mod ed25519;
pub mod mnemonic;
pub mod sealed;
pub mod secp256k1;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Signature verification failed.
    #[error("signature verification failed")]
    SignatureVerification,

    /// AEAD decryption failed (wrong key or tampered ciphertext).
    #[error("AEAD decryption failed")]
    AeadDecryption,

    /// AEAD encryption failed.
    #[error("AEAD encryption failed")]
    AeadEncryption,

    /// Key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Argon2id hashing failed.
    #[error("argon2id error: {0}")]
    Argon2(String),

    /// Mnemonic encoding or parsing failed.
    #[error("mnemonic error: {0}")]
    Mnemonic(String),

    /// Address encoding or decoding failed.
    #[error("address error: {0}")]
    Address(String),

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Invalid input data.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
