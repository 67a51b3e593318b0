//! Bech32 account addresses: `bech32(prefix, RIPEMD160(SHA256(compressed_pubkey)))`.

use bech32::{FromBase32, ToBase32, Variant};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::{CryptoError, Result};

/// Human-readable prefix of wallet addresses.
pub const ACCOUNT_PREFIX: &str = "secret";

/// Account id length in bytes.
pub const ACCOUNT_ID_LEN: usize = 20;

/// 20-byte account id of a compressed public key.
pub fn account_id(compressed_pubkey: &[u8]) -> [u8; ACCOUNT_ID_LEN] {
    let sha = Sha256::digest(compressed_pubkey);
    let ripe = Ripemd160::digest(sha);
    let mut id = [0u8; ACCOUNT_ID_LEN];
    id.copy_from_slice(&ripe);
    id
}

pub fn from_public_key(prefix: &str, compressed_pubkey: &[u8]) -> Result<String> {
    encode(prefix, &account_id(compressed_pubkey))
}

pub fn encode(prefix: &str, payload: &[u8]) -> Result<String> {
    bech32::encode(prefix, payload.to_base32(), Variant::Bech32)
        .map_err(|e| CryptoError::Address(e.to_string()))
}

/// Split an address into its prefix and payload bytes.
pub fn decode(address: &str) -> Result<(String, Vec<u8>)> {
    let (prefix, data, variant) =
        bech32::decode(address).map_err(|e| CryptoError::Address(e.to_string()))?;
    if variant != Variant::Bech32 {
        return Err(CryptoError::Address("expected bech32, got bech32m".into()));
    }
    let payload = Vec::<u8>::from_base32(&data).map_err(|e| CryptoError::Address(e.to_string()))?;
    Ok((prefix, payload))
}

/// Check that `address` is a well-formed account address under `prefix`.
pub fn validate(prefix: &str, address: &str) -> Result<()> {
    let (found, payload) = decode(address)?;
    if found != prefix {
        return Err(CryptoError::Address(format!(
            "prefix mismatch: expected '{prefix}', got '{found}'"
        )));
    }
    if payload.len() != ACCOUNT_ID_LEN {
        return Err(CryptoError::InvalidKeyLength {
            expected: ACCOUNT_ID_LEN,
            actual: payload.len(),
        });
    }
    Ok(())
}
