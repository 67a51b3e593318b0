//! Wallet signature envelope.

use serde::{Deserialize, Serialize};

/// Amino type tag of secp256k1 public keys.
pub const SECP256K1_PUBKEY_TYPE: &str = "tendermint/PubKeySecp256k1";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubKey {
    #[serde(rename = "type")]
    pub kind: String,
    /// Base64 of the compressed public key.
    pub value: String,
}

/// What a wallet signer returns: the public key that signed and a base64
/// `r || s` signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdSignature {
    pub pub_key: PubKey,
    pub signature: String,
}
