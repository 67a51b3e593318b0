//! Static API credentials for the thread database service.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which kind of API key the credentials belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    /// User-group key; the scheme used by client applications.
    User,
}

impl KeyType {
    /// Numeric tag used on the wire.
    pub fn code(self) -> u8 {
        match self {
            Self::User => 1,
        }
    }
}

/// API key/secret pair plus scheme tag.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInfo {
    pub key: String,
    pub secret: String,
    #[serde(rename = "type")]
    pub kind: KeyType,
}

impl KeyInfo {
    /// User-group credentials.
    pub fn user(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
            kind: KeyType::User,
        }
    }
}

impl fmt::Debug for KeyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyInfo")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .field("kind", &self.kind)
            .finish()
    }
}
