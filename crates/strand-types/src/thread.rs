//! Thread identifiers.
//!
//! A thread id is `version || variant || random`, multibase-encoded as
//! lowercase unpadded base32 with the `b` prefix. Version and variant are
//! single-byte varints.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::{Result, TypesError};

/// Only supported id version.
pub const VERSION: u8 = 0x01;

/// Multibase prefix for lowercase base32.
pub const MULTIBASE_BASE32: char = 'b';

/// Length of the random part of freshly generated ids.
pub const RANDOM_LEN: usize = 32;

/// Shortest random part accepted when parsing.
const MIN_RANDOM_LEN: usize = 16;

const ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThreadVariant {
    Raw,
    AccessControlled,
}

impl ThreadVariant {
    fn code(self) -> u8 {
        match self {
            Self::Raw => 0x55,
            Self::AccessControlled => 0x70,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            0x55 => Some(Self::Raw),
            0x70 => Some(Self::AccessControlled),
            _ => None,
        }
    }
}

/// A parsed, validated thread id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ThreadId {
    variant: ThreadVariant,
    random: Vec<u8>,
}

impl ThreadId {
    /// Fresh id with [`RANDOM_LEN`] random bytes.
    pub fn random(variant: ThreadVariant) -> Self {
        let mut random = vec![0u8; RANDOM_LEN];
        rand::rngs::OsRng.fill_bytes(&mut random);
        Self { variant, random }
    }

    pub fn variant(&self) -> ThreadVariant {
        self.variant
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 + self.random.len());
        bytes.push(VERSION);
        bytes.push(self.variant.code());
        bytes.extend_from_slice(&self.random);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, String> {
        let (version, rest) = bytes.split_first().ok_or("empty id")?;
        if *version != VERSION {
            return Err(format!("unsupported version {version:#04x}"));
        }
        let (code, random) = rest.split_first().ok_or("missing variant")?;
        let variant =
            ThreadVariant::from_code(*code).ok_or_else(|| format!("unknown variant {code:#04x}"))?;
        if random.len() < MIN_RANDOM_LEN {
            return Err(format!("random part too short ({} bytes)", random.len()));
        }
        Ok(Self {
            variant,
            random: random.to_vec(),
        })
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{MULTIBASE_BASE32}{}", base32_encode(&self.to_bytes()))
    }
}

impl FromStr for ThreadId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: String| TypesError::InvalidThreadId {
            id: s.to_string(),
            reason,
        };
        let body = s
            .strip_prefix(MULTIBASE_BASE32)
            .ok_or_else(|| invalid("expected multibase prefix 'b'".into()))?;
        let bytes = base32_decode(body).ok_or_else(|| invalid("not lowercase base32".into()))?;
        Self::from_bytes(&bytes).map_err(invalid)
    }
}

impl TryFrom<String> for ThreadId {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ThreadId> for String {
    fn from(id: ThreadId) -> Self {
        id.to_string()
    }
}

/// One entry of a thread listing, as returned by the database service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadInfo {
    /// Unparsed id; parsing happens when the thread is adopted.
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

fn base32_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() * 8).div_ceil(5));
    let mut buffer: u16 = 0;
    let mut bits = 0u32;
    for &byte in bytes {
        buffer = (buffer << 8) | u16::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(char::from(ALPHABET[usize::from((buffer >> bits) & 0x1f)]));
        }
    }
    if bits > 0 {
        out.push(char::from(ALPHABET[usize::from((buffer << (5 - bits)) & 0x1f)]));
    }
    out
}

fn base32_decode(text: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut buffer: u16 = 0;
    let mut bits = 0u32;
    for c in text.bytes() {
        let value = ALPHABET.iter().position(|&a| a == c)?;
        buffer = (buffer << 5) | value as u16;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
        }
        buffer &= (1 << bits) - 1;
    }
    // Leftover bits must be zero padding.
    if buffer != 0 {
        return None;
    }
    Some(out)
}
