use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{decode_32, TypeError};

/// The 32-byte title seed argument carried by node-creating instructions.
///
/// A well-formed seed is the SHA-256 digest of the node's title. This type
/// does not enforce that; the program checks it on admission.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TitleSeed([u8; 32]);

impl TitleSeed {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        decode_32(s).map(Self)
    }
}

impl AsRef<[u8]> for TitleSeed {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for TitleSeed {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for TitleSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TitleSeed({})", hex::encode(&self.0[..4]))
    }
}
