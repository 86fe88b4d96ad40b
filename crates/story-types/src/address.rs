use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{decode_32, TypeError};

/// A 32-byte ledger address.
///
/// The same type names both public identities (an author's Ed25519 public
/// key) and account locations (a story node's derived address). Story node
/// addresses are never assigned; they are derived from content seeds.
///
/// The all-zero value is reserved as [`Address::SENTINEL`], the "no parent"
/// marker carried by root nodes.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; 32]);

impl Address {
    /// The reserved "no parent" address (all zeros).
    pub const SENTINEL: Self = Self([0u8; 32]);

    /// Wrap raw address bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns `true` if this is the sentinel address.
    pub fn is_sentinel(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Copy out the raw 32 bytes.
    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }

    /// Full hex-encoded string (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Abbreviated form for listings: first and last four hex characters.
    pub fn short(&self) -> String {
        let hex = self.to_hex();
        format!("{}...{}", &hex[..4], &hex[hex.len() - 4..])
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        decode_32(s.trim()).map(Self)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Address> for [u8; 32] {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl FromStr for Address {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_default_and_all_zeros() {
        assert_eq!(Address::SENTINEL, Address::default());
        assert!(Address::SENTINEL.is_sentinel());
        assert!(!Address::new([1; 32]).is_sentinel());
    }

    #[test]
    fn hex_roundtrip() {
        let addr = Address::new([0xab; 32]);
        let parsed = Address::from_hex(&addr.to_hex()).unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = Address::from_hex("abcd").unwrap_err();
        assert_eq!(err, TypeError::InvalidLength { expected: 32, actual: 2 });
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(matches!(
            Address::from_hex("zz"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn from_str_trims_whitespace() {
        let addr = Address::new([3; 32]);
        let parsed: Address = format!("  {}\n", addr.to_hex()).parse().unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn short_form() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0x12;
        bytes[1] = 0x34;
        bytes[31] = 0xef;
        let short = Address::new(bytes).short();
        assert_eq!(short, "1234...00ef");
    }

    #[test]
    fn display_is_full_hex() {
        let addr = Address::new([9; 32]);
        assert_eq!(format!("{addr}").len(), 64);
    }

    #[test]
    fn serde_roundtrip() {
        let addr = Address::new([5; 32]);
        let json = serde_json::to_string(&addr).unwrap();
        let parsed: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn ordering_is_bytewise() {
        assert!(Address::new([0; 32]) < Address::new([1; 32]));
    }
}
