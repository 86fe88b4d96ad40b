use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use story_types::Address;

/// An author's Ed25519 keypair. The public half is the author's [`Address`].
pub struct Keypair(ed25519_dalek::SigningKey);

/// Ed25519 signature; doubles as a transaction identifier.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "signature_serde")] ed25519_dalek::Signature);

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut csprng = rand::thread_rng();
        Self(ed25519_dalek::SigningKey::generate(&mut csprng))
    }

    /// Create from a raw 32-byte secret.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&bytes))
    }

    /// Parse a 64-character hex secret.
    pub fn from_secret_hex(s: &str) -> Result<Self, KeypairError> {
        let bytes = hex::decode(s.trim()).map_err(|e| KeypairError::Malformed(e.to_string()))?;
        let secret: [u8; 32] = bytes
            .try_into()
            .map_err(|_| KeypairError::Malformed("secret must be 32 bytes".into()))?;
        Ok(Self::from_secret_bytes(secret))
    }

    /// The author identity for this keypair.
    pub fn address(&self) -> Address {
        Address::new(self.0.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        use ed25519_dalek::Signer;
        Signature(self.0.sign(message))
    }

    pub fn secret_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// Read a keypair file: a JSON array of 64 bytes (secret || public).
    pub fn read_file(path: &Path) -> Result<Self, KeypairError> {
        let raw = fs::read_to_string(path)?;
        let bytes: Vec<u8> =
            serde_json::from_str(&raw).map_err(|e| KeypairError::Malformed(e.to_string()))?;
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| KeypairError::Malformed("expected 64 bytes".into()))?;
        let key = ed25519_dalek::SigningKey::from_keypair_bytes(&arr)
            .map_err(|_| KeypairError::Malformed("public half does not match secret".into()))?;
        Ok(Self(key))
    }

    /// Write this keypair in the format read by [`Keypair::read_file`].
    pub fn write_file(&self, path: &Path) -> Result<(), KeypairError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = self.0.to_keypair_bytes().to_vec();
        let json =
            serde_json::to_string(&bytes).map_err(|e| KeypairError::Malformed(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl Signature {
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self(ed25519_dalek::Signature::from_bytes(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_bytes())
    }
}

/// Verify `signature` over `message` by the key whose public half is `signer`.
pub fn verify_signature(
    signer: &Address,
    message: &[u8],
    signature: &Signature,
) -> Result<(), SignatureError> {
    use ed25519_dalek::Verifier;
    let key = ed25519_dalek::VerifyingKey::from_bytes(signer.as_bytes())
        .map_err(|_| SignatureError::InvalidKey)?;
    key.verify(message, &signature.0)
        .map_err(|_| SignatureError::InvalidSignature)
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({}, <redacted>)", self.address().short())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", hex::encode(&self.0.to_bytes()[..8]))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Errors from signature verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid key")]
    InvalidKey,
}

/// Errors from loading or storing keypairs.
#[derive(Debug, thiserror::Error)]
pub enum KeypairError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed keypair: {0}")]
    Malformed(String),
}

mod signature_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(sig: &ed25519_dalek::Signature, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&sig.to_bytes())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ed25519_dalek::Signature, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Vec::deserialize(deserializer)?;
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 64-byte signature"))?;
        Ok(ed25519_dalek::Signature::from_bytes(&arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"create root");
        assert!(verify_signature(&kp.address(), b"create root", &sig).is_ok());
    }

    #[test]
    fn verify_fails_on_wrong_message() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"correct");
        assert_eq!(
            verify_signature(&kp.address(), b"tampered", &sig),
            Err(SignatureError::InvalidSignature)
        );
    }

    #[test]
    fn verify_fails_with_other_author() {
        let a = Keypair::generate();
        let b = Keypair::generate();
        let sig = a.sign(b"message");
        assert!(verify_signature(&b.address(), b"message", &sig).is_err());
    }

    #[test]
    fn secret_hex_reproduces_address() {
        let kp = Keypair::generate();
        let restored = Keypair::from_secret_hex(&hex::encode(kp.secret_bytes())).unwrap();
        assert_eq!(kp.address(), restored.address());
    }

    #[test]
    fn secret_hex_rejects_short_input() {
        assert!(matches!(
            Keypair::from_secret_hex("abcd"),
            Err(KeypairError::Malformed(_))
        ));
    }

    #[test]
    fn keypair_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("id.json");
        let kp = Keypair::generate();
        kp.write_file(&path).unwrap();
        let loaded = Keypair::read_file(&path).unwrap();
        assert_eq!(kp.address(), loaded.address());
    }

    #[test]
    fn keypair_file_with_wrong_public_half_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.json");
        let mut bytes = vec![1u8; 32];
        bytes.extend_from_slice(&[2u8; 32]);
        fs::write(&path, serde_json::to_string(&bytes).unwrap()).unwrap();
        assert!(Keypair::read_file(&path).is_err());
    }

    #[test]
    fn debug_redacts_secret() {
        let kp = Keypair::generate();
        assert!(format!("{kp:?}").contains("redacted"));
    }
}
