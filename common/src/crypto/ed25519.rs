//! Ed25519 key material used to sign ledger transactions.
//!
//! Keys are accepted either as raw hex (32 bytes) or as the hex of their
//! DER encoding, which is how account keys are usually exported from
//! ledger portals and SDKs.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH,
    SIGNATURE_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Size of an ed25519 private key seed in bytes.
pub const PRIVATE_KEY_SIZE: usize = SECRET_KEY_LENGTH;

/// Size of an ed25519 public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of an ed25519 signature in bytes.
pub const SIGNATURE_SIZE: usize = SIGNATURE_LENGTH;

/// DER prefix of a PKCS#8 ed25519 private key, followed by the 32 byte seed.
pub const PRIVATE_KEY_DER_PREFIX: &str = "302e020100300506032b657004220420";

/// DER prefix of an ed25519 SubjectPublicKeyInfo, followed by the 32 byte key.
pub const PUBLIC_KEY_DER_PREFIX: &str = "302a300506032b6570032100";

/// Error types for key parsing and signature checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Decoded key material has the wrong length.
    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Expected byte length
        expected: usize,
        /// Actual byte length
        actual: usize,
    },

    /// Invalid signature length.
    #[error("Invalid signature length: expected {}, got {}", SIGNATURE_SIZE, _0)]
    InvalidSignatureLength(usize),

    /// Bytes do not form a valid ed25519 point.
    #[error("Failed to parse public key")]
    InvalidPublicKey,

    /// Signature verification failed.
    #[error("Signature verification failed")]
    VerificationFailed,

    /// Hex decoding error.
    #[error("Invalid hex string: {0}")]
    Hex(String),

    /// Threshold outside `[1, keys]`.
    #[error("Invalid threshold {threshold} for a key list of {keys} keys")]
    InvalidThreshold {
        /// Requested threshold
        threshold: u32,
        /// Number of keys in the list
        keys: usize,
    },
}

fn decode_hex(input: &str) -> Result<Vec<u8>, KeyError> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(trimmed).map_err(|e| KeyError::Hex(e.to_string()))
}

fn strip_der<'a>(input: &'a str, prefix: &str) -> &'a str {
    let trimmed = input.trim();
    match (trimmed.get(..prefix.len()), trimmed.get(prefix.len()..)) {
        (Some(head), Some(rest)) if !rest.is_empty() && head.eq_ignore_ascii_case(prefix) => rest,
        _ => trimmed,
    }
}

fn to_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N], KeyError> {
    bytes.try_into().map_err(|_| KeyError::InvalidLength {
        expected: N,
        actual: bytes.len(),
    })
}

/// Ed25519 private key.
///
/// The seed is never printed. `SigningKey` zeroizes it on drop.
#[derive(Clone)]
pub struct PrivateKey {
    signing_key: SigningKey,
}

impl PrivateKey {
    /// Generate a new random key using a cryptographically secure RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Create a key from its 32 byte seed.
    pub fn from_bytes(bytes: &[u8; PRIVATE_KEY_SIZE]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    /// Parse a key from raw hex or DER hex.
    pub fn from_str_ed25519(input: &str) -> Result<Self, KeyError> {
        let bytes = decode_hex(strip_der(input, PRIVATE_KEY_DER_PREFIX))?;
        Ok(Self::from_bytes(&to_array(&bytes)?))
    }

    /// Get the public half of this key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message and return the signature.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }

    /// Hex of the raw seed.
    pub fn to_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// Hex of the DER encoding.
    pub fn to_der_hex(&self) -> String {
        format!("{}{}", PRIVATE_KEY_DER_PREFIX, self.to_hex())
    }
}

impl FromStr for PrivateKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_ed25519(s)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key())
            .field("seed", &"[REDACTED]")
            .finish()
    }
}

impl<'de> Deserialize<'de> for PrivateKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Ed25519 public key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Create a public key from raw bytes, checking it is a curve point.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Result<Self, KeyError> {
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Parse a public key from raw hex or DER hex.
    pub fn from_str_ed25519(input: &str) -> Result<Self, KeyError> {
        let bytes = decode_hex(strip_der(input, PUBLIC_KEY_DER_PREFIX))?;
        Self::from_bytes(to_array(&bytes)?)
    }

    /// Get the raw bytes of the public key.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Hex of the DER encoding.
    pub fn to_der_hex(&self) -> String {
        format!("{}{}", PUBLIC_KEY_DER_PREFIX, self.to_hex())
    }

    /// Verify a signature on a message.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), KeyError> {
        let verifying_key =
            VerifyingKey::from_bytes(&self.0).map_err(|_| KeyError::InvalidPublicKey)?;
        verifying_key
            .verify(message, &DalekSignature::from_bytes(&signature.0))
            .map_err(|_| KeyError::VerificationFailed)
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_ed25519(s)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_der_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Ed25519 signature (64 bytes).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    /// Create a signature from raw bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create a signature from a slice.
    pub fn from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes = slice
            .try_into()
            .map_err(|_| KeyError::InvalidSignatureLength(slice.len()))?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes of the signature.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &self.to_hex()[..16])
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = decode_hex(&s).map_err(serde::de::Error::custom)?;
        Self::from_slice(&bytes).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED_HEX: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    #[test]
    fn test_parse_raw_and_der_private_key() {
        let raw = PrivateKey::from_str_ed25519(SEED_HEX).unwrap();
        let der = PrivateKey::from_str_ed25519(&format!("{PRIVATE_KEY_DER_PREFIX}{SEED_HEX}"))
            .unwrap();
        assert_eq!(raw.public_key(), der.public_key());
        assert_eq!(raw.to_hex(), SEED_HEX);
    }

    #[test]
    fn test_known_public_key() {
        // RFC 8032 test vector 1
        let key = PrivateKey::from_str_ed25519(SEED_HEX).unwrap();
        assert_eq!(
            key.public_key().to_hex(),
            "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a"
        );
    }

    #[test]
    fn test_public_key_der_roundtrip() {
        let key = PrivateKey::generate().public_key();
        let parsed = PublicKey::from_str_ed25519(&key.to_der_hex()).unwrap();
        assert_eq!(key, parsed);
    }

    #[test]
    fn test_invalid_key_length() {
        let err = PrivateKey::from_str_ed25519("abcd").unwrap_err();
        assert_eq!(
            err,
            KeyError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
        assert!(matches!(
            PrivateKey::from_str_ed25519("zz"),
            Err(KeyError::Hex(_))
        ));
    }

    #[test]
    fn test_non_ascii_key_is_rejected() {
        let input = format!("{}\u{e9}{}", "a".repeat(31), "b".repeat(40));
        assert!(matches!(
            PrivateKey::from_str_ed25519(&input),
            Err(KeyError::Hex(_))
        ));
        assert!(matches!(
            PublicKey::from_str_ed25519(&format!("{}\u{e9}", "c".repeat(23))),
            Err(KeyError::Hex(_))
        ));

        let json = serde_json::to_string(&input).unwrap();
        let err = serde_json::from_str::<PrivateKey>(&json).unwrap_err();
        assert!(err.to_string().contains("Invalid hex string"), "{}", err);
    }

    #[test]
    fn test_sign_and_verify() {
        let key = PrivateKey::generate();
        let signature = key.sign(b"Hello, Hedera!");
        assert!(key.public_key().verify(b"Hello, Hedera!", &signature).is_ok());
        assert_eq!(
            key.public_key().verify(b"tampered", &signature),
            Err(KeyError::VerificationFailed)
        );
    }

    #[test]
    fn test_debug_redacts_seed() {
        let key = PrivateKey::from_str_ed25519(SEED_HEX).unwrap();
        let debug = format!("{key:?}");
        assert!(!debug.contains(SEED_HEX));
        assert!(debug.contains("REDACTED"));
    }
}
