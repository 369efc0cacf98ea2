//! Authorization keys: a single ed25519 key or a threshold key list.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::{KeyError, PublicKey};

/// A key that can authorize an entity operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    /// A single ed25519 key
    Single(PublicKey),
    /// A list of keys, optionally with an M-of-N threshold
    List(KeyList),
}

impl Key {
    /// Whether the given signer set satisfies this key.
    pub fn is_satisfied_by(&self, signers: &HashSet<PublicKey>) -> bool {
        match self {
            Key::Single(key) => signers.contains(key),
            Key::List(list) => list.is_satisfied_by(signers),
        }
    }

    /// All single keys reachable from this key.
    pub fn public_keys(&self) -> Vec<PublicKey> {
        match self {
            Key::Single(key) => vec![*key],
            Key::List(list) => list.keys.iter().flat_map(Key::public_keys).collect(),
        }
    }
}

impl From<PublicKey> for Key {
    fn from(key: PublicKey) -> Self {
        Key::Single(key)
    }
}

impl From<KeyList> for Key {
    fn from(list: KeyList) -> Self {
        Key::List(list)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Single(key) => write!(f, "{}", key),
            Key::List(list) => write!(f, "{}", list),
        }
    }
}

/// Ordered list of keys.
///
/// Without a threshold every member must sign. With a threshold `m`,
/// at least `m` members must be satisfied, `1 <= m <= keys.len()`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyList {
    keys: Vec<Key>,
    threshold: Option<u32>,
}

impl KeyList {
    /// Key list requiring every member.
    pub fn new(keys: Vec<Key>) -> Self {
        Self {
            keys,
            threshold: None,
        }
    }

    /// Key list requiring `threshold` of its members.
    pub fn with_threshold(keys: Vec<Key>, threshold: u32) -> Result<Self, KeyError> {
        if threshold == 0 || threshold as usize > keys.len() {
            return Err(KeyError::InvalidThreshold {
                threshold,
                keys: keys.len(),
            });
        }
        Ok(Self {
            keys,
            threshold: Some(threshold),
        })
    }

    /// Members of the list.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Explicit threshold, if any.
    pub fn threshold(&self) -> Option<u32> {
        self.threshold
    }

    /// Number of satisfied members required.
    pub fn required(&self) -> usize {
        self.threshold
            .map(|t| t as usize)
            .unwrap_or(self.keys.len())
    }

    /// Whether at least `required()` members are satisfied.
    pub fn is_satisfied_by(&self, signers: &HashSet<PublicKey>) -> bool {
        let satisfied = self
            .keys
            .iter()
            .filter(|key| key.is_satisfied_by(signers))
            .count();
        satisfied >= self.required()
    }
}

impl fmt::Display for KeyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-of-{} [", self.required(), self.keys.len())?;
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", key)?;
        }
        write!(f, "]")
    }
}
