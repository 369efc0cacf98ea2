//! Ledger entity identifiers (`shard.realm.num`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntityIdError {
    #[error("Entity id '{0}' must have the form shard.realm.num")]
    Format(String),

    #[error("Entity id '{input}' has an invalid number: {reason}")]
    Number { input: String, reason: String },
}

/// Raw `shard.realm.num` triple shared by every entity type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl EntityId {
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }
}

impl FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        let [shard, realm, num] = parts.as_slice() else {
            return Err(EntityIdError::Format(s.to_string()));
        };

        let parse = |part: &str| {
            part.parse::<u64>().map_err(|e| EntityIdError::Number {
                input: s.to_string(),
                reason: e.to_string(),
            })
        };

        Ok(Self::new(parse(shard)?, parse(realm)?, parse(num)?))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

macro_rules! entity_id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(EntityId);

        impl $name {
            pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
                Self(EntityId::new(shard, realm, num))
            }

            pub const fn num(&self) -> u64 {
                self.0.num
            }

            pub const fn entity(&self) -> EntityId {
                self.0
            }
        }

        impl From<EntityId> for $name {
            fn from(id: EntityId) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = EntityIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<EntityId>().map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

entity_id_type!(
    /// Account identifier
    AccountId
);
entity_id_type!(
    /// Consensus topic identifier
    TopicId
);
entity_id_type!(
    /// Fungible token identifier
    TokenId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id: AccountId = "0.0.1001".parse().unwrap();
        assert_eq!(id, AccountId::new(0, 0, 1001));
        assert_eq!(id.to_string(), "0.0.1001");
        assert_eq!(id.num(), 1001);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "0.0".parse::<TokenId>(),
            Err(EntityIdError::Format(_))
        ));
        assert!(matches!(
            "0.0.x".parse::<TopicId>(),
            Err(EntityIdError::Number { .. })
        ));
        assert!("0.0.1.2".parse::<AccountId>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let id = TokenId::new(0, 0, 42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0.0.42\"");
        let back: TokenId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
