//! Transaction bodies and the signed envelope submitted to the network.
//!
//! A client serializes a [`TransactionBody`] to bytes, signs those exact
//! bytes with every required key and submits a [`SignedTransaction`].
//! The network verifies each signature over the same bytes before it
//! decodes and applies the body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::{
    crypto::{Key, KeyError, PrivateKey, PublicKey, Signature},
    entity::{AccountId, TokenId, TopicId},
    hbar::Hbar,
};

mod receipt;

pub use receipt::{Status, TransactionReceipt};

/// Maximum size of a single topic message in bytes.
pub const MAX_MESSAGE_SIZE: usize = 1024;

/// Payer account plus the instant the transaction becomes valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId {
    pub payer: AccountId,
    pub valid_start: DateTime<Utc>,
}

impl TransactionId {
    pub fn generate(payer: AccountId) -> Self {
        Self {
            payer,
            valid_start: Utc::now(),
        }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}.{:09}",
            self.payer,
            self.valid_start.timestamp(),
            self.valid_start.timestamp_subsec_nanos()
        )
    }
}

/// Token supply policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSupplyType {
    #[default]
    Infinite,
    Finite,
}

/// Parameters of a topic creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCreateParams {
    pub memo: String,
    pub admin_key: Option<Key>,
    pub submit_key: Option<Key>,
}

/// Parameters of a fungible token creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCreateParams {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub initial_supply: u64,
    pub treasury: AccountId,
    pub admin_key: Option<Key>,
    pub supply_key: Option<Key>,
    pub supply_type: TokenSupplyType,
    /// Cap on total supply, only meaningful for finite tokens
    pub max_supply: u64,
}

/// Operation carried by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionData {
    TopicCreate(TopicCreateParams),
    TopicMessageSubmit {
        topic_id: TopicId,
        #[serde(with = "hex_bytes")]
        message: Vec<u8>,
    },
    TokenCreate(TokenCreateParams),
    TokenMint {
        token_id: TokenId,
        amount: u64,
    },
    TokenAssociate {
        account: AccountId,
        token_id: TokenId,
    },
    TokenTransfer {
        token_id: TokenId,
        from: AccountId,
        to: AccountId,
        amount: u64,
    },
}

impl TransactionData {
    /// Short operation name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TransactionData::TopicCreate(_) => "topic_create",
            TransactionData::TopicMessageSubmit { .. } => "topic_message_submit",
            TransactionData::TokenCreate(_) => "token_create",
            TransactionData::TokenMint { .. } => "token_mint",
            TransactionData::TokenAssociate { .. } => "token_associate",
            TransactionData::TokenTransfer { .. } => "token_transfer",
        }
    }
}

/// Unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionBody {
    pub transaction_id: TransactionId,
    pub max_transaction_fee: Hbar,
    pub memo: String,
    pub data: TransactionData,
}

impl TransactionBody {
    pub fn new(transaction_id: TransactionId, max_transaction_fee: Hbar, data: TransactionData) -> Self {
        Self {
            transaction_id,
            max_transaction_fee,
            memo: String::new(),
            data,
        }
    }

    /// Canonical bytes that get signed.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Serialize and sign with the given keys.
    pub fn sign(&self, signers: &[&PrivateKey]) -> Result<SignedTransaction, serde_json::Error> {
        let body_bytes = self.to_bytes()?;
        let signatures = signers
            .iter()
            .map(|key| SignaturePair {
                public_key: key.public_key(),
                signature: key.sign(&body_bytes),
            })
            .collect();

        Ok(SignedTransaction {
            body_bytes,
            signatures,
        })
    }
}

/// One signature over the body bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturePair {
    pub public_key: PublicKey,
    pub signature: Signature,
}

/// Body bytes plus the signatures collected over them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    #[serde(with = "hex_bytes")]
    pub body_bytes: Vec<u8>,
    pub signatures: Vec<SignaturePair>,
}

impl SignedTransaction {
    /// Add another signer, e.g. an account key required besides the payer.
    pub fn add_signature(&mut self, key: &PrivateKey) {
        self.signatures.push(SignaturePair {
            public_key: key.public_key(),
            signature: key.sign(&self.body_bytes),
        });
    }

    pub fn body(&self) -> Result<TransactionBody, serde_json::Error> {
        serde_json::from_slice(&self.body_bytes)
    }

    /// Verify every signature and return the set of signing keys.
    pub fn verified_signers(&self) -> Result<HashSet<PublicKey>, KeyError> {
        let mut signers = HashSet::with_capacity(self.signatures.len());
        for pair in &self.signatures {
            pair.public_key.verify(&self.body_bytes, &pair.signature)?;
            signers.insert(pair.public_key);
        }
        Ok(signers)
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
