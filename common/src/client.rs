//! Capability interface of a ledger client.
//!
//! Everything a scenario does against the ledger goes through
//! [`LedgerClient`]. A handle is bound to at most one operator; binding a
//! different operator returns a new handle and leaves the original
//! untouched, so two scenarios never share mutable operator state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::{
    crypto::{Hash, Key, PrivateKey},
    entity::{AccountId, TokenId, TopicId},
    error::ClientError,
    hbar::Hbar,
    transaction::{TokenCreateParams, TokenSupplyType, TopicCreateParams, TransactionReceipt},
};

/// Account and key paying for and signing transactions.
#[derive(Clone, Debug)]
pub struct Operator {
    pub account_id: AccountId,
    pub private_key: PrivateKey,
}

impl Operator {
    pub fn new(account_id: AccountId, private_key: PrivateKey) -> Self {
        Self {
            account_id,
            private_key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_id: AccountId,
    pub hbars: Hbar,
    pub tokens: BTreeMap<TokenId, u64>,
}

impl AccountBalance {
    /// Balance of `token`, `None` when the account is not associated.
    pub fn token(&self, token: &TokenId) -> Option<u64> {
        self.tokens.get(token).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub token_id: TokenId,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub total_supply: u64,
    pub treasury_account_id: AccountId,
    pub admin_key: Option<Key>,
    pub supply_key: Option<Key>,
    pub supply_type: TokenSupplyType,
    pub max_supply: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicInfo {
    pub topic_id: TopicId,
    pub memo: String,
    pub admin_key: Option<Key>,
    pub submit_key: Option<Key>,
    pub sequence_number: u64,
    pub running_hash: Hash,
}

/// A message delivered by a topic subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMessage {
    pub topic_id: TopicId,
    pub sequence_number: u64,
    pub consensus_timestamp: DateTime<Utc>,
    pub running_hash: Hash,
    pub contents: Vec<u8>,
}

/// Long-lived feed of topic messages.
///
/// Errors reported by the feed do not close it; `next` returns `None`
/// once the producing side is gone.
pub struct TopicSubscription {
    topic_id: TopicId,
    receiver: mpsc::UnboundedReceiver<Result<TopicMessage, ClientError>>,
}

impl TopicSubscription {
    pub fn new(
        topic_id: TopicId,
        receiver: mpsc::UnboundedReceiver<Result<TopicMessage, ClientError>>,
    ) -> Self {
        Self { topic_id, receiver }
    }

    pub fn topic_id(&self) -> &TopicId {
        &self.topic_id
    }

    /// Wait for the next delivery.
    pub async fn next(&mut self) -> Option<Result<TopicMessage, ClientError>> {
        self.receiver.recv().await
    }
}

/// Operations the scenario harness needs from a ledger.
///
/// Every transaction operation blocks until the receipt is available
/// and fails with [`ClientError::ReceiptStatus`] when the receipt status
/// is not `SUCCESS`.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Return a new handle bound to `operator`.
    fn with_operator(&self, operator: Operator) -> Arc<dyn LedgerClient>;

    /// Operator of this handle, if bound.
    fn operator(&self) -> Option<&Operator>;

    async fn account_balance(&self, account: &AccountId) -> Result<AccountBalance, ClientError>;

    async fn create_topic(&self, params: TopicCreateParams)
        -> Result<TransactionReceipt, ClientError>;

    async fn submit_message(
        &self,
        topic: &TopicId,
        message: &[u8],
    ) -> Result<TransactionReceipt, ClientError>;

    /// Subscribe to a topic from its first message.
    async fn subscribe_topic(&self, topic: &TopicId) -> Result<TopicSubscription, ClientError>;

    async fn topic_info(&self, topic: &TopicId) -> Result<TopicInfo, ClientError>;

    async fn create_token(&self, params: TokenCreateParams)
        -> Result<TransactionReceipt, ClientError>;

    async fn mint_token(&self, token: &TokenId, amount: u64)
        -> Result<TransactionReceipt, ClientError>;

    async fn token_info(&self, token: &TokenId) -> Result<TokenInfo, ClientError>;

    /// Associate `token` with `account`. The operator must be `account`.
    async fn associate_token(
        &self,
        account: &AccountId,
        token: &TokenId,
    ) -> Result<TransactionReceipt, ClientError>;

    /// Move `amount` units of `token`. The operator must be `from`.
    async fn transfer_token(
        &self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<TransactionReceipt, ClientError>;
}
