//! In-process simulated ledger network
//!
//! A deterministic stand-in for a remote ledger: it verifies ed25519
//! signatures over the submitted body bytes, enforces payer, submit,
//! supply and treasury keys (including threshold key lists), charges
//! fees, assigns entity ids and streams topic messages to subscribers.
//! It does not model consensus or gossip; every transaction reaches
//! finality as soon as it is applied.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ledger_testing_framework::simnet::{SimClient, SimNetworkBuilder};
//!
//! let network = SimNetworkBuilder::new()
//!     .with_account(account_id, key.public_key(), Hbar::from_hbars(1000))
//!     .build();
//! let client = SimClient::new(network).with_operator(Operator::new(account_id, key));
//! let receipt = client.create_topic(TopicCreateParams::default()).await?;
//! ```

mod builder;
mod client;
mod state;

pub use builder::SimNetworkBuilder;
pub use client::SimClient;
pub use state::{LedgerState, SimAccount, SimTopic, MAX_TOKEN_DECIMALS};

use ledger_common::{
    crypto::Key,
    transaction::{SignedTransaction, Status, TransactionData, TransactionReceipt},
    AccountBalance, AccountId, ClientError, Hbar, TokenId, TokenInfo, TopicId, TopicInfo,
    TopicSubscription,
};
use log::{debug, info};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Fee charged for each transaction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    pub topic_create: Hbar,
    pub topic_message_submit: Hbar,
    pub token_create: Hbar,
    pub token_mint: Hbar,
    pub token_associate: Hbar,
    pub token_transfer: Hbar,
}

impl FeeSchedule {
    /// Schedule with every fee set to zero
    pub const FREE: FeeSchedule = FeeSchedule {
        topic_create: Hbar::ZERO,
        topic_message_submit: Hbar::ZERO,
        token_create: Hbar::ZERO,
        token_mint: Hbar::ZERO,
        token_associate: Hbar::ZERO,
        token_transfer: Hbar::ZERO,
    };

    pub fn fee_for(&self, data: &TransactionData) -> Hbar {
        match data {
            TransactionData::TopicCreate(_) => self.topic_create,
            TransactionData::TopicMessageSubmit { .. } => self.topic_message_submit,
            TransactionData::TokenCreate(_) => self.token_create,
            TransactionData::TokenMint { .. } => self.token_mint,
            TransactionData::TokenAssociate { .. } => self.token_associate,
            TransactionData::TokenTransfer { .. } => self.token_transfer,
        }
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            topic_create: Hbar::from_tinybars(1_000_000),
            topic_message_submit: Hbar::from_tinybars(10_000),
            token_create: Hbar::from_tinybars(100_000_000),
            token_mint: Hbar::from_tinybars(100_000),
            token_associate: Hbar::from_tinybars(5_000_000),
            token_transfer: Hbar::from_tinybars(100_000),
        }
    }
}

/// Shared handle to a simulated ledger
///
/// Cloning is cheap; all clones see the same state.
#[derive(Clone)]
pub struct SimNetwork {
    state: Arc<RwLock<LedgerState>>,
    fees: FeeSchedule,
}

impl SimNetwork {
    pub(crate) fn new(state: LedgerState, fees: FeeSchedule) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            fees,
        }
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Add an account after genesis and return its id
    pub fn create_account(&self, key: Key, balance: Hbar) -> AccountId {
        let mut state = self.state.write();
        let id = AccountId::new(0, 0, state.next_entity_num());
        state.insert_account(id, key, balance);
        info!("Simulated account {} created with {}", id, balance);
        id
    }

    /// Run `f` against the current ledger state (for assertions)
    pub fn inspect<R>(&self, f: impl FnOnce(&LedgerState) -> R) -> R {
        f(&self.state.read())
    }

    /// Verify, charge and apply a signed transaction
    ///
    /// # Errors
    ///
    /// - [`ClientError::Serialization`] if the body cannot be decoded
    /// - [`ClientError::Precheck`] for bad signatures or an unfit payer;
    ///   no fee is charged
    /// - [`ClientError::ReceiptStatus`] when the transaction is rejected
    ///   after the fee was charged
    pub fn execute(&self, signed: SignedTransaction) -> Result<TransactionReceipt, ClientError> {
        let body = signed.body()?;
        let transaction_id = body.transaction_id;
        let precheck = |status: Status| ClientError::Precheck {
            status,
            transaction_id,
        };

        let signers = signed
            .verified_signers()
            .map_err(|_| precheck(Status::InvalidSignature))?;

        let mut state = self.state.write();
        let fee = self.fees.fee_for(&body.data);
        state
            .charge_fee(&transaction_id.payer, &signers, fee, body.max_transaction_fee)
            .map_err(precheck)?;

        debug!(
            "Transaction {} ({}) charged {}",
            transaction_id,
            body.data.kind(),
            fee
        );

        state
            .apply(transaction_id, body.data, &signers)
            .map_err(|status| ClientError::ReceiptStatus {
                status,
                transaction_id,
            })
    }

    pub fn account_balance(&self, account: &AccountId) -> Result<AccountBalance, ClientError> {
        let state = self.state.read();
        let stored = state
            .accounts
            .get(account)
            .ok_or(ClientError::QueryFailed {
                status: Status::InvalidAccountId,
            })?;

        Ok(AccountBalance {
            account_id: *account,
            hbars: stored.balance,
            tokens: stored.tokens.clone(),
        })
    }

    pub fn token_info(&self, token: &TokenId) -> Result<TokenInfo, ClientError> {
        self.state
            .read()
            .tokens
            .get(token)
            .cloned()
            .ok_or(ClientError::QueryFailed {
                status: Status::InvalidTokenId,
            })
    }

    pub fn topic_info(&self, topic: &TopicId) -> Result<TopicInfo, ClientError> {
        let state = self.state.read();
        let stored = state.topics.get(topic).ok_or(ClientError::QueryFailed {
            status: Status::InvalidTopicId,
        })?;

        Ok(TopicInfo {
            topic_id: *topic,
            memo: stored.memo.clone(),
            admin_key: stored.admin_key.clone(),
            submit_key: stored.submit_key.clone(),
            sequence_number: stored.sequence_number,
            running_hash: stored.running_hash,
        })
    }

    /// Open a feed that replays the topic history, then follows new messages
    pub fn subscribe(&self, topic: &TopicId) -> Result<TopicSubscription, ClientError> {
        let mut state = self.state.write();
        let stored = state.topics.get_mut(topic).ok_or(ClientError::QueryFailed {
            status: Status::InvalidTopicId,
        })?;

        let (sender, receiver) = mpsc::unbounded_channel();
        for message in &stored.messages {
            // Receiver is alive, it is returned below
            let _ = sender.send(Ok(message.clone()));
        }
        stored.subscribers.push(sender);

        debug!(
            "Subscription opened on {} ({} messages replayed)",
            topic,
            stored.messages.len()
        );
        Ok(TopicSubscription::new(*topic, receiver))
    }
}
