//! Ledger domain types shared by the scenario harness and every
//! [`LedgerClient`](client::LedgerClient) implementation.

pub mod client;
pub mod crypto;
pub mod entity;
pub mod error;
pub mod hbar;
pub mod transaction;

pub use client::{
    AccountBalance, LedgerClient, Operator, TokenInfo, TopicInfo, TopicMessage, TopicSubscription,
};
pub use entity::{AccountId, EntityId, EntityIdError, TokenId, TopicId};
pub use error::ClientError;
pub use hbar::Hbar;
