use thiserror::Error;

use crate::{
    crypto::KeyError,
    transaction::{Status, TransactionId},
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No operator configured on this client")]
    NoOperator,

    #[error("Transaction {transaction_id} failed precheck with status {status}")]
    Precheck {
        status: Status,
        transaction_id: TransactionId,
    },

    #[error("Receipt for transaction {transaction_id} contained error status {status}")]
    ReceiptStatus {
        status: Status,
        transaction_id: TransactionId,
    },

    #[error("Query failed with status {status}")]
    QueryFailed { status: Status },

    #[error("Subscription error: {0}")]
    Subscription(String),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Status carried by a precheck, receipt or query failure.
    pub fn status(&self) -> Option<Status> {
        match self {
            ClientError::Precheck { status, .. }
            | ClientError::ReceiptStatus { status, .. }
            | ClientError::QueryFailed { status } => Some(*status),
            _ => None,
        }
    }
}
