use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use super::TransactionId;
use crate::entity::{TokenId, TopicId};

/// Response codes returned by prechecks, receipts and queries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    // Precheck
    InvalidSignature,
    PayerAccountNotFound,
    InsufficientPayerBalance,
    InsufficientTxFee,
    // Accounts
    InvalidAccountId,
    // Topics
    InvalidTopicId,
    InvalidTopicMessage,
    MessageSizeTooLarge,
    // Tokens
    InvalidTokenId,
    MissingTokenName,
    MissingTokenSymbol,
    InvalidTokenDecimals,
    InvalidTokenInitialSupply,
    InvalidTokenMaxSupply,
    InvalidTokenMintAmount,
    InvalidTreasuryAccountForToken,
    TokenHasNoSupplyKey,
    TokenMaxSupplyReached,
    TokenAlreadyAssociatedToAccount,
    TokenNotAssociatedToAccount,
    InsufficientTokenBalance,
    InvalidTransferAmount,
}

impl Status {
    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

/// Finality confirmation for a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_id: TransactionId,
    pub status: Status,
    /// Set when the transaction created a topic
    pub topic_id: Option<TopicId>,
    /// Set when the transaction created a token
    pub token_id: Option<TokenId>,
    /// Topic sequence number after a message submission
    pub topic_sequence_number: Option<u64>,
    /// Token total supply after a mint
    pub total_supply: Option<u64>,
}

impl TransactionReceipt {
    pub fn new(transaction_id: TransactionId, status: Status) -> Self {
        Self {
            transaction_id,
            status,
            topic_id: None,
            token_id: None,
            topic_sequence_number: None,
            total_supply: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_matches_wire_names() {
        assert_eq!(Status::Success.to_string(), "SUCCESS");
        assert_eq!(
            Status::TokenMaxSupplyReached.to_string(),
            "TOKEN_MAX_SUPPLY_REACHED"
        );
        assert_eq!(
            serde_json::to_string(&Status::InvalidSignature).unwrap(),
            "\"INVALID_SIGNATURE\""
        );
    }
}
