//! `LedgerClient` implementation backed by a [`SimNetwork`]

use super::SimNetwork;
use async_trait::async_trait;
use ledger_common::{
    transaction::{
        TokenCreateParams, TopicCreateParams, TransactionBody, TransactionData, TransactionId,
        TransactionReceipt,
    },
    AccountBalance, AccountId, ClientError, Hbar, LedgerClient, Operator, TokenId, TokenInfo,
    TopicId, TopicInfo, TopicSubscription,
};
use std::sync::Arc;

/// Fee ceiling attached to every transaction built by the client
pub const DEFAULT_MAX_TRANSACTION_FEE: Hbar = Hbar::from_hbars(2);

/// Client handle for the simulated network
///
/// Signs every transaction with the operator key only, the way an SDK
/// client signs with its operator before submitting.
#[derive(Clone)]
pub struct SimClient {
    network: SimNetwork,
    operator: Option<Operator>,
    max_transaction_fee: Hbar,
}

impl SimClient {
    /// Unbound client; queries work, transactions need an operator
    pub fn new(network: SimNetwork) -> Self {
        Self {
            network,
            operator: None,
            max_transaction_fee: DEFAULT_MAX_TRANSACTION_FEE,
        }
    }

    pub fn with_max_transaction_fee(mut self, fee: Hbar) -> Self {
        self.max_transaction_fee = fee;
        self
    }

    pub fn network(&self) -> &SimNetwork {
        &self.network
    }

    fn execute(&self, data: TransactionData) -> Result<TransactionReceipt, ClientError> {
        let operator = self.operator.as_ref().ok_or(ClientError::NoOperator)?;
        let body = TransactionBody::new(
            TransactionId::generate(operator.account_id),
            self.max_transaction_fee,
            data,
        );
        let signed = body.sign(&[&operator.private_key])?;
        self.network.execute(signed)
    }
}

#[async_trait]
impl LedgerClient for SimClient {
    fn with_operator(&self, operator: Operator) -> Arc<dyn LedgerClient> {
        Arc::new(Self {
            network: self.network.clone(),
            operator: Some(operator),
            max_transaction_fee: self.max_transaction_fee,
        })
    }

    fn operator(&self) -> Option<&Operator> {
        self.operator.as_ref()
    }

    async fn account_balance(&self, account: &AccountId) -> Result<AccountBalance, ClientError> {
        self.network.account_balance(account)
    }

    async fn create_topic(
        &self,
        params: TopicCreateParams,
    ) -> Result<TransactionReceipt, ClientError> {
        self.execute(TransactionData::TopicCreate(params))
    }

    async fn submit_message(
        &self,
        topic: &TopicId,
        message: &[u8],
    ) -> Result<TransactionReceipt, ClientError> {
        self.execute(TransactionData::TopicMessageSubmit {
            topic_id: *topic,
            message: message.to_vec(),
        })
    }

    async fn subscribe_topic(&self, topic: &TopicId) -> Result<TopicSubscription, ClientError> {
        self.network.subscribe(topic)
    }

    async fn topic_info(&self, topic: &TopicId) -> Result<TopicInfo, ClientError> {
        self.network.topic_info(topic)
    }

    async fn create_token(
        &self,
        params: TokenCreateParams,
    ) -> Result<TransactionReceipt, ClientError> {
        self.execute(TransactionData::TokenCreate(params))
    }

    async fn mint_token(
        &self,
        token: &TokenId,
        amount: u64,
    ) -> Result<TransactionReceipt, ClientError> {
        self.execute(TransactionData::TokenMint {
            token_id: *token,
            amount,
        })
    }

    async fn token_info(&self, token: &TokenId) -> Result<TokenInfo, ClientError> {
        self.network.token_info(token)
    }

    async fn associate_token(
        &self,
        account: &AccountId,
        token: &TokenId,
    ) -> Result<TransactionReceipt, ClientError> {
        self.execute(TransactionData::TokenAssociate {
            account: *account,
            token_id: *token,
        })
    }

    async fn transfer_token(
        &self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<TransactionReceipt, ClientError> {
        self.execute(TransactionData::TokenTransfer {
            token_id: *token,
            from: *from,
            to: *to,
            amount,
        })
    }
}
