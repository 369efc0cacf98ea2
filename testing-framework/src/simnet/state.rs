//! Ledger state of the simulated network and the rules applied to it.

use chrono::Utc;
use ledger_common::{
    crypto::{hash_parts, Hash, Key, PublicKey},
    transaction::{
        Status, TokenCreateParams, TokenSupplyType, TopicCreateParams, TransactionData,
        TransactionId, TransactionReceipt, MAX_MESSAGE_SIZE,
    },
    AccountId, ClientError, Hbar, TokenId, TokenInfo, TopicId, TopicMessage,
};
use log::debug;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::mpsc::UnboundedSender;

/// Maximum number of decimals a token may declare
pub const MAX_TOKEN_DECIMALS: u32 = 18;

pub(crate) type SubscriberSender = UnboundedSender<Result<TopicMessage, ClientError>>;

/// Account as stored by the simulated ledger
#[derive(Debug, Clone)]
pub struct SimAccount {
    /// Key that must sign for this account
    pub key: Key,
    /// Native balance
    pub balance: Hbar,
    /// Associated tokens and their balances
    pub tokens: BTreeMap<TokenId, u64>,
}

/// Topic as stored by the simulated ledger
#[derive(Debug, Default)]
pub struct SimTopic {
    pub memo: String,
    pub admin_key: Option<Key>,
    pub submit_key: Option<Key>,
    pub sequence_number: u64,
    pub running_hash: Hash,
    pub messages: Vec<TopicMessage>,
    pub(crate) subscribers: Vec<SubscriberSender>,
}

/// Whole ledger: accounts, topics and tokens keyed by entity id
#[derive(Debug, Default)]
pub struct LedgerState {
    pub accounts: HashMap<AccountId, SimAccount>,
    pub topics: HashMap<TopicId, SimTopic>,
    pub tokens: HashMap<TokenId, TokenInfo>,
    /// Fees collected from payers
    pub collected_fees: Hbar,
    next_entity_num: u64,
}

type ApplyResult = Result<TransactionReceipt, Status>;

fn require(key: &Key, signers: &HashSet<PublicKey>) -> Result<(), Status> {
    if key.is_satisfied_by(signers) {
        Ok(())
    } else {
        Err(Status::InvalidSignature)
    }
}

impl LedgerState {
    pub fn new(first_entity_num: u64) -> Self {
        Self {
            next_entity_num: first_entity_num,
            ..Default::default()
        }
    }

    /// Reserve the next entity number shared by accounts, topics and tokens.
    pub fn next_entity_num(&mut self) -> u64 {
        let num = self.next_entity_num;
        self.next_entity_num += 1;
        num
    }

    /// Insert an account, keeping newly assigned ids above it.
    pub fn insert_account(&mut self, id: AccountId, key: Key, balance: Hbar) {
        self.next_entity_num = self.next_entity_num.max(id.num() + 1);
        self.accounts.insert(
            id,
            SimAccount {
                key,
                balance,
                tokens: BTreeMap::new(),
            },
        );
    }

    /// Precheck the payer and charge the fee.
    pub fn charge_fee(
        &mut self,
        payer: &AccountId,
        signers: &HashSet<PublicKey>,
        fee: Hbar,
        max_fee: Hbar,
    ) -> Result<(), Status> {
        let account = self
            .accounts
            .get_mut(payer)
            .ok_or(Status::PayerAccountNotFound)?;
        require(&account.key, signers)?;
        if fee > max_fee {
            return Err(Status::InsufficientTxFee);
        }
        account.balance = account
            .balance
            .checked_sub(fee)
            .ok_or(Status::InsufficientPayerBalance)?;
        self.collected_fees = self.collected_fees.checked_add(fee).unwrap_or(self.collected_fees);
        Ok(())
    }

    /// Apply a transaction whose fee has already been charged.
    pub fn apply(
        &mut self,
        transaction_id: TransactionId,
        data: TransactionData,
        signers: &HashSet<PublicKey>,
    ) -> ApplyResult {
        debug!("Applying {} from {}", data.kind(), transaction_id);
        match data {
            TransactionData::TopicCreate(params) => {
                self.create_topic(transaction_id, params, signers)
            }
            TransactionData::TopicMessageSubmit { topic_id, message } => {
                self.submit_message(transaction_id, topic_id, message, signers)
            }
            TransactionData::TokenCreate(params) => {
                self.create_token(transaction_id, params, signers)
            }
            TransactionData::TokenMint { token_id, amount } => {
                self.mint(transaction_id, token_id, amount, signers)
            }
            TransactionData::TokenAssociate { account, token_id } => {
                self.associate(transaction_id, account, token_id, signers)
            }
            TransactionData::TokenTransfer {
                token_id,
                from,
                to,
                amount,
            } => self.transfer(transaction_id, token_id, from, to, amount, signers),
        }
    }

    fn create_topic(
        &mut self,
        transaction_id: TransactionId,
        params: TopicCreateParams,
        signers: &HashSet<PublicKey>,
    ) -> ApplyResult {
        if let Some(admin_key) = &params.admin_key {
            require(admin_key, signers)?;
        }

        let topic_id = TopicId::new(0, 0, self.next_entity_num());
        self.topics.insert(
            topic_id,
            SimTopic {
                memo: params.memo,
                admin_key: params.admin_key,
                submit_key: params.submit_key,
                ..Default::default()
            },
        );

        let mut receipt = TransactionReceipt::new(transaction_id, Status::Success);
        receipt.topic_id = Some(topic_id);
        Ok(receipt)
    }

    fn submit_message(
        &mut self,
        transaction_id: TransactionId,
        topic_id: TopicId,
        message: Vec<u8>,
        signers: &HashSet<PublicKey>,
    ) -> ApplyResult {
        let topic = self
            .topics
            .get_mut(&topic_id)
            .ok_or(Status::InvalidTopicId)?;
        if message.is_empty() {
            return Err(Status::InvalidTopicMessage);
        }
        if message.len() > MAX_MESSAGE_SIZE {
            return Err(Status::MessageSizeTooLarge);
        }
        if let Some(submit_key) = &topic.submit_key {
            require(submit_key, signers)?;
        }

        topic.sequence_number += 1;
        topic.running_hash = hash_parts(&[
            topic.running_hash.as_bytes(),
            &topic.sequence_number.to_be_bytes(),
            &message,
        ]);

        let delivered = TopicMessage {
            topic_id,
            sequence_number: topic.sequence_number,
            consensus_timestamp: Utc::now(),
            running_hash: topic.running_hash,
            contents: message,
        };

        // Closed receivers are pruned here
        topic
            .subscribers
            .retain(|subscriber| subscriber.send(Ok(delivered.clone())).is_ok());
        topic.messages.push(delivered);

        let mut receipt = TransactionReceipt::new(transaction_id, Status::Success);
        receipt.topic_sequence_number = Some(topic.sequence_number);
        Ok(receipt)
    }

    fn create_token(
        &mut self,
        transaction_id: TransactionId,
        params: TokenCreateParams,
        signers: &HashSet<PublicKey>,
    ) -> ApplyResult {
        if params.name.trim().is_empty() {
            return Err(Status::MissingTokenName);
        }
        if params.symbol.trim().is_empty() {
            return Err(Status::MissingTokenSymbol);
        }
        if params.decimals > MAX_TOKEN_DECIMALS {
            return Err(Status::InvalidTokenDecimals);
        }
        match params.supply_type {
            TokenSupplyType::Finite => {
                if params.max_supply == 0 {
                    return Err(Status::InvalidTokenMaxSupply);
                }
                if params.initial_supply > params.max_supply {
                    return Err(Status::InvalidTokenInitialSupply);
                }
            }
            TokenSupplyType::Infinite => {
                if params.max_supply != 0 {
                    return Err(Status::InvalidTokenMaxSupply);
                }
            }
        }

        let treasury = self
            .accounts
            .get(&params.treasury)
            .ok_or(Status::InvalidTreasuryAccountForToken)?;
        require(&treasury.key, signers)?;
        if let Some(admin_key) = &params.admin_key {
            require(admin_key, signers)?;
        }

        let token_id = TokenId::new(0, 0, self.next_entity_num());
        if let Some(treasury) = self.accounts.get_mut(&params.treasury) {
            treasury.tokens.insert(token_id, params.initial_supply);
        }
        self.tokens.insert(
            token_id,
            TokenInfo {
                token_id,
                name: params.name,
                symbol: params.symbol,
                decimals: params.decimals,
                total_supply: params.initial_supply,
                treasury_account_id: params.treasury,
                admin_key: params.admin_key,
                supply_key: params.supply_key,
                supply_type: params.supply_type,
                max_supply: params.max_supply,
            },
        );

        let mut receipt = TransactionReceipt::new(transaction_id, Status::Success);
        receipt.token_id = Some(token_id);
        Ok(receipt)
    }

    fn mint(
        &mut self,
        transaction_id: TransactionId,
        token_id: TokenId,
        amount: u64,
        signers: &HashSet<PublicKey>,
    ) -> ApplyResult {
        let token = self
            .tokens
            .get_mut(&token_id)
            .ok_or(Status::InvalidTokenId)?;
        let supply_key = token.supply_key.as_ref().ok_or(Status::TokenHasNoSupplyKey)?;
        require(supply_key, signers)?;
        if amount == 0 {
            return Err(Status::InvalidTokenMintAmount);
        }

        let new_supply = token
            .total_supply
            .checked_add(amount)
            .ok_or(Status::InvalidTokenMintAmount)?;
        if token.supply_type == TokenSupplyType::Finite && new_supply > token.max_supply {
            return Err(Status::TokenMaxSupplyReached);
        }

        let treasury = self
            .accounts
            .get_mut(&token.treasury_account_id)
            .ok_or(Status::InvalidTreasuryAccountForToken)?;
        let held = treasury.tokens.entry(token_id).or_insert(0);
        *held = held.checked_add(amount).ok_or(Status::InvalidTokenMintAmount)?;
        token.total_supply = new_supply;

        let mut receipt = TransactionReceipt::new(transaction_id, Status::Success);
        receipt.total_supply = Some(new_supply);
        Ok(receipt)
    }

    fn associate(
        &mut self,
        transaction_id: TransactionId,
        account_id: AccountId,
        token_id: TokenId,
        signers: &HashSet<PublicKey>,
    ) -> ApplyResult {
        if !self.tokens.contains_key(&token_id) {
            return Err(Status::InvalidTokenId);
        }
        let account = self
            .accounts
            .get_mut(&account_id)
            .ok_or(Status::InvalidAccountId)?;
        require(&account.key, signers)?;
        if account.tokens.contains_key(&token_id) {
            return Err(Status::TokenAlreadyAssociatedToAccount);
        }
        account.tokens.insert(token_id, 0);

        Ok(TransactionReceipt::new(transaction_id, Status::Success))
    }

    fn transfer(
        &mut self,
        transaction_id: TransactionId,
        token_id: TokenId,
        from: AccountId,
        to: AccountId,
        amount: u64,
        signers: &HashSet<PublicKey>,
    ) -> ApplyResult {
        if !self.tokens.contains_key(&token_id) {
            return Err(Status::InvalidTokenId);
        }
        if amount == 0 {
            return Err(Status::InvalidTransferAmount);
        }

        let sender = self.accounts.get(&from).ok_or(Status::InvalidAccountId)?;
        require(&sender.key, signers)?;
        let sender_balance = sender
            .tokens
            .get(&token_id)
            .copied()
            .ok_or(Status::TokenNotAssociatedToAccount)?;
        let receiver = self.accounts.get(&to).ok_or(Status::InvalidAccountId)?;
        let receiver_balance = receiver
            .tokens
            .get(&token_id)
            .copied()
            .ok_or(Status::TokenNotAssociatedToAccount)?;

        let sender_after = sender_balance
            .checked_sub(amount)
            .ok_or(Status::InsufficientTokenBalance)?;
        if from == to {
            return Ok(TransactionReceipt::new(transaction_id, Status::Success));
        }
        let receiver_after = receiver_balance
            .checked_add(amount)
            .ok_or(Status::InvalidTransferAmount)?;

        if let Some(sender) = self.accounts.get_mut(&from) {
            sender.tokens.insert(token_id, sender_after);
        }
        if let Some(receiver) = self.accounts.get_mut(&to) {
            receiver.tokens.insert(token_id, receiver_after);
        }

        Ok(TransactionReceipt::new(transaction_id, Status::Success))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_common::crypto::PrivateKey;

    fn signers(keys: &[&PrivateKey]) -> HashSet<PublicKey> {
        keys.iter().map(|k| k.public_key()).collect()
    }

    fn tx(payer: AccountId) -> TransactionId {
        TransactionId::generate(payer)
    }

    fn setup() -> (LedgerState, AccountId, PrivateKey) {
        let key = PrivateKey::generate();
        let account = AccountId::new(0, 0, 1001);
        let mut state = LedgerState::new(1000);
        state.insert_account(account, key.public_key().into(), Hbar::from_hbars(100));
        (state, account, key)
    }

    fn token_params(treasury: AccountId, key: &PrivateKey) -> TokenCreateParams {
        TokenCreateParams {
            name: "Test Token".to_string(),
            symbol: "HTT".to_string(),
            decimals: 0,
            initial_supply: 1000,
            treasury,
            admin_key: Some(key.public_key().into()),
            supply_key: Some(key.public_key().into()),
            supply_type: TokenSupplyType::Finite,
            max_supply: 1000,
        }
    }

    #[test]
    fn test_entity_numbers_follow_genesis_accounts() {
        let (mut state, _, _) = setup();
        assert_eq!(state.next_entity_num(), 1002);
        assert_eq!(state.next_entity_num(), 1003);
    }

    #[test]
    fn test_charge_fee_rules() {
        let (mut state, account, key) = setup();
        let other = PrivateKey::generate();

        assert_eq!(
            state.charge_fee(&account, &signers(&[&other]), Hbar::from_hbars(1), Hbar::from_hbars(2)),
            Err(Status::InvalidSignature)
        );
        assert_eq!(
            state.charge_fee(&account, &signers(&[&key]), Hbar::from_hbars(3), Hbar::from_hbars(2)),
            Err(Status::InsufficientTxFee)
        );
        assert_eq!(
            state.charge_fee(
                &account,
                &signers(&[&key]),
                Hbar::from_hbars(101),
                Hbar::from_hbars(200)
            ),
            Err(Status::InsufficientPayerBalance)
        );
        state
            .charge_fee(&account, &signers(&[&key]), Hbar::from_hbars(1), Hbar::from_hbars(2))
            .unwrap();
        assert_eq!(state.accounts[&account].balance, Hbar::from_hbars(99));
        assert_eq!(state.collected_fees, Hbar::from_hbars(1));
    }

    #[test]
    fn test_finite_token_rejects_mint_beyond_cap() {
        let (mut state, account, key) = setup();
        let receipt = state
            .apply(
                tx(account),
                TransactionData::TokenCreate(token_params(account, &key)),
                &signers(&[&key]),
            )
            .unwrap();
        let token_id = receipt.token_id.unwrap();

        let result = state.apply(
            tx(account),
            TransactionData::TokenMint {
                token_id,
                amount: 100,
            },
            &signers(&[&key]),
        );
        assert_eq!(result, Err(Status::TokenMaxSupplyReached));
        assert_eq!(state.tokens[&token_id].total_supply, 1000);
        assert_eq!(state.accounts[&account].tokens[&token_id], 1000);
    }

    #[test]
    fn test_mint_without_supply_key() {
        let (mut state, account, key) = setup();
        let mut params = token_params(account, &key);
        params.supply_key = None;
        params.supply_type = TokenSupplyType::Infinite;
        params.max_supply = 0;
        let token_id = state
            .apply(tx(account), TransactionData::TokenCreate(params), &signers(&[&key]))
            .unwrap()
            .token_id
            .unwrap();

        let result = state.apply(
            tx(account),
            TransactionData::TokenMint {
                token_id,
                amount: 1,
            },
            &signers(&[&key]),
        );
        assert_eq!(result, Err(Status::TokenHasNoSupplyKey));
    }

    #[test]
    fn test_token_create_validation() {
        let (mut state, account, key) = setup();

        let mut params = token_params(account, &key);
        params.symbol = String::new();
        assert_eq!(
            state.apply(tx(account), TransactionData::TokenCreate(params), &signers(&[&key])),
            Err(Status::MissingTokenSymbol)
        );

        let mut params = token_params(account, &key);
        params.initial_supply = 1001;
        assert_eq!(
            state.apply(tx(account), TransactionData::TokenCreate(params), &signers(&[&key])),
            Err(Status::InvalidTokenInitialSupply)
        );

        let mut params = token_params(account, &key);
        params.treasury = AccountId::new(0, 0, 4242);
        assert_eq!(
            state.apply(tx(account), TransactionData::TokenCreate(params), &signers(&[&key])),
            Err(Status::InvalidTreasuryAccountForToken)
        );
    }

    #[test]
    fn test_submit_key_enforced() {
        let (mut state, account, key) = setup();
        let outsider = PrivateKey::generate();
        let topic_id = state
            .apply(
                tx(account),
                TransactionData::TopicCreate(TopicCreateParams {
                    submit_key: Some(key.public_key().into()),
                    ..Default::default()
                }),
                &signers(&[&key]),
            )
            .unwrap()
            .topic_id
            .unwrap();

        let rejected = state.apply(
            tx(account),
            TransactionData::TopicMessageSubmit {
                topic_id,
                message: b"hi".to_vec(),
            },
            &signers(&[&outsider]),
        );
        assert_eq!(rejected, Err(Status::InvalidSignature));

        let accepted = state
            .apply(
                tx(account),
                TransactionData::TopicMessageSubmit {
                    topic_id,
                    message: b"hi".to_vec(),
                },
                &signers(&[&key]),
            )
            .unwrap();
        assert_eq!(accepted.topic_sequence_number, Some(1));
        assert_eq!(state.topics[&topic_id].messages.len(), 1);
    }

    #[test]
    fn test_message_size_limits() {
        let (mut state, account, key) = setup();
        let topic_id = state
            .apply(
                tx(account),
                TransactionData::TopicCreate(TopicCreateParams::default()),
                &signers(&[&key]),
            )
            .unwrap()
            .topic_id
            .unwrap();

        let submit = |message: Vec<u8>| TransactionData::TopicMessageSubmit { topic_id, message };
        assert_eq!(
            state.apply(tx(account), submit(Vec::new()), &signers(&[&key])),
            Err(Status::InvalidTopicMessage)
        );
        assert_eq!(
            state.apply(
                tx(account),
                submit(vec![0u8; MAX_MESSAGE_SIZE + 1]),
                &signers(&[&key])
            ),
            Err(Status::MessageSizeTooLarge)
        );
    }

    #[test]
    fn test_associate_and_transfer() {
        let (mut state, first, first_key) = setup();
        let second_key = PrivateKey::generate();
        let second = AccountId::new(0, 0, 1002);
        state.insert_account(second, second_key.public_key().into(), Hbar::from_hbars(10));

        let mut params = token_params(first, &first_key);
        params.supply_type = TokenSupplyType::Infinite;
        params.max_supply = 0;
        let token_id = state
            .apply(tx(first), TransactionData::TokenCreate(params), &signers(&[&first_key]))
            .unwrap()
            .token_id
            .unwrap();

        let transfer = TransactionData::TokenTransfer {
            token_id,
            from: first,
            to: second,
            amount: 10,
        };
        assert_eq!(
            state.apply(tx(first), transfer.clone(), &signers(&[&first_key])),
            Err(Status::TokenNotAssociatedToAccount)
        );

        let associate = TransactionData::TokenAssociate {
            account: second,
            token_id,
        };
        assert_eq!(
            state.apply(tx(second), associate.clone(), &signers(&[&first_key])),
            Err(Status::InvalidSignature)
        );
        state
            .apply(tx(second), associate.clone(), &signers(&[&second_key]))
            .unwrap();
        assert_eq!(
            state.apply(tx(second), associate, &signers(&[&second_key])),
            Err(Status::TokenAlreadyAssociatedToAccount)
        );

        state
            .apply(tx(first), transfer, &signers(&[&first_key]))
            .unwrap();
        assert_eq!(state.accounts[&first].tokens[&token_id], 990);
        assert_eq!(state.accounts[&second].tokens[&token_id], 10);
        assert_eq!(state.tokens[&token_id].total_supply, 1000);
    }
}
