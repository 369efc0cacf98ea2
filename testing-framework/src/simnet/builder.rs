//! SimNetworkBuilder - Fluent API for configuring simulated networks

use super::{FeeSchedule, LedgerState, SimNetwork};
use crate::config::AccountBook;
use ledger_common::{crypto::PublicKey, AccountId, Hbar};

/// Entity number assigned to the first created entity when no genesis
/// account sits above it
pub const DEFAULT_FIRST_ENTITY_NUM: u64 = 1000;

/// Builder for [`SimNetwork`] instances
///
/// # Example
///
/// ```rust,ignore
/// let network = SimNetworkBuilder::new()
///     .with_account(first_id, first_key.public_key(), Hbar::from_hbars(1000))
///     .with_fees(FeeSchedule::FREE)
///     .build();
/// ```
pub struct SimNetworkBuilder {
    /// Genesis accounts (id, key, balance)
    accounts: Vec<(AccountId, PublicKey, Hbar)>,

    /// Fee schedule, `FeeSchedule::default()` when unset
    fees: FeeSchedule,
}

impl SimNetworkBuilder {
    pub fn new() -> Self {
        Self {
            accounts: Vec::new(),
            fees: FeeSchedule::default(),
        }
    }

    /// Add a genesis account
    ///
    /// Adding the same id twice keeps the last entry.
    pub fn with_account(mut self, id: AccountId, key: PublicKey, balance: Hbar) -> Self {
        self.accounts.push((id, key, balance));
        self
    }

    /// Add every configured account with its genesis balance
    pub fn with_account_book(self, book: &AccountBook) -> Self {
        book.iter().fold(self, |builder, record| {
            builder.with_account(
                record.id,
                record.private_key.public_key(),
                record.genesis_balance(),
            )
        })
    }

    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    pub fn build(self) -> SimNetwork {
        let mut state = LedgerState::new(DEFAULT_FIRST_ENTITY_NUM);
        for (id, key, balance) in self.accounts {
            state.insert_account(id, key.into(), balance);
        }
        SimNetwork::new(state, self.fees)
    }
}

impl Default for SimNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
