//! Step library: the vocabulary feature files are written in
//!
//! Every step is a thin adapter from one clause of natural language to
//! one ledger call and its check. Steps share values through the
//! [`ScenarioContext`] of the running scenario.

mod account_steps;
pub mod context;
pub mod registry;
mod token_steps;
mod topic_steps;

pub use context::{ScenarioContext, StepSettings};
pub use registry::{StepArgs, StepDefinition, StepHandler, StepMatch, StepRegistry};

use anyhow::{Context, Result};
use ledger_common::{
    transaction::{Status, TransactionReceipt},
    AccountBalance, AccountId, Hbar, LedgerClient,
};
use log::info;

use crate::error::StepFailure;

/// Registry holding every ledger step, in registration order
pub fn ledger_steps() -> Result<StepRegistry, regex::Error> {
    let mut registry = StepRegistry::new();
    account_steps::register(&mut registry)?;
    topic_steps::register(&mut registry)?;
    token_steps::register(&mut registry)?;
    Ok(registry)
}

/// Fail unless the receipt reports `SUCCESS`
pub(crate) fn ensure_success(receipt: &TransactionReceipt) -> Result<(), StepFailure> {
    if receipt.status.is_success() {
        Ok(())
    } else {
        Err(StepFailure::mismatch(
            format!("receipt status of {}", receipt.transaction_id),
            Status::Success,
            receipt.status,
        ))
    }
}

/// Query `account` and require strictly more than `hbars` hbar
pub(crate) async fn ensure_hbars_above(
    client: &dyn LedgerClient,
    account: &AccountId,
    hbars: u64,
) -> Result<AccountBalance> {
    let balance = client
        .account_balance(account)
        .await
        .with_context(|| format!("Balance query for {} failed", account))?;

    let minimum = Hbar::from_hbars(hbars);
    if balance.hbars <= minimum {
        return Err(StepFailure::PreconditionNotMet(format!(
            "account {} holds {}, needs more than {}",
            account, balance.hbars, minimum
        ))
        .into());
    }

    info!("Account {} holds {}", account, balance.hbars);
    Ok(balance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_step_registers() {
        let registry = ledger_steps().unwrap();
        assert_eq!(registry.len(), 23);
    }

    #[test]
    fn test_vocabulary_is_unambiguous() {
        let registry = ledger_steps().unwrap();
        let texts = [
            "a first account with more than 10 hbars",
            "A second account with more than 5 hbars",
            "A Hedera account with more than 10 hbar",
            "A 1 of 2 threshold key with the first and second account",
            "A topic is created with the first account as the submit key",
            "A topic is created with the threshold key as the submit key",
            "The message \"Hello, Hedera!\" is published to the topic",
            "The message \"Hello, Hedera!\" is received by the topic and can be printed to the console",
            "The second account publishes the message \"hi\" to the topic",
            "A message published by the second account to the topic is rejected",
            "The topic has 1 message",
            "The topic has 3 messages",
            "I create a token named Test Token (HTT)",
            "I create a fixed supply token named Test Token (HTT) with 1000 tokens",
            "The token has the name \"Test Token\"",
            "The token has the symbol \"HTT\"",
            "The token has 0 decimals",
            "The token is owned by the account",
            "The total supply of the token is 1000000",
            "An attempt to mint 100 additional tokens succeeds",
            "An attempt to mint tokens fails",
            "A first hedera account with more than 10 hbar and 100 HTT tokens",
            "A second Hedera account with 5 hbar and 100 HTT tokens",
            "The first account transfers 100 HTT tokens to the second account",
        ];
        for text in texts {
            assert!(
                matches!(registry.find(text), StepMatch::Found(..)),
                "no unique match for {:?}",
                text
            );
        }
    }
}
