//! Per-scenario state shared between steps

use ledger_common::{
    crypto::{KeyList, PrivateKey},
    AccountId, LedgerClient, Operator, TokenId, TopicId,
};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AccountBook, AccountRecord, DEFAULT_SUBSCRIPTION_TIMEOUT_SECS};
use crate::error::StepFailure;

/// Settings steps read but never change
#[derive(Debug, Clone)]
pub struct StepSettings {
    /// How long the receive step waits for a topic message
    pub subscription_timeout: Duration,
}

impl Default for StepSettings {
    fn default() -> Self {
        Self {
            subscription_timeout: Duration::from_secs(DEFAULT_SUBSCRIPTION_TIMEOUT_SECS),
        }
    }
}

/// Values produced by earlier steps of one scenario
///
/// A fresh context is created for every scenario and dropped when it
/// ends. Reading a slot no earlier step has set is a scenario authoring
/// defect and fails the step with [`StepFailure::UnsetSlot`].
pub struct ScenarioContext {
    /// Client handle of this scenario, rebound when an operator is set
    client: Arc<dyn LedgerClient>,
    accounts: Arc<AccountBook>,
    settings: StepSettings,

    account: Option<AccountId>,
    private_key: Option<PrivateKey>,
    second_account: Option<AccountId>,
    second_private_key: Option<PrivateKey>,
    threshold_key: Option<KeyList>,
    topic_id: Option<TopicId>,
    threshold_topic_id: Option<TopicId>,
    active_topic: Option<TopicId>,
    token_id: Option<TokenId>,
}

macro_rules! slot {
    ($get:ident, $set:ident, $field:ident, $ty:ty, $label:literal) => {
        pub fn $get(&self) -> Result<&$ty, StepFailure> {
            self.$field.as_ref().ok_or(StepFailure::UnsetSlot($label))
        }

        pub fn $set(&mut self, value: $ty) {
            self.$field = Some(value);
        }
    };
}

impl ScenarioContext {
    pub fn new(
        client: Arc<dyn LedgerClient>,
        accounts: Arc<AccountBook>,
        settings: StepSettings,
    ) -> Self {
        Self {
            client,
            accounts,
            settings,
            account: None,
            private_key: None,
            second_account: None,
            second_private_key: None,
            threshold_key: None,
            topic_id: None,
            threshold_topic_id: None,
            active_topic: None,
            token_id: None,
        }
    }

    /// Current client handle
    pub fn client(&self) -> &Arc<dyn LedgerClient> {
        &self.client
    }

    /// Bind `record` as this scenario's operator
    pub fn bind_operator(&mut self, record: &AccountRecord) {
        self.client = self.client.with_operator(record.operator());
    }

    /// A handle bound to `operator`, leaving the scenario's own handle as is
    pub fn client_for(&self, operator: Operator) -> Arc<dyn LedgerClient> {
        self.client.with_operator(operator)
    }

    pub fn accounts(&self) -> &AccountBook {
        &self.accounts
    }

    pub fn settings(&self) -> &StepSettings {
        &self.settings
    }

    slot!(account, set_account, account, AccountId, "account");
    slot!(private_key, set_private_key, private_key, PrivateKey, "private key");
    slot!(second_account, set_second_account, second_account, AccountId, "second account");
    slot!(
        second_private_key,
        set_second_private_key,
        second_private_key,
        PrivateKey,
        "second private key"
    );
    slot!(threshold_key, set_threshold_key, threshold_key, KeyList, "threshold key");
    slot!(topic_id, set_topic_id, topic_id, TopicId, "topic id");
    slot!(
        threshold_topic_id,
        set_threshold_topic_id,
        threshold_topic_id,
        TopicId,
        "threshold topic id"
    );
    slot!(active_topic, set_active_topic, active_topic, TopicId, "active topic");
    slot!(token_id, set_token_id, token_id, TokenId, "token id");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simnet::{SimClient, SimNetworkBuilder};

    fn context() -> ScenarioContext {
        let client = Arc::new(SimClient::new(SimNetworkBuilder::new().build()));
        ScenarioContext::new(client, Arc::new(AccountBook::default()), StepSettings::default())
    }

    #[test]
    fn test_unset_slot_names_the_slot() {
        let ctx = context();
        let err = ctx.token_id().unwrap_err();
        assert!(matches!(err, StepFailure::UnsetSlot("token id")));
        assert!(ctx.active_topic().is_err());
    }

    #[test]
    fn test_set_then_read() {
        let mut ctx = context();
        ctx.set_topic_id(TopicId::new(0, 0, 5));
        ctx.set_active_topic(TopicId::new(0, 0, 5));
        assert_eq!(*ctx.topic_id().unwrap(), TopicId::new(0, 0, 5));
        assert_eq!(*ctx.active_topic().unwrap(), TopicId::new(0, 0, 5));
        assert!(ctx.threshold_topic_id().is_err());
    }
}
