//! Common imports for harness users
//!
//! ```rust,ignore
//! use ledger_testing_framework::prelude::*;
//! ```

pub use crate::config::{AccountBook, AccountRecord, SuiteConfig};
pub use crate::error::{FailureKind, StepFailure};
pub use crate::scenarios::{
    load_features, parse_feature, Feature, Scenario, ScenarioExecutor, ScenarioReport,
    StepOutcome, SuiteReport,
};
pub use crate::simnet::{FeeSchedule, SimClient, SimNetwork, SimNetworkBuilder};
pub use crate::steps::{ledger_steps, ScenarioContext, StepArgs, StepRegistry, StepSettings};

pub use ledger_common::{
    crypto::{Key, KeyList, PrivateKey, PublicKey},
    transaction::Status,
    AccountId, ClientError, Hbar, LedgerClient, Operator, TokenId, TopicId,
};

pub use anyhow::{Context, Result};
pub use std::sync::Arc;
