//! # Ledger Scenario Harness
//!
//! Behaviour-driven scenarios for ledger account, consensus topic and
//! token services.
//!
//! ## Architecture Overview
//!
//! - **Feature parser**: Gherkin subset into features and scenarios
//! - **Step registry**: ordered `(pattern, handler)` pairs, compiled once
//! - **Step library**: balance preconditions, topic and token steps
//! - **Executor**: one fresh context per scenario, steps run in order
//! - **Simulated network**: in-process ledger that verifies signatures,
//!   keys and fees
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ledger_testing_framework::prelude::*;
//!
//! #[tokio::test]
//! async fn test_token_feature() {
//!     let config = SuiteConfig::load("config/accounts.yaml").unwrap();
//!     let accounts = config.account_book();
//!     let network = SimNetworkBuilder::new().with_account_book(&accounts).build();
//!
//!     let executor = ScenarioExecutor::new(
//!         Arc::new(ledger_steps().unwrap()),
//!         Arc::new(SimClient::new(network)),
//!         Arc::new(accounts),
//!         StepSettings::default(),
//!     );
//!     let report = executor.execute_suite(&load_features("features").unwrap()).await;
//!     assert!(report.success());
//! }
//! ```

#![warn(clippy::all)]

/// Suite configuration (accounts, timeouts)
pub mod config;

/// Step failures and their classification
pub mod error;

// Feature parser and executor
pub mod scenarios;

/// In-process simulated ledger
pub mod simnet;

/// Step registry, scenario context and the ledger step library
pub mod steps;

// Convenient re-exports for common usage
pub mod prelude;

pub use config::{AccountBook, AccountRecord, ConfigError, SuiteConfig};
pub use error::{FailureKind, StepFailure};
pub use scenarios::{load_features, parse_feature, ScenarioExecutor, SuiteReport};
pub use simnet::{SimClient, SimNetwork, SimNetworkBuilder};
pub use steps::{ledger_steps, ScenarioContext, StepRegistry, StepSettings};

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
