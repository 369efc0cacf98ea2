//! Feature files: parsing and execution
//!
//! Scenarios are written in a Gherkin subset and run step by step
//! against a ledger client.
//!
//! ## Example Feature
//!
//! ```gherkin
//! Feature: Token service
//!
//!   Scenario: Mint additional tokens
//!     Given A Hedera account with more than 10 hbar
//!     When I create a token named Test Token (HTT)
//!     Then An attempt to mint 100 additional tokens succeeds
//!     And The total supply of the token is 1000100
//! ```

pub mod executor;
pub mod parser;

pub use executor::{
    FeatureReport, ScenarioExecutor, ScenarioReport, StepOutcome, StepReport, SuiteReport,
};
pub use parser::{
    load_features, parse_feature, Feature, LoadError, ParseError, Scenario, Step, StepKeyword,
};
