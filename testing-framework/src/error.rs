use ledger_common::ClientError;
use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;

/// Failures raised by step definitions themselves.
///
/// Client failures are not wrapped here; they travel as [`ClientError`]
/// inside the `anyhow` chain and are classified as unexpected.
#[derive(Debug, Error)]
pub enum StepFailure {
    #[error("Precondition not met: {0}")]
    PreconditionNotMet(String),

    #[error("{what}: expected {expected}, got {actual}")]
    AssertionMismatch {
        what: String,
        expected: String,
        actual: String,
    },

    #[error("Expected {0} to fail, but it succeeded")]
    ExpectedFailureMissing(String),

    #[error("Context slot '{0}' read before any step set it")]
    UnsetSlot(&'static str),

    #[error("Invalid step argument: {0}")]
    InvalidArgument(String),

    #[error("Timed out after {0:?} waiting for {1}")]
    Timeout(std::time::Duration, String),
}

impl StepFailure {
    pub fn mismatch(
        what: impl Into<String>,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        StepFailure::AssertionMismatch {
            what: what.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// Category of a failed step, used in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    PreconditionNotMet,
    AssertionMismatch,
    ExpectedFailureMissing,
    /// Unexpected failure of a ledger operation
    Client,
    Timeout,
    /// Harness authoring defect: unset slot, bad argument, missing account
    Harness,
    /// No step definition matches the step text
    Undefined,
    /// More than one step definition matches the step text
    Ambiguous,
}

impl FailureKind {
    /// Classify an error returned by a step handler
    pub fn classify(error: &anyhow::Error) -> Self {
        for cause in error.chain() {
            if let Some(failure) = cause.downcast_ref::<StepFailure>() {
                return match failure {
                    StepFailure::PreconditionNotMet(_) => FailureKind::PreconditionNotMet,
                    StepFailure::AssertionMismatch { .. } => FailureKind::AssertionMismatch,
                    StepFailure::ExpectedFailureMissing(_) => FailureKind::ExpectedFailureMissing,
                    StepFailure::Timeout(..) => FailureKind::Timeout,
                    StepFailure::UnsetSlot(_) | StepFailure::InvalidArgument(_) => {
                        FailureKind::Harness
                    }
                };
            }
            if cause.downcast_ref::<ClientError>().is_some() {
                return FailureKind::Client;
            }
            if cause.downcast_ref::<ConfigError>().is_some() {
                return FailureKind::Harness;
            }
        }
        FailureKind::Client
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::PreconditionNotMet => "precondition not met",
            FailureKind::AssertionMismatch => "assertion mismatch",
            FailureKind::ExpectedFailureMissing => "expected failure missing",
            FailureKind::Client => "unexpected operation failure",
            FailureKind::Timeout => "timeout",
            FailureKind::Harness => "harness defect",
            FailureKind::Undefined => "undefined step",
            FailureKind::Ambiguous => "ambiguous step",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use ledger_common::transaction::Status;

    #[test]
    fn test_classify_through_context() {
        let err = Err::<(), _>(StepFailure::mismatch("token name", "HTT", "XYZ"))
            .context("step failed")
            .unwrap_err();
        assert_eq!(FailureKind::classify(&err), FailureKind::AssertionMismatch);
        assert!(format!("{err:#}").contains("expected HTT, got XYZ"));
    }

    #[test]
    fn test_classify_client_and_harness() {
        let client = anyhow::Error::new(ClientError::QueryFailed {
            status: Status::InvalidTokenId,
        });
        assert_eq!(FailureKind::classify(&client), FailureKind::Client);

        let unset = anyhow::Error::new(StepFailure::UnsetSlot("token id"));
        assert_eq!(FailureKind::classify(&unset), FailureKind::Harness);

        let config = anyhow::Error::new(ConfigError::NoAccounts);
        assert_eq!(FailureKind::classify(&config), FailureKind::Harness);
    }
}
