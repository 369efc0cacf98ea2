//! Feature execution engine
//!
//! Runs parsed features against a [`LedgerClient`], one scenario at a
//! time, resolving every step through the [`StepRegistry`].
//!
//! # Example
//!
//! ```rust,ignore
//! use ledger_testing_framework::prelude::*;
//!
//! let features = load_features("features")?;
//! let executor = ScenarioExecutor::new(registry, client, accounts, StepSettings::default())
//!     .with_tags(vec!["smoke".to_string()]);
//! let report = executor.execute_suite(&features).await;
//!
//! report.print();
//! assert!(report.success());
//! ```

use super::parser::{Feature, Scenario, Step, StepKeyword};
use crate::config::AccountBook;
use crate::error::FailureKind;
use crate::steps::{ScenarioContext, StepMatch, StepRegistry, StepSettings};
use ledger_common::LedgerClient;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Passed,
    Failed { kind: FailureKind, message: String },
    /// Not run because an earlier step of the scenario failed
    Skipped,
    /// No step definition matches the text
    Undefined,
}

impl StepOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, StepOutcome::Passed)
    }

    /// Failure kind of a failed or undefined step
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            StepOutcome::Failed { kind, .. } => Some(*kind),
            StepOutcome::Undefined => Some(FailureKind::Undefined),
            StepOutcome::Passed | StepOutcome::Skipped => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepReport {
    pub keyword: StepKeyword,
    pub text: String,
    pub line: usize,
    pub outcome: StepOutcome,
    pub duration: Duration,
}

/// Result of one scenario
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub feature: String,
    pub name: String,
    pub steps: Vec<StepReport>,
    pub duration: Duration,
    /// Execution log
    pub log: Vec<String>,
}

impl ScenarioReport {
    pub fn success(&self) -> bool {
        self.steps.iter().all(|step| step.outcome.is_passed())
    }

    /// First step that did not pass or get skipped
    pub fn failure(&self) -> Option<&StepReport> {
        self.steps
            .iter()
            .find(|step| step.outcome.failure_kind().is_some())
    }

    pub fn print(&self) {
        println!(
            "\n  {} Scenario: {} ({:.2?})",
            if self.success() { "✓" } else { "✗" },
            self.name,
            self.duration
        );
        for entry in &self.log {
            println!("    {}", entry);
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeatureReport {
    pub name: String,
    pub scenarios: Vec<ScenarioReport>,
}

impl FeatureReport {
    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|s| s.success()).count()
    }

    pub fn failed(&self) -> usize {
        self.scenarios.len() - self.passed()
    }
}

/// Result of a whole run
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    pub features: Vec<FeatureReport>,
    /// Scenarios left out by the tag filter
    pub filtered_out: usize,
    /// Set when `fail_fast` stopped the run early
    pub stopped_early: bool,
}

impl SuiteReport {
    /// True iff no executed scenario failed
    pub fn success(&self) -> bool {
        self.features.iter().all(|feature| feature.failed() == 0)
    }

    pub fn scenarios(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.features.iter().flat_map(|feature| feature.scenarios.iter())
    }

    pub fn scenario(&self, name: &str) -> Option<&ScenarioReport> {
        self.scenarios().find(|scenario| scenario.name == name)
    }

    pub fn passed(&self) -> usize {
        self.features.iter().map(FeatureReport::passed).sum()
    }

    pub fn failed(&self) -> usize {
        self.features.iter().map(FeatureReport::failed).sum()
    }

    /// Count of steps with each outcome: passed, failed, skipped, undefined
    pub fn step_counts(&self) -> (usize, usize, usize, usize) {
        self.scenarios()
            .flat_map(|scenario| scenario.steps.iter())
            .fold((0, 0, 0, 0), |(p, f, s, u), step| match step.outcome {
                StepOutcome::Passed => (p + 1, f, s, u),
                StepOutcome::Failed { .. } => (p, f + 1, s, u),
                StepOutcome::Skipped => (p, f, s + 1, u),
                StepOutcome::Undefined => (p, f, s, u + 1),
            })
    }

    pub fn print(&self) {
        for feature in &self.features {
            println!("\nFeature: {}", feature.name);
            for scenario in &feature.scenarios {
                scenario.print();
            }
        }

        let (passed, failed, skipped, undefined) = self.step_counts();
        println!("\n╔════════════════════════════════════════════════════════════╗");
        println!("║  Scenario Suite Report                                     ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!(
            "║  Scenarios: {:<46} ║",
            format!(
                "{} ({} passed, {} failed)",
                self.passed() + self.failed(),
                self.passed(),
                self.failed()
            )
        );
        println!(
            "║  Steps: {:<50} ║",
            format!(
                "{} passed, {} failed, {} skipped, {} undefined",
                passed, failed, skipped, undefined
            )
        );
        if self.filtered_out > 0 {
            println!("║  Filtered out: {:<43} ║", self.filtered_out);
        }
        println!(
            "║  Status: {:<49} ║",
            if self.success() {
                "SUCCESS ✓"
            } else if self.stopped_early {
                "FAILED ✗ (stopped early)"
            } else {
                "FAILED ✗"
            }
        );
        println!("╚════════════════════════════════════════════════════════════╝\n");

        for scenario in self.scenarios().filter(|s| !s.success()) {
            if let Some(step) = scenario.failure() {
                let message = match &step.outcome {
                    StepOutcome::Failed { message, .. } => message.as_str(),
                    _ => "no matching step definition",
                };
                println!(
                    "✗ {} / {} (line {}): {}",
                    scenario.feature, scenario.name, step.line, message
                );
            }
        }
    }
}

/// Runs features against a ledger client
pub struct ScenarioExecutor {
    registry: Arc<StepRegistry>,
    /// Unbound client; every scenario binds its own handle
    client: Arc<dyn LedgerClient>,
    accounts: Arc<AccountBook>,
    settings: StepSettings,
    tags: Vec<String>,
    fail_fast: bool,
}

impl ScenarioExecutor {
    pub fn new(
        registry: Arc<StepRegistry>,
        client: Arc<dyn LedgerClient>,
        accounts: Arc<AccountBook>,
        settings: StepSettings,
    ) -> Self {
        Self {
            registry,
            client,
            accounts,
            settings,
            tags: Vec::new(),
            fail_fast: false,
        }
    }

    /// Only run scenarios carrying at least one of `tags`
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Stop at the first failing scenario
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn selects(&self, scenario: &Scenario) -> bool {
        self.tags.is_empty() || scenario.has_any_tag(&self.tags)
    }

    /// Execute every selected scenario of every feature, in order
    pub async fn execute_suite(&self, features: &[Feature]) -> SuiteReport {
        let mut report = SuiteReport::default();

        for feature in features {
            let mut feature_report = FeatureReport {
                name: feature.name.clone(),
                scenarios: Vec::new(),
            };

            for scenario in &feature.scenarios {
                if report.stopped_early {
                    break;
                }
                if !self.selects(scenario) {
                    report.filtered_out += 1;
                    continue;
                }

                let scenario_report = self.execute_scenario(&feature.name, scenario).await;
                if !scenario_report.success() && self.fail_fast {
                    report.stopped_early = true;
                }
                feature_report.scenarios.push(scenario_report);
            }

            report.features.push(feature_report);
            if report.stopped_early {
                break;
            }
        }

        report
    }

    /// Execute one scenario with a fresh context
    ///
    /// Steps run strictly in order. After the first step that fails or
    /// has no definition the remaining steps are skipped.
    pub async fn execute_scenario(&self, feature: &str, scenario: &Scenario) -> ScenarioReport {
        info!("Running scenario: {}", scenario.name);
        let started = Instant::now();
        let mut ctx = ScenarioContext::new(
            self.client.clone(),
            self.accounts.clone(),
            self.settings.clone(),
        );

        let mut steps = Vec::with_capacity(scenario.steps.len());
        let mut log = Vec::with_capacity(scenario.steps.len());
        let mut failed = false;

        for step in &scenario.steps {
            let step_started = Instant::now();
            let outcome = if failed {
                StepOutcome::Skipped
            } else {
                self.run_step(&mut ctx, step).await
            };

            log.push(match &outcome {
                StepOutcome::Passed => format!("✓ {} {}", step.keyword, step.text),
                StepOutcome::Failed { kind, message } => {
                    format!("✗ {} {}\n      {}: {}", step.keyword, step.text, kind, message)
                }
                StepOutcome::Skipped => format!("- {} {}", step.keyword, step.text),
                StepOutcome::Undefined => format!("? {} {}", step.keyword, step.text),
            });

            failed |= !matches!(outcome, StepOutcome::Passed | StepOutcome::Skipped);
            steps.push(StepReport {
                keyword: step.keyword,
                text: step.text.clone(),
                line: step.line,
                outcome,
                duration: step_started.elapsed(),
            });
        }

        let report = ScenarioReport {
            feature: feature.to_string(),
            name: scenario.name.clone(),
            steps,
            duration: started.elapsed(),
            log,
        };
        match report.failure() {
            Some(step) => warn!(
                "Scenario '{}' failed at line {}: {:?}",
                report.name, step.line, step.outcome
            ),
            None => info!("Scenario '{}' passed", report.name),
        }
        report
    }

    async fn run_step(&self, ctx: &mut ScenarioContext, step: &Step) -> StepOutcome {
        match self.registry.find(&step.text) {
            StepMatch::Undefined => StepOutcome::Undefined,
            StepMatch::Ambiguous(patterns) => StepOutcome::Failed {
                kind: FailureKind::Ambiguous,
                message: format!("step matches {}", patterns.join(", ")),
            },
            StepMatch::Found(definition, args) => {
                debug!("{} {} -> {}", step.keyword, step.text, definition.pattern());
                match (definition.handler())(ctx, args).await {
                    Ok(()) => StepOutcome::Passed,
                    Err(e) => StepOutcome::Failed {
                        kind: FailureKind::classify(&e),
                        message: format!("{:#}", e),
                    },
                }
            }
        }
    }
}
