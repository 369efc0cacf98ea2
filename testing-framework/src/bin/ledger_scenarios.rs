//! Run feature files against the simulated ledger network
//!
//! ```text
//! ledger-scenarios --config config/accounts.yaml --features features --tag tokens
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use ledger_testing_framework::{
    load_features, ledger_steps, ScenarioExecutor, SimClient, SimNetworkBuilder, StepSettings,
    SuiteConfig,
};
use log::{error, info, LevelFilter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Parser)]
#[clap(version, about = "Ledger scenario runner")]
struct Config {
    /// Suite configuration with the test accounts
    #[clap(long, default_value = "config/accounts.yaml")]
    config: PathBuf,
    /// Feature file, or directory of `.feature` files
    #[clap(long, default_value = "features")]
    features: PathBuf,
    /// Only run scenarios carrying this tag (repeatable)
    #[clap(long = "tag")]
    tags: Vec<String>,
    /// Stop at the first failing scenario
    #[clap(long)]
    fail_fast: bool,
    /// Log level, overridden by RUST_LOG
    #[clap(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

async fn run(config: Config) -> Result<bool> {
    let suite = SuiteConfig::load(&config.config)
        .with_context(|| format!("Loading {}", config.config.display()))?;
    let features = load_features(&config.features)?;
    let registry = ledger_steps().context("Compiling step patterns")?;
    info!(
        "Loaded {} feature(s), {} step definitions, {} account(s)",
        features.len(),
        registry.len(),
        suite.accounts.len()
    );

    let accounts = suite.account_book();
    let network = SimNetworkBuilder::new().with_account_book(&accounts).build();
    let settings = StepSettings {
        subscription_timeout: suite.subscription_timeout(),
    };

    let executor = ScenarioExecutor::new(
        Arc::new(registry),
        Arc::new(SimClient::new(network)),
        Arc::new(accounts),
        settings,
    )
    .with_tags(config.tags)
    .with_fail_fast(config.fail_fast);

    let report = executor.execute_suite(&features).await;
    report.print();
    Ok(report.success())
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    let level = LevelFilter::from(config.log_level).to_string().to_lowercase();
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    match run(config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
