#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//! Runs the shipped feature files end to end against the simulated network

use ledger_testing_framework::prelude::*;
use std::path::PathBuf;

fn manifest_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn shipped_suite() -> (ScenarioExecutor, SimNetwork) {
    let config = SuiteConfig::load(manifest_path("config/accounts.yaml"))
        .expect("Failed to load shipped config");
    let accounts = config.account_book();
    let network = SimNetworkBuilder::new()
        .with_account_book(&accounts)
        .build();

    let executor = ScenarioExecutor::new(
        Arc::new(ledger_steps().unwrap()),
        Arc::new(SimClient::new(network.clone())),
        Arc::new(accounts),
        StepSettings {
            subscription_timeout: config.subscription_timeout(),
        },
    );
    (executor, network)
}

#[tokio::test]
async fn test_shipped_features_pass() {
    let _ = env_logger::builder().is_test(true).try_init();

    let features = load_features(manifest_path("features")).expect("Failed to load features");
    let names: Vec<_> = features.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Fungible token service", "Consensus topic messages"]);

    let (executor, network) = shipped_suite();
    let report = executor.execute_suite(&features).await;
    report.print();

    assert!(report.success());
    assert_eq!(report.passed(), 8);
    let (_, failed, skipped, undefined) = report.step_counts();
    assert_eq!((failed, skipped, undefined), (0, 0, 0));

    network.inspect(|state| {
        assert_eq!(state.tokens.len(), 4);
        assert_eq!(state.topics.len(), 4);
        assert!(state.collected_fees > Hbar::ZERO);
    });
}

#[tokio::test]
async fn test_tag_filter_selects_threshold_scenarios() {
    let features = load_features(manifest_path("features")).unwrap();
    let (executor, network) = shipped_suite();

    let report = executor
        .with_tags(vec!["threshold".to_string()])
        .execute_suite(&features)
        .await;

    assert!(report.success());
    assert_eq!(report.passed(), 2);
    assert_eq!(report.filtered_out, 6);
    network.inspect(|state| assert!(state.tokens.is_empty()));
}
