#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//! Standalone test for the feature parser
//!
//! Tests parser functionality independently of the simulated network

use ledger_testing_framework::scenarios::{parse_feature, StepKeyword};
use ledger_testing_framework::steps::{ledger_steps, StepMatch};

#[test]
fn test_parse_shipped_features() {
    let features = [
        include_str!("../features/topic.feature"),
        include_str!("../features/token.feature"),
    ];

    for (idx, source) in features.iter().enumerate() {
        match parse_feature(source) {
            Ok(feature) => {
                println!(
                    "✓ Feature {}: {} parsed successfully ({} scenarios)",
                    idx + 1,
                    feature.name,
                    feature.scenarios.len()
                );
                assert!(!feature.scenarios.is_empty());
            }
            Err(e) => panic!("Feature {} failed to parse: {}", idx + 1, e),
        }
    }
}

#[test]
fn test_every_shipped_step_is_defined() {
    let registry = ledger_steps().unwrap();
    for source in [
        include_str!("../features/topic.feature"),
        include_str!("../features/token.feature"),
    ] {
        let feature = parse_feature(source).unwrap();
        for scenario in &feature.scenarios {
            for step in &scenario.steps {
                assert!(
                    matches!(registry.find(&step.text), StepMatch::Found(..)),
                    "{} / {} line {}: '{}' has no unique definition",
                    feature.name,
                    scenario.name,
                    step.line,
                    step.text
                );
            }
        }
    }
}

#[test]
fn test_token_outline_expands_per_row() {
    let feature = parse_feature(include_str!("../features/token.feature")).unwrap();
    let transfers: Vec<_> = feature
        .scenarios
        .iter()
        .filter(|s| s.name == "Transfer tokens to a second account")
        .collect();
    assert_eq!(transfers.len(), 2);

    let step = &transfers[1].steps[3];
    assert_eq!(step.keyword, StepKeyword::When);
    assert_eq!(
        step.text,
        "The first account transfers 250000 HTT tokens to the second account"
    );
    assert!(transfers.iter().all(|s| s.tags == vec!["tokens".to_string()]));
}

#[test]
fn test_and_inherits_previous_keyword() {
    let feature = parse_feature(
        r#"
Feature: Keywords
  Scenario: Inherit
    * a first account with more than 1 hbars
    When A topic is created with the first account as the submit key
    And The message "x" is published to the topic
    Then The topic has 1 message
    But The topic has 1 message
"#,
    )
    .unwrap();

    let keywords: Vec<_> = feature.scenarios[0]
        .steps
        .iter()
        .map(|s| s.keyword)
        .collect();
    assert_eq!(
        keywords,
        vec![
            StepKeyword::Given,
            StepKeyword::When,
            StepKeyword::When,
            StepKeyword::Then,
            StepKeyword::Then
        ]
    );
}

#[test]
fn test_parse_errors_name_the_line() {
    let err = parse_feature("Feature: Broken\n\n  Scenario: x\n    Given a step\n  | not | a table |\n")
        .unwrap_err();
    assert_eq!(err.line, 5);
    assert!(err.to_string().starts_with("line 5:"));
}
