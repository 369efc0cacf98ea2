//! Step definitions keyed by text pattern
//!
//! The registry is an ordered list of `(pattern, handler)` pairs whose
//! regexes are compiled once when the registry is built. Matching
//! ignores the step keyword, so `Given`, `When`, `Then`, `And` and `But`
//! all resolve against the same list.

use anyhow::Result;
use futures::future::BoxFuture;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use super::context::ScenarioContext;
use crate::error::StepFailure;

/// Async step handler
pub type StepHandler = for<'a> fn(&'a mut ScenarioContext, StepArgs) -> BoxFuture<'a, Result<()>>;

/// Values captured from the step text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepArgs(Vec<String>);

impl StepArgs {
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Capture `index` as text
    pub fn text(&self, index: usize) -> Result<&str, StepFailure> {
        self.0
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| StepFailure::InvalidArgument(format!("missing capture #{}", index)))
    }

    /// Capture `index` parsed into `T`
    pub fn parse<T>(&self, index: usize) -> Result<T, StepFailure>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.text(index)?;
        raw.parse().map_err(|e: T::Err| {
            StepFailure::InvalidArgument(format!("capture #{} '{}': {}", index, raw, e))
        })
    }
}

/// One `(pattern, handler)` pair
pub struct StepDefinition {
    pattern: Regex,
    handler: StepHandler,
}

impl StepDefinition {
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn handler(&self) -> StepHandler {
        self.handler
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// Result of resolving a step text
#[derive(Debug)]
pub enum StepMatch<'r> {
    Found(&'r StepDefinition, StepArgs),
    Undefined,
    Ambiguous(Vec<&'r str>),
}

#[derive(Debug, Default)]
pub struct StepRegistry {
    definitions: Vec<StepDefinition>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an anchored regex pattern
    ///
    /// `^` and `$` are added when missing so a pattern never matches a
    /// fragment of a longer step.
    pub fn register(&mut self, pattern: &str, handler: StepHandler) -> Result<(), regex::Error> {
        let anchored = format!(
            "{}{}{}",
            if pattern.starts_with('^') { "" } else { "^" },
            pattern,
            if pattern.ends_with('$') { "" } else { "$" }
        );
        self.definitions.push(StepDefinition {
            pattern: Regex::new(&anchored)?,
            handler,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn definitions(&self) -> &[StepDefinition] {
        &self.definitions
    }

    /// Resolve `text` against every definition
    pub fn find(&self, text: &str) -> StepMatch<'_> {
        let mut matches = self
            .definitions
            .iter()
            .filter_map(|def| def.pattern.captures(text).map(|caps| (def, caps)));

        let Some((definition, captures)) = matches.next() else {
            return StepMatch::Undefined;
        };

        let others: Vec<&str> = matches.map(|(def, _)| def.pattern()).collect();
        if !others.is_empty() {
            let mut patterns = vec![definition.pattern()];
            patterns.extend(others);
            return StepMatch::Ambiguous(patterns);
        }

        let args = captures
            .iter()
            .skip(1)
            .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect();
        StepMatch::Found(definition, StepArgs::new(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut ScenarioContext, _: StepArgs) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    #[test]
    fn test_find_with_captures() {
        let mut registry = StepRegistry::new();
        registry
            .register(r#"The message "([^"]*)" is published to the topic"#, noop)
            .unwrap();
        registry
            .register(r"A (\d+) of (\d+) threshold key with the first and second account", noop)
            .unwrap();

        match registry.find(r#"The message "Hello, Hedera!" is published to the topic"#) {
            StepMatch::Found(_, args) => assert_eq!(args.text(0).unwrap(), "Hello, Hedera!"),
            other => panic!("unexpected match: {:?}", other),
        }

        match registry.find("A 1 of 2 threshold key with the first and second account") {
            StepMatch::Found(_, args) => {
                assert_eq!(args.parse::<u32>(0).unwrap(), 1);
                assert_eq!(args.parse::<u32>(1).unwrap(), 2);
            }
            other => panic!("unexpected match: {:?}", other),
        }
    }

    #[test]
    fn test_patterns_are_anchored() {
        let mut registry = StepRegistry::new();
        registry.register("The token has the name", noop).unwrap();
        assert!(matches!(
            registry.find("The token has the name \"x\""),
            StepMatch::Undefined
        ));
    }

    #[test]
    fn test_ambiguous_match() {
        let mut registry = StepRegistry::new();
        registry.register(r"The token has (\d+) decimals", noop).unwrap();
        registry.register(r"The token has (.+) decimals", noop).unwrap();
        match registry.find("The token has 2 decimals") {
            StepMatch::Ambiguous(patterns) => assert_eq!(patterns.len(), 2),
            other => panic!("unexpected match: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_argument() {
        let args = StepArgs::new(vec!["abc".to_string()]);
        assert!(matches!(
            args.parse::<u64>(0),
            Err(StepFailure::InvalidArgument(_))
        ));
        assert!(args.text(3).is_err());
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut registry = StepRegistry::new();
        assert!(registry.register("(unclosed", noop).is_err());
        assert!(registry.is_empty());
    }
}
