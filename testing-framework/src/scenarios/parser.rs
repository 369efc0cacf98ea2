//! Gherkin feature file parser
//!
//! Supports the subset the scenario suites use: `Feature:` with free
//! description lines, `Background:`, `Scenario:`/`Example:`,
//! `Scenario Outline:`/`Scenario Template:` with `Examples:` tables,
//! `Given`/`When`/`Then`/`And`/`But`/`*` steps, `@tag` lines and `#`
//! comments. Doc strings and step data tables are rejected.

use std::fs;
use std::mem;
use std::path::{Path, PathBuf};
use strum::Display;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },
}

/// Effective keyword of a step; `And`, `But` and `*` take the keyword of
/// the step before them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StepKeyword {
    Given,
    When,
    Then,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub keyword: StepKeyword,
    pub text: String,
    pub line: usize,
}

/// A runnable scenario, background steps included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    /// Tags without the leading `@`, feature tags included
    pub tags: Vec<String>,
    pub steps: Vec<Step>,
    pub line: usize,
}

impl Scenario {
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|tag| self.tags.contains(tag))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub name: String,
    pub description: Vec<String>,
    pub tags: Vec<String>,
    pub scenarios: Vec<Scenario>,
    /// File the feature was loaded from
    pub path: Option<PathBuf>,
}

const STEP_PREFIXES: [(&str, Option<StepKeyword>); 6] = [
    ("Given ", Some(StepKeyword::Given)),
    ("When ", Some(StepKeyword::When)),
    ("Then ", Some(StepKeyword::Then)),
    ("And ", None),
    ("But ", None),
    ("* ", None),
];

struct Outline {
    name: String,
    tags: Vec<String>,
    line: usize,
    steps: Vec<Step>,
    examples: Vec<Examples>,
}

struct Examples {
    tags: Vec<String>,
    line: usize,
    header: Option<Vec<String>>,
    rows: Vec<(usize, Vec<String>)>,
}

#[derive(Default)]
enum Block {
    #[default]
    Header,
    Background,
    Scenario(Scenario),
    Outline(Outline),
}

#[derive(Default)]
struct FeatureParser {
    feature: Option<Feature>,
    background: Vec<Step>,
    pending_tags: Vec<String>,
    block: Block,
    last_keyword: Option<StepKeyword>,
}

/// Parse the text of one `.feature` file
pub fn parse_feature(source: &str) -> Result<Feature, ParseError> {
    let mut parser = FeatureParser::default();
    let mut last_line = 0;
    for (idx, raw) in source.lines().enumerate() {
        last_line = idx + 1;
        parser.line(last_line, raw.trim())?;
    }
    parser.finish(last_line)
}

/// Load a `.feature` file, or every `.feature` file of a directory in
/// file name order
pub fn load_features(path: impl AsRef<Path>) -> Result<Vec<Feature>, LoadError> {
    let path = path.as_ref();
    let io_error = |path: &Path| {
        let path = path.display().to_string();
        move |source| LoadError::Io { path, source }
    };

    let files = if path.is_dir() {
        let mut files = Vec::new();
        for entry in fs::read_dir(path).map_err(io_error(path))? {
            let file = entry.map_err(io_error(path))?.path();
            if file.extension().is_some_and(|ext| ext == "feature") {
                files.push(file);
            }
        }
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };

    files
        .into_iter()
        .map(|file| -> Result<Feature, LoadError> {
            let source = fs::read_to_string(&file).map_err(io_error(file.as_path()))?;
            let mut feature = parse_feature(&source).map_err(|source| LoadError::Parse {
                path: file.display().to_string(),
                source,
            })?;
            feature.path = Some(file);
            Ok(feature)
        })
        .collect()
}

fn strip_any<'a>(text: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes
        .iter()
        .find_map(|prefix| text.strip_prefix(prefix))
        .map(str::trim)
}

fn table_cells(line: usize, text: &str) -> Result<Vec<String>, ParseError> {
    let inner = text
        .strip_prefix('|')
        .and_then(|rest| rest.strip_suffix('|'))
        .ok_or_else(|| ParseError::new(line, "table row must start and end with '|'"))?;
    Ok(inner.split('|').map(|cell| cell.trim().to_string()).collect())
}

fn substitute(template: &str, header: &[String], row: &[String]) -> String {
    header
        .iter()
        .zip(row)
        .fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("<{}>", name), value)
        })
}

impl FeatureParser {
    fn line(&mut self, line: usize, text: &str) -> Result<(), ParseError> {
        if text.is_empty() || text.starts_with('#') {
            return Ok(());
        }

        if text.starts_with('@') {
            for tag in text.split_whitespace() {
                let name = tag
                    .strip_prefix('@')
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| ParseError::new(line, format!("invalid tag '{}'", tag)))?;
                self.pending_tags.push(name.to_string());
            }
            return Ok(());
        }

        if let Some(name) = strip_any(text, &["Feature:"]) {
            if self.feature.is_some() {
                return Err(ParseError::new(line, "only one Feature per file"));
            }
            self.feature = Some(Feature {
                name: name.to_string(),
                description: Vec::new(),
                tags: mem::take(&mut self.pending_tags),
                scenarios: Vec::new(),
                path: None,
            });
            return Ok(());
        }

        if self.feature.is_none() {
            return Err(ParseError::new(line, "expected 'Feature:'"));
        }

        if strip_any(text, &["Background:"]).is_some() {
            if !matches!(self.block, Block::Header) {
                return Err(ParseError::new(
                    line,
                    "Background must come before the first scenario",
                ));
            }
            if !self.pending_tags.is_empty() {
                return Err(ParseError::new(line, "Background cannot be tagged"));
            }
            self.block = Block::Background;
            self.last_keyword = None;
            return Ok(());
        }

        if let Some(name) = strip_any(text, &["Scenario Outline:", "Scenario Template:"]) {
            self.close_block()?;
            self.block = Block::Outline(Outline {
                name: name.to_string(),
                tags: self.scenario_tags(),
                line,
                steps: Vec::new(),
                examples: Vec::new(),
            });
            self.last_keyword = None;
            return Ok(());
        }

        if let Some(name) = strip_any(text, &["Scenario:", "Example:"]) {
            self.close_block()?;
            self.block = Block::Scenario(Scenario {
                name: name.to_string(),
                tags: self.scenario_tags(),
                steps: self.background.clone(),
                line,
            });
            self.last_keyword = None;
            return Ok(());
        }

        if strip_any(text, &["Examples:", "Scenarios:"]).is_some() {
            let tags = mem::take(&mut self.pending_tags);
            return match &mut self.block {
                Block::Outline(outline) => {
                    outline.examples.push(Examples {
                        tags,
                        line,
                        header: None,
                        rows: Vec::new(),
                    });
                    Ok(())
                }
                _ => Err(ParseError::new(
                    line,
                    "Examples outside of a Scenario Outline",
                )),
            };
        }

        if text.starts_with('|') {
            let cells = table_cells(line, text)?;
            return match &mut self.block {
                Block::Outline(Outline { examples, .. }) => match examples.last_mut() {
                    Some(table) if table.header.is_none() => {
                        table.header = Some(cells);
                        Ok(())
                    }
                    Some(table) => {
                        table.rows.push((line, cells));
                        Ok(())
                    }
                    None => Err(ParseError::new(line, "step data tables are not supported")),
                },
                _ => Err(ParseError::new(line, "step data tables are not supported")),
            };
        }

        if text.starts_with("\"\"\"") || text.starts_with("```") {
            return Err(ParseError::new(line, "doc strings are not supported"));
        }

        if let Some(step) = self.step(line, text) {
            return match &mut self.block {
                Block::Header => Err(ParseError::new(line, "step outside of a scenario")),
                Block::Background => {
                    self.background.push(step);
                    Ok(())
                }
                Block::Scenario(scenario) => {
                    scenario.steps.push(step);
                    Ok(())
                }
                Block::Outline(outline) if outline.examples.is_empty() => {
                    outline.steps.push(step);
                    Ok(())
                }
                Block::Outline(_) => Err(ParseError::new(
                    line,
                    "steps must come before the Examples of an outline",
                )),
            };
        }

        match (&self.block, self.feature.as_mut()) {
            (Block::Header, Some(feature)) => {
                feature.description.push(text.to_string());
                Ok(())
            }
            _ => Err(ParseError::new(line, format!("unexpected line '{}'", text))),
        }
    }

    fn step(&mut self, line: usize, text: &str) -> Option<Step> {
        let (keyword, rest) = STEP_PREFIXES.iter().find_map(|(prefix, keyword)| {
            text.strip_prefix(prefix).map(|rest| (*keyword, rest))
        })?;
        let keyword = keyword
            .or(self.last_keyword)
            .unwrap_or(StepKeyword::Given);
        self.last_keyword = Some(keyword);
        Some(Step {
            keyword,
            text: rest.trim().to_string(),
            line,
        })
    }

    fn scenario_tags(&mut self) -> Vec<String> {
        let mut tags = self
            .feature
            .as_ref()
            .map(|feature| feature.tags.clone())
            .unwrap_or_default();
        for tag in mem::take(&mut self.pending_tags) {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }

    fn close_block(&mut self) -> Result<(), ParseError> {
        let finished = match mem::take(&mut self.block) {
            Block::Header | Block::Background => Vec::new(),
            Block::Scenario(scenario) => vec![scenario],
            Block::Outline(outline) => self.expand(outline)?,
        };
        if let Some(feature) = self.feature.as_mut() {
            feature.scenarios.extend(finished);
        }
        Ok(())
    }

    /// One scenario per example row
    fn expand(&self, outline: Outline) -> Result<Vec<Scenario>, ParseError> {
        let mut scenarios = Vec::new();
        for examples in &outline.examples {
            let header = examples
                .header
                .as_ref()
                .ok_or_else(|| ParseError::new(examples.line, "Examples without a table"))?;

            for (line, row) in &examples.rows {
                if row.len() != header.len() {
                    return Err(ParseError::new(
                        *line,
                        format!(
                            "example row has {} cells, header has {}",
                            row.len(),
                            header.len()
                        ),
                    ));
                }

                let mut tags = outline.tags.clone();
                tags.extend(examples.tags.iter().cloned());

                let mut steps = self.background.clone();
                steps.extend(outline.steps.iter().map(|step| Step {
                    keyword: step.keyword,
                    text: substitute(&step.text, header, row),
                    line: step.line,
                }));

                scenarios.push(Scenario {
                    name: substitute(&outline.name, header, row),
                    tags,
                    steps,
                    line: *line,
                });
            }
        }

        if scenarios.is_empty() {
            return Err(ParseError::new(
                outline.line,
                "Scenario Outline has no example rows",
            ));
        }
        Ok(scenarios)
    }

    fn finish(mut self, last_line: usize) -> Result<Feature, ParseError> {
        self.close_block()?;
        if !self.pending_tags.is_empty() {
            return Err(ParseError::new(last_line, "tags without a scenario"));
        }
        self.feature
            .ok_or_else(|| ParseError::new(last_line.max(1), "expected 'Feature:'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOPIC_FEATURE: &str = r#"
@topics
Feature: Topic messages
  Publishing to a consensus topic

  Background:
    Given a first account with more than 10 hbars

  # plain scenario
  @smoke
  Scenario: Publish with the first account
    When A topic is created with the first account as the submit key
    And The message "Hello, Hedera!" is published to the topic
    Then The message "Hello, Hedera!" is received by the topic and can be printed to the console
    But The topic has 1 message
"#;

    #[test]
    fn test_parse_feature_with_background() {
        let feature = parse_feature(TOPIC_FEATURE).unwrap();
        assert_eq!(feature.name, "Topic messages");
        assert_eq!(feature.description, vec!["Publishing to a consensus topic"]);
        assert_eq!(feature.tags, vec!["topics"]);
        assert_eq!(feature.scenarios.len(), 1);

        let scenario = &feature.scenarios[0];
        assert_eq!(scenario.tags, vec!["topics", "smoke"]);
        assert_eq!(scenario.steps.len(), 5);
        assert_eq!(scenario.steps[0].text, "a first account with more than 10 hbars");
        assert_eq!(scenario.steps[0].line, 7);
        assert_eq!(scenario.steps[2].keyword, StepKeyword::When);
        assert_eq!(scenario.steps[4].keyword, StepKeyword::Then);
        assert!(scenario.has_any_tag(&["smoke".to_string()]));
        assert!(!scenario.has_any_tag(&["tokens".to_string()]));
    }

    #[test]
    fn test_outline_expansion() {
        let source = r#"
Feature: Minting
  Scenario Outline: Mint <amount>
    Given A Hedera account with more than 10 hbar
    When An attempt to mint <amount> additional tokens succeeds
    Then The total supply of the token is <total>

    @large
    Examples:
      | amount | total   |
      | 100    | 1000100 |
      | 5      | 1000005 |
"#;
        let feature = parse_feature(source).unwrap();
        assert_eq!(feature.scenarios.len(), 2);
        assert_eq!(feature.scenarios[0].name, "Mint 100");
        assert_eq!(
            feature.scenarios[1].steps[2].text,
            "The total supply of the token is 1000005"
        );
        assert_eq!(feature.scenarios[1].tags, vec!["large"]);
        assert_eq!(feature.scenarios[1].line, 12);
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let err = parse_feature("Scenario: no feature").unwrap_err();
        assert_eq!(err.line, 1);

        let err = parse_feature("Feature: x\n  Given a step outside").unwrap_err();
        assert_eq!(err, ParseError::new(2, "step outside of a scenario"));

        let outline = "Feature: x\nScenario Outline: y\n  Given <a>\nExamples:\n  | a |\n  | 1 | 2 |\n";
        assert_eq!(parse_feature(outline).unwrap_err().line, 6);

        let empty = "Feature: x\nScenario Outline: y\n  Given <a>\n";
        assert_eq!(parse_feature(empty).unwrap_err().line, 2);

        assert!(parse_feature("").is_err());
    }

    #[test]
    fn test_load_directory_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.feature"), "Feature: B\n").unwrap();
        fs::write(dir.path().join("a.feature"), "Feature: A\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a feature").unwrap();

        let features = load_features(dir.path()).unwrap();
        let names: Vec<_> = features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(
            features[0].path.as_deref(),
            Some(dir.path().join("a.feature").as_path())
        );

        fs::write(dir.path().join("c.feature"), "Scenario: broken\n").unwrap();
        assert!(matches!(
            load_features(dir.path()),
            Err(LoadError::Parse { .. })
        ));
    }
}
