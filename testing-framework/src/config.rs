//! Suite configuration: test accounts and harness settings.
//!
//! ```yaml
//! subscription_timeout_secs: 30
//! accounts:
//!   - id: "0.0.1001"
//!     private_key: "302e020100300506032b657004220420..."
//!     balance_hbar: 1000
//! ```

use ledger_common::{crypto::PrivateKey, AccountId, Hbar, Operator};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default wait for a subscribed topic message
pub const DEFAULT_SUBSCRIPTION_TIMEOUT_SECS: u64 = 30;

/// Default genesis balance of a configured account on the simulated network
pub const DEFAULT_GENESIS_BALANCE_HBAR: u64 = 1_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Config must list at least one account")]
    NoAccounts,

    #[error("Account {0} is listed more than once")]
    DuplicateAccount(AccountId),

    #[error("Scenario needs configured account #{index}, only {available} configured")]
    MissingAccount { index: usize, available: usize },
}

fn default_subscription_timeout_secs() -> u64 {
    DEFAULT_SUBSCRIPTION_TIMEOUT_SECS
}

fn default_balance_hbar() -> u64 {
    DEFAULT_GENESIS_BALANCE_HBAR
}

/// A statically configured test account
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRecord {
    pub id: AccountId,
    pub private_key: PrivateKey,
    /// Genesis balance, only used by the simulated network
    #[serde(default = "default_balance_hbar")]
    pub balance_hbar: u64,
}

impl AccountRecord {
    pub fn operator(&self) -> Operator {
        Operator::new(self.id, self.private_key.clone())
    }

    pub fn genesis_balance(&self) -> Hbar {
        Hbar::from_hbars(self.balance_hbar)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuiteConfig {
    pub accounts: Vec<AccountRecord>,
    /// Seconds the receive step waits for a topic message
    #[serde(default = "default_subscription_timeout_secs")]
    pub subscription_timeout_secs: u64,
}

impl SuiteConfig {
    /// Parse and validate YAML config
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: SuiteConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.accounts.is_empty() {
            return Err(ConfigError::NoAccounts);
        }
        let mut seen = HashSet::new();
        for account in &self.accounts {
            if !seen.insert(account.id) {
                return Err(ConfigError::DuplicateAccount(account.id));
            }
        }
        Ok(())
    }

    pub fn subscription_timeout(&self) -> Duration {
        Duration::from_secs(self.subscription_timeout_secs)
    }

    pub fn account_book(&self) -> AccountBook {
        AccountBook::new(self.accounts.clone())
    }
}

/// Ordered, read-only list of configured accounts
#[derive(Debug, Clone, Default)]
pub struct AccountBook {
    accounts: Vec<AccountRecord>,
}

impl AccountBook {
    pub fn new(accounts: Vec<AccountRecord>) -> Self {
        Self { accounts }
    }

    /// Account at `index` (0 = first)
    pub fn get(&self, index: usize) -> Result<&AccountRecord, ConfigError> {
        self.accounts.get(index).ok_or(ConfigError::MissingAccount {
            index: index + 1,
            available: self.accounts.len(),
        })
    }

    pub fn first(&self) -> Result<&AccountRecord, ConfigError> {
        self.get(0)
    }

    pub fn second(&self) -> Result<&AccountRecord, ConfigError> {
        self.get(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccountRecord> {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIRST_KEY: &str =
        "302e020100300506032b6570042204209d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
    const SECOND_KEY: &str = "4ccd089b28ff96da9db6c346ec114e0f5b8a319f35aba624da8cf6ed4fb8a6fb";

    #[test]
    fn test_parse_config_with_defaults() {
        let yaml = format!(
            r#"
accounts:
  - id: "0.0.1001"
    private_key: "{FIRST_KEY}"
  - id: "0.0.1002"
    private_key: "{SECOND_KEY}"
    balance_hbar: 5
"#
        );
        let config = SuiteConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config.accounts.len(), 2);
        assert_eq!(config.subscription_timeout(), Duration::from_secs(30));
        assert_eq!(config.accounts[0].genesis_balance(), Hbar::from_hbars(1000));
        assert_eq!(config.accounts[1].genesis_balance(), Hbar::from_hbars(5));

        let book = config.account_book();
        assert_eq!(book.second().unwrap().id, AccountId::new(0, 0, 1002));
        assert!(matches!(
            book.get(2),
            Err(ConfigError::MissingAccount {
                index: 3,
                available: 2
            })
        ));
    }

    #[test]
    fn test_rejects_invalid_configs() {
        assert!(matches!(
            SuiteConfig::from_yaml("accounts: []"),
            Err(ConfigError::NoAccounts)
        ));

        let duplicate = format!(
            r#"
accounts:
  - {{ id: "0.0.1001", private_key: "{FIRST_KEY}" }}
  - {{ id: "0.0.1001", private_key: "{SECOND_KEY}" }}
"#
        );
        assert!(matches!(
            SuiteConfig::from_yaml(&duplicate),
            Err(ConfigError::DuplicateAccount(_))
        ));

        let bad_key = r#"
accounts:
  - { id: "0.0.1001", private_key: "not-a-key" }
"#;
        assert!(matches!(
            SuiteConfig::from_yaml(bad_key),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.yaml");
        std::fs::write(
            &path,
            format!("subscription_timeout_secs: 5\naccounts:\n  - {{ id: \"0.0.1001\", private_key: \"{FIRST_KEY}\" }}\n"),
        )
        .unwrap();

        let config = SuiteConfig::load(&path).unwrap();
        assert_eq!(config.subscription_timeout_secs, 5);
        assert!(matches!(
            SuiteConfig::load(dir.path().join("missing.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
