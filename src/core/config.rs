use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const ORACLE_RETRY_LIMIT: u32 = 3;
pub const LOAD_RETRY_DELAY_MS: u64 = 5000;
const DEFAULT_ORACLE_BASE_URL: &str = "http://localhost:8080/oracle";

fn default_base_url() -> String {
    DEFAULT_ORACLE_BASE_URL.to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_retry_limit() -> u32 {
    ORACLE_RETRY_LIMIT
}

fn default_load_retry_delay_ms() -> u64 {
    LOAD_RETRY_DELAY_MS
}

fn default_currencies() -> Vec<String> {
    vec!["usd".to_string(), "eur".to_string()]
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OracleConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// When false the oracle never touches the network and serves fallback rates.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Consecutive failures tolerated before the oracle disables itself.
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,
    #[serde(default = "default_load_retry_delay_ms")]
    pub load_retry_delay_ms: u64,
}

impl OracleConfig {
    pub fn load_retry_delay(&self) -> Duration {
        Duration::from_millis(self.load_retry_delay_ms)
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        OracleConfig {
            base_url: default_base_url(),
            enabled: default_enabled(),
            retry_limit: default_retry_limit(),
            load_retry_delay_ms: default_load_retry_delay_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub oracle: OracleConfig,
    /// Codes shown by `price` and `watch` when none are given on the command line.
    #[serde(default = "default_currencies")]
    pub currencies: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            oracle: OracleConfig::default(),
            currencies: default_currencies(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "wallet", "wallet-oracle")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
oracle:
  base_url: "http://example.com/oracle"
  enabled: false
  retry_limit: 5
  load_retry_delay_ms: 250
currencies: ["usd", "btc", "gbp"]
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.oracle.base_url, "http://example.com/oracle");
        assert!(!config.oracle.enabled);
        assert_eq!(config.oracle.retry_limit, 5);
        assert_eq!(config.oracle.load_retry_delay(), Duration::from_millis(250));
        assert_eq!(config.currencies, vec!["usd", "btc", "gbp"]);
    }

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config.oracle.base_url, DEFAULT_ORACLE_BASE_URL);
        assert!(config.oracle.enabled);
        assert_eq!(config.oracle.retry_limit, ORACLE_RETRY_LIMIT);
        assert_eq!(config.oracle.load_retry_delay_ms, LOAD_RETRY_DELAY_MS);
        assert_eq!(config.currencies, vec!["usd", "eur"]);

        let partial = r#"
oracle:
  base_url: "http://localhost:9000/oracle"
"#;
        let config: AppConfig = serde_yaml::from_str(partial).expect("Failed to deserialize");
        assert_eq!(config.oracle.base_url, "http://localhost:9000/oracle");
        assert!(config.oracle.enabled);
        assert_eq!(config.oracle.retry_limit, ORACLE_RETRY_LIMIT);
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let result = AppConfig::load_from_path("/nonexistent/wallet-oracle/config.yaml");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }
}
