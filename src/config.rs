//! Run configuration.
//!
//! Values come from an optional YAML file; command-line flags override them
//! (see [`crate::cli::Cli::apply_to`]). Every field has a default so a bare
//! invocation works.
//!
//! ```yaml
//! user_agent: "Mozilla/5.0 (compatible; claim-review-harvest)"
//! request_timeout_secs: 20
//! max_attempts: 3
//! base_delay_ms: 500
//! max_delay_ms: 8000
//! site_concurrency: 4
//! prefetch_window: 3
//! grace_window_ms: 2000
//! cache_dir: .claim_cache
//! avoid_urls:
//!   - https://www.snopes.com/fact-check/some-retracted-review/
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct HarvestConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Total attempts per request, first try included.
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// How many sites are crawled at the same time.
    pub site_concurrency: usize,
    /// In-flight review page requests per site.
    pub prefetch_window: usize,
    /// How long in-flight work may finish after the stop signal.
    pub grace_window_ms: u64,
    pub cache_dir: PathBuf,
    /// Review URLs that are never fetched.
    pub avoid_urls: Vec<String>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (compatible; claim-review-harvest/0.1)".to_string(),
            request_timeout_secs: 20,
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
            site_concurrency: 4,
            prefetch_window: 3,
            grace_window_ms: 2_000,
            cache_dir: PathBuf::from(".claim_cache"),
            avoid_urls: Vec::new(),
        }
    }
}

impl HarvestConfig {
    /// Load a config file, falling back to defaults for absent keys.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml(&text).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        info!("Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".into()));
        }
        if self.site_concurrency == 0 || self.prefetch_window == 0 {
            return Err(ConfigError::Invalid(
                "site_concurrency and prefetch_window must be at least 1".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn grace_window(&self) -> Duration {
        Duration::from_millis(self.grace_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = HarvestConfig::from_yaml("site_concurrency: 2\navoid_urls: [\"https://a\"]\n")
            .unwrap();
        assert_eq!(config.site_concurrency, 2);
        assert_eq!(config.avoid_urls, vec!["https://a"]);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.cache_dir, PathBuf::from(".claim_cache"));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(HarvestConfig::from_yaml("").unwrap(), HarvestConfig::default());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let config = HarvestConfig {
            max_attempts: 0,
            ..HarvestConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = HarvestConfig::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "grace_window_ms: 10\ncache_dir: /tmp/cc\n").unwrap();
        let config = HarvestConfig::load(&path).unwrap();
        assert_eq!(config.grace_window(), Duration::from_millis(10));
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/cc"));
    }
}
