//! Configuration loading and validation

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::engine::EvaluatorConfig;
use crate::error::{AuthzError, Result};
use crate::store::StoreConfig;

/// Complete access-control configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccessControlConfig {
    /// Let members of `privileged_group` bypass every restriction
    #[serde(default = "default_true")]
    pub admin_bypass: bool,

    /// Group whose members bypass restrictions
    #[serde(default = "default_privileged_group")]
    pub privileged_group: String,

    /// Show search snippets of restricted pages to everyone unless a page
    /// opts out with `(nosearch)`
    #[serde(default)]
    pub allow_search_snippet_for_all: bool,

    /// Collect evaluator metrics
    #[serde(default = "default_true")]
    pub metrics: bool,

    #[serde(default)]
    pub cache: CacheSection,

    #[serde(default)]
    pub store: StoreSection,
}

/// Cache sizing and expiry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheSection {
    /// Lifetime of a cached group classification, in seconds
    #[serde(default = "default_group_ttl")]
    pub group_ttl_secs: u64,

    /// Lifetime of a cached page restriction, in seconds
    #[serde(default = "default_page_ttl")]
    pub page_ttl_secs: u64,

    /// Maximum number of page restrictions kept in memory
    #[serde(default = "default_page_capacity")]
    pub page_capacity: usize,
}

/// Persistent restriction store
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StoreSection {
    /// Primary database URL (writes)
    #[serde(default)]
    pub primary_url: Option<String>,
    /// Replica database URL (reads); the primary is used when absent
    #[serde(default)]
    pub replica_url: Option<String>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            group_ttl_secs: default_group_ttl(),
            page_ttl_secs: default_page_ttl(),
            page_capacity: default_page_capacity(),
        }
    }
}

impl Default for AccessControlConfig {
    fn default() -> Self {
        Self {
            admin_bypass: true,
            privileged_group: default_privileged_group(),
            allow_search_snippet_for_all: false,
            metrics: true,
            cache: CacheSection::default(),
            store: StoreSection::default(),
        }
    }
}

fn default_true() -> bool { true }
fn default_privileged_group() -> String { "sysop".to_string() }
fn default_group_ttl() -> u64 { 300 }
fn default_page_ttl() -> u64 { 60 }
fn default_page_capacity() -> usize { 10_000 }

impl AccessControlConfig {
    /// Load configuration from TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AccessControlConfig = toml::from_str(contents)
            .map_err(|e| AuthzError::Config(format!("Failed to parse configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.admin_bypass && self.privileged_group.trim().is_empty() {
            return Err(AuthzError::Config(
                "privileged_group must be set when admin_bypass is enabled".to_string(),
            ));
        }

        if self.cache.page_capacity == 0 {
            return Err(AuthzError::Config("cache.page_capacity must be positive".to_string()));
        }

        if self.store.replica_url.is_some() && self.store.primary_url.is_none() {
            return Err(AuthzError::Config(
                "store.replica_url requires store.primary_url".to_string(),
            ));
        }

        Ok(())
    }

    /// Evaluator settings
    pub fn evaluator(&self) -> EvaluatorConfig {
        EvaluatorConfig {
            admin_bypass: self.admin_bypass,
            privileged_group: self.privileged_group.clone(),
            enable_metrics: self.metrics,
        }
    }

    /// Restriction cache settings
    pub fn page_cache(&self) -> StoreConfig {
        StoreConfig {
            capacity: self.cache.page_capacity,
            ttl: Duration::from_secs(self.cache.page_ttl_secs),
        }
    }

    /// Group resolution cache TTL
    pub fn group_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.group_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = AccessControlConfig::from_toml("").unwrap();
        assert!(config.admin_bypass);
        assert_eq!(config.privileged_group, "sysop");
        assert!(!config.allow_search_snippet_for_all);
        assert_eq!(config.group_ttl(), Duration::from_secs(300));
        assert_eq!(config.page_cache().capacity, 10_000);
    }

    #[test]
    fn test_parse_full_config() {
        let config = AccessControlConfig::from_toml(
            r#"
            admin_bypass = false
            privileged_group = "bureaucrat"
            allow_search_snippet_for_all = true
            metrics = false

            [cache]
            group_ttl_secs = 10
            page_ttl_secs = 5
            page_capacity = 100

            [store]
            primary_url = "postgresql://localhost/wiki"
            "#,
        )
        .unwrap();

        assert!(!config.admin_bypass);
        assert!(config.allow_search_snippet_for_all);
        assert_eq!(config.evaluator().privileged_group, "bureaucrat");
        assert!(!config.evaluator().enable_metrics);
        assert_eq!(config.page_cache().ttl, Duration::from_secs(5));
        assert_eq!(config.store.primary_url.as_deref(), Some("postgresql://localhost/wiki"));
        assert!(config.store.replica_url.is_none());
    }

    #[test]
    fn test_validation_errors() {
        assert!(AccessControlConfig::from_toml("privileged_group = \"\"").is_err());
        assert!(AccessControlConfig::from_toml("[cache]\npage_capacity = 0").is_err());
        assert!(AccessControlConfig::from_toml("[store]\nreplica_url = \"x\"").is_err());
        assert!(AccessControlConfig::from_toml("admin_bypass = \"yes\"").is_err());

        let no_bypass = AccessControlConfig::from_toml("admin_bypass = false\nprivileged_group = \"\"");
        assert!(no_bypass.is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accesscontrol.toml");
        std::fs::write(&path, "allow_search_snippet_for_all = true\n").unwrap();

        let config = AccessControlConfig::load(&path).unwrap();
        assert!(config.allow_search_snippet_for_all);

        assert!(AccessControlConfig::load(dir.path().join("missing.toml")).is_err());
    }
}
