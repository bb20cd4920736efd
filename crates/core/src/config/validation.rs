//! Configuration validation rules.
//!
//! This module provides validation logic for `WorkerConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::WorkerConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl WorkerConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `cache_name` is empty, and
    /// `ConfigError::Invalid` if:
    /// - `scope` is not an absolute http(s) URL ending in `/`
    /// - a seed path carries a scheme
    /// - `dynamic_config_file` is empty or contains `/`
    /// - `bust_param` or `user_agent` is empty
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is set below 100ms or above 5 minutes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_name.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "cache_name".into(),
                hint: "Set SHELLCACHE_CACHE_NAME to the generation identifier".into(),
            });
        }

        let scope = self.scope_url()?;
        if !matches!(scope.scheme(), "http" | "https") {
            return Err(invalid("scope", format!("unsupported scheme: {}", scope.scheme())));
        }
        if !scope.path().ends_with('/') {
            return Err(invalid("scope", "must end with '/'"));
        }

        if let Some(path) = self.seed_paths.iter().find(|p| p.contains("://")) {
            return Err(invalid("seed_paths", format!("must be relative to scope: {path}")));
        }

        if self.dynamic_config_file.is_empty() || self.dynamic_config_file.contains('/') {
            return Err(invalid("dynamic_config_file", "must be a bare filename"));
        }

        if self.bust_param.is_empty() {
            return Err(invalid("bust_param", "must not be empty"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if let Some(timeout_ms) = self.timeout_ms {
            if timeout_ms < 100 {
                return Err(invalid("timeout_ms", "must be at least 100ms"));
            }
            if timeout_ms > 300_000 {
                return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
            }
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.seed_paths.is_empty() {
            tracing::warn!(cache_name = %self.cache_name, "seed_paths is empty; install will create an empty generation");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(config: WorkerConfig, expected: &str) {
        let result = config.validate();
        assert!(
            matches!(&result, Err(ConfigError::Invalid { field, .. }) if field == expected),
            "expected invalid {expected}, got {result:?}"
        );
    }

    #[test]
    fn test_validate_default_config() {
        assert!(WorkerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_cache_name() {
        let config = WorkerConfig { cache_name: "  ".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Missing { field, .. }) if field == "cache_name"));
    }

    #[test]
    fn test_validate_scope() {
        assert_invalid(WorkerConfig { scope: "not a url".into(), ..Default::default() }, "scope");
        assert_invalid(WorkerConfig { scope: "ftp://example.com/".into(), ..Default::default() }, "scope");
        assert_invalid(WorkerConfig { scope: "https://example.com/app".into(), ..Default::default() }, "scope");

        let config = WorkerConfig { scope: "https://example.com/app/".into(), ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_absolute_seed() {
        let config = WorkerConfig { seed_paths: vec!["https://cdn.example/x.css".into()], ..Default::default() };
        assert_invalid(config, "seed_paths");
    }

    #[test]
    fn test_validate_root_looking_seed_allowed() {
        let config = WorkerConfig { seed_paths: vec!["/".into(), "/index.html".into()], ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_dynamic_config_file() {
        assert_invalid(WorkerConfig { dynamic_config_file: String::new(), ..Default::default() }, "dynamic_config_file");
        assert_invalid(
            WorkerConfig { dynamic_config_file: "data/buttons.json".into(), ..Default::default() },
            "dynamic_config_file",
        );
    }

    #[test]
    fn test_validate_bust_param() {
        assert_invalid(WorkerConfig { bust_param: String::new(), ..Default::default() }, "bust_param");
    }

    #[test]
    fn test_validate_max_bytes() {
        assert_invalid(WorkerConfig { max_bytes: 0, ..Default::default() }, "max_bytes");
        assert_invalid(WorkerConfig { max_bytes: 51 * 1024 * 1024, ..Default::default() }, "max_bytes");
        assert!(WorkerConfig { max_bytes: 50 * 1024 * 1024, ..Default::default() }.validate().is_ok());
    }

    #[test]
    fn test_validate_timeout() {
        assert_invalid(WorkerConfig { timeout_ms: Some(50), ..Default::default() }, "timeout_ms");
        assert_invalid(WorkerConfig { timeout_ms: Some(301_000), ..Default::default() }, "timeout_ms");
        assert!(WorkerConfig { timeout_ms: Some(100), ..Default::default() }.validate().is_ok());
        assert!(WorkerConfig { timeout_ms: None, ..Default::default() }.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_user_agent() {
        assert_invalid(WorkerConfig { user_agent: String::new(), ..Default::default() }, "user_agent");
    }
}
