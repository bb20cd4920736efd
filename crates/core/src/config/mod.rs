//! Worker configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The generation identifier and the activation mode live here rather than in
//! code, so shipping a new deployment means changing `cache_name` only.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::policy::{DEFAULT_DYNAMIC_CONFIG_FILE, FetchPolicy};

mod validation;

pub use validation::ConfigError;

/// How a freshly installed worker takes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivationMode {
    /// Activate and claim pages as soon as install finishes.
    Auto,
    /// Stay waiting until the page sends `SKIP_WAITING`.
    #[default]
    UserGated,
}

/// Worker configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLCACHE_*)
/// 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Current cache generation identifier.
    ///
    /// Set via SHELLCACHE_CACHE_NAME. Bump it to ship a new generation.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Registration scope; seed paths resolve against it.
    ///
    /// Set via SHELLCACHE_SCOPE. Must end with `/`.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Assets fetched into the generation at install time, relative to `scope`.
    #[serde(default = "default_seed_paths")]
    pub seed_paths: Vec<String>,

    /// Filename of the dynamic JSON config served network-only.
    #[serde(default = "default_dynamic_config_file")]
    pub dynamic_config_file: String,

    /// Query parameter appended to defeat intermediary caches.
    #[serde(default = "default_bust_param")]
    pub bust_param: String,

    /// Auto or user-gated activation.
    ///
    /// Set via SHELLCACHE_ACTIVATION (`auto` or `user_gated`).
    #[serde(default)]
    pub activation: ActivationMode,

    /// Path to SQLite cache database.
    ///
    /// Set via SHELLCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes buffered per response.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Optional HTTP request timeout in milliseconds. No timeout when unset.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_cache_name() -> String {
    "dashboard-static-v1".into()
}

fn default_scope() -> String {
    "http://localhost:8080/".into()
}

fn default_seed_paths() -> Vec<String> {
    vec!["./".into(), "./index.html".into(), "./manifest.json".into()]
}

fn default_dynamic_config_file() -> String {
    DEFAULT_DYNAMIC_CONFIG_FILE.into()
}

fn default_bust_param() -> String {
    "v".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellcache.sqlite")
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_name: default_cache_name(),
            scope: default_scope(),
            seed_paths: default_seed_paths(),
            dynamic_config_file: default_dynamic_config_file(),
            bust_param: default_bust_param(),
            activation: ActivationMode::default(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: None,
        }
    }
}

impl WorkerConfig {
    /// Timeout as Duration for use with reqwest, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Classification rules for this deployment.
    pub fn policy(&self) -> FetchPolicy {
        FetchPolicy::new(self.dynamic_config_file.clone())
    }

    /// Parsed registration scope.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `scope` is not an absolute URL.
    pub fn scope_url(&self) -> Result<url::Url, ConfigError> {
        url::Url::parse(&self.scope)
            .map_err(|e| ConfigError::Invalid { field: "scope".into(), reason: e.to_string() })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLCACHE_`
    /// 2. TOML file from `SHELLCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELLCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
