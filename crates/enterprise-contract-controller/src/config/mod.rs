// crates/enterprise-contract-controller/src/config/mod.rs
// ============================================================================
// Module: Controller Configuration
// Description: Configuration loading and validation for the controller.
// Purpose: Provide strict TOML parsing with explicit limits and defaults.
// Dependencies: serde, toml, thiserror
// ============================================================================

//! ## Overview
//! Configuration is read from `enterprise-contract.toml`, a path in
//! `ENTERPRISE_CONTRACT_CONFIG`, or an explicit path. An explicitly named file
//! must exist; a missing default file means "use defaults". Unknown keys are
//! rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::params::PARAMS_CONFIG_MAP;

pub mod examples;
pub mod schema;

pub use examples::config_toml_example;
pub use schema::config_schema;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "enterprise-contract.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "ENTERPRISE_CONTRACT_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 64 * 1024;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a namespace name.
pub(crate) const MAX_NAMESPACE_LENGTH: usize = 63;
/// Maximum length of a `ConfigMap` name.
pub(crate) const MAX_CONFIG_MAP_NAME_LENGTH: usize = 253;
/// Upper bound on either requeue delay (one day).
pub(crate) const MAX_REQUEUE_SECS: u64 = 86_400;
/// Default delay before retrying a transient failure.
pub(crate) const DEFAULT_TRANSIENT_REQUEUE_SECS: u64 = 15;
/// Default delay before retrying a permanent failure.
pub(crate) const DEFAULT_PERMANENT_REQUEUE_SECS: u64 = 300;
/// Default tracing filter directive.
pub(crate) const DEFAULT_LOG_FILTER: &str = "info";

/// Service-account namespace file mounted into every pod.
pub const SERVICE_ACCOUNT_NAMESPACE_FILE: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/namespace";
/// Namespace used when neither config nor pod environment names one.
pub const FALLBACK_NAMESPACE: &str = "default";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Model
// ============================================================================

/// Top-level controller configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    /// Reconciler settings.
    #[serde(default)]
    pub controller: ControllerSettings,
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Reconciler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerSettings {
    /// Namespace for verification `TaskRun`s and the params `ConfigMap`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Name of the params `ConfigMap`.
    #[serde(default = "default_params_config_map")]
    pub params_config_map: String,
    /// Requeue delay after a transient failure, in seconds.
    #[serde(default = "default_transient_requeue_secs")]
    pub transient_requeue_secs: u64,
    /// Requeue delay after a permanent failure, in seconds.
    #[serde(default = "default_permanent_requeue_secs")]
    pub permanent_requeue_secs: u64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            namespace: None,
            params_config_map: default_params_config_map(),
            transient_requeue_secs: default_transient_requeue_secs(),
            permanent_requeue_secs: default_permanent_requeue_secs(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { format: LogFormat::default(), filter: default_log_filter() }
    }
}

pub(crate) fn default_params_config_map() -> String {
    PARAMS_CONFIG_MAP.to_string()
}

pub(crate) const fn default_transient_requeue_secs() -> u64 {
    DEFAULT_TRANSIENT_REQUEUE_SECS
}

pub(crate) const fn default_permanent_requeue_secs() -> u64 {
    DEFAULT_PERMANENT_REQUEUE_SECS
}

pub(crate) fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl ControllerConfig {
    /// Loads configuration using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an explicit file is unreadable, parsing
    /// fails, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        if !explicit && !resolved.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let bytes = fs::read(&resolved).map_err(|err| {
            ConfigError::Io(format!("{}: {err}", resolved.display()))
        })?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.controller.validate()?;
        self.logging.validate()
    }
}

impl ControllerSettings {
    /// Validates reconciler settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a field is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(namespace) = &self.namespace {
            validate_dns_name("controller.namespace", namespace, NameRule::Label)?;
        }
        validate_dns_name("controller.params_config_map", &self.params_config_map, NameRule::Subdomain)?;
        validate_requeue("controller.transient_requeue_secs", self.transient_requeue_secs)?;
        validate_requeue("controller.permanent_requeue_secs", self.permanent_requeue_secs)
    }

    /// Requeue delay after a transient failure.
    #[must_use]
    pub const fn transient_requeue(&self) -> Duration {
        Duration::from_secs(self.transient_requeue_secs)
    }

    /// Requeue delay after a permanent failure.
    #[must_use]
    pub const fn permanent_requeue(&self) -> Duration {
        Duration::from_secs(self.permanent_requeue_secs)
    }

    /// Resolves the controller namespace from config or the pod environment.
    #[must_use]
    pub fn resolve_namespace(&self) -> String {
        self.resolve_namespace_from(Path::new(SERVICE_ACCOUNT_NAMESPACE_FILE))
    }

    /// Resolves the namespace, reading `namespace_file` when none is configured.
    #[must_use]
    pub fn resolve_namespace_from(&self, namespace_file: &Path) -> String {
        if let Some(namespace) = &self.namespace {
            return namespace.clone();
        }
        fs::read_to_string(namespace_file)
            .ok()
            .map(|contents| contents.trim().to_string())
            .filter(|namespace| !namespace.is_empty())
            .unwrap_or_else(|| FALLBACK_NAMESPACE.to_string())
    }
}

impl LoggingConfig {
    /// Validates log settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the filter directive does not parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.filter.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.filter must be non-empty".to_string()));
        }
        EnvFilter::try_new(&self.filter)
            .map_err(|err| ConfigError::Invalid(format!("logging.filter: {err}")))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path; the flag reports whether it was named explicitly.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        if !env_path.trim().is_empty() {
            return Ok((PathBuf::from(env_path), true));
        }
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates an RFC 1123 name under `rule`.
fn validate_dns_name(field: &str, value: &str, rule: NameRule) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    let max_len = rule.max_len();
    if value.len() > max_len {
        return Err(ConfigError::Invalid(format!("{field} exceeds {max_len} characters")));
    }
    let valid_chars = value.chars().all(|ch| {
        ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || (ch == '.' && rule.allows_dots())
    });
    let valid_ends = value.starts_with(|ch: char| ch.is_ascii_alphanumeric())
        && value.ends_with(|ch: char| ch.is_ascii_alphanumeric());
    if !valid_chars || !valid_ends {
        return Err(ConfigError::Invalid(format!("{field} must be a lowercase RFC 1123 {}", rule.noun())));
    }
    Ok(())
}

/// Kubernetes object name grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameRule {
    /// RFC 1123 label, used for namespaces.
    Label,
    /// RFC 1123 subdomain, used for most object names.
    Subdomain,
}

impl NameRule {
    const fn max_len(self) -> usize {
        match self {
            Self::Label => MAX_NAMESPACE_LENGTH,
            Self::Subdomain => MAX_CONFIG_MAP_NAME_LENGTH,
        }
    }

    const fn allows_dots(self) -> bool {
        matches!(self, Self::Subdomain)
    }

    const fn noun(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::Subdomain => "subdomain",
        }
    }
}

/// Validates a requeue delay in seconds.
fn validate_requeue(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid(format!("{field} must be greater than zero")));
    }
    if value > MAX_REQUEUE_SECS {
        return Err(ConfigError::Invalid(format!("{field} must be at most {MAX_REQUEUE_SECS}")));
    }
    Ok(())
}
