// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Relay Configuration Types
//
// Defines the configuration schema for a docrelay process:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Outline connection settings (base URL, API key, timeout, retry budget)
// - Capability probe toggle
// - Lease backend selection and TTL bounds
// - Allowed action classes
//
// Values are layered: YAML manifest (explicit path or discovered) -> OUTLINE_*
// environment overrides -> `resolve()`, which validates and produces the
// `ResolvedConfig` consumed by the client and the lease crate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const API_VERSION: &str = "100monkeys.ai/v1";
pub const KIND: &str = "RelayConfig";
pub const DEFAULT_BASE_URL: &str = "https://app.getoutline.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {var}: '{value}'. {reason}")]
    InvalidEnvironment {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Action classes a dispatcher may be permitted to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllowedAction {
    Read,
    Write,
    Delete,
    Admin,
}

impl AllowedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for AllowedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllowedAction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "delete" => Ok(Self::Delete),
            "admin" => Ok(Self::Admin),
            other => Err(ConfigError::Invalid(format!(
                "OUTLINE_ALLOWED_ACTIONS has unsupported action \"{other}\". Allowed values: read, write, delete, admin"
            ))),
        }
    }
}

/// Parse a comma separated action list (`"read, Write"`).
pub fn parse_allowed_actions(raw: &str) -> Result<BTreeSet<AllowedAction>, ConfigError> {
    let tokens: Vec<String> = raw
        .split(',')
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect();

    if tokens.is_empty() {
        return Err(ConfigError::Invalid(
            "OUTLINE_ALLOWED_ACTIONS must include at least one action".to_string(),
        ));
    }

    tokens.iter().map(|token| token.parse()).collect()
}

/// Requested lease backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseStrategy {
    /// `data_attribute` when an attribute id is configured, otherwise `memory`.
    #[default]
    Auto,
    Memory,
    DataAttribute,
}

impl FromStr for LeaseStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "memory" => Ok(Self::Memory),
            "data_attribute" => Ok(Self::DataAttribute),
            _ => Err("Expected one of: auto, memory, data_attribute".to_string()),
        }
    }
}

/// Concrete lease backend after `auto` has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseBackend {
    Memory,
    DataAttribute,
}

impl LeaseBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::DataAttribute => "data_attribute",
        }
    }
}

impl fmt::Display for LeaseBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level Kubernetes-style relay configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// API version (must be "100monkeys.ai/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "RelayConfig")
    pub kind: String,

    pub metadata: ConfigMetadata,

    pub spec: RelayConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfigSpec {
    #[serde(default)]
    pub outline: OutlineSettings,

    #[serde(default)]
    pub lease: LeaseSettings,

    #[serde(default = "default_allowed_actions")]
    pub allowed_actions: Vec<AllowedAction>,
}

/// Connection settings for the Outline deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (usually supplied through OUTLINE_API_KEY instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Per-attempt request timeout
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Extra attempts after the first one for retryable failures
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Linear backoff step; attempt N waits N * this value
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_true")]
    pub enable_capability_probe: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseSettings {
    #[serde(default)]
    pub strategy: LeaseStrategy,

    /// Data attribute holding the lease JSON (data_attribute backend)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_id: Option<String>,

    #[serde(default = "default_lease_default_ttl")]
    pub default_ttl_seconds: i64,

    #[serde(default = "default_lease_max_ttl")]
    pub max_ttl_seconds: i64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_base_delay_ms() -> u64 {
    200
}

fn default_true() -> bool {
    true
}

fn default_lease_default_ttl() -> i64 {
    600
}

fn default_lease_max_ttl() -> i64 {
    7200
}

fn default_allowed_actions() -> Vec<AllowedAction> {
    vec![AllowedAction::Read, AllowedAction::Write, AllowedAction::Delete]
}

impl Default for OutlineSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            request_timeout_ms: default_request_timeout_ms(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            enable_capability_probe: true,
        }
    }
}

impl Default for LeaseSettings {
    fn default() -> Self {
        Self {
            strategy: LeaseStrategy::Auto,
            attribute_id: None,
            default_ttl_seconds: default_lease_default_ttl(),
            max_ttl_seconds: default_lease_max_ttl(),
        }
    }
}

impl Default for RelayConfigSpec {
    fn default() -> Self {
        Self {
            outline: OutlineSettings::default(),
            lease: LeaseSettings::default(),
            allowed_actions: default_allowed_actions(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ConfigMetadata {
                name: "docrelay".to_string(),
                version: Some("1.0.0".to_string()),
            },
            spec: RelayConfigSpec::default(),
        }
    }
}

/// Fully validated settings with `auto` resolved and TTLs clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Base URL without a trailing slash
    pub base_url: String,
    pub api_key: String,
    pub allowed_actions: BTreeSet<AllowedAction>,
    pub request_timeout: Duration,
    pub retry_count: u32,
    pub retry_base_delay: Duration,
    pub capability_probe_enabled: bool,
    pub lease: ResolvedLeaseSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLeaseSettings {
    pub backend: LeaseBackend,
    pub attribute_id: Option<String>,
    /// Never larger than `max_ttl_seconds`
    pub default_ttl_seconds: i64,
    pub max_ttl_seconds: i64,
}

impl RelayConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })
    }

    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, yaml).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Discover configuration file using precedence order
    /// 1. DOCRELAY_CONFIG_PATH environment variable
    /// 2. ./docrelay-config.yaml (working directory)
    /// 3. ~/.docrelay/config.yaml (user home)
    /// 4. /etc/docrelay/config.yaml (system, Unix) or C:\ProgramData\DocRelay\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("DOCRELAY_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./docrelay-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".docrelay").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/docrelay/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\DocRelay\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default.
    /// Environment overrides are applied in every case.
    pub fn load_or_default(cli_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)?;
            config.apply_env_overrides()?;
            return Ok(config);
        }

        let mut config = match Self::discover_config() {
            Some(config_path) => {
                tracing::info!("Loading configuration from discovered path: {:?}", config_path);
                Self::from_yaml_file(config_path)?
            }
            None => {
                tracing::debug!("No configuration file found in standard locations. Using defaults.");
                Self::default()
            }
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply OUTLINE_* overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_env_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply OUTLINE_* overrides from an arbitrary variable lookup.
    ///
    /// Empty values count as unset. Values that fail to parse are rejected
    /// rather than ignored, since they usually gate permissions or retries.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let outline = &mut self.spec.outline;
        let lease = &mut self.spec.lease;

        if let Some(val) = get("OUTLINE_API_KEY") {
            outline.api_key = Some(val);
        }
        if let Some(val) = get("OUTLINE_BASE_URL") {
            tracing::debug!("Environment override: OUTLINE_BASE_URL={}", val);
            outline.base_url = val;
        }
        if let Some(val) = get("OUTLINE_ALLOWED_ACTIONS") {
            self.spec.allowed_actions = parse_allowed_actions(&val)?.into_iter().collect();
        }
        if let Some(val) = get("OUTLINE_REQUEST_TIMEOUT_MS") {
            outline.request_timeout_ms = parse_env_number("OUTLINE_REQUEST_TIMEOUT_MS", &val)?;
        }
        if let Some(val) = get("OUTLINE_RETRY_COUNT") {
            outline.retry_count = parse_env_number("OUTLINE_RETRY_COUNT", &val)?;
        }
        if let Some(val) = get("OUTLINE_ENABLE_CAPABILITY_PROBE") {
            outline.enable_capability_probe = match val.trim() {
                "true" => true,
                "false" => false,
                _ => {
                    return Err(ConfigError::InvalidEnvironment {
                        var: "OUTLINE_ENABLE_CAPABILITY_PROBE",
                        value: val.clone(),
                        reason: "Expected true or false.".to_string(),
                    })
                }
            };
        }
        if let Some(val) = get("OUTLINE_LEASE_STRATEGY") {
            lease.strategy =
                val.trim()
                    .parse()
                    .map_err(|reason| ConfigError::InvalidEnvironment {
                        var: "OUTLINE_LEASE_STRATEGY",
                        value: val.clone(),
                        reason,
                    })?;
        }
        if let Some(val) = get("OUTLINE_LEASE_ATTRIBUTE_ID") {
            lease.attribute_id = Some(val);
        }
        if let Some(val) = get("OUTLINE_LEASE_DEFAULT_TTL_SECONDS") {
            lease.default_ttl_seconds =
                parse_env_number("OUTLINE_LEASE_DEFAULT_TTL_SECONDS", &val)?;
        }
        if let Some(val) = get("OUTLINE_LEASE_MAX_TTL_SECONDS") {
            lease.max_ttl_seconds = parse_env_number("OUTLINE_LEASE_MAX_TTL_SECONDS", &val)?;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_version != API_VERSION {
            return Err(ConfigError::Invalid(format!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version, API_VERSION
            )));
        }
        if self.kind != KIND {
            return Err(ConfigError::Invalid(format!(
                "Invalid kind: '{}'. Must be '{}'",
                self.kind, KIND
            )));
        }

        let outline = &self.spec.outline;
        if outline.api_key.as_deref().is_none_or(|key| key.trim().is_empty()) {
            return Err(ConfigError::Invalid("OUTLINE_API_KEY is required".to_string()));
        }

        let url = url::Url::parse(&outline.base_url).map_err(|e| {
            ConfigError::Invalid(format!("Invalid base_url '{}': {}", outline.base_url, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Invalid(format!(
                "Invalid base_url '{}': scheme must be http or https",
                outline.base_url
            )));
        }

        if outline.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_ms must be positive".to_string(),
            ));
        }

        if self.spec.allowed_actions.is_empty() {
            return Err(ConfigError::Invalid(
                "allowed_actions must include at least one action".to_string(),
            ));
        }

        let lease = &self.spec.lease;
        if lease.default_ttl_seconds <= 0 {
            return Err(ConfigError::Invalid(
                "lease.default_ttl_seconds must be positive".to_string(),
            ));
        }
        if lease.max_ttl_seconds <= 0 {
            return Err(ConfigError::Invalid(
                "lease.max_ttl_seconds must be positive".to_string(),
            ));
        }
        if lease.attribute_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "lease.attribute_id cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate and produce the settings the runtime works with
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        self.validate()?;

        let outline = &self.spec.outline;
        let lease = &self.spec.lease;

        let backend = match lease.strategy {
            LeaseStrategy::Auto if lease.attribute_id.is_some() => LeaseBackend::DataAttribute,
            LeaseStrategy::Auto | LeaseStrategy::Memory => LeaseBackend::Memory,
            LeaseStrategy::DataAttribute => LeaseBackend::DataAttribute,
        };

        let base_url = outline
            .base_url
            .strip_suffix('/')
            .unwrap_or(&outline.base_url)
            .to_string();

        Ok(ResolvedConfig {
            base_url,
            api_key: outline.api_key.clone().unwrap_or_default(),
            allowed_actions: self.spec.allowed_actions.iter().copied().collect(),
            request_timeout: Duration::from_millis(outline.request_timeout_ms),
            retry_count: outline.retry_count,
            retry_base_delay: Duration::from_millis(outline.retry_base_delay_ms),
            capability_probe_enabled: outline.enable_capability_probe,
            lease: ResolvedLeaseSettings {
                backend,
                attribute_id: lease.attribute_id.clone(),
                default_ttl_seconds: lease.default_ttl_seconds.min(lease.max_ttl_seconds),
                max_ttl_seconds: lease.max_ttl_seconds,
            },
        })
    }
}

fn parse_env_number<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvironment {
            var,
            value: value.to_string(),
            reason: "Expected a non-negative integer.".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn config_with(pairs: &[(&str, &str)]) -> Result<RelayConfig, ConfigError> {
        let vars = env(pairs);
        let mut config = RelayConfig::default();
        config.apply_env_overrides_from(|name| vars.get(name).cloned())?;
        Ok(config)
    }

    #[test]
    fn test_default_manifest() {
        let config = RelayConfig::default();
        assert_eq!(config.api_version, API_VERSION);
        assert_eq!(config.kind, KIND);
        assert_eq!(config.spec.outline.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.spec.outline.request_timeout_ms, 15_000);
        assert_eq!(config.spec.outline.retry_count, 2);
        assert!(config.spec.outline.enable_capability_probe);
        assert_eq!(config.spec.lease.strategy, LeaseStrategy::Auto);
        assert_eq!(config.spec.lease.default_ttl_seconds, 600);
        assert_eq!(config.spec.lease.max_ttl_seconds, 7200);
        assert_eq!(
            config.spec.allowed_actions,
            vec![AllowedAction::Read, AllowedAction::Write, AllowedAction::Delete]
        );
    }

    #[test]
    fn test_missing_api_key_fails_validation() {
        let err = RelayConfig::default().resolve().unwrap_err();
        assert!(err.to_string().contains("OUTLINE_API_KEY is required"));
    }

    #[test]
    fn test_resolve_auto_strategy() {
        let resolved = config_with(&[("OUTLINE_API_KEY", "key")])
            .unwrap()
            .resolve()
            .unwrap();
        assert_eq!(resolved.lease.backend, LeaseBackend::Memory);

        let resolved = config_with(&[
            ("OUTLINE_API_KEY", "key"),
            ("OUTLINE_LEASE_ATTRIBUTE_ID", "attr-1"),
        ])
        .unwrap()
        .resolve()
        .unwrap();
        assert_eq!(resolved.lease.backend, LeaseBackend::DataAttribute);
        assert_eq!(resolved.lease.attribute_id.as_deref(), Some("attr-1"));
    }

    #[test]
    fn test_explicit_memory_strategy_ignores_attribute() {
        let resolved = config_with(&[
            ("OUTLINE_API_KEY", "key"),
            ("OUTLINE_LEASE_STRATEGY", "memory"),
            ("OUTLINE_LEASE_ATTRIBUTE_ID", "attr-1"),
        ])
        .unwrap()
        .resolve()
        .unwrap();
        assert_eq!(resolved.lease.backend, LeaseBackend::Memory);
    }

    #[test]
    fn test_data_attribute_strategy_resolves_without_attribute_id() {
        let resolved = config_with(&[
            ("OUTLINE_API_KEY", "key"),
            ("OUTLINE_LEASE_STRATEGY", "data_attribute"),
        ])
        .unwrap()
        .resolve()
        .unwrap();
        assert_eq!(resolved.lease.backend, LeaseBackend::DataAttribute);
        assert!(resolved.lease.attribute_id.is_none());
    }

    #[test]
    fn test_default_ttl_clamped_to_max() {
        let resolved = config_with(&[
            ("OUTLINE_API_KEY", "key"),
            ("OUTLINE_LEASE_DEFAULT_TTL_SECONDS", "900"),
            ("OUTLINE_LEASE_MAX_TTL_SECONDS", "300"),
        ])
        .unwrap()
        .resolve()
        .unwrap();
        assert_eq!(resolved.lease.default_ttl_seconds, 300);
        assert_eq!(resolved.lease.max_ttl_seconds, 300);
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let resolved = config_with(&[
            ("OUTLINE_API_KEY", "key"),
            ("OUTLINE_BASE_URL", "https://docs.example.com/"),
        ])
        .unwrap()
        .resolve()
        .unwrap();
        assert_eq!(resolved.base_url, "https://docs.example.com");
    }

    #[test]
    fn test_env_overrides_numbers_and_flags() {
        let resolved = config_with(&[
            ("OUTLINE_API_KEY", "key"),
            ("OUTLINE_REQUEST_TIMEOUT_MS", "2500"),
            ("OUTLINE_RETRY_COUNT", "0"),
            ("OUTLINE_ENABLE_CAPABILITY_PROBE", "false"),
        ])
        .unwrap()
        .resolve()
        .unwrap();
        assert_eq!(resolved.request_timeout, Duration::from_millis(2500));
        assert_eq!(resolved.retry_count, 0);
        assert!(!resolved.capability_probe_enabled);
    }

    #[test]
    fn test_invalid_env_values_rejected() {
        assert!(matches!(
            config_with(&[("OUTLINE_RETRY_COUNT", "-1")]),
            Err(ConfigError::InvalidEnvironment { var: "OUTLINE_RETRY_COUNT", .. })
        ));
        assert!(matches!(
            config_with(&[("OUTLINE_ENABLE_CAPABILITY_PROBE", "yes")]),
            Err(ConfigError::InvalidEnvironment { .. })
        ));
        assert!(matches!(
            config_with(&[("OUTLINE_LEASE_STRATEGY", "redis")]),
            Err(ConfigError::InvalidEnvironment { .. })
        ));
    }

    #[test]
    fn test_parse_allowed_actions() {
        let actions = parse_allowed_actions(" Read, write ,,admin").unwrap();
        assert_eq!(
            actions.into_iter().collect::<Vec<_>>(),
            vec![AllowedAction::Read, AllowedAction::Write, AllowedAction::Admin]
        );

        let err = parse_allowed_actions("read,publish").unwrap_err();
        assert!(err.to_string().contains("unsupported action \"publish\""));

        let err = parse_allowed_actions(" , ").unwrap_err();
        assert!(err.to_string().contains("at least one action"));
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docrelay-config.yaml");

        let mut config = RelayConfig::default();
        config.spec.outline.api_key = Some("key".to_string());
        config.spec.lease.attribute_id = Some("attr-9".to_string());
        config.to_yaml_file(&path).unwrap();

        let loaded = RelayConfig::from_yaml_file(&path).unwrap();
        assert_eq!(loaded.spec.lease.attribute_id.as_deref(), Some("attr-9"));
        assert_eq!(
            loaded.resolve().unwrap().lease.backend,
            LeaseBackend::DataAttribute
        );
    }

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let yaml = r#"
apiVersion: 100monkeys.ai/v1
kind: RelayConfig
metadata:
  name: test-relay
spec:
  outline:
    api_key: secret
"#;
        let config = RelayConfig::from_yaml_str(yaml).unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
        assert_eq!(resolved.retry_base_delay, Duration::from_millis(200));
        assert_eq!(resolved.allowed_actions.len(), 3);
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let err = RelayConfig::load_or_default(Some(PathBuf::from("/nonexistent/docrelay.yaml")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
