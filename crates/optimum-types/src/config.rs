//! Configuration loading for optimum.
//!
//! Layered config: defaults -> user config file -> explicit config file ->
//! env vars (`OPTIMUM_*`) -> CLI flags. The result is immutable once
//! handed to the client, writers and job poller.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::OptimumError;
use crate::vector::MAX_KEY_LEN;

/// Representation of vector records on the wire.
///
/// A deployment uses exactly one of them; both are gzip-compressed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// Length-prefixed binary frames, uploaded with PUT to the bulk endpoint.
    #[default]
    Binary,
    /// JSON lines, uploaded with POST to the objects endpoint.
    Json,
}

/// What to do with unique keys longer than the configured limit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeyPolicy {
    /// Cut the key to the limit. Distinct keys sharing a prefix collide.
    #[default]
    Truncate,
    /// Fail the write.
    Reject,
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Service base URL, e.g. `https://example.com`
    #[serde(default)]
    pub host: String,

    /// Bearer token for the service (loaded from env var, not stored in config file)
    #[serde(default)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Segment flush threshold, in compressed bytes
    #[serde(default = "default_chunk_bytes")]
    pub chunk_bytes: usize,

    /// Idle time between job status polls, in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Wire representation of vector records
    #[serde(default)]
    pub wire_format: WireFormat,

    /// Handling of oversized unique keys
    #[serde(default)]
    pub key_policy: KeyPolicy,

    /// Maximum unique key length in bytes
    #[serde(default = "default_key_limit")]
    pub key_limit: usize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_chunk_bytes() -> usize {
    4 * 1024 * 1024
}

fn default_poll_interval_secs() -> u64 {
    20
}

fn default_key_limit() -> usize {
    MAX_KEY_LEN
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: String::new(),
            token: None,
            timeout_secs: default_timeout_secs(),
            chunk_bytes: default_chunk_bytes(),
            poll_interval_secs: default_poll_interval_secs(),
            wire_format: WireFormat::default(),
            key_policy: KeyPolicy::default(),
            key_limit: default_key_limit(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/optimum/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (OPTIMUM_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, OptimumError> {
        let config_dir = ProjectDirs::from("", "", "optimum")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("host", "")
            .map_err(|e| OptimumError::Config(e.to_string()))?
            .set_default("timeout_secs", default_timeout_secs() as i64)
            .map_err(|e| OptimumError::Config(e.to_string()))?
            .set_default("chunk_bytes", default_chunk_bytes() as i64)
            .map_err(|e| OptimumError::Config(e.to_string()))?
            .set_default("poll_interval_secs", default_poll_interval_secs() as i64)
            .map_err(|e| OptimumError::Config(e.to_string()))?
            .set_default("wire_format", "binary")
            .map_err(|e| OptimumError::Config(e.to_string()))?
            .set_default("key_policy", "truncate")
            .map_err(|e| OptimumError::Config(e.to_string()))?
            .set_default("key_limit", default_key_limit() as i64)
            .map_err(|e| OptimumError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| OptimumError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // OPTIMUM_HOST, OPTIMUM_CHUNK_BYTES, OPTIMUM_POLL_INTERVAL_SECS, ...
        builder = builder.add_source(
            Environment::with_prefix("OPTIMUM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| OptimumError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| OptimumError::Config(e.to_string()))
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), OptimumError> {
        if self.host.is_empty() {
            return Err(OptimumError::Config(
                "host is not set (use --host or OPTIMUM_HOST)".to_string(),
            ));
        }
        if !(self.host.starts_with("http://") || self.host.starts_with("https://")) {
            return Err(OptimumError::Config(format!(
                "host must be an http(s) URL, got '{}'",
                self.host
            )));
        }
        if self.chunk_bytes == 0 {
            return Err(OptimumError::Config("chunk_bytes must be > 0".to_string()));
        }
        if self.poll_interval_secs == 0 {
            return Err(OptimumError::Config(
                "poll_interval_secs must be > 0".to_string(),
            ));
        }
        if self.key_limit == 0 || self.key_limit > u8::MAX as usize {
            return Err(OptimumError::Config(format!(
                "key_limit must be 1-255, got {}",
                self.key_limit
            )));
        }
        Ok(())
    }

    /// Host without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.host.trim_end_matches('/')
    }

    /// Idle time between job status polls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Timeout of a single HTTP request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid() -> Settings {
        Settings {
            host: "https://example.com".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.chunk_bytes, 4 * 1024 * 1024);
        assert_eq!(settings.poll_interval(), Duration::from_secs(20));
        assert_eq!(settings.wire_format, WireFormat::Binary);
        assert_eq!(settings.key_policy, KeyPolicy::Truncate);
        assert_eq!(settings.key_limit, 32);
    }

    #[test]
    fn test_validate_requires_host() {
        let settings = Settings::default();
        assert!(settings.validate().is_err());
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = valid();
        settings.host = "example.com".to_string();
        assert!(settings.validate().is_err());

        let mut settings = valid();
        settings.chunk_bytes = 0;
        assert!(settings.validate().is_err());

        let mut settings = valid();
        settings.poll_interval_secs = 0;
        assert!(settings.validate().is_err());

        let mut settings = valid();
        settings.key_limit = 256;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_base_url_strips_trailing_slash() {
        let mut settings = valid();
        settings.host = "https://example.com/".to_string();
        assert_eq!(settings.base_url(), "https://example.com");
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
host = "http://localhost:8080"
chunk_bytes = 1024
poll_interval_secs = 5
wire_format = "json"
key_policy = "reject"
"#
        )
        .unwrap();

        let settings = Settings::load(Some(&file.path().to_string_lossy())).unwrap();
        assert_eq!(settings.host, "http://localhost:8080");
        assert_eq!(settings.chunk_bytes, 1024);
        assert_eq!(settings.poll_interval_secs, 5);
        assert_eq!(settings.wire_format, WireFormat::Json);
        assert_eq!(settings.key_policy, KeyPolicy::Reject);
        assert_eq!(settings.key_limit, 32);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let result = Settings::load(Some("/nonexistent/optimum-config.toml"));
        assert!(matches!(result, Err(OptimumError::Config(_))));
    }

    #[test]
    fn test_wire_format_serde() {
        let json = serde_json::to_string(&WireFormat::Json).unwrap();
        assert_eq!(json, r#""json""#);
        let parsed: KeyPolicy = serde_json::from_str(r#""truncate""#).unwrap();
        assert_eq!(parsed, KeyPolicy::Truncate);
    }
}
