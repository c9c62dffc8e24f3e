// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Client configuration and delivery mode validation.
//!
//! [`ClientConfig`] is the raw, host-supplied form. It is turned into a
//! [`ResolvedConfig`] by [`ClientConfig::resolve`], which validates the mode
//! before anything else and resolves the local log file location.

use crate::constants;
use crate::error::ConfigError;
use crate::path::resolve_log_path;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Delivery target of a client. The two modes are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Entries are appended to a JSON array file on the local filesystem.
    Local,
    /// Entries are posted in batches to a remote log collector.
    Server,
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "server" => Ok(Self::Server),
            other => Err(ConfigError::InvalidMode {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "LOCAL"),
            Self::Server => write!(f, "SERVER"),
        }
    }
}

/// Configuration supplied by the host application.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL for the request helpers, and the ping target in server mode.
    pub endpoint: String,
    /// Identifier stamped on every entry.
    pub app: String,
    /// Either `"local"` or `"server"`; anything else fails construction.
    pub mode: String,
    /// File or directory for the local sink. Only read in local mode.
    pub local_log_path: Option<String>,
    /// Base URL of the log collector. Required in server mode.
    pub log_collection_url: Option<String>,
    pub flush_interval_ms: u64,
    pub max_buffer_size: usize,
    pub max_in_flight_flushes: usize,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            app: String::new(),
            mode: String::new(),
            local_log_path: None,
            log_collection_url: None,
            flush_interval_ms: constants::FLUSH_INTERVAL_MS,
            max_buffer_size: constants::MAX_BUFFER_SIZE,
            max_in_flight_flushes: constants::MAX_IN_FLIGHT_FLUSHES,
            request_timeout_secs: constants::REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Configuration for a client writing to a local file.
    pub fn local(app: impl Into<String>, local_log_path: Option<String>) -> Self {
        Self {
            app: app.into(),
            mode: "local".to_string(),
            local_log_path,
            ..Default::default()
        }
    }

    /// Configuration for a client posting to a remote collector.
    pub fn server(
        endpoint: impl Into<String>,
        app: impl Into<String>,
        log_collection_url: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            app: app.into(),
            mode: "server".to_string(),
            log_collection_url: Some(log_collection_url.into()),
            ..Default::default()
        }
    }

    /// Create configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            endpoint: lookup("SENINTEL_ENDPOINT").unwrap_or_default(),
            app: lookup("SENINTEL_APP").unwrap_or_default(),
            mode: lookup("SENINTEL_MODE")
                .map(|val| val.trim().to_string())
                .unwrap_or_default(),
            local_log_path: lookup("SENINTEL_LOCAL_LOG_PATH").filter(|val| !val.is_empty()),
            log_collection_url: lookup("MONITOR_DB_URL").filter(|val| !val.is_empty()),
            flush_interval_ms: lookup("SENINTEL_FLUSH_INTERVAL_MS")
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(defaults.flush_interval_ms),
            max_buffer_size: lookup("SENINTEL_MAX_BUFFER_SIZE")
                .and_then(|val| val.parse::<usize>().ok())
                .unwrap_or(defaults.max_buffer_size),
            max_in_flight_flushes: defaults.max_in_flight_flushes,
            request_timeout_secs: defaults.request_timeout_secs,
        }
    }

    /// Validate the configuration and resolve the local log path.
    ///
    /// The mode is checked first so an invalid mode never touches the
    /// filesystem or the network.
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        let mode = Mode::from_str(&self.mode)?;

        if self.flush_interval_ms == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "flush_interval_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.max_buffer_size == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "max_buffer_size",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.max_in_flight_flushes == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "max_in_flight_flushes",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "request_timeout_secs",
                reason: "must be greater than 0".to_string(),
            });
        }

        let (local_log_path, log_collection_url) = match mode {
            Mode::Local => {
                let path = resolve_log_path(self.local_log_path.as_deref()).map_err(|source| {
                    ConfigError::LocalSetup {
                        path: PathBuf::from(self.local_log_path.clone().unwrap_or_default()),
                        source,
                    }
                })?;
                (Some(path), None)
            }
            Mode::Server => {
                if self.endpoint.trim().is_empty() {
                    return Err(ConfigError::MissingSetting("endpoint"));
                }
                let url = self
                    .log_collection_url
                    .as_deref()
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .ok_or(ConfigError::MissingSetting("log_collection_url"))?;
                (None, Some(url.trim_end_matches('/').to_string()))
            }
        };

        Ok(ResolvedConfig {
            endpoint: self.endpoint.trim_end_matches('/').to_string(),
            app: self.app.clone(),
            mode,
            local_log_path,
            log_collection_url,
            flush_interval: Duration::from_millis(self.flush_interval_ms),
            max_buffer_size: self.max_buffer_size,
            max_in_flight_flushes: self.max_in_flight_flushes,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        })
    }
}

/// Validated configuration. Immutable for the lifetime of a client.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub endpoint: String,
    pub app: String,
    pub mode: Mode,
    /// Present only in local mode.
    pub local_log_path: Option<PathBuf>,
    /// Present only in server mode.
    pub log_collection_url: Option<String>,
    pub flush_interval: Duration,
    pub max_buffer_size: usize,
    pub max_in_flight_flushes: usize,
    pub request_timeout: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_mode_from_str() {
        assert_eq!(Mode::from_str("local").unwrap(), Mode::Local);
        assert_eq!(Mode::from_str("server").unwrap(), Mode::Server);
    }

    #[test]
    fn test_mode_rejects_everything_else() {
        for value in ["", "LOCAL", "Server", "remote", " local"] {
            match Mode::from_str(value) {
                Err(ConfigError::InvalidMode { value: v }) => assert_eq!(v, value),
                other => panic!("expected InvalidMode for {value:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_mode_serde() {
        assert_eq!(serde_json::to_string(&Mode::Local).unwrap(), "\"local\"");
        let mode: Mode = serde_json::from_str("\"server\"").unwrap();
        assert_eq!(mode, Mode::Server);
        assert!(serde_json::from_str::<Mode>("\"both\"").is_err());
    }

    #[test]
    fn test_default_config_has_fixed_values() {
        let config = ClientConfig::default();
        assert_eq!(config.flush_interval_ms, 5000);
        assert_eq!(config.max_buffer_size, 10);
    }

    #[test]
    fn test_resolve_invalid_mode_before_path_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("never-created");
        let config = ClientConfig {
            mode: "files".to_string(),
            local_log_path: Some(target.to_string_lossy().into_owned()),
            ..Default::default()
        };

        assert!(matches!(
            config.resolve(),
            Err(ConfigError::InvalidMode { .. })
        ));
        assert!(!target.exists());
    }

    #[test]
    fn test_resolve_missing_mode() {
        let config = ClientConfig::default();
        match config.resolve() {
            Err(ConfigError::InvalidMode { value }) => assert!(value.is_empty()),
            other => panic!("expected InvalidMode, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_local_sets_path_only() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::local("billing", Some(dir.path().to_string_lossy().into_owned()));

        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.mode, Mode::Local);
        assert_eq!(
            resolved.local_log_path.unwrap(),
            dir.path().join(constants::LOG_FILE_NAME)
        );
        assert!(resolved.log_collection_url.is_none());
    }

    #[test]
    fn test_resolve_server_requires_collection_url() {
        let config = ClientConfig {
            endpoint: "http://localhost:3000".to_string(),
            mode: "server".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::MissingSetting("log_collection_url"))
        ));
    }

    #[test]
    fn test_resolve_server_requires_endpoint() {
        let config = ClientConfig::server("", "billing", "http://collector");
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::MissingSetting("endpoint"))
        ));
    }

    #[test]
    fn test_resolve_server_trims_trailing_slashes() {
        let config = ClientConfig::server("http://api/", "billing", "http://collector/");
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.endpoint, "http://api");
        assert_eq!(resolved.log_collection_url.as_deref(), Some("http://collector"));
        assert!(resolved.local_log_path.is_none());
    }

    #[test]
    fn test_resolve_rejects_zero_buffer_size() {
        let config = ClientConfig {
            max_buffer_size: 0,
            ..ClientConfig::server("http://api", "billing", "http://collector")
        };
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::InvalidSetting {
                name: "max_buffer_size",
                ..
            })
        ));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SENINTEL_ENDPOINT", "http://api"),
            ("SENINTEL_APP", "billing"),
            ("SENINTEL_MODE", " server "),
            ("MONITOR_DB_URL", "http://collector"),
            ("SENINTEL_FLUSH_INTERVAL_MS", "250"),
            ("SENINTEL_MAX_BUFFER_SIZE", "not-a-number"),
        ]);
        let config = ClientConfig::from_lookup(|key| vars.get(key).map(ToString::to_string));

        assert_eq!(config.endpoint, "http://api");
        assert_eq!(config.app, "billing");
        assert_eq!(config.mode, "server");
        assert_eq!(config.log_collection_url.as_deref(), Some("http://collector"));
        assert_eq!(config.flush_interval_ms, 250);
        assert_eq!(config.max_buffer_size, constants::MAX_BUFFER_SIZE);
        assert!(config.local_log_path.is_none());
    }

    #[test]
    fn test_deserialize_from_json() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"endpoint":"http://api","app":"billing","mode":"local","local_log_path":"/tmp/out.json"}"#,
        )
        .unwrap();
        assert_eq!(config.mode, "local");
        assert_eq!(config.local_log_path.as_deref(), Some("/tmp/out.json"));
        assert_eq!(config.max_buffer_size, constants::MAX_BUFFER_SIZE);
    }
}
