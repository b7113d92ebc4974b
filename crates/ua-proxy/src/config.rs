// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Proxy manager configuration.
//!
//! All behaviour switches that would otherwise be process-wide toggles live
//! here and are passed to [`ProxyManager::new`](crate::proxy::ProxyManager::new).
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use ua_proxy::config::ProxyConfig;
//!
//! let config = ProxyConfig::builder()
//!     .request_timeout(Duration::from_secs(5))
//!     .max_depth(8)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.max_depth, 8);
//!
//! let config = ProxyConfig::from_toml_str(r#"
//!     request_timeout = "2s"
//!     use_user_executable = true
//! "#).unwrap();
//! assert_eq!(config.request_timeout, Duration::from_secs(2));
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, ProxyError, ProxyResult};
use crate::ids;
use crate::types::NodeId;

/// Upper bound accepted for either depth setting.
pub const MAX_DEPTH_LIMIT: usize = 1024;

// =============================================================================
// ProxyConfig
// =============================================================================

/// Configuration for a [`ProxyManager`](crate::proxy::ProxyManager).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Bound on every single browse, read or call.
    #[serde(default = "default_request_timeout")]
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Deepest node, counted from the root at 0, a build may reach.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum supertype hops before a chain counts as malformed.
    #[serde(default = "default_max_type_depth")]
    pub max_type_depth: usize,

    /// Where state machine type lookups by name start searching.
    #[serde(default = "default_type_search_root")]
    pub type_search_root: NodeId,

    /// Read each variable's value while building.
    #[serde(default = "default_true")]
    pub read_initial_values: bool,

    /// Read each method's executable flag while building.
    #[serde(default = "default_true")]
    pub read_initial_executable_flags: bool,

    /// Gate on UserExecutable instead of Executable.
    #[serde(default)]
    pub use_user_executable: bool,

    /// Reuse built trees for repeated `get_object` calls on the same root.
    #[serde(default = "default_true")]
    pub cache_objects: bool,

    /// Build sibling subtrees concurrently.
    #[serde(default = "default_true")]
    pub concurrent_build: bool,

    /// Emit a trace event for every remote request.
    #[serde(default)]
    pub trace_operations: bool,
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_depth() -> usize {
    32
}

fn default_max_type_depth() -> usize {
    64
}

fn default_type_search_root() -> NodeId {
    ids::types::BASE_OBJECT_TYPE
}

fn default_true() -> bool {
    true
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            max_depth: default_max_depth(),
            max_type_depth: default_max_type_depth(),
            type_search_root: default_type_search_root(),
            read_initial_values: true,
            read_initial_executable_flags: true,
            use_user_executable: false,
            cache_objects: true,
            concurrent_build: true,
            trace_operations: false,
        }
    }
}

impl ProxyConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ProxyConfigBuilder {
        ProxyConfigBuilder::default()
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(s: &str) -> ProxyResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| {
            ProxyError::configuration(ConfigurationError::parse("TOML", e.to_string()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(s: &str) -> ProxyResult<Self> {
        let config: Self = serde_json::from_str(s).map_err(|e| {
            ProxyError::configuration(ConfigurationError::parse("JSON", e.to_string()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates this configuration.
    pub fn validate(&self) -> ProxyResult<()> {
        if self.request_timeout.is_zero() {
            return Err(ProxyError::configuration(ConfigurationError::invalid_value(
                "request_timeout",
                "must be greater than 0",
            )));
        }

        for (field, value) in [
            ("max_depth", self.max_depth),
            ("max_type_depth", self.max_type_depth),
        ] {
            if value == 0 || value > MAX_DEPTH_LIMIT {
                return Err(ProxyError::configuration(ConfigurationError::invalid_value(
                    field,
                    format!("must be between 1 and {}", MAX_DEPTH_LIMIT),
                )));
            }
        }

        if self.type_search_root.is_null() {
            return Err(ProxyError::configuration(ConfigurationError::invalid_value(
                "type_search_root",
                "must not be the null node",
            )));
        }

        Ok(())
    }
}

// =============================================================================
// ProxyConfigBuilder
// =============================================================================

/// Builder for `ProxyConfig`.
#[derive(Debug, Default)]
pub struct ProxyConfigBuilder {
    request_timeout: Option<Duration>,
    max_depth: Option<usize>,
    max_type_depth: Option<usize>,
    type_search_root: Option<NodeId>,
    read_initial_values: Option<bool>,
    read_initial_executable_flags: Option<bool>,
    use_user_executable: Option<bool>,
    cache_objects: Option<bool>,
    concurrent_build: Option<bool>,
    trace_operations: Option<bool>,
}

impl ProxyConfigBuilder {
    /// Sets the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the maximum build depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Sets the maximum supertype chain length.
    pub fn max_type_depth(mut self, depth: usize) -> Self {
        self.max_type_depth = Some(depth);
        self
    }

    /// Sets the root of type searches by name.
    pub fn type_search_root(mut self, root: NodeId) -> Self {
        self.type_search_root = Some(root);
        self
    }

    /// Enables or disables initial value reads.
    pub fn read_initial_values(mut self, enabled: bool) -> Self {
        self.read_initial_values = Some(enabled);
        self
    }

    /// Enables or disables initial executable flag reads.
    pub fn read_initial_executable_flags(mut self, enabled: bool) -> Self {
        self.read_initial_executable_flags = Some(enabled);
        self
    }

    /// Gates on UserExecutable instead of Executable.
    pub fn use_user_executable(mut self, enabled: bool) -> Self {
        self.use_user_executable = Some(enabled);
        self
    }

    /// Enables or disables object tree caching.
    pub fn cache_objects(mut self, enabled: bool) -> Self {
        self.cache_objects = Some(enabled);
        self
    }

    /// Enables or disables concurrent sibling builds.
    pub fn concurrent_build(mut self, enabled: bool) -> Self {
        self.concurrent_build = Some(enabled);
        self
    }

    /// Enables per-request trace events.
    pub fn trace_operations(mut self, enabled: bool) -> Self {
        self.trace_operations = Some(enabled);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> ProxyResult<ProxyConfig> {
        let defaults = ProxyConfig::default();
        let config = ProxyConfig {
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            max_depth: self.max_depth.unwrap_or(defaults.max_depth),
            max_type_depth: self.max_type_depth.unwrap_or(defaults.max_type_depth),
            type_search_root: self.type_search_root.unwrap_or(defaults.type_search_root),
            read_initial_values: self
                .read_initial_values
                .unwrap_or(defaults.read_initial_values),
            read_initial_executable_flags: self
                .read_initial_executable_flags
                .unwrap_or(defaults.read_initial_executable_flags),
            use_user_executable: self
                .use_user_executable
                .unwrap_or(defaults.use_user_executable),
            cache_objects: self.cache_objects.unwrap_or(defaults.cache_objects),
            concurrent_build: self.concurrent_build.unwrap_or(defaults.concurrent_build),
            trace_operations: self.trace_operations.unwrap_or(defaults.trace_operations),
        };
        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// LoggingConfig
// =============================================================================

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human readable multi-field lines.
    #[default]
    Text,
    /// Single-line compact output.
    Compact,
    /// JSON lines for log aggregation.
    Json,
}

impl FromStr for LogFormat {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(ProxyError::configuration(ConfigurationError::invalid_value(
                "log.format",
                format!("unknown format '{}'", s),
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Compact => f.write_str("compact"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Settings for [`init_logging`](crate::logging::init_logging).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// =============================================================================
// humantime_serde helper
// =============================================================================

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        humantime::format_duration(*duration)
            .to_string()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Tests
// =============================================================================
