//! Pool configuration — TOML parsing and validation.
//!
//! A pool is configured once and the configuration is immutable afterwards.
//! Idle eviction (`max_idle_ms`) and keepalive probing are mutually
//! exclusive policies; [`PoolConfig::validate`] rejects configs that enable
//! both.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PoolError, PoolResult};

/// Credentials handed to the connection factory verbatim.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub user: String,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(user: &str, password: Option<&str>) -> Self {
        Self {
            user: user.to_string(),
            password: password.map(str::to_string),
        }
    }
}

// Keep passwords out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Periodic probe settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepaliveConfig {
    pub enabled: bool,
    /// Probe interval in milliseconds (default: 60000).
    pub interval_ms: u64,
    /// Query executed on every probe (default: `SELECT 1`).
    pub probe_query: String,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: 60_000,
            probe_query: "SELECT 1".to_string(),
        }
    }
}

impl KeepaliveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Configuration for a single connection pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Target address passed to the factory (e.g. `db.internal:5432`).
    pub address: String,
    pub credentials: Credentials,
    /// Soft floor restored on every reservation (default: 1).
    pub min_size: usize,
    /// Upper bound on reserved connections (default: 10).
    pub max_size: usize,
    pub keepalive: KeepaliveConfig,
    /// Evict available connections idle longer than this. `None` disables
    /// idle eviction.
    pub max_idle_ms: Option<u64>,
    /// Upper bound on a single factory `open` call (default: 5000).
    pub connect_timeout_ms: u64,
    /// Log filter used by binaries embedding the pool. Ignored by the pool.
    pub log_level: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            credentials: Credentials::default(),
            min_size: 1,
            max_size: 10,
            keepalive: KeepaliveConfig::default(),
            max_idle_ms: None,
            connect_timeout_ms: 5_000,
            log_level: "info".to_string(),
        }
    }
}

impl PoolConfig {
    /// Create a config for `address` with defaults for everything else.
    pub fn new(address: &str, credentials: Credentials) -> Self {
        Self {
            address: address.to_string(),
            credentials,
            ..Self::default()
        }
    }

    /// Read, parse and validate a TOML config file.
    pub fn from_file(path: &Path) -> PoolResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PoolError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> PoolResult<Self> {
        let config: PoolConfig =
            toml::from_str(content).map_err(|e| PoolError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check sizing bounds and the keepalive / idle-eviction exclusivity.
    pub fn validate(&self) -> PoolResult<()> {
        if self.address.trim().is_empty() {
            return Err(PoolError::Config("address must not be empty".to_string()));
        }
        if self.min_size < 1 {
            return Err(PoolError::Config("min_size must be at least 1".to_string()));
        }
        if self.max_size < self.min_size {
            return Err(PoolError::Config(format!(
                "max_size ({}) must be >= min_size ({})",
                self.max_size, self.min_size
            )));
        }
        if self.connect_timeout_ms == 0 {
            return Err(PoolError::Config(
                "connect_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.keepalive.enabled {
            if self.keepalive.interval_ms == 0 {
                return Err(PoolError::Config(
                    "keepalive.interval_ms must be greater than 0".to_string(),
                ));
            }
            if self.keepalive.probe_query.trim().is_empty() {
                return Err(PoolError::Config(
                    "keepalive.probe_query must not be empty".to_string(),
                ));
            }
            if self.max_idle_ms.is_some() {
                return Err(PoolError::Config(
                    "keepalive and max_idle_ms are mutually exclusive".to_string(),
                ));
            }
        }
        if self.max_idle_ms == Some(0) {
            return Err(PoolError::Config(
                "max_idle_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn max_idle(&self) -> Option<Duration> {
        self.max_idle_ms.map(Duration::from_millis)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
