use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{VlkError, VlkResult};

/// Top-level configuration (loaded from vaultlink.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VlkConfig {
    pub channel: ChannelConfig,
    pub pake: PakeConfig,
    pub crypto: CryptoConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Inter-poll delay in milliseconds (default: 5000)
    pub poll_interval_ms: u64,
    /// Faster delay for local/dev backends (default: 25)
    pub dev_poll_interval_ms: u64,
    /// Upper bound on one address wait in seconds (default: 900 = 15 min)
    pub max_wait_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PakeConfig {
    /// OPRF output hardening iteration count (default: 1000)
    pub iterations: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Argon2id memory cost in KiB (default: 4096)
    pub argon2_mem_cost_kib: u32,
    /// Argon2id time cost (default: 3)
    pub argon2_time_cost: u32,
    /// Argon2id parallelism (default: 1)
    pub argon2_parallelism: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub log_level: String,
    /// Log format: "json" or "text"
    pub log_format: String,
}

impl ChannelConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn dev_poll_interval(&self) -> Duration {
        Duration::from_millis(self.dev_poll_interval_ms)
    }

    /// The bound handed to every engine-level address wait.
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

impl PakeConfig {
    /// Protocol-wide OPRF hardening round count. Registration and every
    /// later login must use the same value.
    pub const DEFAULT_ITERATIONS: u32 = 1000;
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5000,
            dev_poll_interval_ms: 25,
            max_wait_secs: 900,
        }
    }
}

impl Default for PakeConfig {
    fn default() -> Self {
        Self {
            iterations: Self::DEFAULT_ITERATIONS,
        }
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            argon2_mem_cost_kib: 4096,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            log_format: "text".into(),
        }
    }
}

impl VlkConfig {
    /// Load configuration from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> VlkResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| VlkError::Config(format!("parsing {}: {e}", path.display())))
    }
}
