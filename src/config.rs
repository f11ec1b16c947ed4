//! Configuration for OrionKV
//!
//! Loaded from a TOML file; every key has a default so a partial file is
//! enough to run a node. Sizes are written as `Nb`/`Nkb`/`Nmb` strings and
//! durations as `Nms`/`Ns`/`Nm`/`Nh` strings, both parsed once at load time.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{OrionError, Result};

/// Top-level configuration for an OrionKV node
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub network: NetworkConfig,
    pub logging: LoggingConfig,
    pub wal: WalConfig,
    pub replication: ReplicationConfig,
}

/// Storage engine selection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine kind; informational only
    #[serde(rename = "type")]
    pub engine_type: String,

    /// Initial map capacity hint
    pub start_size: usize,

    /// 0 selects the direct engine, >= 1 the sharded engine
    pub partitions_count: usize,
}

/// Client-facing TCP endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// TCP listen address (host:port)
    pub address: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Max request frame size, e.g. "4kb"
    pub max_message_size: String,

    /// Per-connection read deadline, e.g. "5m"; "0s" disables it
    pub idle_timeout: String,
}

/// Process logging
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of "debug", "info", "warn", "error"
    pub level: String,

    /// "stdout", "stderr", or a file path
    pub output: String,
}

/// Segmented write-ahead log
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalConfig {
    /// Buffered records that trigger a synchronous flush
    pub flushing_batch_size: usize,

    /// Background flush ticker period, e.g. "1s"
    pub flushing_batch_timeout: String,

    /// Upper byte bound of a segment file, e.g. "1kb"
    pub max_segment_size: String,

    /// Directory holding the segment files
    pub data_directory: String,

    #[serde(skip)]
    max_segment_size_bytes: OnceLock<u64>,
}

/// Primary/replica roles and the replication endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReplicationConfig {
    pub replica_type: ReplicaRole,

    /// Address the primary serves the replication feed on,
    /// and the address replicas dial
    pub master_address: String,

    /// Replica pull period, e.g. "1s"
    pub sync_interval: String,
}

/// Node role in a replication pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplicaRole {
    Master,
    Slave,
}

impl ReplicaRole {
    pub fn is_slave(self) -> bool {
        self == ReplicaRole::Slave
    }
}

// =============================================================================
// Defaults
// =============================================================================

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine_type: "in_memory".to_string(),
            start_size: 1000,
            partitions_count: 0,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3223".to_string(),
            max_connections: 100,
            max_message_size: "4kb".to_string(),
            idle_timeout: "5m".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: "stderr".to_string(),
        }
    }
}

impl Default for WalConfig {
    fn default() -> Self {
        Self {
            flushing_batch_size: 100,
            flushing_batch_timeout: "1s".to_string(),
            max_segment_size: "1kb".to_string(),
            data_directory: "./data".to_string(),
            max_segment_size_bytes: OnceLock::new(),
        }
    }
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            replica_type: ReplicaRole::Master,
            master_address: "127.0.0.1:3232".to_string(),
            sync_interval: "1s".to_string(),
        }
    }
}

// =============================================================================
// Loading and derived values
// =============================================================================

impl AppConfig {
    /// Load and validate a config file.
    ///
    /// Every size and duration string is parsed here so a malformed value
    /// fails at startup instead of deep inside a subsystem.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            OrionError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: AppConfig = toml::from_str(&contents).map_err(|e| {
            OrionError::Config(format!("cannot parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.network.max_message_size_bytes()?;
        self.network.idle_timeout()?;
        self.wal.max_segment_size_bytes()?;
        self.wal.flushing_batch_timeout()?;
        self.replication.sync_interval()?;
        Ok(())
    }

    /// Network config of the replication feed: the client endpoint settings
    /// with the address swapped for the master address.
    pub fn replicator_network_config(&self) -> NetworkConfig {
        let mut conf = self.network.clone();
        conf.address = self.replication.master_address.clone();
        conf
    }
}

impl NetworkConfig {
    pub fn max_message_size_bytes(&self) -> Result<u64> {
        parse_size(&self.max_message_size)
    }

    pub fn idle_timeout(&self) -> Result<Duration> {
        parse_duration(&self.idle_timeout)
    }
}

impl WalConfig {
    /// Parsed `max_segment_size`, memoized: the config is immutable after load.
    pub fn max_segment_size_bytes(&self) -> Result<u64> {
        if let Some(size) = self.max_segment_size_bytes.get() {
            return Ok(*size);
        }
        let size = parse_size(&self.max_segment_size)?;
        Ok(*self.max_segment_size_bytes.get_or_init(|| size))
    }

    pub fn flushing_batch_timeout(&self) -> Result<Duration> {
        parse_duration(&self.flushing_batch_timeout)
    }
}

impl ReplicationConfig {
    pub fn sync_interval(&self) -> Result<Duration> {
        parse_duration(&self.sync_interval)
    }
}

/// Parse a size string like "512b", "4kb" or "2mb" into bytes.
///
/// Units are case-insensitive powers of 1024; anything else is rejected.
pub fn parse_size(value: &str) -> Result<u64> {
    let lowered = value.trim().to_ascii_lowercase();
    let digits: String = lowered.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(OrionError::Config(format!("invalid size: {value}")));
    }
    let amount: u64 = digits
        .parse()
        .map_err(|_| OrionError::Config(format!("invalid size: {value}")))?;

    match &lowered[digits.len()..] {
        "b" => Ok(amount),
        "kb" => Ok(amount << 10),
        "mb" => Ok(amount << 20),
        unit => Err(OrionError::Config(format!(
            "unknown size unit {unit:?} in {value:?}"
        ))),
    }
}

/// Parse a duration string like "10ms", "1s", "5m" or "1h".
pub fn parse_duration(value: &str) -> Result<Duration> {
    let lowered = value.trim().to_ascii_lowercase();
    let digits: String = lowered.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(OrionError::Config(format!("invalid duration: {value}")));
    }
    let amount: u64 = digits
        .parse()
        .map_err(|_| OrionError::Config(format!("invalid duration: {value}")))?;

    match &lowered[digits.len()..] {
        "ms" => Ok(Duration::from_millis(amount)),
        "s" => Ok(Duration::from_secs(amount)),
        "m" => Ok(Duration::from_secs(amount * 60)),
        "h" => Ok(Duration::from_secs(amount * 3600)),
        unit => Err(OrionError::Config(format!(
            "unknown duration unit {unit:?} in {value:?}"
        ))),
    }
}
