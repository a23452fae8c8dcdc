//! Configuration for the escrow ledger

use crate::types::AccountId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Escrow ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Admin identity; never a valid deal counterparty
    pub admin: AccountId,

    /// Minimum accepted deal value (ledger units)
    pub min_deal_value: u64,

    /// Actor mailbox capacity (bounded for backpressure)
    pub mailbox_capacity: usize,

    /// RocksDB configuration
    pub rocksdb: RocksDBConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/escrow"),
            service_name: "escrow-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            admin: AccountId::new("admin"),
            min_deal_value: 1,
            mailbox_capacity: 1000,
            rocksdb: RocksDBConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDBConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Target file size (MB)
    pub target_file_size_mb: u64,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            target_file_size_mb: 64,
            max_background_jobs: 4,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("ESCROW_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(admin) = std::env::var("ESCROW_ADMIN") {
            config.admin = AccountId::new(admin);
        }

        if let Ok(min) = std::env::var("ESCROW_MIN_DEAL_VALUE") {
            config.min_deal_value = min
                .parse()
                .map_err(|e| crate::Error::Config(format!("Bad ESCROW_MIN_DEAL_VALUE: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants
    pub fn validate(&self) -> crate::Result<()> {
        if self.admin.as_str().is_empty() {
            return Err(crate::Error::Config("Admin identity is empty".to_string()));
        }
        if self.min_deal_value == 0 {
            return Err(crate::Error::Config(
                "Minimum deal value must be at least 1".to_string(),
            ));
        }
        if self.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "Mailbox capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
