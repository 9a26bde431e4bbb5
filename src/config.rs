//! Configuration for walkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{KvError, Result};

/// Main configuration for a walkv store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for data files
    /// Internal structure:
    ///   {data_dir}/
    ///     └── wal.log          (write-ahead log)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// How appends are forced to stable storage
    pub sync_mode: SyncMode,

    /// Take an OS advisory lock around appends and scans so that several
    /// processes can share one log file
    pub file_lock: bool,

    // -------------------------------------------------------------------------
    // Store Configuration
    // -------------------------------------------------------------------------
    /// Replay the existing log into the store when it is opened
    pub recover_on_open: bool,
}

/// How a WAL append is made durable.
///
/// Both modes complete before `append` returns; there is no buffered mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// `fsync`: file data and metadata
    #[default]
    Full,

    /// `fdatasync`: file data plus the metadata needed to read it back
    Data,
}

/// Options for a single WAL engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalOptions {
    pub sync_mode: SyncMode,
    pub file_lock: bool,
}

impl Default for WalOptions {
    fn default() -> Self {
        Self {
            sync_mode: SyncMode::Full,
            file_lock: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./walkv_data"),
            sync_mode: SyncMode::Full,
            file_lock: true,
            recover_on_open: true,
        }
    }
}

impl Config {
    const WAL_FILENAME: &'static str = "wal.log";

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Path of the log file inside `data_dir`
    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join(Self::WAL_FILENAME)
    }

    pub fn wal_options(&self) -> WalOptions {
        WalOptions {
            sync_mode: self.sync_mode,
            file_lock: self.file_lock,
        }
    }

    /// Reject configurations that cannot name a log file
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(KvError::Config("data_dir must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the WAL sync mode
    pub fn sync_mode(mut self, mode: SyncMode) -> Self {
        self.config.sync_mode = mode;
        self
    }

    /// Enable or disable the cross-process advisory file lock
    pub fn file_lock(mut self, enabled: bool) -> Self {
        self.config.file_lock = enabled;
        self
    }

    /// Replay the log when the store is opened
    pub fn recover_on_open(mut self, enabled: bool) -> Self {
        self.config.recover_on_open = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
