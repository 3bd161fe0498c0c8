//! Configuration for rmstore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a store table
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for the file backend
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── scores.rms       (one image file per record store)
    ///     └── settings.rms
    pub data_dir: PathBuf,

    /// Byte budget of a single record store (drives `Full` and `size_available`)
    pub store_capacity: usize,

    /// When the file backend rewrites a store image
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Bookkeeping Map Configuration
    // -------------------------------------------------------------------------
    /// Initial bucket count of the internal name tables
    pub map_initial_capacity: usize,

    /// Load factor of the internal name tables
    pub map_load_factor: f32,
}

/// Image sync strategy for the file backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Rewrite the image after every mutation (safest, slowest)
    EveryWrite,

    /// Rewrite the image only when the store is closed or flushed
    OnClose,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./rms_data"),
            store_capacity: 1024 * 1024, // 1 MB
            sync_strategy: SyncStrategy::EveryWrite,
            map_initial_capacity: 11,
            map_load_factor: 0.75,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all store images)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the per-store capacity (in bytes)
    pub fn store_capacity(mut self, bytes: usize) -> Self {
        self.config.store_capacity = bytes;
        self
    }

    /// Set the image sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the initial bucket count of internal maps
    pub fn map_initial_capacity(mut self, buckets: usize) -> Self {
        self.config.map_initial_capacity = buckets;
        self
    }

    /// Set the load factor of internal maps
    pub fn map_load_factor(mut self, load_factor: f32) -> Self {
        self.config.map_load_factor = load_factor;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
