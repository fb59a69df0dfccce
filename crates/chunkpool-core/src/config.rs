use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::pool::PoolConfig;

/// Default chunk size for the file chunker (4 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

fn default_auto_cycle() -> bool {
    true
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

/// Global configuration loaded from `~/.config/chunkpool/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkpoolConfig {
    /// Maximum number of uploads in flight.
    pub max_jobs: usize,
    /// Promote waiting chunks automatically on submit and completion.
    #[serde(default = "default_auto_cycle")]
    pub auto_cycle: bool,
    /// Chunk size in bytes used when splitting files.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Default chunk store directory (None = must be given on the command line).
    #[serde(default)]
    pub store_dir: Option<PathBuf>,
}

impl Default for ChunkpoolConfig {
    fn default() -> Self {
        Self {
            max_jobs: 4,
            auto_cycle: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            store_dir: None,
        }
    }
}

impl ChunkpoolConfig {
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_jobs: self.max_jobs,
            auto_cycle: self.auto_cycle,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("chunkpool")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ChunkpoolConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ChunkpoolConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: ChunkpoolConfig = toml::from_str(&data)?;
    Ok(cfg)
}
