//! CLI command handlers, one per file.

mod completions;
mod config;
mod restore;
mod upload;

pub use completions::{run_completions, run_man};
pub use config::run_config;
pub use restore::run_restore;
pub use upload::{run_upload, UploadArgs};

use anyhow::{anyhow, Result};
use chunkpool_core::config::ChunkpoolConfig;
use std::path::PathBuf;

/// `--dest` if given, else `store_dir` from config.
pub(crate) fn resolve_store_dir(cfg: &ChunkpoolConfig, dest: Option<PathBuf>) -> Result<PathBuf> {
    dest.or_else(|| cfg.store_dir.clone())
        .ok_or_else(|| anyhow!("no chunk store: pass --dest or set store_dir in the config file"))
}
