//! `chunkpool config` – show config path and effective values.

use anyhow::Result;
use chunkpool_core::config::{self, ChunkpoolConfig};

pub fn run_config(cfg: &ChunkpoolConfig) -> Result<()> {
    println!("config file: {}", config::config_path()?.display());
    println!("max_jobs:    {}", cfg.max_jobs);
    println!("auto_cycle:  {}", cfg.auto_cycle);
    println!("chunk_size:  {}", cfg.chunk_size);
    match &cfg.store_dir {
        Some(dir) => println!("store_dir:   {}", dir.display()),
        None => println!("store_dir:   (unset)"),
    }
    Ok(())
}
