//! `chunkpool upload <FILE>...` – chunk files and upload them through the pool.

use anyhow::{bail, Result};
use chunkpool_core::config::ChunkpoolConfig;
use chunkpool_core::store::ChunkStore;
use chunkpool_core::upload::upload_files;
use std::path::PathBuf;

use super::resolve_store_dir;

#[derive(Debug)]
pub struct UploadArgs {
    pub paths: Vec<PathBuf>,
    pub dest: Option<PathBuf>,
    pub chunk_size: Option<usize>,
    pub jobs: Option<usize>,
    pub manual_cycle: bool,
}

pub async fn run_upload(cfg: &ChunkpoolConfig, args: UploadArgs) -> Result<()> {
    let store_dir = resolve_store_dir(cfg, args.dest)?;
    let store = ChunkStore::open(&store_dir)?;

    let mut pool_cfg = cfg.pool_config();
    if let Some(jobs) = args.jobs {
        pool_cfg.max_jobs = jobs;
    }
    if args.manual_cycle {
        pool_cfg = pool_cfg.manual();
    }
    let chunk_size = args.chunk_size.unwrap_or(cfg.chunk_size);

    tracing::info!(
        files = args.paths.len(),
        store = %store_dir.display(),
        chunk_size,
        max_jobs = pool_cfg.max_jobs,
        "upload starting"
    );
    let summary = upload_files(&store, &args.paths, chunk_size, pool_cfg).await?;

    for file in &summary.files {
        if file.is_complete() {
            println!(
                "{}  {} ({} chunks)",
                file.manifest.id(),
                file.path.display(),
                file.manifest.chunks.len()
            );
        } else {
            println!(
                "INCOMPLETE  {} ({} of {} chunks missing)",
                file.path.display(),
                file.failed_chunks.len(),
                file.manifest.chunks.len()
            );
            for (id, err) in &file.failed_chunks {
                println!("  {}  {}", id, err.as_deref().unwrap_or("not stored"));
            }
        }
    }
    println!(
        "Uploaded {} chunk(s), {} failed.",
        summary.stats.completed, summary.stats.failed
    );

    let incomplete = summary.files.iter().filter(|f| !f.is_complete()).count();
    if incomplete > 0 {
        bail!("{} file(s) incomplete", incomplete);
    }
    Ok(())
}
