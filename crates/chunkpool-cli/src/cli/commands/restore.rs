//! `chunkpool restore <MANIFEST> <OUT>` – reassemble a file from the store.

use anyhow::{Context, Result};
use chunkpool_core::config::ChunkpoolConfig;
use chunkpool_core::store::{restore_file, ChunkStore};
use std::path::{Path, PathBuf};

use super::resolve_store_dir;

pub async fn run_restore(
    cfg: &ChunkpoolConfig,
    manifest_id: &str,
    out: &Path,
    dest: Option<PathBuf>,
) -> Result<()> {
    let store = ChunkStore::open(&resolve_store_dir(cfg, dest)?)?;
    let manifest = store.load_manifest(manifest_id)?;
    let out_path = out.to_path_buf();
    let size = manifest.size;
    tokio::task::spawn_blocking(move || restore_file(&store, &manifest, &out_path))
        .await
        .context("restore task")??;
    println!("Restored {} ({} bytes)", out.display(), size);
    Ok(())
}
