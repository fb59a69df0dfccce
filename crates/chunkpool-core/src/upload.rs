//! Upload pipeline: chunk files, push the chunks through a pool into a store,
//! and record a manifest for every file whose chunks all landed.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;

use crate::chunker::{chunk_file, FileRange};
use crate::manifest::Manifest;
use crate::pool::{JobState, Pool, PoolConfig, PoolStats, Uploader};
use crate::store::{ChunkStore, FsUploader};

/// Outcome for one input file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub manifest: Manifest,
    /// Where the manifest was written; None if any chunk is missing.
    pub manifest_path: Option<PathBuf>,
    /// Chunk ids not in the store after the run, with the uploader error if known.
    pub failed_chunks: Vec<(String, Option<String>)>,
}

impl FileOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed_chunks.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct UploadSummary {
    pub files: Vec<FileOutcome>,
    pub stats: PoolStats,
}

impl UploadSummary {
    pub fn all_complete(&self) -> bool {
        self.files.iter().all(FileOutcome::is_complete)
    }
}

/// Upload `paths` into `store` with at most `config.max_jobs` chunk uploads in flight.
pub async fn upload_files(
    store: &ChunkStore,
    paths: &[PathBuf],
    chunk_size: usize,
    config: PoolConfig,
) -> Result<UploadSummary> {
    let pool = Pool::with_config(FsUploader::new(store.clone()), config)?;
    let mut reports = pool.subscribe();
    let collector = tokio::spawn(async move {
        let mut errors: HashMap<String, String> = HashMap::new();
        loop {
            match reports.recv().await {
                Ok(r) if r.state == JobState::Failed => {
                    errors.insert(r.chunk_id, r.error.unwrap_or_default());
                }
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!("missed {} job report(s); failures are still detected from the store", n);
                }
                Err(RecvError::Closed) => break,
            }
        }
        errors
    });

    let manifests = match queue_files(&pool, paths, chunk_size).await {
        Ok(manifests) => manifests,
        Err(err) => {
            // Settle what was already queued before reporting the failure.
            pool.shutdown().await;
            let _ = collector.await;
            return Err(err);
        }
    };

    drive_until_idle(&pool, config.auto_cycle).await;
    let stats = pool.shutdown().await;
    let errors = collector.await.context("report collector")?;

    let mut files = Vec::with_capacity(manifests.len());
    for (path, manifest) in manifests {
        let mut failed_chunks: Vec<(String, Option<String>)> = Vec::new();
        for id in &manifest.chunks {
            if !store.contains(id) && !failed_chunks.iter().any(|(f, _)| f == id) {
                failed_chunks.push((id.clone(), errors.get(id).cloned()));
            }
        }
        let manifest_path = if failed_chunks.is_empty() {
            Some(store.put_manifest(&manifest)?)
        } else {
            tracing::warn!(
                file = %path.display(),
                missing = failed_chunks.len(),
                "file incomplete; manifest not written"
            );
            None
        };
        files.push(FileOutcome {
            path,
            manifest,
            manifest_path,
            failed_chunks,
        });
    }

    Ok(UploadSummary { files, stats })
}

/// Chunk each file and submit its distinct chunks, in path order.
async fn queue_files<U>(
    pool: &Pool<FileRange, U>,
    paths: &[PathBuf],
    chunk_size: usize,
) -> Result<Vec<(PathBuf, Manifest)>>
where
    U: Uploader<FileRange>,
{
    let mut manifests = Vec::with_capacity(paths.len());
    for path in paths {
        let p = path.clone();
        let chunked = tokio::task::spawn_blocking(move || chunk_file(&p, chunk_size))
            .await
            .context("chunker task")??;
        let distinct = chunked.chunks.len();
        for chunk in chunked.chunks {
            pool.submit(chunk).await?;
        }
        tracing::info!(file = %path.display(), chunks = distinct, "queued file");
        manifests.push((path.clone(), chunked.manifest));
    }
    Ok(manifests)
}

/// Wait for the pool to go idle, activating jobs ourselves when automatic
/// cycling is off.
async fn drive_until_idle<P, U>(pool: &Pool<P, U>, auto_cycle: bool) -> PoolStats
where
    P: Send + Sync + 'static,
    U: Uploader<P>,
{
    if auto_cycle {
        return pool.wait_idle().await;
    }
    let mut rx = pool.watch_stats();
    loop {
        pool.cycle().await;
        let stats = *rx.borrow_and_update();
        if stats.is_idle() {
            return stats;
        }
        if rx.changed().await.is_err() {
            return pool.stats().await;
        }
    }
}
