//! Handler tests against a throwaway chunk store.

use crate::cli::commands::{run_restore, run_upload, UploadArgs};
use chunkpool_core::checksum::sha256_hex;
use chunkpool_core::config::ChunkpoolConfig;
use std::path::PathBuf;
use tempfile::tempdir;

fn upload_args(paths: Vec<PathBuf>, dest: PathBuf) -> UploadArgs {
    UploadArgs {
        paths,
        dest: Some(dest),
        chunk_size: Some(64),
        jobs: Some(2),
        manual_cycle: false,
    }
}

#[tokio::test]
async fn upload_then_restore_round_trip() {
    let work = tempdir().unwrap();
    let store = work.path().join("store");
    let body: Vec<u8> = (0u8..200).cycle().take(1000).collect();
    let src = work.path().join("notes.txt");
    std::fs::write(&src, &body).unwrap();

    let cfg = ChunkpoolConfig::default();
    run_upload(&cfg, upload_args(vec![src], store.clone()))
        .await
        .unwrap();

    let out = work.path().join("restored.txt");
    run_restore(&cfg, &sha256_hex(&body), &out, Some(store))
        .await
        .unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), body);
}

#[tokio::test]
async fn upload_with_zero_jobs_fails() {
    let work = tempdir().unwrap();
    let src = work.path().join("a.bin");
    std::fs::write(&src, b"abc").unwrap();
    let mut args = upload_args(vec![src], work.path().join("store"));
    args.jobs = Some(0);
    let err = run_upload(&ChunkpoolConfig::default(), args).await.unwrap_err();
    assert!(err.to_string().contains("max_jobs"));
}

#[tokio::test]
async fn restore_unknown_manifest_fails() {
    let work = tempdir().unwrap();
    let out = work.path().join("out.bin");
    let err = run_restore(
        &ChunkpoolConfig::default(),
        &sha256_hex(b"never uploaded"),
        &out,
        Some(work.path().join("store")),
    )
    .await
    .unwrap_err();
    assert!(format!("{:#}", err).contains("read manifest"));
    assert!(!out.exists());
}

#[tokio::test]
async fn upload_without_store_dir_fails() {
    let work = tempdir().unwrap();
    let mut args = upload_args(vec![work.path().join("a.bin")], work.path().join("unused"));
    args.dest = None;
    let err = run_upload(&ChunkpoolConfig::default(), args).await.unwrap_err();
    assert!(err.to_string().contains("no chunk store"));
}
