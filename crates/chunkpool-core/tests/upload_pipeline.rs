//! Integration test: chunk files, upload them through the pool into a local
//! store, and restore them from their manifests.

use chunkpool_core::checksum::sha256_path;
use chunkpool_core::chunker::chunk_file;
use chunkpool_core::logging;
use chunkpool_core::pool::PoolConfig;
use chunkpool_core::store::{restore_file, ChunkStore};
use chunkpool_core::upload::upload_files;
use std::path::PathBuf;
use tempfile::tempdir;

fn write_file(dir: &std::path::Path, name: &str, body: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn upload_then_restore_matches_source() {
    logging::init_test_logging();
    let src = tempdir().unwrap();
    let store_dir = tempdir().unwrap();
    let out_dir = tempdir().unwrap();

    let body: Vec<u8> = (0u8..251).cycle().take(100 * 1024 + 17).collect();
    let repeated: Vec<u8> = b"abcdefgh".repeat(4096);
    let paths = vec![
        write_file(src.path(), "big.bin", &body),
        write_file(src.path(), "repeated.bin", &repeated),
        write_file(src.path(), "empty.bin", b""),
    ];

    let store = ChunkStore::open(store_dir.path()).unwrap();
    let summary = upload_files(&store, &paths, 4096, PoolConfig::new(3))
        .await
        .expect("upload_files");

    assert!(summary.all_complete());
    assert_eq!(summary.stats.failed, 0);
    assert!(summary.stats.is_idle());
    assert_eq!(summary.files.len(), 3);

    for (file, src_path) in summary.files.iter().zip(&paths) {
        let manifest_path = file.manifest_path.as_ref().expect("manifest written");
        assert!(manifest_path.is_file());

        let manifest = store.load_manifest(file.manifest.id()).unwrap();
        let out = out_dir.path().join(&manifest.name);
        restore_file(&store, &manifest, &out).unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), std::fs::read(src_path).unwrap());
        assert_eq!(sha256_path(&out).unwrap(), manifest.sha256);
    }

    // Every 4 KiB block of `repeated.bin` is identical: one stored object.
    let repeated_manifest = &summary.files[1].manifest;
    assert_eq!(repeated_manifest.chunks.len(), 8);
    assert!(repeated_manifest.chunks.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn manual_cycling_still_uploads_everything() {
    let src = tempdir().unwrap();
    let store_dir = tempdir().unwrap();
    let body: Vec<u8> = (0u8..=255).cycle().take(10_000).collect();
    let paths = vec![write_file(src.path(), "data.bin", &body)];

    let store = ChunkStore::open(store_dir.path()).unwrap();
    let summary = upload_files(&store, &paths, 1000, PoolConfig::new(2).manual())
        .await
        .unwrap();

    assert!(summary.all_complete());
    assert_eq!(summary.stats.completed, 10);
}

#[tokio::test]
async fn second_upload_of_same_file_stores_nothing_new() {
    let src = tempdir().unwrap();
    let store_dir = tempdir().unwrap();
    let paths = vec![write_file(src.path(), "a.txt", b"hello chunkpool\n")];
    let store = ChunkStore::open(store_dir.path()).unwrap();

    let first = upload_files(&store, &paths, 4, PoolConfig::new(2)).await.unwrap();
    let second = upload_files(&store, &paths, 4, PoolConfig::new(2)).await.unwrap();
    assert!(first.all_complete() && second.all_complete());
    assert_eq!(first.files[0].manifest, second.files[0].manifest);
    assert_eq!(second.stats.completed, first.stats.completed);
}

#[tokio::test]
async fn missing_input_file_is_an_error() {
    let store_dir = tempdir().unwrap();
    let store = ChunkStore::open(store_dir.path()).unwrap();
    let paths = vec![store_dir.path().join("does-not-exist")];
    assert!(upload_files(&store, &paths, 4, PoolConfig::new(1)).await.is_err());
}

#[tokio::test]
async fn failed_file_still_settles_earlier_uploads() {
    let src = tempdir().unwrap();
    let store_dir = tempdir().unwrap();
    let body: Vec<u8> = (0u8..=255).cycle().take(8_000).collect();
    let good = write_file(src.path(), "good.bin", &body);
    let paths = vec![good.clone(), src.path().join("missing.bin")];

    let store = ChunkStore::open(store_dir.path()).unwrap();
    let err = upload_files(&store, &paths, 1000, PoolConfig::new(2))
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("missing.bin"));

    // Every chunk queued before the error has landed once the call returns.
    let chunked = chunk_file(&good, 1000).unwrap();
    assert_eq!(chunked.manifest.chunks.len(), 8);
    for id in &chunked.manifest.chunks {
        assert!(store.contains(id), "chunk {} not stored", id);
    }
    // No manifest is written for a failed run.
    assert!(store.load_manifest(&chunked.manifest.sha256).is_err());
}
