//! Fixed-size file chunking.
//!
//! Splits a file into byte ranges, hashes each range to get its content
//! address, and produces chunks whose payload is a reference back into the
//! source file (the bytes are re-read by the uploader).

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::checksum::sha256_hex;
use crate::manifest::Manifest;
use crate::pool::Chunk;

/// Byte range [start, end) (half-open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Payload of a file chunk: where its bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRange {
    pub path: Arc<PathBuf>,
    pub range: ByteRange,
}

/// Plan fixed-size ranges covering `total_size` bytes; the last may be shorter.
/// Returns an empty vec if `total_size` or `chunk_size` is 0.
pub fn plan_chunks(total_size: u64, chunk_size: u64) -> Vec<ByteRange> {
    if total_size == 0 || chunk_size == 0 {
        return Vec::new();
    }
    let count = total_size.div_ceil(chunk_size);
    (0..count)
        .map(|i| {
            let start = i * chunk_size;
            ByteRange {
                start,
                end: (start + chunk_size).min(total_size),
            }
        })
        .collect()
}

/// Result of chunking one file.
#[derive(Debug)]
pub struct ChunkedFile {
    /// Distinct chunks in first-seen order (repeated content appears once).
    pub chunks: Vec<Chunk<FileRange>>,
    /// Every position of the file, in order, including repeats.
    pub manifest: Manifest,
}

/// Read `path` once, hashing each `chunk_size` range and the whole file.
pub fn chunk_file(path: &Path, chunk_size: usize) -> Result<ChunkedFile> {
    if chunk_size == 0 {
        bail!("chunk size must be greater than zero");
    }
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let size = f
        .metadata()
        .with_context(|| format!("stat {}", path.display()))?
        .len();

    let shared_path = Arc::new(path.to_path_buf());
    let mut file_hasher = Sha256::new();
    // Never allocate more than the file can fill.
    let buf_len = chunk_size.min(usize::try_from(size).unwrap_or(usize::MAX));
    let mut buf = vec![0u8; buf_len];
    let mut seen = HashSet::new();
    let mut chunks = Vec::new();
    let mut ids = Vec::new();

    for range in plan_chunks(size, chunk_size as u64) {
        let data = &mut buf[..range.len() as usize];
        f.read_exact(data)
            .with_context(|| format!("read {} at offset {}", path.display(), range.start))?;
        file_hasher.update(&*data);
        let id = sha256_hex(data);
        if seen.insert(id.clone()) {
            chunks.push(Chunk::new(
                id.clone(),
                FileRange {
                    path: Arc::clone(&shared_path),
                    range,
                },
            ));
        }
        ids.push(id);
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file.bin".to_string());
    let manifest = Manifest {
        name,
        size,
        chunk_size: chunk_size as u64,
        sha256: hex::encode(file_hasher.finalize()),
        chunks: ids,
    };
    tracing::debug!(
        file = %path.display(),
        size,
        positions = manifest.chunks.len(),
        distinct = chunks.len(),
        "chunked file"
    );
    Ok(ChunkedFile { chunks, manifest })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn plan_chunks_even() {
        let r = plan_chunks(1000, 250);
        assert_eq!(r.len(), 4);
        assert_eq!(r[0], ByteRange { start: 0, end: 250 });
        assert_eq!(r[3], ByteRange { start: 750, end: 1000 });
    }

    #[test]
    fn plan_chunks_short_tail() {
        let r = plan_chunks(10, 4);
        assert_eq!(
            r,
            vec![
                ByteRange { start: 0, end: 4 },
                ByteRange { start: 4, end: 8 },
                ByteRange { start: 8, end: 10 },
            ]
        );
        assert_eq!(r[2].len(), 2);
    }

    #[test]
    fn plan_chunks_empty() {
        assert!(plan_chunks(0, 4).is_empty());
        assert!(plan_chunks(100, 0).is_empty());
    }

    #[test]
    fn chunk_file_dedups_repeated_content() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"aaaabbbbaaaacc").unwrap();
        f.flush().unwrap();

        let out = chunk_file(f.path(), 4).unwrap();
        assert_eq!(out.manifest.size, 14);
        assert_eq!(out.manifest.chunks.len(), 4);
        assert_eq!(out.manifest.chunks[0], out.manifest.chunks[2]);
        assert_eq!(out.chunks.len(), 3);
        assert_eq!(out.chunks[0].id, sha256_hex(b"aaaa"));
        assert_eq!(out.chunks[1].payload.range, ByteRange { start: 4, end: 8 });
        assert_eq!(out.chunks[2].id, sha256_hex(b"cc"));
        assert_eq!(out.manifest.sha256, sha256_hex(b"aaaabbbbaaaacc"));
    }

    #[test]
    fn chunk_file_empty_file() {
        let f = tempfile::NamedTempFile::new().unwrap();
        let out = chunk_file(f.path(), 4).unwrap();
        assert!(out.chunks.is_empty());
        assert!(out.manifest.chunks.is_empty());
        assert_eq!(out.manifest.size, 0);
    }

    #[test]
    fn chunk_file_huge_chunk_size_on_small_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"tiny").unwrap();
        f.flush().unwrap();

        let out = chunk_file(f.path(), usize::MAX).unwrap();
        assert_eq!(out.chunks.len(), 1);
        assert_eq!(out.chunks[0].payload.range, ByteRange { start: 0, end: 4 });
        assert_eq!(out.chunks[0].id, sha256_hex(b"tiny"));
        assert_eq!(out.manifest.chunk_size, usize::MAX as u64);
    }

    #[test]
    fn chunk_file_rejects_zero_chunk_size() {
        let f = tempfile::NamedTempFile::new().unwrap();
        assert!(chunk_file(f.path(), 0).is_err());
    }
}
