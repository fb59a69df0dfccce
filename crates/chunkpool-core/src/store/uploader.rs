//! Uploader that copies file ranges into a local chunk store.

use std::fs::File;
use std::io;

use crate::checksum::sha256_hex;
use crate::chunker::FileRange;
use crate::pool::{Chunk, UploadError, Uploader};

use super::ChunkStore;

/// Reads each chunk's range from its source file, checks that the bytes still
/// hash to the chunk id, and writes them into the store. Chunks already in
/// the store are skipped.
#[derive(Debug, Clone)]
pub struct FsUploader {
    store: ChunkStore,
}

impl FsUploader {
    pub fn new(store: ChunkStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }
}

impl Uploader<FileRange> for FsUploader {
    fn upload(&self, chunk: &Chunk<FileRange>) -> Result<(), UploadError> {
        if self.store.contains(&chunk.id) {
            tracing::debug!(chunk = %chunk.id, "already stored, skipping");
            return Ok(());
        }
        let data = read_range(&chunk.payload)?;
        let digest = sha256_hex(&data);
        if digest != chunk.id {
            return Err(UploadError::rejected(format!(
                "{} changed since chunking (offset {}): expected {}, got {}",
                chunk.payload.path.display(),
                chunk.payload.range.start,
                chunk.id,
                digest
            )));
        }
        self.store.put(&chunk.id, &data)?;
        Ok(())
    }
}

/// Read exactly the bytes of `r` from its file.
#[cfg(unix)]
fn read_range(r: &FileRange) -> io::Result<Vec<u8>> {
    use std::os::unix::fs::FileExt;
    let f = File::open(r.path.as_path())?;
    let mut buf = vec![0u8; r.range.len() as usize];
    f.read_exact_at(&mut buf, r.range.start)?;
    Ok(buf)
}

/// Non-Unix fallback: seek + read.
#[cfg(not(unix))]
fn read_range(r: &FileRange) -> io::Result<Vec<u8>> {
    use std::io::{Read, Seek, SeekFrom};
    let mut f = File::open(r.path.as_path())?;
    f.seek(SeekFrom::Start(r.range.start))?;
    let mut buf = vec![0u8; r.range.len() as usize];
    f.read_exact(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::ByteRange;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn source(content: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content).unwrap();
        f.flush().unwrap();
        f
    }

    fn chunk(path: PathBuf, start: u64, end: u64, id: String) -> Chunk<FileRange> {
        Chunk::new(
            id,
            FileRange {
                path: Arc::new(path),
                range: ByteRange { start, end },
            },
        )
    }

    #[test]
    fn uploads_range_into_store() {
        let src = source(b"0123456789");
        let dir = tempfile::tempdir().unwrap();
        let up = FsUploader::new(ChunkStore::open(dir.path()).unwrap());
        let id = sha256_hex(b"3456");
        up.upload(&chunk(src.path().to_path_buf(), 3, 7, id.clone()))
            .unwrap();
        assert_eq!(up.store().get(&id).unwrap(), b"3456");
    }

    #[test]
    fn rejects_changed_content() {
        let src = source(b"0123456789");
        let dir = tempfile::tempdir().unwrap();
        let up = FsUploader::new(ChunkStore::open(dir.path()).unwrap());
        let id = sha256_hex(b"something else");
        let err = up
            .upload(&chunk(src.path().to_path_buf(), 0, 4, id.clone()))
            .unwrap_err();
        assert!(matches!(err, UploadError::Rejected(_)));
        assert!(!up.store().contains(&id));
    }

    #[test]
    fn missing_source_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let up = FsUploader::new(ChunkStore::open(dir.path()).unwrap());
        let err = up
            .upload(&chunk(dir.path().join("nope"), 0, 4, sha256_hex(b"abcd")))
            .unwrap_err();
        assert!(matches!(err, UploadError::Io(_)));
    }

    #[test]
    fn existing_object_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::open(dir.path()).unwrap();
        let id = sha256_hex(b"abcd");
        store.put(&id, b"abcd").unwrap();
        let up = FsUploader::new(store);
        // Source does not exist; the upload succeeds because nothing is read.
        up.upload(&chunk(dir.path().join("gone"), 0, 4, id)).unwrap();
    }
}
