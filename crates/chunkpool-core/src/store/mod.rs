//! Content-addressed chunk store on the local filesystem.
//!
//! Layout under the root:
//! - `objects/<id[0..2]>/<id>`: chunk bytes, named by their SHA-256
//! - `manifests/<sha256>.json`: file manifests
//!
//! Writes go to a `.part` temp file next to the target and are renamed into
//! place, so a reader never sees a partial object.

mod restore;
mod uploader;

pub use restore::restore_file;
pub use uploader::FsUploader;

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::checksum::is_sha256_hex;
use crate::manifest::Manifest;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique temp path next to `final_path`. Concurrent writers of the same
/// object never share a temp file.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut o = final_path.as_os_str().to_owned();
    o.push(format!(".{}.{}{}", std::process::id(), n, TEMP_SUFFIX));
    PathBuf::from(o)
}

#[derive(Debug, Clone)]
pub struct ChunkStore {
    root: PathBuf,
}

impl ChunkStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: &Path) -> Result<Self> {
        for sub in ["objects", "manifests"] {
            let dir = root.join(sub);
            fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the object for `id`. Ids must be SHA-256 hex so they cannot
    /// escape the store.
    pub fn object_path(&self, id: &str) -> io::Result<PathBuf> {
        if !is_sha256_hex(id) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a chunk id: {:?}", id),
            ));
        }
        Ok(self.root.join("objects").join(&id[..2]).join(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.object_path(id).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Store `data` under `id`. Returns false if the object already existed.
    pub fn put(&self, id: &str, data: &[u8]) -> io::Result<bool> {
        let final_path = self.object_path(id)?;
        if final_path.is_file() {
            return Ok(false);
        }
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_atomic(&final_path, data)?;
        Ok(true)
    }

    pub fn get(&self, id: &str) -> io::Result<Vec<u8>> {
        fs::read(self.object_path(id)?)
    }

    pub fn manifest_path(&self, id: &str) -> Result<PathBuf> {
        if !is_sha256_hex(id) {
            anyhow::bail!("not a manifest id: {:?}", id);
        }
        Ok(self.root.join("manifests").join(format!("{id}.json")))
    }

    pub fn put_manifest(&self, manifest: &Manifest) -> Result<PathBuf> {
        let path = self.manifest_path(manifest.id())?;
        let json = manifest.to_json()?;
        write_atomic(&path, json.as_bytes())
            .with_context(|| format!("write manifest {}", path.display()))?;
        Ok(path)
    }

    pub fn load_manifest(&self, id: &str) -> Result<Manifest> {
        let path = self.manifest_path(id)?;
        let data =
            fs::read_to_string(&path).with_context(|| format!("read manifest {}", path.display()))?;
        Manifest::from_json(&data).with_context(|| format!("parse manifest {}", path.display()))
    }
}

/// Write to a temp file, sync, and rename over `final_path`.
fn write_atomic(final_path: &Path, data: &[u8]) -> io::Result<()> {
    let temp = temp_path(final_path);
    let result = (|| {
        let mut f = File::create(&temp)?;
        f.write_all(data)?;
        f.sync_all()?;
        fs::rename(&temp, final_path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}
