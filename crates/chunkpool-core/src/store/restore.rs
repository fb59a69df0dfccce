//! Reassemble a file from its manifest.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::checksum::sha256_hex;
use crate::manifest::Manifest;

use super::{temp_path, ChunkStore};

/// Write the file described by `manifest` to `out`, verifying every chunk and
/// the whole-file digest. `out` only appears once everything checks out.
pub fn restore_file(store: &ChunkStore, manifest: &Manifest, out: &Path) -> Result<()> {
    let temp = temp_path(out);
    let result = write_chunks(store, manifest, &temp).and_then(|()| {
        fs::rename(&temp, out)
            .with_context(|| format!("failed to rename {} to {}", temp.display(), out.display()))
    });
    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result?;
    tracing::info!(
        manifest = %manifest.id(),
        out = %out.display(),
        bytes = manifest.size,
        "restored file"
    );
    Ok(())
}

fn write_chunks(store: &ChunkStore, manifest: &Manifest, temp: &Path) -> Result<()> {
    let file = File::create(temp).with_context(|| format!("create {}", temp.display()))?;
    let mut w = BufWriter::new(file);
    let mut hasher = Sha256::new();
    let mut written = 0u64;

    for (index, id) in manifest.chunks.iter().enumerate() {
        let data = store
            .get(id)
            .with_context(|| format!("chunk {} ({}) missing from store", index, id))?;
        if sha256_hex(&data) != *id {
            bail!("chunk {} ({}) is corrupt", index, id);
        }
        hasher.update(&data);
        w.write_all(&data)?;
        written += data.len() as u64;
    }

    let file = w.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;

    if written != manifest.size {
        bail!("restored {} bytes, manifest says {}", written, manifest.size);
    }
    let digest = hex::encode(hasher.finalize());
    if digest != manifest.sha256 {
        bail!("restored file digest {} does not match manifest {}", digest, manifest.sha256);
    }
    Ok(())
}
