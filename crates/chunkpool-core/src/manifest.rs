//! File manifest: the ordered list of chunk ids that reassembles a file.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::checksum::is_sha256_hex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Original file name (no directories).
    pub name: String,
    /// Total size in bytes.
    pub size: u64,
    /// Chunk size used when splitting; the last chunk may be shorter.
    pub chunk_size: u64,
    /// SHA-256 of the whole file; also the manifest's id in the store.
    pub sha256: String,
    /// Chunk ids in file order (repeats allowed).
    pub chunks: Vec<String>,
}

impl Manifest {
    pub fn id(&self) -> &str {
        &self.sha256
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and sanity-check a manifest.
    pub fn from_json(data: &str) -> Result<Self> {
        let m: Manifest = serde_json::from_str(data)?;
        m.validate()?;
        Ok(m)
    }

    fn validate(&self) -> Result<()> {
        if !is_sha256_hex(&self.sha256) {
            bail!("manifest digest is not a sha256 hex string");
        }
        if let Some(bad) = self.chunks.iter().find(|id| !is_sha256_hex(id)) {
            bail!("manifest lists invalid chunk id {:?}", bad);
        }
        let expected = if self.chunk_size == 0 {
            0
        } else {
            self.size.div_ceil(self.chunk_size)
        };
        if self.chunks.len() as u64 != expected {
            bail!(
                "manifest has {} chunks, expected {} for {} bytes",
                self.chunks.len(),
                expected,
                self.size
            );
        }
        Ok(())
    }
}
