//! Write-once file semantics shared by every stage.
//!
//! A destination is either absent, present with identical content (no-op), or
//! present with different content (rejected unless forced). Content is always
//! written to a temporary file in the destination directory and renamed into
//! place, so readers never observe a partial write.

mod record;

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::error::{ReelError, Result};

pub use record::{InputDigest, ProvenanceRecord, RuntimeInfo, build_provenance, write_provenance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    Created,
    Unchanged,
    Overwritten,
}

impl WriteOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            WriteOutcome::Created => "created",
            WriteOutcome::Unchanged => "unchanged",
            WriteOutcome::Overwritten => "overwritten",
        }
    }
}

/// Canonical JSON: keys sorted at every level, pretty-printed, newline-terminated.
pub fn canonical_json<T: Serialize>(payload: &T) -> Result<Vec<u8>> {
    // serde_json's Map is a BTreeMap without `preserve_order`, so a round trip
    // through Value sorts struct fields as well as map keys.
    let value = serde_json::to_value(payload)?;
    let mut bytes = serde_json::to_vec_pretty(&value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

pub fn write_deterministic<T: Serialize>(
    path: &Path,
    payload: &T,
    force: bool,
) -> Result<WriteOutcome> {
    let bytes = canonical_json(payload)?;
    write_bytes_immutable(path, &bytes, force)
}

pub fn write_text_immutable(path: &Path, text: &str, force: bool) -> Result<WriteOutcome> {
    write_bytes_immutable(path, text.as_bytes(), force)
}

pub fn write_bytes_immutable(path: &Path, bytes: &[u8], force: bool) -> Result<WriteOutcome> {
    let existed = path.exists();
    if existed {
        let current = fs::read(path)?;
        if current == bytes {
            return Ok(WriteOutcome::Unchanged);
        }
        if !force {
            return Err(ReelError::ImmutabilityViolation {
                path: path.to_path_buf(),
            });
        }
    }
    atomic_write(path, bytes)?;
    Ok(if existed {
        WriteOutcome::Overwritten
    } else {
        WriteOutcome::Created
    })
}

/// Move a finished scratch file into `dest` under the same contract.
///
/// Identity is decided by SHA-256 so large media never has to be held in memory.
/// The scratch file is consumed in every successful outcome.
pub fn publish_file_immutable(scratch: &Path, dest: &Path, force: bool) -> Result<WriteOutcome> {
    let existed = dest.exists();
    if existed {
        if file_sha256(scratch)? == file_sha256(dest)? {
            fs::remove_file(scratch)?;
            return Ok(WriteOutcome::Unchanged);
        }
        if !force {
            return Err(ReelError::ImmutabilityViolation {
                path: dest.to_path_buf(),
            });
        }
    }
    let parent = parent_dir(dest);
    fs::create_dir_all(parent)?;
    let tmp = NamedTempFile::new_in(parent)?;
    fs::copy(scratch, tmp.path())?;
    tmp.persist(dest).map_err(|e| ReelError::Io(e.error))?;
    fs::remove_file(scratch)?;
    Ok(if existed {
        WriteOutcome::Overwritten
    } else {
        WriteOutcome::Created
    })
}

/// Status reports and logs describe the current state and are always replaced.
pub fn write_report<T: Serialize>(path: &Path, payload: &T) -> Result<()> {
    let bytes = canonical_json(payload)?;
    atomic_write(path, &bytes)
}

pub fn write_report_text(path: &Path, text: &str) -> Result<()> {
    atomic_write(path, text.as_bytes())
}

pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = parent_dir(path);
    fs::create_dir_all(parent)?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| ReelError::Io(e.error))?;
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
