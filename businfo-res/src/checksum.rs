//! Incremental-build gate.
//!
//! The database checksum covers the schema text, the filter mapping file and
//! every line-definition source, in path order. It is computed over source
//! bytes rather than generated SQL so it does not depend on how the output
//! happens to be serialized.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// Extension of compiled line-definition files.
pub const SOURCE_EXTENSION: &str = "txt";

/// Errors from checksum computation or the marker file.
#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    #[error("can't read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("can't write checksum marker {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of comparing the current checksum with the stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Sources unchanged since the last run; nothing to do.
    UpToDate,
    /// Sources changed (or first run); the new checksum has been stored.
    Changed { previous: Option<String> },
}

/// All `*.txt` files below `dir`, sorted by path.
pub fn find_line_sources(dir: &Path) -> Result<Vec<PathBuf>, ChecksumError> {
    let mut sources = Vec::new();
    walk(dir, &mut sources)?;
    sources.sort();
    Ok(sources)
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), ChecksumError> {
    let read_err = |source| ChecksumError::Read {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_dir() {
            walk(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
            out.push(path);
        }
    }
    Ok(())
}

/// Hex SHA-256 of a file's content.
fn file_digest(path: &Path) -> Result<String, ChecksumError> {
    let bytes = fs::read(path).map_err(|source| ChecksumError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Checksum of the database inputs.
///
/// Hashes the schema, then the digest of `filter_map`, then the digest of
/// each source in the given order.
pub fn compute_db_checksum(
    schema: &str,
    filter_map: &Path,
    sources: &[PathBuf],
) -> Result<String, ChecksumError> {
    let mut hasher = Sha256::new();
    hasher.update(schema.as_bytes());
    hasher.update(file_digest(filter_map)?.as_bytes());
    for source in sources {
        hasher.update(file_digest(source)?.as_bytes());
    }
    let checksum = format!("{:x}", hasher.finalize());
    debug!(%checksum, sources = sources.len(), "computed database checksum");
    Ok(checksum)
}

/// File holding the checksum of the last processed sources.
#[derive(Debug, Clone)]
pub struct ChecksumMarker {
    path: PathBuf,
}

impl ChecksumMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Stored checksum, `None` when there is no marker yet.
    pub fn load(&self) -> Result<Option<String>, ChecksumError> {
        match fs::read_to_string(&self.path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ChecksumError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Compare with the stored checksum, storing `checksum` if it differs.
    pub fn check_up_to_date(&self, checksum: &str) -> Result<GateOutcome, ChecksumError> {
        let previous = self.load()?;
        if previous.as_deref() == Some(checksum) {
            info!("Nothing to do.");
            return Ok(GateOutcome::UpToDate);
        }

        fs::write(&self.path, checksum).map_err(|source| ChecksumError::Write {
            path: self.path.clone(),
            source,
        })?;
        Ok(GateOutcome::Changed { previous })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
