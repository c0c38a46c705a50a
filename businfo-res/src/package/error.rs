//! Packaging error types.

use std::path::PathBuf;

/// Errors while writing chunked resources or version records.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The reference version record lacks a required entry
    #[error("{path}: {field} is missing")]
    MissingField { path: PathBuf, field: &'static str },

    /// The reference version record holds a non-numeric version
    #[error("{path}: invalid dbversion {value:?}")]
    InvalidVersion { path: PathBuf, value: String },
}

impl PackageError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| PackageError::Io { path, source }
    }
}
