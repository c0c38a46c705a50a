//! Top-level error type for a build run.

use std::path::PathBuf;

use crate::assemble::{AssembleError, InputError};
use crate::checksum::ChecksumError;
use crate::compiler::CompilerError;
use crate::config::ConfigError;
use crate::package::PackageError;
use crate::parser::ParseError;

/// Any failure that aborts a build run.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Checksum(#[from] ChecksumError),

    #[error(transparent)]
    Compiler(#[from] CompilerError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error(transparent)]
    Package(#[from] PackageError),

    /// Writing the SQL script or creating the work directory failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    /// Process exit code for this error.
    ///
    /// A failing line compiler passes its own code through.
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::Compiler(e) => e.exit_code().unwrap_or(1),
            _ => 1,
        }
    }
}
