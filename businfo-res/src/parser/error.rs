//! Schedule parser error types.

use std::path::PathBuf;

/// Errors raised while reading a line-definition file.
///
/// All of them are fatal: a single malformed file aborts the whole run.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The file could not be read
    #[error("can't open file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Nothing left once blank lines and comments are removed
    #[error("empty content")]
    EmptyContent,

    /// A station line appeared before any `direction=` line
    #[error("line {line_no}: station line before any direction: {line}")]
    MissingDirection { line_no: usize, line: String },

    /// A station line appeared before any `city=` line
    #[error("line {line_no}: station line before any city: {line}")]
    MissingCity { line_no: usize, line: String },

    /// The file never set `name=`
    #[error("missing line name")]
    MissingName,

    /// Any of the above, tagged with the offending file
    #[error("processing {path}: {source}")]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<ParseError>,
    },
}
