//! Assembler error types.

use std::path::PathBuf;

/// Failures reading the assembler's side inputs (network registry, GPS cache).
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// File missing or unreadable
    #[error("can't read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Network registry is not valid JSON of the expected shape
    #[error("invalid network registry {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// GPS cache record is not `city;lat;lng`
    #[error("{path}:{line_no}: malformed GPS cache entry: {source}")]
    MalformedGps {
        path: PathBuf,
        line_no: usize,
        #[source]
        source: csv::Error,
    },
}

/// Referential integrity failures while building tables.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssembleError {
    /// The source path contains no registered network path
    #[error("wrong network_id 0 for {0}")]
    WrongNetwork(PathBuf),

    /// A line needs two non-empty directions to define its terminals
    #[error("line {line}: expected 2 non-empty directions, got {directions}")]
    IncompleteLine { line: String, directions: usize },

    /// City name not in the city table
    #[error("city id not found: {0}")]
    UnknownCity(String),

    /// Station not in the station table
    #[error("station id not found: {station} ({city})")]
    UnknownStation { station: String, city: String },

    /// Line name not in the line table
    #[error("line id not found: {0}")]
    UnknownLine(String),

    /// Two sources define the same line name with different attributes
    #[error("line {0} is defined more than once with different attributes")]
    ConflictingLine(String),
}
