//! Build configuration.
//!
//! The only required setting is the root of the line definitions, read from
//! a `local.properties` file:
//!
//! ```text
//! lines.dir=/path/to/businfo-sample-lines
//! ```
//!
//! Everything else has a default and can be overridden with the `with_*`
//! builders.

use std::path::{Path, PathBuf};

use crate::assemble::Strictness;
use crate::package::CHUNK_SIZE;
use crate::parser::DEFAULT_CIRCULATION_POLICY;
use crate::schema::Dialect;

/// Key of the lines root in `local.properties`.
pub const LINES_DIR_KEY: &str = "lines.dir";

/// Default GPS cache file, relative to the lines root.
pub const GPS_CACHE_FILE: &str = "gps.csv";
/// Default filter mapping file, relative to the lines root.
pub const FILTER_MAP_FILE: &str = "filter.map";
/// Default network registry, relative to the lines root.
pub const NETWORKS_FILE: &str = "networks.json";

pub const SQL_FILE: &str = "htdb.sql";
pub const CHECKSUM_FILE: &str = ".checksum";
pub const STATS_FILE: &str = "dbstats.xml";
pub const VERSION_FILE: &str = "dbversion.xml";
pub const GPS_RESOURCE_FILE: &str = "gps.xml";

/// Configuration errors; all are reported before any processing starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing {path}; add a line `lines.dir=/path/to/businfo-sample-lines`")]
    MissingFile { path: PathBuf },

    #[error("can't read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} has no `{key}=` entry")]
    MissingEntry { path: PathBuf, key: &'static str },

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    /// Two settings that can't be combined
    #[error("{0}")]
    Incompatible(&'static str),
}

/// Everything a build run needs to know.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Root of the line definitions and their side files.
    pub lines_dir: PathBuf,
    /// Directory of compiled `*.txt` line files.
    pub raw_dir: PathBuf,
    /// Where every output file goes.
    pub work_dir: PathBuf,
    pub dialect: Dialect,
    /// Produce chunked resources for the mobile client.
    pub android: bool,
    /// Chunk threshold in bytes, 0 for a single chunk.
    pub chunk_size: usize,
    /// Reference version record to keep up to date.
    pub compare_with: Option<PathBuf>,
    pub gps_cache: String,
    pub filter_map: String,
    pub networks_file: String,
    /// Line compiler to run on `*.in` definitions before parsing.
    pub compiler: Option<PathBuf>,
    pub strictness: Strictness,
    /// Circulation policy each line starts with.
    pub default_policy: String,
}

impl BuildConfig {
    /// Create a config with default settings.
    pub fn new(lines_dir: impl Into<PathBuf>, raw_dir: impl Into<PathBuf>) -> Self {
        Self {
            lines_dir: lines_dir.into(),
            raw_dir: raw_dir.into(),
            work_dir: std::env::temp_dir().join("businfo"),
            dialect: Dialect::default(),
            android: false,
            chunk_size: CHUNK_SIZE,
            compare_with: None,
            gps_cache: GPS_CACHE_FILE.to_string(),
            filter_map: FILTER_MAP_FILE.to_string(),
            networks_file: NETWORKS_FILE.to_string(),
            compiler: None,
            strictness: Strictness::default(),
            default_policy: DEFAULT_CIRCULATION_POLICY.to_string(),
        }
    }

    /// Create a config whose lines root comes from a properties file.
    pub fn from_properties(
        properties: &Path,
        raw_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(properties) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::MissingFile {
                    path: properties.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: properties.to_path_buf(),
                    source,
                });
            }
        };

        let lines_dir = parse_lines_dir(&contents).ok_or_else(|| ConfigError::MissingEntry {
            path: properties.to_path_buf(),
            key: LINES_DIR_KEY,
        })?;
        Ok(Self::new(lines_dir, raw_dir))
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_android(mut self, android: bool) -> Self {
        self.android = android;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_compare_with(mut self, path: impl Into<PathBuf>) -> Self {
        self.compare_with = Some(path.into());
        self
    }

    pub fn with_gps_cache(mut self, file: impl Into<String>) -> Self {
        self.gps_cache = file.into();
        self
    }

    pub fn with_filter_map(mut self, file: impl Into<String>) -> Self {
        self.filter_map = file.into();
        self
    }

    pub fn with_networks_file(mut self, file: impl Into<String>) -> Self {
        self.networks_file = file.into();
        self
    }

    pub fn with_compiler(mut self, program: impl Into<PathBuf>) -> Self {
        self.compiler = Some(program.into());
        self
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn with_default_policy(mut self, policy: impl Into<String>) -> Self {
        self.default_policy = policy.into();
        self
    }

    /// Reject combinations of settings that make no sense together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compare_with.is_some() && !self.android {
            return Err(ConfigError::Incompatible(
                "comparing with a reference version requires android output",
            ));
        }
        if self.android && self.dialect != Dialect::Sqlite {
            return Err(ConfigError::Incompatible(
                "android output is only available for sqlite",
            ));
        }
        Ok(())
    }

    pub fn networks_path(&self) -> PathBuf {
        self.lines_dir.join(&self.networks_file)
    }

    pub fn filter_map_path(&self) -> PathBuf {
        self.lines_dir.join(&self.filter_map)
    }

    pub fn gps_cache_path(&self) -> PathBuf {
        self.lines_dir.join(&self.gps_cache)
    }

    pub fn sql_path(&self) -> PathBuf {
        self.work_dir.join(SQL_FILE)
    }

    pub fn checksum_path(&self) -> PathBuf {
        self.work_dir.join(CHECKSUM_FILE)
    }

    pub fn stats_path(&self) -> PathBuf {
        self.work_dir.join(STATS_FILE)
    }

    pub fn version_path(&self) -> PathBuf {
        self.work_dir.join(VERSION_FILE)
    }

    pub fn gps_resource_path(&self) -> PathBuf {
        self.work_dir.join(GPS_RESOURCE_FILE)
    }
}

/// Value of the last `lines.dir=` entry.
fn parse_lines_dir(properties: &str) -> Option<PathBuf> {
    properties
        .lines()
        .filter_map(|line| line.strip_prefix(LINES_DIR_KEY)?.strip_prefix('='))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .last()
        .map(PathBuf::from)
}

/// Parse a boolean setting as given in the environment.
pub fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}
