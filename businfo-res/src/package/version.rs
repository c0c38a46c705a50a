//! Database version records.
//!
//! Every packaged build carries a local record of its checksum and chunk
//! count. An optional reference record, shared with the client release
//! process, additionally holds a version number that goes up by one each
//! time the packaged database changes.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;

use super::error::PackageError;
use super::resource::string_resources;

lazy_static! {
    static ref CHECKSUM_ENTRY: Regex = Regex::new(r#""dbchecksum">(.*?)</string>"#).unwrap();
    static ref VERSION_ENTRY: Regex = Regex::new(r#""dbversion">(.*?)</string>"#).unwrap();
}

/// Contents of a reference version record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    pub numchunks: usize,
    pub checksum: String,
    pub version: u64,
}

impl VersionRecord {
    pub fn to_resource(&self) -> String {
        string_resources([
            ("numchunks", self.numchunks.to_string()),
            ("dbchecksum", self.checksum.clone()),
            ("dbversion", self.version.to_string()),
        ])
    }

    /// Read the checksum and version of an existing record.
    ///
    /// The chunk count is not read back; it is rewritten on every update.
    fn read(path: &Path) -> Result<(String, u64), PackageError> {
        let text = std::fs::read_to_string(path).map_err(PackageError::io(path))?;

        let last_match = |re: &Regex| {
            text.lines()
                .filter_map(|line| re.captures(line))
                .last()
                .map(|c| c[1].to_string())
        };
        let version = last_match(&VERSION_ENTRY).ok_or(PackageError::MissingField {
            path: path.to_path_buf(),
            field: "dbversion",
        })?;
        let checksum = last_match(&CHECKSUM_ENTRY).ok_or(PackageError::MissingField {
            path: path.to_path_buf(),
            field: "dbchecksum",
        })?;

        let version = version
            .trim()
            .parse()
            .map_err(|_| PackageError::InvalidVersion {
                path: path.to_path_buf(),
                value: version.clone(),
            })?;
        Ok((checksum, version))
    }

    fn write(&self, path: &Path) -> Result<(), PackageError> {
        std::fs::write(path, self.to_resource()).map_err(PackageError::io(path))
    }
}

/// What happened to the reference record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionUpdate {
    /// No record existed; one was created at version 1.
    Created,
    /// The checksum changed and the version was bumped.
    Upgraded { from: u64, to: u64 },
    /// Same checksum; the record was left untouched.
    Unchanged { version: u64 },
}

/// The `dbversion.xml` resource shipped with the chunks.
pub fn local_version_resource(checksum: &str, numchunks: usize) -> String {
    string_resources([
        ("dbchecksum", checksum.to_string()),
        ("numchunks", numchunks.to_string()),
    ])
}

/// Write the local `dbversion.xml` resource.
pub fn write_local_version(
    path: &Path,
    checksum: &str,
    numchunks: usize,
) -> Result<(), PackageError> {
    std::fs::write(path, local_version_resource(checksum, numchunks))
        .map_err(PackageError::io(path))
}

/// Bring the reference record at `path` up to date with this build.
pub fn compare_with_reference(
    path: &Path,
    checksum: &str,
    numchunks: usize,
) -> Result<VersionUpdate, PackageError> {
    if !path.exists() {
        info!(path = %path.display(), "reference version record not found, creating it");
        VersionRecord {
            numchunks,
            checksum: checksum.to_string(),
            version: 1,
        }
        .write(path)?;
        return Ok(VersionUpdate::Created);
    }

    let (previous, version) = VersionRecord::read(path)?;
    if previous == checksum {
        info!(version, "database not updated");
        return Ok(VersionUpdate::Unchanged { version });
    }

    let next = version
        .checked_add(1)
        .ok_or_else(|| PackageError::InvalidVersion {
            path: path.to_path_buf(),
            value: version.to_string(),
        })?;
    info!(from = version, to = next, "database changed, incrementing version");
    VersionRecord {
        numchunks,
        checksum: checksum.to_string(),
        version: next,
    }
    .write(path)?;
    Ok(VersionUpdate::Upgraded {
        from: version,
        to: next,
    })
}
