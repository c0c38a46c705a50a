//! Packaging of the generated database for the mobile client.
//!
//! The SQL script is cut into string resources of bounded size
//! (`htdb_chunk_<n>.xml`), shipped with a statistics resource
//! (`dbstats.xml`) and a version resource (`dbversion.xml`).

mod chunks;
mod error;
mod resource;
mod version;

pub use chunks::{
    CHUNK_PREFIX, CHUNK_SIZE, chunk_path, make_chunks, reformat_line, reformat_sql, split_chunks,
};
pub use error::PackageError;
pub use resource::{DbStats, XML_HEADER, chunk_payload, chunk_resource, string_resources};
pub use version::{
    VersionRecord, VersionUpdate, compare_with_reference, local_version_resource,
    write_local_version,
};
