//! String resource files consumed by the client.

use std::path::Path;

use super::error::PackageError;

/// Header of every generated resource file.
pub const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>
<!-- GENERATED AUTOMATICALLY BY THE businfo-res TOOL. DO NOT MODIFY! -->
";

const CHUNK_OPEN: &str = "\n<string name=\"ht_createdb\">\n";
const CHUNK_CLOSE: &str = "\n</string>\n";

/// Wrap a chunk payload into a standalone resource file.
pub fn chunk_resource(payload: &str) -> String {
    format!("{XML_HEADER}{CHUNK_OPEN}{payload}{CHUNK_CLOSE}")
}

/// Payload of a chunk resource, `None` if the wrapper is not recognized.
pub fn chunk_payload(resource: &str) -> Option<&str> {
    resource
        .strip_prefix(XML_HEADER)?
        .strip_prefix(CHUNK_OPEN)?
        .strip_suffix(CHUNK_CLOSE)
}

/// A `<resources>` file of named strings.
pub fn string_resources<'a>(entries: impl IntoIterator<Item = (&'a str, String)>) -> String {
    let mut xml = format!("{XML_HEADER}\n<resources>\n");
    for (name, value) in entries {
        xml.push_str(&format!("  <string name=\"{name}\">{value}</string>\n"));
    }
    xml.push_str("</resources>\n");
    xml
}

/// Table sizes shipped alongside the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DbStats {
    pub networks: usize,
    pub lines: usize,
    pub cities: usize,
    pub stations: usize,
}

impl DbStats {
    pub fn to_resource(&self) -> String {
        string_resources([
            ("num_networks", self.networks.to_string()),
            ("num_lines", self.lines.to_string()),
            ("num_cities", self.cities.to_string()),
            ("num_stations", self.stations.to_string()),
        ])
    }

    /// Write the `dbstats.xml` resource.
    pub fn write(&self, path: &Path) -> Result<(), PackageError> {
        std::fs::write(path, self.to_resource()).map_err(PackageError::io(path))
    }
}
