//! On-disk cache of city coordinates.
//!
//! The cache is a headerless `;`-delimited file of `city;lat;lng` records,
//! appended to by whatever tool geocodes new cities. Cities missing from the
//! cache are stored at (0, 0).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use super::error::InputError;

/// Cities whose name ends with this suffix are never geocoded.
pub const SELF_SUFFIX: &str = "_Self";

/// Multiplier turning degrees into the stored fixed-point integers.
const FIXED_POINT_SCALE: f64 = 1_000_000.0;

/// Latitude and longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Fixed-point values with six decimal digits, truncated toward zero.
    pub fn to_fixed(self) -> (i64, i64) {
        (
            (self.lat * FIXED_POINT_SCALE) as i64,
            (self.lng * FIXED_POINT_SCALE) as i64,
        )
    }

    pub fn is_origin(&self) -> bool {
        self.lat == 0.0 && self.lng == 0.0
    }
}

/// One `city;lat;lng` record.
#[derive(Debug, Deserialize)]
struct GpsRecord(String, f64, f64);

/// GPS coordinate cache backed by a `city;lat;lng` file.
#[derive(Debug, Clone)]
pub struct GpsCache {
    path: PathBuf,
    /// Entries in file order.
    entries: Vec<(String, Coordinates)>,
    index: HashMap<String, usize>,
}

impl GpsCache {
    /// Load the cache file. A missing file is an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, InputError> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path).map_err(|source| InputError::Io {
            path: path.clone(),
            source,
        })?;

        let mut cache = Self {
            path,
            entries: Vec::new(),
            index: HashMap::new(),
        };
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .trim(csv::Trim::Fields)
            .from_reader(contents.as_bytes());
        for rec in reader.deserialize() {
            let GpsRecord(city, lat, lng) = rec.map_err(|source| InputError::MalformedGps {
                path: cache.path.clone(),
                line_no: source.position().map_or(0, |p| p.line() as usize),
                source,
            })?;
            cache.insert(city, Coordinates { lat, lng });
        }
        info!(path = %cache.path.display(), cities = cache.len(), "GPS cache loaded");
        Ok(cache)
    }

    #[cfg(test)]
    pub(crate) fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Coordinates of a city, (0, 0) if not cached.
    pub fn coordinates(&self, city: &str) -> Coordinates {
        self.index
            .get(city)
            .map(|&i| self.entries[i].1)
            .unwrap_or_default()
    }

    pub fn contains(&self, city: &str) -> bool {
        self.index.contains_key(city)
    }

    /// Cities that still need geocoding, skipping self-referencing ones.
    pub fn missing<'a>(&self, cities: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        cities
            .into_iter()
            .filter(|c| !c.ends_with(SELF_SUFFIX) && !self.contains(c))
            .collect()
    }

    /// Cached cities sitting at (0, 0), usually a failed geocoding.
    pub fn at_origin<'a>(&self, cities: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        cities
            .into_iter()
            .filter(|c| self.index.get(*c).is_some_and(|&i| self.entries[i].1.is_origin()))
            .collect()
    }

    /// Write the `gps.xml` resource listing every cached city.
    pub fn write_resource(&self, out: &Path, header: &str) -> Result<(), InputError> {
        let mut xml = String::from(header);
        xml.push_str("<gps>\n");
        for (city, c) in &self.entries {
            xml.push_str(&format!(
                "  <city name=\"{}\" lat=\"{}\" lng=\"{}\" />\n",
                city, c.lat, c.lng
            ));
        }
        xml.push_str("</gps>\n");

        std::fs::write(out, xml).map_err(|source| InputError::Io {
            path: out.to_path_buf(),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn insert(&mut self, city: String, coords: Coordinates) {
        // First entry wins, like a linear scan of the file would
        if !self.index.contains_key(&city) {
            self.index.insert(city.clone(), self.entries.len());
            self.entries.push((city, coords));
        }
    }
}
