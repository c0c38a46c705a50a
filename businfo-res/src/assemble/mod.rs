//! Relational assembler.
//!
//! Turns the parsed schedules of every network into the six tables shipped
//! to the client (`network`, `city`, `station`, `line`, `line_station`,
//! `stop`) and writes them as `INSERT` statements. Foreign keys are resolved
//! by name, so a lookup miss means the sources disagree with each other.

mod dataset;
mod error;
mod gps;
mod registry;
mod sql;

pub use dataset::{Dataset, DatasetStats, Source, Strictness};
pub use error::{AssembleError, InputError};
pub use gps::{Coordinates, GpsCache, SELF_SUFFIX};
pub use registry::{Network, NetworkRegistry};
pub use sql::{CityRow, LineRow, LineStationRow, NetworkRow, SqlWriter, StationRow, StopRow};

#[cfg(test)]
mod dataset_tests;
