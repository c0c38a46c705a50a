//! Schedule parser for raw line-definition files.
//!
//! A line file is a flat list of `key=value` directives and station lines:
//!
//! ```text
//! name=38
//! color=#ff0000
//! circulation=1-6
//! direction=Montpellier
//! city=saint-jean-de-védas
//! Centre;7:05;8:10;12:00*7*
//! city=montpellier
//! Gare St-Roch/Comédie;7:25;*7*;8:30
//! direction=Saint-Jean-de-Védas
//! ...
//! ```
//!
//! Names are normalized with [`smart_capitalize`](crate::domain::smart_capitalize)
//! and stop times with [`StopTime`](crate::domain::StopTime).

mod error;
mod schedule;

pub use error::ParseError;
pub use schedule::{
    DEFAULT_CIRCULATION_POLICY, Direction, LineSchedule, ParserConfig, StationVisit, parse_file,
    parse_schedule,
};
