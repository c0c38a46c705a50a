//! Bus schedule database generator.
//!
//! Reads hand-written line definitions for one or more bus networks and
//! produces the SQL database shipped with the mobile client: a full
//! `htdb.sql` script, and for the client itself the same script cut into
//! string resources along with statistics and version records.

pub mod assemble;
pub mod checksum;
pub mod compiler;
pub mod config;
pub mod domain;
pub mod error;
pub mod package;
pub mod parser;
pub mod pipeline;
pub mod schema;
