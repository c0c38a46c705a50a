//! Domain types for bus schedules.
//!
//! Values here are normalized at construction time: stop times are always
//! "HH:MM", and names go through [`smart_capitalize`] before they are stored.

mod names;
mod stop;
mod time;

pub use names::smart_capitalize;
pub use stop::Stop;
pub use time::{StopTime, TimeError};
