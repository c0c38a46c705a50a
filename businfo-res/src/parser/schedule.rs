//! Line-definition grammar.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::domain::{Stop, StopTime, smart_capitalize};

use super::error::ParseError;

/// Circulation policy in effect until a file sets `circulation=`.
pub const DEFAULT_CIRCULATION_POLICY: &str = "1-6";

const NAME: &str = "name=";
const CIRCULATION: &str = "circulation=";
const DIRECTION: &str = "direction=";
const CITY: &str = "city=";
const FROM: &str = "from=";
const TO: &str = "to=";
const COLOR: &str = "color=";
const UPDATED: &str = "updated=";

lazy_static! {
    /// `*POLICY*`: switches the policy for the rest of the station line.
    static ref POLICY_ONLY: Regex = Regex::new(r"^\*(.*)\*$").unwrap();
    /// `HH:MM*POLICY*`: one stop with its own policy.
    static ref TIMED_POLICY: Regex = Regex::new(r"^([0-9]{1,2}:[0-9]{2})\*(.*)\*$").unwrap();
}

/// Parser settings.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Default circulation policy each file starts with.
    pub default_policy: String,
}

impl ParserConfig {
    pub fn new(default_policy: impl Into<String>) -> Self {
        Self {
            default_policy: default_policy.into(),
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CIRCULATION_POLICY)
    }
}

/// One station served by a direction, with its departures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationVisit {
    pub station: String,
    pub city: String,
    pub stops: Vec<Stop>,
}

/// One traversal of a line, in visiting order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Direction {
    pub visits: Vec<StationVisit>,
}

impl Direction {
    /// City of the last station; identifies the direction.
    pub fn terminal_city(&self) -> Option<&str> {
        self.visits.last().map(|v| v.city.as_str())
    }
}

/// Everything one line-definition file describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSchedule {
    pub name: String,
    pub directions: Vec<Direction>,
    pub color: String,
    /// Default policy in effect at the end of the file.
    pub default_policy: String,
    pub from_date: String,
    pub to_date: String,
}

/// Read and parse a line-definition file.
pub fn parse_file(path: &Path, config: &ParserConfig) -> Result<LineSchedule, ParseError> {
    let text = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_schedule(&text, config).map_err(|e| ParseError::InFile {
        path: path.to_path_buf(),
        source: Box::new(e),
    })
}

/// Parse the text of a line-definition file.
///
/// Blank lines and lines starting with `#` are ignored.
pub fn parse_schedule(text: &str, config: &ParserConfig) -> Result<LineSchedule, ParseError> {
    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'))
        .collect();

    if lines.is_empty() {
        return Err(ParseError::EmptyContent);
    }

    let mut name = None;
    let mut directions: Vec<Direction> = Vec::new();
    let mut default_policy = config.default_policy.clone();
    let mut city: Option<String> = None;
    let mut color = String::new();
    let mut from_date = String::new();
    let mut to_date = String::new();

    for (line_no, line) in lines {
        if line.starts_with(DIRECTION) {
            directions.push(Direction::default());
        } else if let Some(v) = line.strip_prefix(CIRCULATION) {
            default_policy = v.to_string();
        } else if let Some(v) = line.strip_prefix(CITY) {
            city = Some(smart_capitalize(v));
        } else if let Some(v) = line.strip_prefix(NAME) {
            name = Some(v.to_string());
        } else if let Some(v) = line.strip_prefix(FROM) {
            from_date = v.to_string();
        } else if let Some(v) = line.strip_prefix(TO) {
            to_date = v.to_string();
        } else if let Some(v) = line.strip_prefix(COLOR) {
            color = v.to_string();
        } else if line.starts_with(UPDATED) {
            // Informational only
        } else {
            let direction = directions
                .last_mut()
                .ok_or_else(|| ParseError::MissingDirection {
                    line_no,
                    line: line.to_string(),
                })?;
            let city = city.as_ref().ok_or_else(|| ParseError::MissingCity {
                line_no,
                line: line.to_string(),
            })?;
            parse_station_line(line, city, &default_policy, direction);
        }
    }

    Ok(LineSchedule {
        name: name.ok_or(ParseError::MissingName)?,
        directions,
        color,
        default_policy,
        from_date,
        to_date,
    })
}

/// Parse `name[/name...];stop;stop;...` and append one visit per name.
fn parse_station_line(line: &str, city: &str, default_policy: &str, direction: &mut Direction) {
    let mut fields = line.split(';');
    let names = fields.next().unwrap_or_default();
    let stops = parse_stops(fields, default_policy);

    for station in names.split('/') {
        direction.visits.push(StationVisit {
            station: smart_capitalize(station),
            city: city.to_string(),
            stops: stops.clone(),
        });
    }
}

/// Classify stop tokens. Unrecognized tokens are dropped.
fn parse_stops<'a>(tokens: impl Iterator<Item = &'a str>, default_policy: &str) -> Vec<Stop> {
    let mut stops = Vec::new();
    let mut active = default_policy;

    for token in tokens {
        if let Some(caps) = POLICY_ONLY.captures(token) {
            active = caps.get(1).map_or("", |m| m.as_str());
        } else if let Ok(time) = StopTime::parse(token) {
            if active == default_policy {
                stops.push(Stop::new(time));
            } else {
                stops.push(Stop::with_policy(time, active));
            }
        } else if let Some(caps) = TIMED_POLICY.captures(token)
            && let Ok(time) = StopTime::parse(&caps[1])
        {
            stops.push(Stop::with_policy(time, &caps[2]));
        }
    }

    stops
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Every stored name is a fixed point of the capitalizer
        #[test]
        fn stored_names_are_normalized(
            city in "[a-zé' -]{1,20}",
            station in "[a-zé' -]{1,20}",
        ) {
            let text = format!("name=1\ndirection=A\ncity={city}\n{station};7:00\n");
            let line = parse_schedule(&text, &ParserConfig::default()).unwrap();
            for visit in &line.directions[0].visits {
                prop_assert_eq!(smart_capitalize(&visit.city), visit.city.clone());
                prop_assert_eq!(smart_capitalize(&visit.station), visit.station.clone());
            }
        }

        /// Pure time tokens always come out as five characters
        #[test]
        fn stop_times_are_five_chars(h in 0u32..24, m in 0u32..60) {
            let text = format!("name=1\ndirection=A\ncity=a\nX;{h}:{m:02}\n");
            let line = parse_schedule(&text, &ParserConfig::default()).unwrap();
            let stop = &line.directions[0].visits[0].stops[0];
            prop_assert_eq!(stop.time.as_str(), format!("{h:02}:{m:02}"));
        }
    }
}
