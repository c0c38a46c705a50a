//! Relational assembly of parsed schedules.
//!
//! Entities are deduplicated into ordered sets, given 1-based ids in sorted
//! key order, and every foreign key is resolved by value through index maps.
//! Ids are therefore reproducible across runs for identical inputs.

use std::collections::{BTreeSet, HashMap};
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::parser::LineSchedule;

use super::error::AssembleError;
use super::gps::GpsCache;
use super::registry::NetworkRegistry;
use super::sql::{CityRow, LineRow, LineStationRow, NetworkRow, SqlWriter, StationRow, StopRow};

/// How to treat lookup misses while emitting stop rows.
///
/// Table construction always fails on a miss. Stop rows historically only
/// logged the miss and wrote id 0 in its place. `Dataset::build` indexes
/// every visit before emitting stops, so a stop row can only miss if the
/// collection and emission passes stop agreeing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Log the miss and emit 0 for the missing id.
    #[default]
    Lenient,
    /// Abort the run.
    Strict,
}

/// A parsed line-definition file.
#[derive(Debug, Clone)]
pub struct Source {
    /// Path relative to the raw directory, matched against network paths.
    pub path: PathBuf,
    pub schedule: LineSchedule,
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DatasetStats {
    pub networks: usize,
    pub cities: usize,
    pub stations: usize,
    pub lines: usize,
    pub line_stations: usize,
    pub stops: usize,
}

/// The full relational dataset, every id resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub networks: Vec<NetworkRow>,
    pub cities: Vec<CityRow>,
    pub stations: Vec<StationRow>,
    pub lines: Vec<LineRow>,
    pub line_stations: Vec<LineStationRow>,
    pub stops: Vec<StopRow>,
}

/// Line attributes; two files agreeing on all of them describe one line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct LineKey {
    name: String,
    from_city: String,
    to_city: String,
    color: String,
    policy: String,
    from_date: String,
    to_date: String,
    network_id: i64,
}

/// A station's place in a line's direction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct LineStationKey {
    line: String,
    station: String,
    rank: i64,
    direction_city: String,
    station_city: String,
}

/// Deduplicated entity sets collected from every source.
#[derive(Default)]
struct Collected {
    cities: BTreeSet<String>,
    /// (station, city)
    stations: BTreeSet<(String, String)>,
    lines: BTreeSet<LineKey>,
    line_stations: BTreeSet<LineStationKey>,
}

/// Name-based indexes into the assigned ids.
#[derive(Default)]
struct Index {
    cities: HashMap<String, i64>,
    stations: HashMap<(String, i64), i64>,
    /// First id assigned to each line name.
    lines: HashMap<String, i64>,
}

impl Index {
    fn city(&self, name: &str) -> Result<i64, AssembleError> {
        self.cities
            .get(name)
            .copied()
            .ok_or_else(|| AssembleError::UnknownCity(name.to_string()))
    }

    fn station(&self, station: &str, city: &str) -> Result<i64, AssembleError> {
        let city_id = self.city(city)?;
        self.stations
            .get(&(station.to_string(), city_id))
            .copied()
            .ok_or_else(|| AssembleError::UnknownStation {
                station: station.to_string(),
                city: city.to_string(),
            })
    }

    fn line(&self, name: &str) -> Result<i64, AssembleError> {
        self.lines
            .get(name)
            .copied()
            .ok_or_else(|| AssembleError::UnknownLine(name.to_string()))
    }
}

impl Dataset {
    /// Build every table from the parsed sources.
    ///
    /// Sources are processed in path order, so the result does not depend
    /// on the order they are given in.
    pub fn build(
        registry: &NetworkRegistry,
        sources: &[Source],
        gps: &GpsCache,
        strictness: Strictness,
    ) -> Result<Self, AssembleError> {
        let mut sources: Vec<&Source> = sources.iter().collect();
        sources.sort_by(|a, b| a.path.cmp(&b.path));

        let mut dataset = Dataset {
            networks: registry
                .iter()
                .map(|(id, n)| NetworkRow {
                    id,
                    name: n.name.clone(),
                    color: n.color.clone(),
                })
                .collect(),
            ..Default::default()
        };

        let collected = collect(registry, &sources)?;
        let mut index = Index::default();

        for (city, id) in collected.cities.iter().zip(1..) {
            let (lat, lng) = gps.coordinates(city).to_fixed();
            dataset.cities.push(CityRow {
                id,
                name: city.clone(),
                lat,
                lng,
            });
            index.cities.insert(city.clone(), id);
        }

        for ((station, city), id) in collected.stations.iter().zip(1..) {
            let city_id = index.city(city)?;
            dataset.stations.push(StationRow {
                id,
                name: station.clone(),
                city_id,
            });
            index.stations.insert((station.clone(), city_id), id);
        }

        for (line, id) in collected.lines.iter().zip(1..) {
            let from_city_id = index.city(&line.from_city)?;
            let to_city_id = index.city(&line.to_city)?;
            if index.lines.contains_key(&line.name) {
                if strictness == Strictness::Strict {
                    return Err(AssembleError::ConflictingLine(line.name.clone()));
                }
                warn!(line = %line.name, "line defined more than once with different attributes");
            } else {
                index.lines.insert(line.name.clone(), id);
            }
            check_validity(line);
            dataset.lines.push(LineRow {
                id,
                network_id: line.network_id,
                name: line.name.clone(),
                color: line.color.clone(),
                policy: line.policy.clone(),
                from_city_id,
                to_city_id,
                from_date: line.from_date.clone(),
                to_date: line.to_date.clone(),
            });
        }

        for (ls, id) in collected.line_stations.iter().zip(1..) {
            dataset.line_stations.push(LineStationRow {
                id,
                line_id: index.line(&ls.line)?,
                station_id: index.station(&ls.station, &ls.station_city)?,
                rank: ls.rank,
                direction_id: index.city(&ls.direction_city)?,
            });
        }

        dataset.stops = stop_rows(&sources, &index, strictness)?;

        debug!(stats = ?dataset.stats(), "dataset assembled");
        Ok(dataset)
    }

    pub fn stats(&self) -> DatasetStats {
        DatasetStats {
            networks: self.networks.len(),
            cities: self.cities.len(),
            stations: self.stations.len(),
            lines: self.lines.len(),
            line_stations: self.line_stations.len(),
            stops: self.stops.len(),
        }
    }

    /// Emit every table, parents before children.
    pub fn write_sql<W: Write>(&self, writer: &mut SqlWriter<W>) -> io::Result<()> {
        writer.write_rows(&self.networks)?;
        writer.write_rows(&self.cities)?;
        writer.write_rows(&self.stations)?;
        writer.write_rows(&self.lines)?;
        writer.write_rows(&self.line_stations)?;
        writer.write_rows(&self.stops)
    }
}

/// Gather the deduplicated cities, stations, lines and line stations.
fn collect(registry: &NetworkRegistry, sources: &[&Source]) -> Result<Collected, AssembleError> {
    let mut collected = Collected::default();

    for source in sources {
        let network_id = registry
            .network_id_for(&source.path)
            .ok_or_else(|| AssembleError::WrongNetwork(source.path.clone()))?;
        let schedule = &source.schedule;
        let (from_city, to_city) = terminals(schedule)?;

        collected.lines.insert(LineKey {
            name: schedule.name.clone(),
            from_city: from_city.to_string(),
            to_city: to_city.to_string(),
            color: schedule.color.clone(),
            policy: schedule.default_policy.clone(),
            from_date: schedule.from_date.clone(),
            to_date: schedule.to_date.clone(),
            network_id,
        });

        for direction in &schedule.directions {
            let Some(direction_city) = direction.terminal_city() else {
                continue;
            };
            for (visit, rank) in direction.visits.iter().zip(1..) {
                collected.cities.insert(visit.city.clone());
                collected
                    .stations
                    .insert((visit.station.clone(), visit.city.clone()));
                collected.line_stations.insert(LineStationKey {
                    line: schedule.name.clone(),
                    station: visit.station.clone(),
                    rank,
                    direction_city: direction_city.to_string(),
                    station_city: visit.city.clone(),
                });
            }
        }
    }

    Ok(collected)
}

/// Terminal cities of the first and second directions.
fn terminals(schedule: &LineSchedule) -> Result<(&str, &str), AssembleError> {
    let incomplete = || AssembleError::IncompleteLine {
        line: schedule.name.clone(),
        directions: schedule
            .directions
            .iter()
            .filter(|d| !d.visits.is_empty())
            .count(),
    };
    let from = schedule
        .directions
        .first()
        .and_then(|d| d.terminal_city())
        .ok_or_else(incomplete)?;
    let to = schedule
        .directions
        .get(1)
        .and_then(|d| d.terminal_city())
        .ok_or_else(incomplete)?;
    Ok((from, to))
}

/// One row per literal stop, in source, direction, visit, stop order.
fn stop_rows(
    sources: &[&Source],
    index: &Index,
    strictness: Strictness,
) -> Result<Vec<StopRow>, AssembleError> {
    let resolve = |lookup: Result<i64, AssembleError>| match lookup {
        Ok(id) => Ok(id),
        Err(e) if strictness == Strictness::Lenient => {
            warn!(error = %e, "stop row lookup failed, using id 0");
            Ok(0)
        }
        Err(e) => Err(e),
    };

    let mut rows = Vec::new();
    let mut id = 1;
    for source in sources {
        let schedule = &source.schedule;
        for direction in &schedule.directions {
            let Some(direction_city) = direction.terminal_city() else {
                continue;
            };
            for visit in &direction.visits {
                for stop in &visit.stops {
                    rows.push(StopRow {
                        id,
                        time: stop.time.to_string(),
                        policy: stop.policy_text().to_string(),
                        station_id: resolve(index.station(&visit.station, &visit.city))?,
                        line_id: resolve(index.line(&schedule.name))?,
                        direction_id: resolve(index.city(direction_city))?,
                        city_id: resolve(index.city(&visit.city))?,
                    });
                    id += 1;
                }
            }
        }
    }
    Ok(rows)
}

/// Warn when both validity dates parse and are out of order.
fn check_validity(line: &LineKey) {
    let parse = |s: &str| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
            .ok()
    };
    if let (Some(from), Some(to)) = (parse(&line.from_date), parse(&line.to_date))
        && from > to
    {
        warn!(line = %line.name, %from, %to, "validity period ends before it starts");
    }
}
