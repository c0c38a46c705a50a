//! Assembly scenarios over small parsed networks.

use std::path::PathBuf;

use tempfile::tempdir;

use super::*;
use crate::parser::{ParserConfig, parse_schedule};

fn registry() -> NetworkRegistry {
    NetworkRegistry::new(vec![
        Network {
            name: "TaM".into(),
            path: "tam".into(),
            color: "#0066cc".into(),
        },
        Network {
            name: "Hérault Transport".into(),
            path: "cg34".into(),
            color: "#ff9900".into(),
        },
    ])
}

fn source(path: &str, text: &str) -> Source {
    Source {
        path: PathBuf::from(path),
        schedule: parse_schedule(text, &ParserConfig::default()).unwrap(),
    }
}

fn no_gps() -> GpsCache {
    GpsCache::empty("gps.csv")
}

fn build(sources: &[Source]) -> Result<Dataset, AssembleError> {
    Dataset::build(&registry(), sources, &no_gps(), Strictness::Lenient)
}

/// Two directions in one city, "Gare" served both ways.
const LOOP_LINE: &str = "\
name=12
color=#00ff00
from=2011-09-01
to=2012-07-05
direction=Saint-Gély
city=saint-gély
mairie;7:00;8:00
gare;7:10;8:10*7*
direction=Saint-Gély
city=saint-gély
gare;17:00
parc;17:10
";

const LINE_38: &str = "\
name=38
color=#e2007a
direction=Montpellier
city=lattes
centre;7:05
city=montpellier
gare st-roch;7:25
direction=Lattes
city=montpellier
gare st-roch;17:00
city=lattes
centre;17:20
";

#[test]
fn single_city_loop_line() {
    let dataset = build(&[source("tam/12.txt", LOOP_LINE)]).unwrap();

    assert_eq!(
        dataset.networks,
        vec![
            NetworkRow {
                id: 1,
                name: "Hérault Transport".into(),
                color: "#ff9900".into(),
            },
            NetworkRow {
                id: 2,
                name: "TaM".into(),
                color: "#0066cc".into(),
            },
        ]
    );

    assert_eq!(
        dataset.cities,
        vec![CityRow {
            id: 1,
            name: "Saint-Gély".into(),
            lat: 0,
            lng: 0,
        }]
    );

    let stations: Vec<(i64, &str, i64)> = dataset
        .stations
        .iter()
        .map(|s| (s.id, s.name.as_str(), s.city_id))
        .collect();
    assert_eq!(stations, vec![(1, "Gare", 1), (2, "Mairie", 1), (3, "Parc", 1)]);

    assert_eq!(
        dataset.lines,
        vec![LineRow {
            id: 1,
            network_id: 2,
            name: "12".into(),
            color: "#00ff00".into(),
            policy: "1-6".into(),
            from_city_id: 1,
            to_city_id: 1,
            from_date: "2011-09-01".into(),
            to_date: "2012-07-05".into(),
        }]
    );

    // (station, rank) pairs; rank 1 at the head of each direction
    let line_stations: Vec<(i64, i64)> = dataset
        .line_stations
        .iter()
        .map(|ls| (ls.station_id, ls.rank))
        .collect();
    assert_eq!(line_stations, vec![(1, 1), (1, 2), (2, 1), (3, 2)]);
    assert!(dataset.line_stations.iter().all(|ls| ls.line_id == 1));
    assert!(dataset.line_stations.iter().all(|ls| ls.direction_id == 1));
}

#[test]
fn stop_rows_follow_source_order() {
    let dataset = build(&[source("tam/12.txt", LOOP_LINE)]).unwrap();

    let stops: Vec<(i64, &str, &str, i64)> = dataset
        .stops
        .iter()
        .map(|s| (s.id, s.time.as_str(), s.policy.as_str(), s.station_id))
        .collect();
    assert_eq!(
        stops,
        vec![
            (1, "07:00", "", 2),
            (2, "08:00", "", 2),
            (3, "07:10", "", 1),
            (4, "08:10", "7", 1),
            (5, "17:00", "", 1),
            (6, "17:10", "", 3),
        ]
    );
    assert!(dataset.stops.iter().all(|s| s.line_id == 1));
    assert!(dataset.stops.iter().all(|s| s.direction_id == 1));
    assert!(dataset.stops.iter().all(|s| s.city_id == 1));
}

#[test]
fn terminals_come_from_last_station_of_each_direction() {
    let dataset = build(&[source("tam/38.txt", LINE_38)]).unwrap();

    let city_id = |name: &str| dataset.cities.iter().find(|c| c.name == name).unwrap().id;
    let line = &dataset.lines[0];
    assert_eq!(line.from_city_id, city_id("Montpellier"));
    assert_eq!(line.to_city_id, city_id("Lattes"));

    // Stops in the first direction point at the Montpellier terminal
    assert_eq!(dataset.stops[0].direction_id, city_id("Montpellier"));
    assert_eq!(dataset.stops[0].city_id, city_id("Lattes"));
    assert_eq!(dataset.stops[3].direction_id, city_id("Lattes"));
}

#[test]
fn same_station_name_in_two_cities() {
    let text = "\
name=7
direction=Pérols
city=lattes
centre;7:00
city=pérols
centre;7:10
direction=Lattes
city=pérols
centre;8:00
city=lattes
centre;8:10
";
    let dataset = build(&[source("tam/7.txt", text)]).unwrap();
    assert_eq!(dataset.cities.len(), 2);
    assert_eq!(dataset.stations.len(), 2);
    assert!(dataset.stations.iter().all(|s| s.name == "Centre"));
    assert_ne!(dataset.stations[0].city_id, dataset.stations[1].city_id);
}

#[test]
fn sources_order_does_not_matter() {
    let a = source("tam/12.txt", LOOP_LINE);
    let b = source("tam/38.txt", LINE_38);

    let forward = build(&[a.clone(), b.clone()]).unwrap();
    let backward = build(&[b, a]).unwrap();
    assert_eq!(forward, backward);
}

#[test]
fn rebuild_is_identical() {
    let sources = [
        source("tam/12.txt", LOOP_LINE),
        source("cg34/38.txt", LINE_38),
    ];
    assert_eq!(build(&sources).unwrap(), build(&sources).unwrap());
}

#[test]
fn identical_lines_are_merged_but_stops_are_not() {
    let dataset = build(&[
        source("tam/12.txt", LOOP_LINE),
        source("tam/12-copy.txt", LOOP_LINE),
    ])
    .unwrap();
    assert_eq!(dataset.lines.len(), 1);
    assert_eq!(dataset.line_stations.len(), 4);
    assert_eq!(dataset.stops.len(), 12);
    assert_eq!(dataset.stops.last().unwrap().id, 12);
}

#[test]
fn conflicting_line_is_lenient_by_default() {
    let recolored = LOOP_LINE.replace("#00ff00", "#123456");
    let sources = [
        source("tam/12.txt", LOOP_LINE),
        source("tam/12b.txt", &recolored),
    ];

    let dataset = build(&sources).unwrap();
    assert_eq!(dataset.lines.len(), 2);
    // Every reference resolves to the first id given to the name
    assert!(dataset.stops.iter().all(|s| s.line_id == 1));
    assert!(dataset.line_stations.iter().all(|ls| ls.line_id == 1));
}

#[test]
fn conflicting_line_is_fatal_when_strict() {
    let recolored = LOOP_LINE.replace("#00ff00", "#123456");
    let sources = [
        source("tam/12.txt", LOOP_LINE),
        source("tam/12b.txt", &recolored),
    ];

    let err = Dataset::build(&registry(), &sources, &no_gps(), Strictness::Strict).unwrap_err();
    assert_eq!(err, AssembleError::ConflictingLine("12".into()));
}

#[test]
fn unknown_network_is_fatal() {
    let err = build(&[source("elsewhere/12.txt", LOOP_LINE)]).unwrap_err();
    assert_eq!(
        err,
        AssembleError::WrongNetwork(PathBuf::from("elsewhere/12.txt"))
    );
}

#[test]
fn single_direction_is_incomplete() {
    let text = "name=3\ndirection=A\ncity=a\nX;7:00\n";
    let err = build(&[source("tam/3.txt", text)]).unwrap_err();
    assert_eq!(
        err,
        AssembleError::IncompleteLine {
            line: "3".into(),
            directions: 1,
        }
    );
}

#[test]
fn empty_second_direction_is_incomplete() {
    let text = "name=3\ndirection=A\ncity=a\nX;7:00\ndirection=B\n";
    let err = build(&[source("tam/3.txt", text)]).unwrap_err();
    assert!(matches!(err, AssembleError::IncompleteLine { .. }));
}

#[test]
fn city_coordinates_come_from_cache() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gps.csv");
    std::fs::write(&path, "Lattes;43.5;3.25\n").unwrap();
    let gps = GpsCache::load(&path).unwrap();

    let dataset = Dataset::build(
        &registry(),
        &[source("tam/38.txt", LINE_38)],
        &gps,
        Strictness::Lenient,
    )
    .unwrap();

    let lattes = dataset.cities.iter().find(|c| c.name == "Lattes").unwrap();
    assert_eq!((lattes.lat, lattes.lng), (43_500_000, 3_250_000));
    let montpellier = dataset.cities.iter().find(|c| c.name == "Montpellier").unwrap();
    assert_eq!((montpellier.lat, montpellier.lng), (0, 0));
}

#[test]
fn stats_count_rows() {
    let dataset = build(&[source("tam/12.txt", LOOP_LINE)]).unwrap();
    assert_eq!(
        dataset.stats(),
        DatasetStats {
            networks: 2,
            cities: 1,
            stations: 3,
            lines: 1,
            line_stations: 4,
            stops: 6,
        }
    );
}

#[test]
fn sql_emits_parents_first() {
    let dataset = build(&[source("tam/12.txt", LOOP_LINE)]).unwrap();
    let mut writer = SqlWriter::new(Vec::new());
    dataset.write_sql(&mut writer).unwrap();
    assert_eq!(writer.statements(), 2 + 1 + 3 + 1 + 4 + 6);

    let sql = String::from_utf8(writer.into_inner()).unwrap();
    let tables: Vec<&str> = sql
        .lines()
        .map(|l| l.split_whitespace().nth(2).unwrap())
        .collect();
    let first = |t: &str| tables.iter().position(|x| *x == t).unwrap();
    let last = |t: &str| tables.iter().rposition(|x| *x == t).unwrap();
    assert!(last("network") < first("city"));
    assert!(last("city") < first("station"));
    assert!(last("station") < first("line"));
    assert!(last("line") < first("line_station"));
    assert!(last("line_station") < first("stop"));
    assert!(sql.contains(r#"INSERT INTO stop VALUES(4, "08:10", "7", 1, 1, 1, 1);"#));
}
