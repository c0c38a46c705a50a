//! Table rows and their `INSERT` statements.
//!
//! Every row renders as one line of SQL, e.g.
//! `INSERT INTO city VALUES(1, "Lattes", 43567000, 3900000);`

use std::fmt;
use std::io::{self, Write};

/// Render a text value as a double-quoted SQL literal.
struct Quoted<'a>(&'a str);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0.replace('"', "\"\""))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRow {
    pub id: i64,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityRow {
    pub id: i64,
    pub name: String,
    /// Latitude in millionths of a degree.
    pub lat: i64,
    /// Longitude in millionths of a degree.
    pub lng: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationRow {
    pub id: i64,
    pub name: String,
    pub city_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRow {
    pub id: i64,
    pub network_id: i64,
    pub name: String,
    pub color: String,
    pub policy: String,
    pub from_city_id: i64,
    pub to_city_id: i64,
    pub from_date: String,
    pub to_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineStationRow {
    pub id: i64,
    pub line_id: i64,
    pub station_id: i64,
    /// Position within the direction, starting at 1.
    pub rank: i64,
    /// Terminal city of the direction.
    pub direction_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopRow {
    pub id: i64,
    pub time: String,
    /// Empty when the line's default policy applies.
    pub policy: String,
    pub station_id: i64,
    pub line_id: i64,
    pub direction_id: i64,
    pub city_id: i64,
}

impl fmt::Display for NetworkRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "INSERT INTO network VALUES({}, {}, {});",
            self.id,
            Quoted(&self.name),
            Quoted(&self.color)
        )
    }
}

impl fmt::Display for CityRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "INSERT INTO city VALUES({}, {}, {}, {});",
            self.id,
            Quoted(&self.name),
            self.lat,
            self.lng
        )
    }
}

impl fmt::Display for StationRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "INSERT INTO station VALUES({}, {}, 0, 0, {});",
            self.id,
            Quoted(&self.name),
            self.city_id
        )
    }
}

impl fmt::Display for LineRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "INSERT INTO line VALUES({}, {}, {}, {}, {}, {}, {}, {}, {});",
            self.id,
            self.network_id,
            Quoted(&self.name),
            Quoted(&self.color),
            Quoted(&self.policy),
            self.from_city_id,
            self.to_city_id,
            Quoted(&self.from_date),
            Quoted(&self.to_date)
        )
    }
}

impl fmt::Display for LineStationRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "INSERT INTO line_station VALUES({}, {}, {}, {}, {});",
            self.id, self.line_id, self.station_id, self.rank, self.direction_id
        )
    }
}

impl fmt::Display for StopRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "INSERT INTO stop VALUES({}, {}, {}, {}, {}, {}, {});",
            self.id,
            Quoted(&self.time),
            Quoted(&self.policy),
            self.station_id,
            self.line_id,
            self.direction_id,
            self.city_id
        )
    }
}

/// Streams rows as one statement per line.
pub struct SqlWriter<W: Write> {
    out: W,
    statements: usize,
}

impl<W: Write> SqlWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, statements: 0 }
    }

    /// Write every row of a table.
    pub fn write_rows<'a, R>(&mut self, rows: impl IntoIterator<Item = &'a R>) -> io::Result<()>
    where
        R: fmt::Display + 'a,
    {
        for row in rows {
            writeln!(self.out, "{row}")?;
            self.statements += 1;
        }
        Ok(())
    }

    /// Write raw SQL text (schema, transaction markers).
    pub fn write_raw(&mut self, sql: &str) -> io::Result<()> {
        self.out.write_all(sql.as_bytes())
    }

    /// Number of row statements written so far.
    pub fn statements(&self) -> usize {
        self.statements
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
