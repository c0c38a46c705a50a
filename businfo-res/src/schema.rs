//! Database schema per SQL dialect.
//!
//! Row statements are dialect-neutral; only the table definitions and the
//! transaction wrapper differ.

use std::fmt;
use std::str::FromStr;

/// Target database engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Sqlite,
    Mysql,
}

/// Error for an unsupported dialect name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported dialect '{0}' (expected sqlite or mysql)")]
pub struct UnknownDialect(pub String);

const SQLITE_SCHEMA: &str = "\
CREATE TABLE network (
  id INTEGER PRIMARY KEY,
  name TEXT NOT NULL,
  color TEXT
);
CREATE TABLE city (
  id INTEGER PRIMARY KEY,
  name TEXT NOT NULL,
  latitude INTEGER,
  longitude INTEGER
);
CREATE TABLE station (
  id INTEGER PRIMARY KEY,
  name TEXT NOT NULL,
  latitude INTEGER,
  longitude INTEGER,
  city_id INTEGER NOT NULL
);
CREATE TABLE line (
  id INTEGER PRIMARY KEY,
  network_id INTEGER NOT NULL,
  name TEXT NOT NULL,
  color TEXT,
  dflt_circpat TEXT,
  from_city_id INTEGER,
  to_city_id INTEGER,
  from_date TEXT,
  to_date TEXT
);
CREATE TABLE line_station (
  id INTEGER PRIMARY KEY,
  line_id INTEGER NOT NULL,
  station_id INTEGER NOT NULL,
  rank INTEGER NOT NULL,
  direction_id INTEGER NOT NULL -- terminal city
);
CREATE TABLE stop (
  id INTEGER PRIMARY KEY,
  time TEXT NOT NULL,
  circpat TEXT,
  station_id INTEGER NOT NULL,
  line_id INTEGER NOT NULL,
  direction_id INTEGER NOT NULL,
  city_id INTEGER NOT NULL
);
CREATE INDEX stop_station_idx ON stop (station_id, line_id, direction_id);
CREATE INDEX line_station_line_idx ON line_station (line_id, direction_id);
CREATE TRIGGER fki_station_city_id
BEFORE INSERT ON station
FOR EACH ROW BEGIN
  SELECT RAISE(ROLLBACK, 'insert on table station violates foreign key constraint on city_id')
  WHERE (SELECT id FROM city WHERE id = NEW.city_id) IS NULL;
END;
CREATE TRIGGER fki_stop_line_id
BEFORE INSERT ON stop
FOR EACH ROW BEGIN
  SELECT RAISE(ROLLBACK, 'insert on table stop violates foreign key constraint on line_id')
  WHERE (SELECT id FROM line WHERE id = NEW.line_id) IS NULL;
END;
";

const MYSQL_SCHEMA: &str = "\
DROP TABLE IF EXISTS stop, line_station, line, station, city, network;
CREATE TABLE network (
  id INT PRIMARY KEY,
  name VARCHAR(255) NOT NULL,
  color VARCHAR(16)
) ENGINE=InnoDB DEFAULT CHARSET=utf8;
CREATE TABLE city (
  id INT PRIMARY KEY,
  name VARCHAR(255) NOT NULL,
  latitude INT,
  longitude INT
) ENGINE=InnoDB DEFAULT CHARSET=utf8;
CREATE TABLE station (
  id INT PRIMARY KEY,
  name VARCHAR(255) NOT NULL,
  latitude INT,
  longitude INT,
  city_id INT NOT NULL,
  FOREIGN KEY (city_id) REFERENCES city (id)
) ENGINE=InnoDB DEFAULT CHARSET=utf8;
CREATE TABLE line (
  id INT PRIMARY KEY,
  network_id INT NOT NULL,
  name VARCHAR(255) NOT NULL,
  color VARCHAR(16),
  dflt_circpat VARCHAR(64),
  from_city_id INT,
  to_city_id INT,
  from_date VARCHAR(16),
  to_date VARCHAR(16),
  FOREIGN KEY (network_id) REFERENCES network (id)
) ENGINE=InnoDB DEFAULT CHARSET=utf8;
CREATE TABLE line_station (
  id INT PRIMARY KEY,
  line_id INT NOT NULL,
  station_id INT NOT NULL,
  rank INT NOT NULL,
  direction_id INT NOT NULL,
  FOREIGN KEY (line_id) REFERENCES line (id),
  FOREIGN KEY (station_id) REFERENCES station (id)
) ENGINE=InnoDB DEFAULT CHARSET=utf8;
CREATE TABLE stop (
  id INT PRIMARY KEY,
  time CHAR(5) NOT NULL,
  circpat VARCHAR(64),
  station_id INT NOT NULL,
  line_id INT NOT NULL,
  direction_id INT NOT NULL,
  city_id INT NOT NULL,
  FOREIGN KEY (station_id) REFERENCES station (id),
  FOREIGN KEY (line_id) REFERENCES line (id)
) ENGINE=InnoDB DEFAULT CHARSET=utf8;
";

impl Dialect {
    /// Table definitions.
    pub fn schema(self) -> &'static str {
        match self {
            Dialect::Sqlite => SQLITE_SCHEMA,
            Dialect::Mysql => MYSQL_SCHEMA,
        }
    }

    /// Statements opening the single transaction around all inserts.
    pub fn preamble(self) -> &'static str {
        match self {
            Dialect::Sqlite => "BEGIN TRANSACTION;\n",
            Dialect::Mysql => "SET autocommit=0;\nBEGIN;\n",
        }
    }

    /// Statements closing the transaction.
    pub fn epilogue(self) -> &'static str {
        match self {
            Dialect::Sqlite => "END TRANSACTION;\n",
            Dialect::Mysql => "COMMIT;\nSET autocommit=1;\n",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Mysql => "mysql",
        }
    }
}

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Dialect::Sqlite),
            "mysql" => Ok(Dialect::Mysql),
            _ => Err(UnknownDialect(s.to_string())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
