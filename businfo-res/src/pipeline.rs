//! End-to-end build run.
//!
//! gate → compile → parse → assemble → `htdb.sql` → chunks, stats and
//! version records (android only) → GPS report and resource.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::assemble::{Dataset, DatasetStats, GpsCache, NetworkRegistry, Source, SqlWriter};
use crate::checksum::{ChecksumMarker, GateOutcome, compute_db_checksum, find_line_sources};
use crate::compiler::{CompileReport, LineCompiler};
use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::package::{
    DbStats, VersionUpdate, XML_HEADER, compare_with_reference, make_chunks, write_local_version,
};
use crate::parser::{ParseError, ParserConfig, parse_file};

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub checksum: String,
    pub stats: DatasetStats,
    /// Present when the line compiler ran.
    pub compiled: Option<CompileReport>,
    /// Number of chunk resources, android runs only.
    pub chunks: Option<usize>,
    /// Fate of the reference version record, if one was given.
    pub version: Option<VersionUpdate>,
    /// Cities with no cached coordinates.
    pub missing_gps: Vec<String>,
    /// Cities cached at (0, 0).
    pub origin_gps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Sources unchanged since the last run.
    UpToDate,
    Built(RunSummary),
}

/// Run a full build.
///
/// The checksum marker is updated before generation starts, so a run that
/// fails midway must be retried after removing it.
pub fn run(config: &BuildConfig) -> Result<RunOutcome, BuildError> {
    config.validate()?;
    create_dir(&config.work_dir)?;
    create_dir(&config.raw_dir)?;

    let schema = config.dialect.schema();
    let checksum = compute_db_checksum(
        schema,
        &config.filter_map_path(),
        &find_line_sources(&config.raw_dir)?,
    )?;
    let marker = ChecksumMarker::new(config.checksum_path());
    if marker.check_up_to_date(&checksum)? == GateOutcome::UpToDate {
        return Ok(RunOutcome::UpToDate);
    }

    let registry = NetworkRegistry::load(&config.networks_path())?;
    if registry.is_empty() {
        warn!(path = %config.networks_path().display(), "no network registered");
    }
    let compiled = match &config.compiler {
        Some(program) => {
            let compiler = LineCompiler::new(program);
            info!(program = %compiler.program().display(), "running line compiler");
            Some(compiler.compile_all(&registry, &config.lines_dir, &config.raw_dir)?)
        }
        None => None,
    };

    let sources = parse_sources(&config.raw_dir, &ParserConfig::new(&config.default_policy))?;
    let gps = GpsCache::load(config.gps_cache_path())?;
    let dataset = Dataset::build(&registry, &sources, &gps, config.strictness)?;

    let sql = render_sql(config, &dataset)?;
    let sql_path = config.sql_path();
    fs::write(&sql_path, &sql).map_err(|source| BuildError::Io {
        path: sql_path.clone(),
        source,
    })?;
    info!(path = %sql_path.display(), dialect = %config.dialect, "raw SQL content written");

    let stats = dataset.stats();
    let mut chunks = None;
    let mut version = None;
    if config.android {
        let n = make_chunks(&sql, config.chunk_size, &config.work_dir)?;
        DbStats {
            networks: stats.networks,
            lines: stats.lines,
            cities: stats.cities,
            stations: stats.stations,
        }
        .write(&config.stats_path())?;
        write_local_version(&config.version_path(), &checksum, n)?;
        if let Some(reference) = &config.compare_with {
            version = Some(compare_with_reference(reference, &checksum, n)?);
        }
        chunks = Some(n);
    }

    let (missing_gps, origin_gps) = report_gps(&gps, &dataset);
    gps.write_resource(&config.gps_resource_path(), XML_HEADER)?;

    info!(?stats, "build complete");
    Ok(RunOutcome::Built(RunSummary {
        checksum,
        stats,
        compiled,
        chunks,
        version,
        missing_gps,
        origin_gps,
    }))
}

fn create_dir(dir: &Path) -> Result<(), BuildError> {
    fs::create_dir_all(dir).map_err(|source| BuildError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// Parse every compiled line file below `raw_dir`.
fn parse_sources(raw_dir: &Path, config: &ParserConfig) -> Result<Vec<Source>, BuildError> {
    let paths = find_line_sources(raw_dir)?;
    info!(files = paths.len(), "parsing line definitions");
    let sources = paths
        .into_iter()
        .map(|path| {
            let schedule = parse_file(&path, config)?;
            let path = path
                .strip_prefix(raw_dir)
                .map(Path::to_path_buf)
                .unwrap_or(path);
            Ok(Source { path, schedule })
        })
        .collect::<Result<Vec<_>, ParseError>>()?;
    Ok(sources)
}

/// The whole SQL script: transaction, schema, rows.
fn render_sql(config: &BuildConfig, dataset: &Dataset) -> Result<String, BuildError> {
    let io_err = |source| BuildError::Io {
        path: config.sql_path(),
        source,
    };
    let mut writer = SqlWriter::new(Vec::new());
    writer.write_raw(config.dialect.preamble()).map_err(io_err)?;
    writer.write_raw(config.dialect.schema()).map_err(io_err)?;
    dataset.write_sql(&mut writer).map_err(io_err)?;
    writer.write_raw(config.dialect.epilogue()).map_err(io_err)?;
    debug!(statements = writer.statements(), "SQL rows rendered");

    // Rows are built from UTF-8 strings
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

/// Log the dataset's cities lacking usable coordinates.
///
/// Returns the uncached cities and those cached at (0, 0).
fn report_gps(gps: &GpsCache, dataset: &Dataset) -> (Vec<String>, Vec<String>) {
    if gps.is_empty() {
        warn!(cache = %gps.path().display(), "GPS cache is empty");
    }
    let cities = || dataset.cities.iter().map(|c| c.name.as_str());
    let missing: Vec<String> = gps.missing(cities()).into_iter().map(str::to_string).collect();
    for city in &missing {
        warn!(%city, cache = %gps.path().display(), "no GPS coordinates cached");
    }
    let origin: Vec<String> = gps.at_origin(cities()).into_iter().map(str::to_string).collect();
    for city in &origin {
        warn!(%city, "cached GPS coordinates are (0, 0)");
    }
    (missing, origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{chunk_path, chunk_payload, reformat_sql};
    use crate::schema::Dialect;
    use std::path::PathBuf;
    use tempfile::{TempDir, tempdir};

    const LINE_38: &str = "\
name=38
color=#e2007a
direction=Montpellier
city=lattes
centre;7:05;8:05
city=montpellier
gare st-roch;7:25;8:25*7*
direction=Lattes
city=montpellier
gare st-roch;17:00
city=lattes
centre;17:20
";

    const LINE_302: &str = "\
name=302
color=#ff9900
circulation=1-5
direction=Sète
city=montpellier
gare st-roch;6:40
city=sète
gare;7:30
direction=Montpellier
city=sète
gare;18:00
city=montpellier
gare st-roch;18:50
";

    struct Fixture {
        _dir: TempDir,
        lines: PathBuf,
        raw: PathBuf,
        work: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let lines = dir.path().join("lines");
        let raw = dir.path().join("raw");
        let work = dir.path().join("work");
        fs::create_dir_all(&lines).unwrap();
        fs::create_dir_all(raw.join("tam")).unwrap();
        fs::create_dir_all(raw.join("cg34")).unwrap();

        fs::write(
            lines.join("networks.json"),
            r##"{
  "TaM": { "path": "tam", "color": "#0066cc" },
  "Hérault Transport": { "path": "cg34", "color": "#ff9900" }
}"##,
        )
        .unwrap();
        fs::write(lines.join("filter.map"), "# old;new\n").unwrap();
        fs::write(lines.join("gps.csv"), "Lattes;43.5;3.25\nSète;0;0\n").unwrap();
        fs::write(raw.join("tam/38.txt"), LINE_38).unwrap();
        fs::write(raw.join("cg34/302.txt"), LINE_302).unwrap();

        Fixture {
            _dir: dir,
            lines,
            raw,
            work,
        }
    }

    fn config(f: &Fixture) -> BuildConfig {
        BuildConfig::new(&f.lines, &f.raw).with_work_dir(&f.work)
    }

    fn built(outcome: RunOutcome) -> RunSummary {
        match outcome {
            RunOutcome::Built(summary) => summary,
            RunOutcome::UpToDate => panic!("expected a build"),
        }
    }

    #[test]
    fn sqlite_run_writes_script() {
        let f = fixture();
        let summary = built(run(&config(&f)).unwrap());

        assert_eq!(
            summary.stats,
            DatasetStats {
                networks: 2,
                cities: 3,
                stations: 3,
                lines: 2,
                line_stations: 8,
                stops: 10,
            }
        );
        assert_eq!(summary.chunks, None);
        assert_eq!(summary.compiled, None);
        assert_eq!(summary.missing_gps, vec!["Montpellier".to_string()]);
        assert_eq!(summary.origin_gps, vec!["Sète".to_string()]);

        let sql = fs::read_to_string(f.work.join("htdb.sql")).unwrap();
        assert!(sql.starts_with("BEGIN TRANSACTION;\nCREATE TABLE network ("));
        assert!(sql.ends_with("END TRANSACTION;\n"));
        assert!(sql.contains(r#"INSERT INTO city VALUES(1, "Lattes", 43500000, 3250000);"#));
        assert!(sql.contains(r##"INSERT INTO line VALUES(1, 1, "302", "#ff9900", "1-5", 3, 2, "", "");"##));

        let gps = fs::read_to_string(f.work.join("gps.xml")).unwrap();
        assert!(gps.contains("<city name=\"Lattes\" lat=\"43.5\" lng=\"3.25\" />"));
        assert!(!f.work.join("dbstats.xml").exists());
    }

    #[test]
    fn second_run_is_up_to_date() {
        let f = fixture();
        let config = config(&f);
        built(run(&config).unwrap());
        assert_eq!(run(&config).unwrap(), RunOutcome::UpToDate);

        fs::write(f.raw.join("tam/38.txt"), LINE_38.replace("17:20", "17:25")).unwrap();
        built(run(&config).unwrap());
    }

    #[test]
    fn schema_change_invalidates_gate() {
        let f = fixture();
        built(run(&config(&f)).unwrap());
        let mysql = config(&f).with_dialect(Dialect::Mysql);
        let summary = built(run(&mysql).unwrap());

        let sql = fs::read_to_string(f.work.join("htdb.sql")).unwrap();
        assert!(sql.starts_with("SET autocommit=0;\nBEGIN;\n"));
        assert!(sql.ends_with("COMMIT;\nSET autocommit=1;\n"));
        assert_eq!(summary.stats.stops, 10);
    }

    #[test]
    fn android_run_packages_chunks() {
        let f = fixture();
        let reference = f.work.join("release-dbversion.xml");
        let config = config(&f)
            .with_android(true)
            .with_chunk_size(512)
            .with_compare_with(&reference);

        let summary = built(run(&config).unwrap());
        let n = summary.chunks.unwrap();
        assert!(n > 1);
        assert_eq!(summary.version, Some(VersionUpdate::Created));

        let mut joined = String::new();
        for i in 1..=n {
            let xml = fs::read_to_string(chunk_path(&f.work, i)).unwrap();
            joined.push_str(chunk_payload(&xml).unwrap());
        }
        let sql = fs::read_to_string(f.work.join("htdb.sql")).unwrap();
        assert_eq!(joined, reformat_sql(&sql));

        let stats = fs::read_to_string(f.work.join("dbstats.xml")).unwrap();
        assert!(stats.contains("<string name=\"num_cities\">3</string>"));
        let local = fs::read_to_string(f.work.join("dbversion.xml")).unwrap();
        assert!(local.contains(&format!("<string name=\"dbchecksum\">{}</string>", summary.checksum)));
        assert!(local.contains(&format!("<string name=\"numchunks\">{n}</string>")));

        fs::write(f.raw.join("cg34/302.txt"), LINE_302.replace("6:40", "6:45")).unwrap();
        let summary = built(run(&config).unwrap());
        assert_eq!(summary.version, Some(VersionUpdate::Upgraded { from: 1, to: 2 }));
    }

    #[test]
    fn invalid_combination_fails_before_any_output() {
        let f = fixture();
        let config = config(&f).with_dialect(Dialect::Mysql).with_android(true);
        let err = run(&config).unwrap_err();
        assert!(matches!(err, BuildError::Config(_)));
        assert!(!f.work.join(".checksum").exists());
    }

    #[test]
    fn parse_error_aborts_run() {
        let f = fixture();
        fs::write(f.raw.join("tam/99.txt"), "name=99\ncentre;7:00\n").unwrap();
        let err = run(&config(&f)).unwrap_err();
        assert!(matches!(err, BuildError::Parse(ParseError::InFile { .. })));
        assert!(!f.work.join("htdb.sql").exists());
    }

    #[test]
    fn origin_report_skips_cities_outside_the_dataset() {
        let f = fixture();
        fs::write(f.lines.join("gps.csv"), "Lattes;43.5;3.25\nSète;0;0\nMauguio;0;0\n").unwrap();
        let summary = built(run(&config(&f)).unwrap());
        assert_eq!(summary.origin_gps, vec!["Sète".to_string()]);
    }

    #[test]
    fn networks_are_matched_below_the_raw_dir() {
        let f = fixture();
        // The raw dir itself sits below a directory named like a network path
        let raw = f.work.with_file_name("cg34-mirror").join("raw");
        fs::create_dir_all(raw.join("tam")).unwrap();
        fs::create_dir_all(raw.join("cg34")).unwrap();
        fs::copy(f.raw.join("tam/38.txt"), raw.join("tam/38.txt")).unwrap();
        fs::copy(f.raw.join("cg34/302.txt"), raw.join("cg34/302.txt")).unwrap();

        let config = BuildConfig::new(&f.lines, &raw).with_work_dir(&f.work);
        built(run(&config).unwrap());

        let sql = fs::read_to_string(f.work.join("htdb.sql")).unwrap();
        assert!(sql.contains(r##"INSERT INTO line VALUES(2, 2, "38", "#e2007a","##));
        assert!(sql.contains(r##"INSERT INTO line VALUES(1, 1, "302", "#ff9900","##));
    }

    #[test]
    fn unknown_network_aborts_run() {
        let f = fixture();
        fs::create_dir_all(f.raw.join("elsewhere")).unwrap();
        fs::write(f.raw.join("elsewhere/38.txt"), LINE_38).unwrap();
        let err = run(&config(&f)).unwrap_err();
        assert!(matches!(err, BuildError::Assemble(_)));
    }

    #[cfg(unix)]
    #[test]
    fn compiler_output_is_parsed() {
        let f = fixture();
        fs::create_dir_all(f.lines.join("tam")).unwrap();
        fs::write(f.lines.join("tam/7.in"), LINE_38.replace("name=38", "name=7")).unwrap();

        let summary = built(run(&config(&f).with_compiler("cat")).unwrap());
        let compiled = summary.compiled.unwrap();
        assert_eq!(compiled.total(), 1);
        assert!(f.raw.join("tam/7.txt").exists());
        assert_eq!(summary.stats.lines, 3);
    }
}
