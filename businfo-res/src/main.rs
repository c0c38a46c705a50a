use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use businfo_res::assemble::Strictness;
use businfo_res::config::{BuildConfig, ConfigError, parse_flag};
use businfo_res::error::BuildError;
use businfo_res::pipeline::{RunOutcome, run};
use businfo_res::schema::Dialect;

/// Properties file used when `BUSINFO_CONFIG` is not set.
const DEFAULT_CONFIG: &str = "local.properties";

const USAGE: &str = "usage: businfo-res <sqlite|mysql> <raw_dir>

environment:
  BUSINFO_CONFIG        properties file holding lines.dir (default: local.properties)
  BUSINFO_WORK_DIR      output directory (default: <temp>/businfo)
  BUSINFO_ANDROID       produce chunked resources for the mobile client
  BUSINFO_CHUNK_SIZE    chunk size in bytes, 0 for a single chunk
  BUSINFO_COMPARE_WITH  reference version record to keep up to date
  BUSINFO_COMPILER      line compiler to run on *.in definitions
  BUSINFO_STRICT        fail on any unresolved stop reference";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [dialect, raw_dir] = args.as_slice() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };
    let dialect: Dialect = match dialect.parse() {
        Ok(dialect) => dialect,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let config = match config_from_env(dialect, raw_dir) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&config) {
        Ok(RunOutcome::UpToDate) => ExitCode::SUCCESS,
        Ok(RunOutcome::Built(summary)) => {
            info!(
                networks = summary.stats.networks,
                lines = summary.stats.lines,
                cities = summary.stats.cities,
                stations = summary.stats.stations,
                stops = summary.stats.stops,
                chunks = ?summary.chunks,
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => exit_with(e),
    }
}

fn exit_with(e: BuildError) -> ExitCode {
    error!("{e}");
    let code = u8::try_from(e.exit_code()).unwrap_or(1);
    ExitCode::from(code)
}

/// Build the run configuration from the environment.
fn config_from_env(dialect: Dialect, raw_dir: &str) -> Result<BuildConfig, ConfigError> {
    let properties = env("BUSINFO_CONFIG").unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let mut config =
        BuildConfig::from_properties(&PathBuf::from(properties), raw_dir)?.with_dialect(dialect);

    if let Some(dir) = env("BUSINFO_WORK_DIR") {
        config = config.with_work_dir(dir);
    }
    if let Some(v) = env("BUSINFO_ANDROID") {
        config = config.with_android(parse_flag("BUSINFO_ANDROID", &v)?);
    }
    if let Some(v) = env("BUSINFO_CHUNK_SIZE") {
        let size = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: "BUSINFO_CHUNK_SIZE",
            value: v.clone(),
        })?;
        config = config.with_chunk_size(size);
    }
    if let Some(path) = env("BUSINFO_COMPARE_WITH") {
        config = config.with_compare_with(path);
    }
    if let Some(program) = env("BUSINFO_COMPILER") {
        config = config.with_compiler(program);
    }
    if let Some(v) = env("BUSINFO_STRICT")
        && parse_flag("BUSINFO_STRICT", &v)?
    {
        config = config.with_strictness(Strictness::Strict);
    }

    config.validate()?;
    Ok(config)
}

/// A non-empty environment variable.
fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
