//! Splitting the generated SQL into size-bounded resources.
//!
//! The client reads its database script from string resources, which have
//! a size limit. The script is flattened to one statement per line and cut
//! into chunks, each wrapped as an independent resource file.

use std::path::{Path, PathBuf};

use tracing::info;

use super::error::PackageError;
use super::resource::chunk_resource;

/// Default chunk size in bytes.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// File name prefix of chunk resources.
pub const CHUNK_PREFIX: &str = "htdb_chunk";

/// Statements the client must not run itself.
const TRANSACTION_MARKERS: [&str; 3] = ["BEGIN TRANSACTION;", "END TRANSACTION;", "END;"];

/// Reformat one line of SQL, `None` for transaction boundaries.
///
/// Comments are dropped, leading blanks removed, and every `;` becomes a
/// line break so statements end up one per line. Each input line keeps a
/// trailing space so multi-line statements stay separated once joined.
/// `IS NULL;` gets an `END` appended, restoring trigger bodies whose `END;`
/// line is dropped.
pub fn reformat_line(line: &str) -> Option<String> {
    if TRANSACTION_MARKERS.iter().any(|m| line.starts_with(m)) {
        return None;
    }

    let code = match line.find("--") {
        Some(i) => &line[..i],
        None => line,
    };
    let out = format!("{code} ")
        .replace("IS NULL;", "IS NULL## END;")
        .trim_start_matches([' ', '\t'])
        .replace('\n', "")
        .replace(';', "\n")
        .replace("##", ";");
    Some(out)
}

/// Reformat a whole SQL script.
pub fn reformat_sql(sql: &str) -> String {
    sql.lines().filter_map(reformat_line).collect()
}

/// Split a SQL script into chunk payloads.
///
/// A chunk is closed as soon as its size exceeds `chunk_size` and the next
/// one is opened right away, so no chunk is larger than `chunk_size` plus one
/// reformatted line and the last chunk may be empty. A `chunk_size` of 0
/// yields a single chunk.
pub fn split_chunks(sql: &str, chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in sql.lines().filter_map(reformat_line) {
        current.push_str(&line);
        if chunk_size > 0 && current.len() > chunk_size {
            chunks.push(std::mem::take(&mut current));
        }
    }
    chunks.push(current);

    chunks
}

/// Path of the n-th (1-based) chunk resource.
pub fn chunk_path(dir: &Path, n: usize) -> PathBuf {
    dir.join(format!("{CHUNK_PREFIX}_{n}.xml"))
}

/// Write the SQL script as chunk resources in `dir`.
///
/// Returns the number of chunks written.
pub fn make_chunks(sql: &str, chunk_size: usize, dir: &Path) -> Result<usize, PackageError> {
    let chunks = split_chunks(sql, chunk_size);
    for (payload, n) in chunks.iter().zip(1..) {
        let path = chunk_path(dir, n);
        info!(chunk = n, path = %path.display(), bytes = payload.len(), "new chunk file");
        std::fs::write(&path, chunk_resource(payload)).map_err(PackageError::io(&path))?;
    }
    Ok(chunks.len())
}
