//! External line compiler.
//!
//! Line definitions are authored as `*.in` files and turned into the
//! `*.txt` schedule format by a separate compiler, which prints the result
//! on stdout.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use tracing::{debug, info, warn};

use crate::assemble::NetworkRegistry;
use crate::checksum::SOURCE_EXTENSION;

/// Extension of line sources handed to the compiler.
pub const INPUT_EXTENSION: &str = "in";

/// Errors from running the line compiler.
#[derive(Debug, thiserror::Error)]
pub enum CompilerError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("can't run line compiler {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The compiler rejected a line definition
    #[error("line compiler failed on {input} ({status})")]
    Failed { input: PathBuf, status: ExitStatus },
}

impl CompilerError {
    /// Exit code to propagate, if the compiler reported one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CompilerError::Failed { status, .. } => status.code(),
            _ => None,
        }
    }
}

/// Number of lines compiled per network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    pub lines: Vec<(String, usize)>,
}

impl CompileReport {
    pub fn total(&self) -> usize {
        self.lines.iter().map(|(_, n)| n).sum()
    }
}

/// Runs the compiler over every network's line definitions.
#[derive(Debug, Clone)]
pub struct LineCompiler {
    program: PathBuf,
}

impl LineCompiler {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Compile `<lines_dir>/<network>/*.in` into `<raw_dir>/<network>/*.txt`.
    ///
    /// Networks without any definition are reported and skipped. The first
    /// failing compilation aborts the run.
    pub fn compile_all(
        &self,
        registry: &NetworkRegistry,
        lines_dir: &Path,
        raw_dir: &Path,
    ) -> Result<CompileReport, CompilerError> {
        let mut report = CompileReport::default();

        for (_, network) in registry.iter() {
            let inputs = find_inputs(&lines_dir.join(&network.path))?;
            if inputs.is_empty() {
                warn!(network = %network.name, "missing line definitions (*.{INPUT_EXTENSION})");
                report.lines.push((network.name.clone(), 0));
                continue;
            }
            info!(network = %network.name, lines = inputs.len(), "compiling lines");

            let dest = raw_dir.join(&network.path);
            fs::create_dir_all(&dest).map_err(|source| CompilerError::Io {
                path: dest.clone(),
                source,
            })?;
            for input in &inputs {
                self.compile(input, &dest)?;
            }
            report.lines.push((network.name.clone(), inputs.len()));
        }

        Ok(report)
    }

    /// Compile one line definition into `dest_dir`, returning the output path.
    pub fn compile(&self, input: &Path, dest_dir: &Path) -> Result<PathBuf, CompilerError> {
        let Some(stem) = input.file_stem() else {
            return Err(CompilerError::Io {
                path: input.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"),
            });
        };
        let output = dest_dir.join(format!("{}.{SOURCE_EXTENSION}", stem.to_string_lossy()));
        let out = File::create(&output).map_err(|source| CompilerError::Io {
            path: output.clone(),
            source,
        })?;

        debug!(input = %input.display(), output = %output.display(), "compiling line");
        let status = Command::new(&self.program)
            .arg(input)
            .stdout(Stdio::from(out))
            .status()
            .map_err(|source| CompilerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(CompilerError::Failed {
                input: input.to_path_buf(),
                status,
            });
        }
        Ok(output)
    }
}

/// Line definitions directly inside `dir`, sorted. A missing directory has none.
fn find_inputs(dir: &Path) -> Result<Vec<PathBuf>, CompilerError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(CompilerError::Io {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    let mut inputs = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| CompilerError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == INPUT_EXTENSION) {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}
