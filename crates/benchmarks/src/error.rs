//! Error types for the benchmark harness.
//!
//! [`PerfError`] covers everything that aborts a run: a missing corpus,
//! a broken scenario file, or a report stream that can no longer be
//! written. Failures of an individual tool command are never a
//! `PerfError`; they surface as [`ExecError`] and are folded into the
//! result [`Outcome`](crate::result::Outcome) so the run can continue.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Fatal errors that abort a benchmark run.
#[derive(Debug, Error)]
pub enum PerfError {
    /// `HOME` is not set and no explicit corpus directory was given
    #[error("HOME is not set; pass --corpus or set SEARCH_BENCH_CORPUS_DIR")]
    HomeNotSet,

    /// The benchmark corpus directory does not exist
    #[error("benchmark corpus directory {} does not exist", path.display())]
    CorpusMissing { path: PathBuf },

    /// Changing into the corpus directory failed
    #[error("cannot enter working directory {}: {source}", path.display())]
    Workdir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing to the report stream failed
    #[error("failed to write report: {0}")]
    Report(#[from] io::Error),

    /// Reading a scenario file failed
    #[error("cannot read scenario file {}: {source}", path.display())]
    ScenarioFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A scenario file is not valid TOML or has the wrong shape
    #[error("invalid scenario file: {0}")]
    ScenarioParse(#[from] toml::de::Error),

    /// The registry breaks a structural rule (duplicate names, bad tool ids)
    #[error("invalid scenario registry: {0}")]
    InvalidRegistry(String),

    /// Layered settings could not be loaded
    #[error("invalid settings: {0}")]
    Settings(#[from] config::ConfigError),
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, PerfError>;

/// Errors from executing a single variant command.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The shell could not be started
    #[error("cannot spawn `{shell}`: {source}")]
    Spawn {
        shell: String,
        #[source]
        source: io::Error,
    },

    /// Waiting on the child failed
    #[error("cannot wait for child: {0}")]
    Wait(#[source] io::Error),

    /// The command ran past the configured limit and was killed
    #[error("timed out after {}s", after.as_secs_f64())]
    TimedOut { after: Duration },
}
