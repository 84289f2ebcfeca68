//! Comparative benchmark harness for command-line search tools.
//!
//! A [`ScenarioRegistry`] holds named scenarios, each expressing the same
//! query once per tool as an opaque shell command. The [`Runner`] executes
//! every variant sequentially inside the benchmark corpus directory, times
//! it, and prints one result line per (scenario, tool) pair.
//!
//! # Quick Start
//!
//! ```no_run
//! use search_bench::{run_benchmarks, RunConfig, ScenarioRegistry};
//!
//! let config = RunConfig::new("/home/dev/aa");
//! let registry = ScenarioRegistry::builtin();
//! let results = run_benchmarks(config, &registry, &mut std::io::stdout())?;
//!
//! for result in &results {
//!     println!("{}/{}: {:.3}s", result.scenario, result.tool, result.elapsed_secs);
//! }
//! # Ok::<(), search_bench::PerfError>(())
//! ```
//!
//! # Modules
//!
//! - [`scenario`] - Scenarios, variants and the ordered registry
//! - [`terminal`] - Terminal pipeline stage (`wc` or sort-to-file)
//! - [`runner`] - Sequential execution, timing and reporting
//! - [`result`] - Per-pair results
//! - [`report`] - Markdown and JSON summaries
//! - [`settings`] - Layered settings and the resolved [`RunConfig`]
//! - [`workdir`] - Scoped working-directory change

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod error;
pub mod report;
pub mod result;
pub mod runner;
pub mod scenario;
pub mod settings;
pub mod terminal;
pub mod timing;
pub mod workdir;

pub use error::{ExecError, PerfError, Result};
pub use result::{BenchmarkResult, Outcome, OutputSummary};
pub use runner::Runner;
pub use scenario::{Scenario, ScenarioRegistry, Variant};
pub use settings::{RunConfig, Settings};
pub use terminal::TerminalStage;

use std::io::Write;

/// Run every scenario in `registry` and report to `out`.
///
/// This is the canonical entrypoint for the harness.
///
/// # Errors
///
/// Returns [`PerfError::CorpusMissing`] before any command runs if the
/// corpus directory does not exist, or [`PerfError::Report`] if `out`
/// cannot be written. Individual tool failures are reported inline and
/// never returned as errors.
pub fn run_benchmarks<W: Write>(
    config: RunConfig,
    registry: &ScenarioRegistry,
    out: &mut W,
) -> Result<Vec<BenchmarkResult>> {
    Runner::new(config).run(registry, out)
}
