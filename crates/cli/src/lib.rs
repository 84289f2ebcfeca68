//! CLI for search-bench.
//!
//! This crate provides the `search-bench` command: `perf` runs every
//! scenario against the benchmark corpus, `list` prints what would run.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use search_bench::{report, ScenarioRegistry, Settings, TerminalStage};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Benchmark command-line search tools against each other.
#[derive(Parser, Debug)]
#[command(name = "search-bench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every scenario and report timings.
    ///
    /// Each variant runs sequentially inside the corpus directory with a
    /// terminal stage appended: `| wc` by default, or `| sort > <tool>.txt`
    /// with --capture.
    Perf(PerfArgs),

    /// Print scenarios and their variants without running anything.
    List(SourceArgs),
}

/// Where settings and scenarios come from.
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// Settings file (default: ./search-bench.toml if present).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Scenario file replacing the built-in scenarios.
    #[arg(short, long, value_name = "FILE")]
    pub scenarios: Option<PathBuf>,
}

/// Options for `perf`.
#[derive(Args, Debug, Default)]
pub struct PerfArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Benchmark corpus directory (default: $HOME/aa).
    #[arg(short, long, value_name = "DIR")]
    pub corpus: Option<PathBuf>,

    /// Write sorted results to <tool>.txt instead of counting them.
    #[arg(long)]
    pub capture: bool,

    /// Kill any command running longer than this many seconds.
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Shell used to run each command.
    #[arg(long, value_name = "SHELL")]
    pub shell: Option<String>,

    /// Print a summary of all results after the run.
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub summary: Option<SummaryFormat>,
}

/// End-of-run summary format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    /// Markdown table.
    Markdown,
    /// Pretty-printed JSON.
    Json,
}

impl PerfArgs {
    /// Apply command-line overrides on top of loaded settings.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(corpus) = &self.corpus {
            settings.corpus_dir = Some(corpus.clone());
        }
        if let Some(scenarios) = &self.source.scenarios {
            settings.scenarios = Some(scenarios.clone());
        }
        if self.capture {
            settings.terminal = TerminalStage::Capture;
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_secs = Some(timeout);
        }
        if let Some(shell) = &self.shell {
            settings.shell = shell.clone();
        }
    }
}

fn load_settings(source: &SourceArgs) -> Result<Settings> {
    Settings::load(source.config.as_deref()).context("loading settings")
}

fn load_registry(settings: &Settings) -> Result<ScenarioRegistry> {
    let registry = match &settings.scenarios {
        Some(path) => ScenarioRegistry::load(path)
            .with_context(|| format!("loading scenarios from {}", path.display()))?,
        None => ScenarioRegistry::builtin(),
    };
    debug!(
        source = ?settings.scenarios,
        scenarios = registry.len(),
        "loaded scenario registry"
    );
    Ok(registry)
}

/// Install the stderr tracing subscriber.
///
/// `RUST_LOG` wins over the verbosity count when set.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Print the registry in run order.
pub fn write_registry<W: Write>(registry: &ScenarioRegistry, out: &mut W) -> io::Result<()> {
    for scenario in registry {
        writeln!(out, "Scenario: {}", scenario.name())?;
        for variant in scenario.variants() {
            writeln!(out, "  {}: {}", variant.tool, variant.command)?;
        }
    }
    Ok(())
}

/// Execute a parsed command, writing the report to `out`.
pub fn execute<W: Write>(command: Commands, out: &mut W) -> Result<()> {
    match command {
        Commands::Perf(args) => {
            let mut settings = load_settings(&args.source)?;
            args.apply(&mut settings);
            let registry = load_registry(&settings)?;
            let config = settings.into_run_config()?;

            let results = search_bench::run_benchmarks(config, &registry, out)?;

            match args.summary {
                Some(SummaryFormat::Markdown) => {
                    writeln!(out)?;
                    report::write_markdown(&results, out)?;
                }
                Some(SummaryFormat::Json) => {
                    writeln!(out)?;
                    report::write_json(&results, out)?;
                }
                None => {}
            }
            Ok(())
        }
        Commands::List(source) => {
            let mut settings = load_settings(&source)?;
            if let Some(scenarios) = source.scenarios {
                settings.scenarios = Some(scenarios);
            }
            let registry = load_registry(&settings)?;
            write_registry(&registry, out)?;
            Ok(())
        }
    }
}

/// Run the CLI with the process arguments.
///
/// # Returns
///
/// Returns `Ok(())` on success, even when individual tools failed, or an
/// error if the run could not start or the report could not be written.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(cli.command, &mut out)
}
