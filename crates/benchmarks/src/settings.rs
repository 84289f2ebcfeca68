//! Layered run settings.
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults (`$HOME/aa` corpus, `wc` summary, `sh`, no timeout)
//! 2. `search-bench.toml` in the invoking directory, if present
//! 3. `SEARCH_BENCH_*` environment variables
//!
//! CLI flags are applied on top by the caller before
//! [`Settings::into_run_config`] resolves the corpus directory.

use crate::error::{PerfError, Result};
use crate::terminal::TerminalStage;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default settings file looked up in the invoking directory.
pub const SETTINGS_FILE: &str = "search-bench.toml";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "SEARCH_BENCH";

/// Corpus directory under `$HOME` used when nothing else is configured.
pub const DEFAULT_CORPUS_SUBDIR: &str = "aa";

/// Raw settings as read from all sources.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Explicit corpus directory; wins over `corpus_subdir`.
    #[serde(default)]
    pub corpus_dir: Option<PathBuf>,
    /// Corpus directory relative to `$HOME`.
    #[serde(default = "default_corpus_subdir")]
    pub corpus_subdir: String,
    /// Scenario file replacing the built-in registry.
    #[serde(default)]
    pub scenarios: Option<PathBuf>,
    /// Terminal stage for every variant.
    #[serde(default)]
    pub terminal: TerminalStage,
    /// Shell used to run `<shell> -c <command>`.
    #[serde(default = "default_shell")]
    pub shell: String,
    /// Per-command limit in seconds; unset means wait forever.
    #[serde(default)]
    pub timeout_secs: Option<f64>,
}

fn default_corpus_subdir() -> String {
    DEFAULT_CORPUS_SUBDIR.to_string()
}

fn default_shell() -> String {
    "sh".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            corpus_dir: None,
            corpus_subdir: default_corpus_subdir(),
            scenarios: None,
            terminal: TerminalStage::default(),
            shell: default_shell(),
            timeout_secs: None,
        }
    }
}

impl Settings {
    /// Load settings from the default file (optional) and the environment.
    ///
    /// An explicit `file` must exist.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let builder = match file {
            Some(path) => Config::builder().add_source(File::from(path).required(true)),
            None => Config::builder()
                .add_source(File::new(SETTINGS_FILE, FileFormat::Toml).required(false)),
        };
        Self::build(builder.add_source(Self::environment()))
    }

    /// Parse settings from TOML text alone, without file or environment lookup.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Self::build(Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX).try_parsing(true)
    }

    fn build(builder: ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let settings: Self = builder.build()?.try_deserialize()?;
        settings.timeout()?;
        Ok(settings)
    }

    /// Validated timeout.
    pub fn timeout(&self) -> Result<Option<Duration>> {
        let Some(secs) = self.timeout_secs else {
            return Ok(None);
        };
        let invalid = |reason: String| {
            PerfError::Settings(config::ConfigError::Message(format!(
                "timeout_secs must be a positive number of seconds, got {secs}: {reason}"
            )))
        };
        if secs <= 0.0 {
            return Err(invalid("not positive".to_string()));
        }
        Duration::try_from_secs_f64(secs)
            .map(Some)
            .map_err(|e| invalid(e.to_string()))
    }

    /// Corpus directory: explicit `corpus_dir`, else `home/corpus_subdir`.
    pub fn corpus_path(&self, home: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = &self.corpus_dir {
            return Ok(dir.clone());
        }
        let home = home.ok_or(PerfError::HomeNotSet)?;
        Ok(home.join(&self.corpus_subdir))
    }

    /// Resolve against `$HOME` into a [`RunConfig`].
    pub fn into_run_config(self) -> Result<RunConfig> {
        let home = env::var_os("HOME").map(PathBuf::from);
        let corpus_dir = self.corpus_path(home.as_deref())?;
        let timeout = self.timeout()?;
        Ok(RunConfig {
            corpus_dir,
            terminal: self.terminal,
            shell: self.shell,
            timeout,
        })
    }
}

/// Resolved configuration consumed by the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Directory every command runs in.
    pub corpus_dir: PathBuf,
    /// Terminal stage appended to every variant.
    pub terminal: TerminalStage,
    /// Shell program.
    pub shell: String,
    /// Optional per-command limit.
    pub timeout: Option<Duration>,
}

impl RunConfig {
    /// Summarize mode, `sh`, no timeout.
    pub fn new(corpus_dir: impl Into<PathBuf>) -> Self {
        Self {
            corpus_dir: corpus_dir.into(),
            terminal: TerminalStage::default(),
            shell: default_shell(),
            timeout: None,
        }
    }

    /// Set the terminal stage.
    pub fn with_terminal(mut self, terminal: TerminalStage) -> Self {
        self.terminal = terminal;
        self
    }

    /// Set the shell program.
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Set the per-command timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
