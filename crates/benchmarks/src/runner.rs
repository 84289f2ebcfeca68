//! Sequential benchmark runner.
//!
//! For every scenario in registry order, and every variant in declaration
//! order, the runner:
//!
//! 1. appends the configured terminal stage to the variant command,
//! 2. prints the exact command,
//! 3. runs it through `<shell> -c` and waits for it,
//! 4. prints one result line with elapsed time and the stage output.
//!
//! Variants never run concurrently. A failing, missing or timed-out tool
//! is reported inline and the run moves on; only a missing corpus or a
//! broken report stream aborts.

use crate::error::{ExecError, PerfError, Result};
use crate::result::{BenchmarkResult, Outcome, OutputSummary};
use crate::scenario::{ScenarioRegistry, Variant};
use crate::settings::RunConfig;
use crate::timing::measure;
use crate::workdir::WorkdirGuard;
use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Interval between exit checks while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long to wait for trailing output once the shell has exited.
const DRAIN_GRACE: Duration = Duration::from_millis(200);

/// Output of a command that ran to completion.
#[derive(Debug)]
struct Execution {
    exit_code: Option<i32>,
    stdout: String,
}

/// Runs every variant of every scenario and reports as it goes.
#[derive(Debug, Clone)]
pub struct Runner {
    config: RunConfig,
}

impl Runner {
    /// Create a runner for the given configuration.
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Run the whole registry inside the corpus directory.
    ///
    /// Report text goes to `out`; results are also returned in run order.
    ///
    /// # Errors
    ///
    /// Fails before anything runs if the corpus directory is missing, and
    /// mid-run only if `out` cannot be written. The previous working
    /// directory is restored in every case.
    pub fn run<W: Write>(
        &self,
        registry: &ScenarioRegistry,
        out: &mut W,
    ) -> Result<Vec<BenchmarkResult>> {
        let corpus = &self.config.corpus_dir;
        if !corpus.is_dir() {
            return Err(PerfError::CorpusMissing {
                path: corpus.clone(),
            });
        }

        info!(
            corpus = %corpus.display(),
            scenarios = registry.len(),
            variants = registry.variant_count(),
            terminal = %self.config.terminal,
            "starting benchmark run"
        );

        let _workdir = WorkdirGuard::enter(corpus)?;
        let mut results = Vec::with_capacity(registry.variant_count());

        for scenario in registry {
            writeln!(out, "\nScenario: {}", scenario.name())?;
            for variant in scenario.variants() {
                results.push(self.run_variant(scenario.name(), variant, out)?);
            }
        }

        let failed = results.iter().filter(|r| !r.outcome.is_success()).count();
        info!(results = results.len(), failed, "benchmark run finished");
        Ok(results)
    }

    /// Run a single variant in the current directory.
    pub fn run_variant<W: Write>(
        &self,
        scenario: &str,
        variant: &Variant,
        out: &mut W,
    ) -> Result<BenchmarkResult> {
        let terminal = self.config.terminal;
        let command = terminal.final_command(&variant.command, &variant.tool);

        writeln!(out, "  Running `{command}`")?;
        out.flush()?;

        debug!(scenario, tool = %variant.tool, %command, "executing variant");
        let (executed, elapsed) = measure(|| self.execute(&command));

        let (outcome, summary) = match executed {
            Ok(execution) => {
                if execution.exit_code != Some(0) {
                    warn!(
                        scenario,
                        tool = %variant.tool,
                        exit_code = ?execution.exit_code,
                        "variant exited unsuccessfully"
                    );
                }
                (
                    Outcome::Completed {
                        exit_code: execution.exit_code,
                    },
                    OutputSummary::from_output(terminal, &variant.tool, &execution.stdout),
                )
            }
            Err(ExecError::TimedOut { after }) => {
                warn!(scenario, tool = %variant.tool, limit = ?after, "variant timed out");
                (
                    Outcome::TimedOut {
                        limit_secs: after.as_secs_f64(),
                    },
                    OutputSummary::Raw {
                        text: String::new(),
                    },
                )
            }
            Err(e) => {
                warn!(scenario, tool = %variant.tool, error = %e, "variant failed to run");
                (
                    Outcome::Failed {
                        reason: e.to_string(),
                    },
                    OutputSummary::Raw {
                        text: String::new(),
                    },
                )
            }
        };

        let result = BenchmarkResult::new(
            scenario,
            &variant.tool,
            command,
            elapsed,
            outcome,
            summary,
        );
        writeln!(out, "{}", result.report_line())?;
        out.flush()?;
        Ok(result)
    }

    fn execute(&self, command: &str) -> std::result::Result<Execution, ExecError> {
        let started = Instant::now();
        let mut cmd = Command::new(&self.config.shell);
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        // An armed timeout kills the whole pipeline, so it gets its own group.
        #[cfg(unix)]
        if self.config.timeout.is_some() {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            shell: self.config.shell.clone(),
            source,
        })?;

        let stdout = spawn_reader(&mut child);

        let status = match self.config.timeout {
            None => child.wait().map_err(ExecError::Wait)?,
            Some(limit) => wait_with_timeout(&mut child, limit, started)?,
        };

        let drain = match self.config.timeout {
            None => None,
            Some(limit) => Some(limit.saturating_sub(started.elapsed()).max(DRAIN_GRACE)),
        };

        Ok(Execution {
            exit_code: status.code(),
            stdout: collect(stdout, drain),
        })
    }
}

/// Read the child's stdout on a helper thread so the pipe keeps draining
/// while we wait on the process.
fn spawn_reader(child: &mut Child) -> Option<Receiver<Vec<u8>>> {
    let mut pipe = child.stdout.take()?;
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buf) {
            debug!(error = %e, "stdout read ended early");
        }
        let _ = tx.send(buf);
    });
    Some(rx)
}

fn collect(rx: Option<Receiver<Vec<u8>>>, drain: Option<Duration>) -> String {
    let Some(rx) = rx else {
        return String::new();
    };
    let bytes = match drain {
        None => rx.recv().unwrap_or_default(),
        Some(limit) => rx.recv_timeout(limit).unwrap_or_else(|_| {
            debug!("stdout still open after shell exit, dropping output");
            Vec::new()
        }),
    };
    String::from_utf8_lossy(&bytes).into_owned()
}

fn wait_with_timeout(
    child: &mut Child,
    limit: Duration,
    started: Instant,
) -> std::result::Result<ExitStatus, ExecError> {
    loop {
        if let Some(status) = child.try_wait().map_err(ExecError::Wait)? {
            return Ok(status);
        }
        if started.elapsed() >= limit {
            kill_pipeline(child);
            child.wait().map_err(ExecError::Wait)?;
            return Err(ExecError::TimedOut { after: limit });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Kill the shell and every stage it forked.
///
/// The shell leads its own process group, so signalling `-pid` reaches
/// all pipeline members. Falls back to killing the shell alone.
#[cfg(unix)]
fn kill_pipeline(child: &mut Child) {
    let group = format!("-{}", child.id());
    let killed = Command::new("kill")
        .args(["-KILL", "--", &group])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match killed {
        Ok(status) if status.success() => debug!(%group, "killed timed-out process group"),
        other => {
            warn!(%group, result = ?other, "process group kill failed, killing shell only");
            if let Err(e) = child.kill() {
                debug!(error = %e, "kill after timeout failed");
            }
        }
    }
}

#[cfg(not(unix))]
fn kill_pipeline(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!(error = %e, "kill after timeout failed");
    }
}
