//! Benchmark result types.
//!
//! One [`BenchmarkResult`] is produced per (scenario, tool) pair. It is
//! rendered to the report stream as soon as the command finishes and is
//! otherwise only kept in memory for the end-of-run summary.

use crate::terminal::TerminalStage;
use crate::timing::format_elapsed;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// How a variant's command ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The shell exited; `None` when it was terminated by a signal.
    Completed { exit_code: Option<i32> },
    /// The command overran the configured limit and was killed.
    TimedOut { limit_secs: f64 },
    /// The shell could not be started or waited on.
    Failed { reason: String },
}

impl Outcome {
    /// Whether the pipeline ran to completion with exit status zero.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { exit_code: Some(0) })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed { exit_code: Some(0) } => f.write_str("ok"),
            Self::Completed { exit_code: Some(code) } => write!(f, "exit {code}"),
            Self::Completed { exit_code: None } => f.write_str("killed by signal"),
            Self::TimedOut { limit_secs } => write!(f, "timed out after {limit_secs}s"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// What the terminal stage left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputSummary {
    /// `wc` output: lines, words, bytes.
    Counts { lines: u64, words: u64, bytes: u64 },
    /// Sorted results were written to this file in the corpus directory.
    Captured { path: PathBuf },
    /// Anything else the pipeline printed, trimmed.
    Raw { text: String },
}

impl OutputSummary {
    /// Derive the summary from captured stdout.
    pub fn from_output(stage: TerminalStage, tool: &str, stdout: &str) -> Self {
        let text = stdout.trim();
        if stage == TerminalStage::Capture && text.is_empty() {
            return Self::Captured {
                path: TerminalStage::capture_file(tool),
            };
        }
        parse_wc(text).unwrap_or_else(|| Self::Raw {
            text: text.to_string(),
        })
    }
}

impl fmt::Display for OutputSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counts {
                lines,
                words,
                bytes,
            } => write!(f, "{lines} {words} {bytes}"),
            Self::Captured { path } => write!(f, "-> {}", path.display()),
            Self::Raw { text } => f.write_str(text),
        }
    }
}

/// Plain `wc` prints exactly three unsigned numbers.
fn parse_wc(text: &str) -> Option<OutputSummary> {
    let mut fields = text.split_whitespace().map(str::parse::<u64>);
    let lines = fields.next()?.ok()?;
    let words = fields.next()?.ok()?;
    let bytes = fields.next()?.ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(OutputSummary::Counts {
        lines,
        words,
        bytes,
    })
}

/// Result of one (scenario, tool) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Scenario heading.
    pub scenario: String,
    /// Tool identifier.
    pub tool: String,
    /// Final command handed to the shell.
    pub command: String,
    /// Wall-clock seconds from spawn to exit.
    pub elapsed_secs: f64,
    /// How the command ended.
    pub outcome: Outcome,
    /// Terminal stage output.
    pub summary: OutputSummary,
    /// When the command finished.
    pub timestamp: DateTime<Utc>,
}

impl BenchmarkResult {
    /// Create a new result stamped with the current time.
    pub fn new(
        scenario: impl Into<String>,
        tool: impl Into<String>,
        command: impl Into<String>,
        elapsed: Duration,
        outcome: Outcome,
        summary: OutputSummary,
    ) -> Self {
        Self {
            scenario: scenario.into(),
            tool: tool.into(),
            command: command.into(),
            elapsed_secs: elapsed.as_secs_f64(),
            outcome,
            summary,
            timestamp: Utc::now(),
        }
    }

    /// Elapsed time as a [`Duration`].
    pub fn elapsed(&self) -> Duration {
        Duration::from_secs_f64(self.elapsed_secs.max(0.0))
    }

    /// The single report line for this result.
    pub fn report_line(&self) -> String {
        let mut line = format!(
            "    Elapsed time: {}  Output: {}",
            format_elapsed(self.elapsed()),
            self.summary
        );
        if !self.outcome.is_success() {
            line.push_str(&format!(" [{}]", self.outcome));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(outcome: Outcome, summary: OutputSummary) -> BenchmarkResult {
        BenchmarkResult::new(
            "count all files",
            "rg",
            "rg --files | wc",
            Duration::from_millis(1250),
            outcome,
            summary,
        )
    }

    #[test]
    fn test_parse_wc_output() {
        let summary = OutputSummary::from_output(
            TerminalStage::Summarize,
            "rg",
            "      3       3      21\n",
        );
        assert_eq!(
            summary,
            OutputSummary::Counts {
                lines: 3,
                words: 3,
                bytes: 21
            }
        );
    }

    #[test]
    fn test_unparseable_output_is_raw() {
        let summary =
            OutputSummary::from_output(TerminalStage::Summarize, "rg", "sh: 1: nope: not found");
        assert_eq!(
            summary,
            OutputSummary::Raw {
                text: "sh: 1: nope: not found".to_string()
            }
        );
        assert!(parse_wc("1 2").is_none());
        assert!(parse_wc("1 2 3 4").is_none());
    }

    #[test]
    fn test_capture_mode_empty_stdout_points_at_file() {
        let summary = OutputSummary::from_output(TerminalStage::Capture, "ag", "");
        assert_eq!(summary.to_string(), "-> ag.txt");
    }

    #[test]
    fn test_report_line_success() {
        let r = result(
            Outcome::Completed { exit_code: Some(0) },
            OutputSummary::Counts {
                lines: 3,
                words: 3,
                bytes: 21,
            },
        );
        assert_eq!(r.report_line(), "    Elapsed time: 0:00:01.25  Output: 3 3 21");
    }

    #[test]
    fn test_report_line_marks_failures() {
        let r = result(
            Outcome::Completed {
                exit_code: Some(127),
            },
            OutputSummary::Raw {
                text: String::new(),
            },
        );
        assert!(r.report_line().ends_with("Output:  [exit 127]"));

        let r = result(
            Outcome::TimedOut { limit_secs: 2.0 },
            OutputSummary::Raw {
                text: String::new(),
            },
        );
        assert!(r.report_line().contains("[timed out after 2s]"));
    }

    #[test]
    fn test_result_serializes_outcome_tag() {
        let r = result(
            Outcome::Completed { exit_code: Some(0) },
            OutputSummary::Captured {
                path: PathBuf::from("rg.txt"),
            },
        );
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["outcome"]["status"], "completed");
        assert_eq!(json["summary"]["kind"], "captured");
        assert!(r.timestamp <= Utc::now());
    }
}
