//! Terminal pipeline stage appended to every variant command.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// How a tool's raw output is reduced before reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalStage {
    /// Count lines, words and bytes with `wc`.
    #[default]
    Summarize,
    /// Sort the result set into `<tool>.txt` in the corpus directory.
    Capture,
}

impl TerminalStage {
    /// Shell text of the stage for the given tool.
    pub fn stage(&self, tool: &str) -> String {
        match self {
            Self::Summarize => "wc".to_string(),
            Self::Capture => format!("sort > {}", Self::capture_file(tool).display()),
        }
    }

    /// Final command: the base command piped into this stage.
    pub fn final_command(&self, base: &str, tool: &str) -> String {
        format!("{} | {}", base, self.stage(tool))
    }

    /// Capture file for a tool, relative to the corpus directory.
    pub fn capture_file(tool: &str) -> PathBuf {
        PathBuf::from(format!("{tool}.txt"))
    }

    /// Name accepted by [`FromStr`] and settings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::Capture => "capture",
        }
    }
}

impl fmt::Display for TerminalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TerminalStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "summarize" | "count" => Ok(Self::Summarize),
            "capture" | "sort" => Ok(Self::Capture),
            other => Err(format!(
                "unknown terminal stage `{other}` (expected summarize or capture)"
            )),
        }
    }
}
