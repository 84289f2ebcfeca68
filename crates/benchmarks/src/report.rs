//! End-of-run summaries.
//!
//! The live report is written by the runner while commands execute. The
//! functions here render the collected results once more, as a markdown
//! table or as JSON, for pasting into notes or feeding to other tools.
//! Nothing here touches the filesystem.

use crate::result::BenchmarkResult;
use crate::timing::format_elapsed;
use std::io::{self, Write};

/// Write a markdown summary table of `results` in run order.
pub fn write_markdown<W: Write>(results: &[BenchmarkResult], out: &mut W) -> io::Result<()> {
    writeln!(out, "# Benchmark Summary")?;
    writeln!(out)?;
    writeln!(out, "| Scenario | Tool | Elapsed | Outcome | Output |")?;
    writeln!(out, "|----------|------|---------|---------|--------|")?;

    for result in results {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            escape_cell(&result.scenario),
            escape_cell(&result.tool),
            format_elapsed(result.elapsed()),
            escape_cell(&result.outcome.to_string()),
            escape_cell(&result.summary.to_string()),
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Total results: {}", results.len())?;
    Ok(())
}

/// Write `results` as pretty-printed JSON.
pub fn write_json<W: Write>(results: &[BenchmarkResult], out: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, results)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    writeln!(out)
}

/// Render the markdown summary into a string.
pub fn generate_markdown(results: &[BenchmarkResult]) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_markdown(results, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
