//! Wall-clock timing helpers.

use std::time::{Duration, Instant};

/// Measure wall-clock time for a synchronous operation.
pub fn measure<F, R>(f: F) -> (R, Duration)
where
    F: FnOnce() -> R,
{
    let start = Instant::now();
    let result = f();
    (result, start.elapsed())
}

/// Format an elapsed duration as `H:MM:SS.ss`.
///
/// Hours are not padded; fractional seconds are truncated to hundredths.
pub fn format_elapsed(elapsed: Duration) -> String {
    let centis = elapsed.as_millis() / 10;
    let hours = centis / 360_000;
    let minutes = (centis / 6_000) % 60;
    let seconds = (centis / 100) % 60;
    let hundredths = centis % 100;
    format!("{hours}:{minutes:02}:{seconds:02}.{hundredths:02}")
}
