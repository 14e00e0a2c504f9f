// src/time.rs

/// Formats seconds as `mm:ss.t` (tenths truncated), the transport readout.
///
/// Negative and non-finite input reads as zero; minutes keep growing past 99.
pub fn format_time(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let tenths_total = (seconds * 10.0 + 1e-9).floor() as u64;
    let minutes = tenths_total / 600;
    let secs = (tenths_total / 10) % 60;
    let tenths = tenths_total % 10;
    format!("{minutes:02}:{secs:02}.{tenths}")
}
