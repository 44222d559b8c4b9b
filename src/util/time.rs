//! Rate and throughput helpers for reports

use std::time::Duration;

/// Format a rate (operations per second)
///
/// # Examples
///
/// ```
/// use iopace::util::time::format_rate;
///
/// assert_eq!(format_rate(500.0), "500");
/// assert_eq!(format_rate(1500.0), "1.50K");
/// assert_eq!(format_rate(2_500_000.0), "2.50M");
/// ```
pub fn format_rate(rate: f64) -> String {
    if rate < 1_000.0 {
        format!("{:.0}", rate)
    } else if rate < 1_000_000.0 {
        format!("{:.2}K", rate / 1_000.0)
    } else {
        format!("{:.2}M", rate / 1_000_000.0)
    }
}

/// Operations per second over a duration (0 for an empty duration)
pub fn calculate_iops(operations: u64, duration: Duration) -> f64 {
    let seconds = duration.as_secs_f64();
    if seconds > 0.0 {
        operations as f64 / seconds
    } else {
        0.0
    }
}

/// Bytes per second over a duration (0 for an empty duration)
pub fn calculate_throughput(bytes: u64, duration: Duration) -> f64 {
    let seconds = duration.as_secs_f64();
    if seconds > 0.0 {
        bytes as f64 / seconds
    } else {
        0.0
    }
}

/// Format throughput in human-readable form (B/s, KB/s, MB/s, GB/s)
///
/// # Examples
///
/// ```
/// use iopace::util::time::format_throughput;
///
/// assert_eq!(format_throughput(500.0), "500.00 B/s");
/// assert_eq!(format_throughput(1536.0), "1.50 KB/s");
/// assert_eq!(format_throughput(2_621_440.0), "2.50 MB/s");
/// ```
pub fn format_throughput(bytes_per_sec: f64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    if bytes_per_sec >= GB {
        format!("{:.2} GB/s", bytes_per_sec / GB)
    } else if bytes_per_sec >= MB {
        format!("{:.2} MB/s", bytes_per_sec / MB)
    } else if bytes_per_sec >= KB {
        format!("{:.2} KB/s", bytes_per_sec / KB)
    } else {
        format!("{:.2} B/s", bytes_per_sec)
    }
}
