//! Human-readable text output

use crate::stats::{RunReport, WorkerSummary};
use crate::util::time::{format_rate, format_throughput};

/// Fixed-width result line for one completed worker
///
/// Column widths are stable so lines from repeated runs can be compared with
/// `cut` or `awk` directly.
pub fn format_worker_line(report: &RunReport, worker: &WorkerSummary) -> String {
    format!(
        "{:<10} epoch width: {:<5}ms mean_duty: {:5.3} target IOs per epoch: {:<4} total IO count: {:<8}, dropped: {:<8}",
        report.label,
        report.epoch_width_us / 1000,
        worker.mean_duty,
        report.ios_per_epoch,
        worker.issued,
        worker.missed,
    )
}

/// Run summary block printed after the worker lines
pub fn format_summary(report: &RunReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Run: {} on {} ({}, {} workers, {} KiB reads) at {}\n",
        report.label,
        report.device,
        report.completion,
        report.workers.len() + report.failed_workers.len(),
        report.io_size / 1024,
        report.host,
    ));
    out.push_str(&format!("  Elapsed:    {:.3}s\n", report.elapsed_secs));
    out.push_str(&format!(
        "  Issued:     {} ({} IOPS)\n",
        report.total_issued,
        format_rate(report.achieved_iops)
    ));
    out.push_str(&format!("  Dropped:    {}\n", report.total_missed));
    out.push_str(&format!(
        "  Throughput: {}\n",
        format_throughput(report.throughput_bytes_per_sec)
    ));
    out.push_str(&format!(
        "  Epoch duty: mean {:.3}, p50 {}us, p99 {}us, max {}us\n",
        report.mean_duty, report.duty_p50_us, report.duty_p99_us, report.duty_max_us
    ));
    if !report.failed_workers.is_empty() {
        let ids: Vec<String> = report.failed_workers.iter().map(|id| id.to_string()).collect();
        out.push_str(&format!("  Failed workers: {}\n", ids.join(", ")));
    }
    out
}

/// Print one line per completed worker, then the summary block
pub fn print_results(report: &RunReport) {
    for worker in &report.workers {
        println!("{}", format_worker_line(report, worker));
    }
    println!();
    print!("{}", format_summary(report));
}
