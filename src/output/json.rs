//! JSON report output
//!
//! Writes the complete [`RunReport`] (run header, aggregates, per-worker detail
//! and failed worker ids) as pretty-printed JSON.

use crate::stats::RunReport;
use crate::Result;
use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serialize a report to a JSON string
pub fn to_json_string(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize run report")
}

/// Write a report to `path`, replacing any existing file
pub fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create JSON output file {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, report)
        .with_context(|| format!("Failed to write JSON report to {}", path.display()))?;
    writeln!(writer)?;
    writer.flush()?;

    Ok(())
}
