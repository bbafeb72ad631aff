//! JSON output formatter for scan results.

use std::io::Write;

use supaprobe_core::prelude::*;

/// Serialises the full scan report as pretty-printed JSON to the given writer.
pub fn write(report: &ScanReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(writer, "{}", report.to_json()?)?;
    Ok(())
}
