//! Output formatting for scan results.

mod json;
mod text;

use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;

use anyhow::Context as _;
use supaprobe_core::prelude::*;

use crate::{OutputFormat, ScanArgs};

/// Writes scan output to a file or stdout in the requested format.
pub fn write_output(args: &ScanArgs, report: &ScanReport) -> anyhow::Result<()> {
    match &args.output {
        Some(path) => write_to_file(path, args.format, report),
        None => write_to_stdout(args.format, args.verbose, report),
    }
}

fn write_to_file(path: &Path, format: OutputFormat, report: &ScanReport) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create output file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        OutputFormat::Text => text::write(report, &mut writer, true, 1)?,
        OutputFormat::Json => json::write(report, &mut writer)?,
    }

    writer.flush().with_context(|| format!("failed to write output file: {}", path.display()))
}

fn write_to_stdout(format: OutputFormat, verbose: u8, report: &ScanReport) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();

    match format {
        OutputFormat::Text => text::write(report, &mut stdout, false, verbose),
        OutputFormat::Json => json::write(report, &mut stdout),
    }
}
