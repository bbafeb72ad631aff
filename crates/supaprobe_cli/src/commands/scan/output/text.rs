//! Text output formatting for scan results.

use std::io::Write;
use std::time::Duration;

use console::style;
use supaprobe_core::prelude::*;

use crate::ui::{
    build_severity_summary, colors, format_duration, indicators, pluralise_word, severity_indicator, severity_style,
    status_badge, truncate_with_ellipsis,
};

const EVIDENCE_MAX_CHARS: usize = 160;
const SUMMARY_MAX_CHARS: usize = 100;
const ID_WIDTH: usize = 34;

/// Renders scan results as styled, human-readable text to the given writer.
///
/// Breaches are always shown in full. Attacks that errored are listed
/// briefly, and `verbose > 0` adds a row for every secure attack.
pub fn write(report: &ScanReport, writer: &mut dyn Write, strip_colors: bool, verbose: u8) -> anyhow::Result<()> {
    for entry in report.breaches() {
        write_breach(entry, writer, strip_colors)?;
    }

    let errors: Vec<&ReportEntry> = report
        .results
        .iter()
        .filter(|e| e.result.status == AttackStatus::Error)
        .collect();
    if !errors.is_empty() {
        write_rows(&errors, writer, strip_colors)?;
    }

    if verbose > 0 {
        let secure: Vec<&ReportEntry> = report
            .results
            .iter()
            .filter(|e| e.result.status == AttackStatus::Secure)
            .collect();
        if !secure.is_empty() {
            write_rows(&secure, writer, strip_colors)?;
        }
    }

    write_summary(report, writer, strip_colors)
}

fn write_breach(entry: &ReportEntry, writer: &mut dyn Write, strip_colors: bool) -> anyhow::Result<()> {
    write_line(
        writer,
        format_args!(
            "{} {} {} {}",
            severity_indicator(entry.severity),
            style(&entry.name).bold(),
            colors::muted().apply_to("·"),
            severity_style(entry.severity).apply_to(entry.severity.as_str()),
        ),
        strip_colors,
    )?;

    write_line(
        writer,
        format_args!("  {}", colors::accent().apply_to(&entry.result.attack_id)),
        strip_colors,
    )?;

    writeln!(writer)?;

    write_line(
        writer,
        format_args!("  {}", colors::secondary().apply_to(&entry.result.summary)),
        strip_colors,
    )?;

    if let Some(evidence) = &entry.result.evidence {
        write_line(
            writer,
            format_args!(
                "  {}",
                colors::muted().apply_to(truncate_with_ellipsis(&evidence.to_string(), EVIDENCE_MAX_CHARS))
            ),
            strip_colors,
        )?;
    }

    writeln!(writer)?;
    write_line(
        writer,
        format_args!(
            "  {} {}",
            colors::info().apply_to(indicators::INFO),
            colors::secondary().apply_to(entry.category.remediation())
        ),
        strip_colors,
    )?;

    writeln!(writer)?;
    Ok(())
}

fn write_rows(entries: &[&ReportEntry], writer: &mut dyn Write, strip_colors: bool) -> anyhow::Result<()> {
    for entry in entries {
        let (icon, label) = status_badge(entry.result.status);
        write_line(
            writer,
            format_args!(
                "{} {:<9} {:<ID_WIDTH$} {}",
                icon,
                label,
                colors::accent().apply_to(&entry.result.attack_id),
                colors::muted().apply_to(truncate_with_ellipsis(&entry.result.summary, SUMMARY_MAX_CHARS))
            ),
            strip_colors,
        )?;
    }

    writeln!(writer)?;
    Ok(())
}

fn write_summary(report: &ScanReport, writer: &mut dyn Write, strip_colors: bool) -> anyhow::Result<()> {
    let total = report.summary.total;
    let attacks = format!("{total} {}", pluralise_word(total, "attack", "attacks"));
    let time = format_duration(Duration::from_millis(report.duration_ms));

    let headline = if report.has_breaches() {
        let breaches: Vec<&ReportEntry> = report.breaches().collect();
        format!(
            "{} {} {} {}",
            colors::error().apply_to(indicators::ERROR),
            colors::primary().apply_to(format!(
                "{} {}",
                breaches.len(),
                pluralise_word(breaches.len(), "breach", "breaches")
            )),
            colors::muted().apply_to("·"),
            build_severity_summary(&breaches, |e| e.severity)
        )
    } else {
        format!(
            "{} {}",
            colors::success().apply_to(indicators::SUCCESS),
            colors::primary().apply_to("No breaches")
        )
    };

    let tail = match report.summary.errors {
        0 => format!("{attacks} ({time})"),
        errors => format!("{attacks} ({time}) · {errors} could not complete"),
    };

    write_line(
        writer,
        format_args!(
            "{} {} {}",
            headline,
            colors::muted().apply_to("·"),
            colors::muted().apply_to(tail)
        ),
        strip_colors,
    )
}

fn write_line(writer: &mut dyn Write, args: std::fmt::Arguments<'_>, strip_colors: bool) -> anyhow::Result<()> {
    if strip_colors {
        let s = args.to_string();
        let stripped = console::strip_ansi_codes(&s);
        writeln!(writer, "{stripped}")?;
    } else {
        writeln!(writer, "{args}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use supaprobe_attacks::{AttackError, Verdict};

    use super::*;

    fn entry(id: &str, verdict: Result<Verdict, AttackError>) -> ReportEntry {
        let registry = AttackRegistry::builtin();
        let meta = *registry.get(id).unwrap().meta();
        let result = match verdict {
            Ok(v) => AttackResult::from_verdict(id, v, Utc::now(), Duration::from_millis(3)),
            Err(e) => AttackResult::from_error(id, &e, Utc::now(), Duration::from_millis(3)),
        };
        ReportEntry::new(&meta, result)
    }

    fn render(report: &ScanReport, verbose: u8) -> String {
        let mut out = Vec::new();
        write(report, &mut out, true, verbose).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn report(entries: Vec<ReportEntry>) -> ScanReport {
        let now = Utc::now();
        ScanReport::new("https://abc.supabase.co/", now, now, entries)
    }

    #[test]
    fn clean_report_says_no_breaches() {
        let text = render(&report(vec![entry("rls/users-read", Ok(Verdict::secure("no rows")))]), 0);
        assert!(text.contains("No breaches"));
        assert!(text.contains("1 attack"));
        assert!(!text.contains("rls/users-read"));
    }

    #[test]
    fn breach_shows_id_summary_evidence_and_remediation() {
        let verdict = Verdict::breached("5 rows readable").with_evidence(serde_json::json!({"status": 200}));
        let text = render(&report(vec![entry("rls/users-read", Ok(verdict))]), 0);

        assert!(text.contains("rls/users-read"));
        assert!(text.contains("5 rows readable"));
        assert!(text.contains("\"status\":200"));
        assert!(text.contains(Category::Rls.remediation()));
        assert!(text.contains("1 breach"));
        assert!(text.contains("1 critical"));
    }

    #[test]
    fn errors_are_listed_and_counted() {
        let text = render(&report(vec![entry("auth/alg-none", Err(AttackError::Cancelled))]), 0);
        assert!(text.contains("error"));
        assert!(text.contains("auth/alg-none"));
        assert!(text.contains("1 could not complete"));
    }

    #[test]
    fn verbose_lists_secure_attacks() {
        let rendered = report(vec![entry("vault/secrets-table", Ok(Verdict::secure("401")))]);
        assert!(!render(&rendered, 0).contains("vault/secrets-table"));
        assert!(render(&rendered, 1).contains("vault/secrets-table"));
    }
}
