//! UI helpers for consistent output formatting.

use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use supaprobe_core::prelude::*;

/// Single-character Unicode glyphs used as status indicators.
pub mod indicators {
    /// Error indicator (✖).
    pub const ERROR: &str = "✖";
    /// Warning indicator (⚠).
    pub const WARNING: &str = "⚠";
    /// Informational indicator (ℹ).
    pub const INFO: &str = "ℹ";
    /// Success indicator (✓).
    pub const SUCCESS: &str = "✓";
    /// Addition indicator (+).
    pub const ADDED: &str = "+";
}

/// Semantic colour palette for terminal output.
pub mod colors {
    use console::Style;

    /// Red - errors and breached attacks.
    pub const fn error() -> Style {
        Style::new().red()
    }

    /// Yellow - warnings and attacks that could not complete.
    pub const fn warning() -> Style {
        Style::new().yellow()
    }

    /// Cyan - informational messages.
    pub const fn info() -> Style {
        Style::new().cyan()
    }

    /// Green - success messages.
    pub const fn success() -> Style {
        Style::new().green()
    }

    /// White bold - primary/headline text.
    pub const fn primary() -> Style {
        Style::new().white().bold()
    }

    /// Light grey - secondary descriptive text.
    pub const fn secondary() -> Style {
        Style::new().color256(252)
    }

    /// Dark grey - muted/contextual text.
    pub const fn muted() -> Style {
        Style::new().color256(243)
    }

    /// Cyan - accent highlights (attack IDs, commands).
    pub const fn accent() -> Style {
        Style::new().cyan()
    }

    /// White - emphasised inline text.
    pub const fn emphasis() -> Style {
        Style::new().white()
    }
}

/// Process exit codes.
pub mod exit {
    /// At least one attack breached the target.
    pub const BREACHED: i32 = 1;
    /// An unrecoverable error occurred.
    pub const ERROR: i32 = 2;
}

const SEVERITY_CRITICAL_COLOR: u8 = 196;
const SEVERITY_HIGH_COLOR: u8 = 208;
const SEVERITY_MEDIUM_COLOR: u8 = 220;
const SEVERITY_LOW_COLOR: u8 = 75;

/// Returns the terminal colour style for a given severity level.
pub const fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Critical => Style::new().color256(SEVERITY_CRITICAL_COLOR).bold(),
        Severity::High => Style::new().color256(SEVERITY_HIGH_COLOR),
        Severity::Medium => Style::new().color256(SEVERITY_MEDIUM_COLOR),
        Severity::Low => Style::new().color256(SEVERITY_LOW_COLOR),
    }
}

/// Returns a severity-coloured error indicator glyph.
#[must_use]
pub fn severity_indicator(severity: Severity) -> String {
    severity_style(severity).apply_to(indicators::ERROR).to_string()
}

/// Returns the glyph and label for an attack outcome.
#[must_use]
pub fn status_badge(status: AttackStatus) -> (String, String) {
    match status {
        AttackStatus::Breached => (
            colors::error().apply_to(indicators::ERROR).to_string(),
            colors::error().bold().apply_to("breached").to_string(),
        ),
        AttackStatus::Secure => (
            colors::success().apply_to(indicators::SUCCESS).to_string(),
            colors::success().apply_to("secure").to_string(),
        ),
        AttackStatus::Error => (
            colors::warning().apply_to(indicators::WARNING).to_string(),
            colors::warning().apply_to("error").to_string(),
        ),
    }
}

/// Prints a styled `supaprobe <command>` header with surrounding blank lines.
pub fn print_command_header(command: &str) {
    println!();
    println!(
        "{} {}",
        colors::accent().bold().apply_to("supaprobe"),
        colors::muted().apply_to(command)
    );
    println!();
}

/// Prints a command hint line (`command  description`).
pub fn print_hint(command: &str, description: &str) {
    const CMD_WIDTH: usize = 28;

    println!(
        "  {}  {}",
        colors::accent().apply_to(format!("{command:<CMD_WIDTH$}")),
        colors::muted().apply_to(description)
    );
}

/// Prints a red error message to stderr.
pub fn print_error(message: &str) {
    eprintln!(
        "{} {}",
        colors::error().apply_to(indicators::ERROR),
        colors::secondary().apply_to(message)
    );
}

/// Prints a yellow warning message to stderr.
pub fn print_warning(message: &str) {
    eprintln!(
        "{} {}",
        colors::warning().apply_to(indicators::WARNING),
        colors::secondary().apply_to(message)
    );
}

/// Prints a cyan informational message to stdout.
pub fn print_info(message: &str) {
    println!(
        "{} {}",
        colors::info().apply_to(indicators::INFO),
        colors::secondary().apply_to(message)
    );
}

/// Returns `singular` when `count` is 1, otherwise `plural`.
#[must_use]
pub const fn pluralise_word<'a>(count: usize, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 { singular } else { plural }
}

/// Truncates a string to `max_chars`, appending an ellipsis if shortened.
#[must_use]
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{truncated}…")
    }
}

const PROGRESS_TICK_MS: u64 = 100;

/// Creates a progress bar for a run of `total` attacks.
#[must_use]
pub fn create_attack_progress(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);

    #[expect(
        clippy::expect_used,
        reason = "static template string; failure is a programmer error"
    )]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.cyan/243} {percent:>3}% {pos}/{len} attacks ({elapsed} elapsed) {msg}")
            .expect("invalid progress template")
            .progress_chars("━━╸"),
    );

    pb.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_MS));
    pb
}

/// Builds a one-line severity breakdown string (e.g. "✖ 2 critical · ✖ 1 high").
#[must_use]
pub fn build_severity_summary<T, F>(items: &[T], get_severity: F) -> String
where
    F: Fn(&T) -> Severity,
{
    let mut counts = [0usize; 4];
    for item in items {
        counts[severity_slot(get_severity(item))] += 1;
    }

    Severity::ALL
        .iter()
        .rev()
        .filter(|&&severity| counts[severity_slot(severity)] > 0)
        .map(|&severity| format_count(counts[severity_slot(severity)], severity))
        .collect::<Vec<_>>()
        .join(" · ")
}

const fn severity_slot(severity: Severity) -> usize {
    match severity {
        Severity::Low => 0,
        Severity::Medium => 1,
        Severity::High => 2,
        Severity::Critical => 3,
    }
}

fn format_count(count: usize, severity: Severity) -> String {
    format!(
        "{} {} {}",
        severity_indicator(severity),
        colors::secondary().apply_to(count),
        colors::muted().apply_to(severity.as_str())
    )
}

/// Formats a tally as `"N breached · N secure · N errors"`, omitting zero errors.
#[must_use]
pub fn format_tally(tally: &Tally) -> String {
    let mut parts = vec![
        format!("{} breached", tally.breached),
        format!("{} secure", tally.secure),
    ];
    if tally.errors > 0 {
        parts.push(format!("{} {}", tally.errors, pluralise_word(tally.errors, "error", "errors")));
    }
    parts.join(" · ")
}

/// Returns the style used to display a benchmark score.
#[must_use]
pub fn score_style(score: f64) -> Style {
    if score >= 90.0 {
        colors::success().bold()
    } else if score >= 60.0 {
        colors::warning().bold()
    } else {
        colors::error().bold()
    }
}

const MICROSECOND_NS: u128 = 1_000;
const MILLISECOND_NS: u128 = 1_000_000;
const SECOND_NS: u128 = 1_000_000_000;

/// Formats a duration as a human-readable string with the most appropriate
/// unit (ns, µs, ms, or s).
#[expect(
    clippy::cast_precision_loss,
    reason = "nanosecond-to-float conversion is display-only; precision loss is acceptable"
)]
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();

    if nanos < MICROSECOND_NS {
        format!("{nanos}ns")
    } else if nanos < MILLISECOND_NS {
        format!("{:.1}µs", nanos as f64 / MICROSECOND_NS as f64)
    } else if nanos < SECOND_NS {
        format!("{:.1}ms", nanos as f64 / MILLISECOND_NS as f64)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}

/// Returns the shared clap colour theme used by all CLI subcommands.
#[must_use]
pub fn clap_styles() -> clap::builder::Styles {
    use clap::builder::styling::{AnsiColor, Effects, Style};

    clap::builder::Styles::styled()
        .header(
            Style::new()
                .fg_color(Some(AnsiColor::Cyan.into()))
                .effects(Effects::BOLD),
        )
        .usage(
            Style::new()
                .fg_color(Some(AnsiColor::Cyan.into()))
                .effects(Effects::BOLD),
        )
        .literal(Style::new().fg_color(Some(AnsiColor::Cyan.into())))
        .placeholder(Style::new().fg_color(Some(AnsiColor::BrightBlack.into())))
        .valid(Style::new().fg_color(Some(AnsiColor::Green.into())))
        .invalid(Style::new().fg_color(Some(AnsiColor::Red.into())))
        .error(
            Style::new()
                .fg_color(Some(AnsiColor::Red.into()))
                .effects(Effects::BOLD),
        )
}
