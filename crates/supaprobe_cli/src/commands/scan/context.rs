//! Verbose run context shown before a scan starts.

use supaprobe_core::prelude::*;

use crate::target::RunContext;
use crate::ui::colors;

/// Data collected for verbose output display.
#[derive(Debug)]
pub struct VerboseInfo {
    /// Base URL being scanned.
    pub target: String,
    /// Active severity filter, if any.
    pub severity: Option<Severity>,
    /// Number of attacks selected.
    pub attack_count: usize,
    /// Whether a service-role key was supplied.
    pub has_service_key: bool,
    /// Category filter, empty for all.
    pub categories: Vec<Category>,
    /// Attack ids removed by configuration.
    pub disabled: Vec<String>,
}

impl VerboseInfo {
    /// Collects the verbose details of a prepared run.
    #[must_use]
    pub fn new(context: &RunContext, selection: &Selection, attack_count: usize) -> Self {
        let session = context.runner.session();
        Self {
            target: session.context().target_url.to_string(),
            severity: selection.min_severity,
            attack_count,
            has_service_key: session.has_service_key(),
            categories: selection.categories.clone(),
            disabled: selection.disabled.clone(),
        }
    }
}

/// Prints verbose scan context to the terminal.
pub fn print_verbose_context(info: &VerboseInfo, level: u8) {
    let severity_str = info.severity.map_or("all", Severity::as_str);
    let key_str = if info.has_service_key {
        "anon + service key"
    } else {
        "anon key"
    };

    let context_line = format!(
        "{} · {} · {} · {} attacks",
        info.target, severity_str, key_str, info.attack_count
    );

    println!("{}", colors::muted().apply_to(&context_line));

    if level >= 2 {
        print_verbose_details(info);
    }

    println!();
}

fn print_verbose_details(info: &VerboseInfo) {
    if !info.categories.is_empty() {
        let names: Vec<_> = info.categories.iter().map(|c| c.as_str()).collect();
        println!(
            "  {}",
            colors::muted().apply_to(format!("categories {}", names.join(" ")))
        );
    }

    if !info.disabled.is_empty() {
        println!(
            "  {}",
            colors::muted().apply_to(format!("disabled {}", info.disabled.join(" ")))
        );
    }
}
