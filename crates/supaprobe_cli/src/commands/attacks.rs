//! Attacks command - lists the built-in attack vectors.

use std::collections::BTreeMap;

use console::style;
use supaprobe_core::prelude::*;

use crate::ui::{colors, indicators, print_command_header, severity_indicator, severity_style, truncate_with_ellipsis};

const NAME_TRUNCATE_WIDTH: usize = 45;
const DESCRIPTION_WIDTH: usize = 60;

/// Lists built-in attacks, optionally filtered by category or severity.
pub fn run(category_filter: Option<&str>, severity_filter: Option<&str>, verbose: bool) -> super::Result {
    print_command_header("attacks");

    let registry = AttackRegistry::builtin();
    let category = category_filter.map(str::parse::<Category>).transpose()?;
    let severity = severity_filter.map(str::parse::<Severity>).transpose()?;
    let attacks = filter_attacks(registry.attacks(), category, severity);

    if attacks.is_empty() {
        print_no_matches(category_filter, severity_filter);
        return Ok(());
    }

    print_count(attacks.len());

    if verbose {
        print_verbose(&attacks);
    } else {
        print_table(&attacks);
    }

    Ok(())
}

fn filter_attacks(
    attacks: &[&'static dyn Attack],
    category: Option<Category>,
    severity: Option<Severity>,
) -> Vec<&'static AttackMeta> {
    attacks
        .iter()
        .map(|a| a.meta())
        .filter(|m| category.is_none_or(|c| m.category == c) && severity.is_none_or(|s| m.severity == s))
        .collect()
}

fn print_count(count: usize) {
    println!("{}", colors::muted().apply_to(format!("{count} attacks")));
}

fn print_no_matches(category: Option<&str>, severity: Option<&str>) {
    let mut filters = Vec::new();
    if let Some(c) = category {
        filters.push(format!("--category {c}"));
    }
    if let Some(s) = severity {
        filters.push(format!("--severity {s}"));
    }

    println!(
        "{} {} {}",
        colors::muted().apply_to("○"),
        colors::secondary().apply_to("no attacks match"),
        colors::emphasis().apply_to(filters.join(" "))
    );
}

fn print_table(attacks: &[&AttackMeta]) {
    let grouped = group_by_severity_and_category(attacks);

    for (severity, categories) in grouped.iter().rev() {
        print_severity_section(*severity, categories);
    }
}

type Grouped<'a> = BTreeMap<Severity, BTreeMap<Category, Vec<&'a AttackMeta>>>;

fn group_by_severity_and_category<'a>(attacks: &[&'a AttackMeta]) -> Grouped<'a> {
    let mut result: Grouped<'a> = BTreeMap::new();

    for meta in attacks {
        result
            .entry(meta.severity)
            .or_default()
            .entry(meta.category)
            .or_default()
            .push(meta);
    }

    result
}

fn print_severity_section(severity: Severity, categories: &BTreeMap<Category, Vec<&AttackMeta>>) {
    let count: usize = categories.values().map(Vec::len).sum();

    println!();
    println!(
        "{} {}",
        severity_style(severity).apply_to(severity.as_str()),
        colors::muted().apply_to(format!("({count})"))
    );

    for (category, attacks) in categories {
        println!();
        println!("{}", style(category.name()).bold());

        for meta in attacks {
            print_attack_row(meta);
        }
    }
}

fn print_attack_row(meta: &AttackMeta) {
    let privileged = if meta.requires_service_key {
        format!(" {}", colors::muted().apply_to("(service key)"))
    } else {
        String::new()
    };

    println!(
        "  {}  {}{}",
        colors::accent().apply_to(format!("{:<32}", meta.id)),
        colors::secondary().apply_to(truncate_with_ellipsis(meta.name, NAME_TRUNCATE_WIDTH)),
        privileged
    );
}

fn print_verbose(attacks: &[&AttackMeta]) {
    for meta in attacks {
        print_attack_detail(meta);
    }
}

fn print_attack_detail(meta: &AttackMeta) {
    println!();
    println!(
        "{} {} {} {} {} {}",
        severity_indicator(meta.severity),
        style(meta.id).bold(),
        colors::muted().apply_to("·"),
        severity_style(meta.severity).apply_to(meta.severity.as_str()),
        colors::muted().apply_to("·"),
        colors::muted().apply_to(meta.category.as_str())
    );

    println!("  {}", colors::primary().apply_to(meta.name));
    for line in wrap_text(meta.description, DESCRIPTION_WIDTH) {
        println!("  {}", colors::secondary().apply_to(&line));
    }

    if !meta.tags.is_empty() {
        println!("  {}", colors::muted().apply_to(format!("tags {}", meta.tags.join(" "))));
    }

    println!(
        "  {} {}",
        colors::info().apply_to(indicators::INFO),
        colors::secondary().apply_to(meta.category.remediation())
    );
}

fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_by_category_and_severity() {
        let registry = AttackRegistry::builtin();
        let metas = filter_attacks(registry.attacks(), Some(Category::Auth), Some(Severity::Critical));
        assert!(!metas.is_empty());
        assert!(
            metas
                .iter()
                .all(|m| m.category == Category::Auth && m.severity == Severity::Critical)
        );
    }

    #[test]
    fn grouping_keeps_every_attack() {
        let registry = AttackRegistry::builtin();
        let metas = filter_attacks(registry.attacks(), None, None);
        let grouped = group_by_severity_and_category(&metas);
        let total: usize = grouped.values().flat_map(BTreeMap::values).map(Vec::len).sum();
        assert_eq!(total, registry.len());
    }

    #[test]
    fn wrap_text_respects_width() {
        let lines = wrap_text("one two three four five six", 9);
        assert!(lines.iter().all(|l| l.len() <= 9));
        assert_eq!(lines.join(" "), "one two three four five six");
    }
}
