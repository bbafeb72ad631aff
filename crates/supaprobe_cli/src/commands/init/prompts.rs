//! Interactive prompts for init command.

use anyhow::Context as _;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, MultiSelect, Select};
use supaprobe_core::prelude::*;

use super::templates::{ConfigOptions, DEFAULT_SEVERITY, LOAD_ATTACKS};
use crate::ui::{colors, indicators};

/// Runs the interactive init wizard, prompting for the target, severity,
/// categories and load-generating attacks.
pub fn collect_interactive() -> anyhow::Result<ConfigOptions> {
    let target_url = prompt_target_url()?;
    let severity = prompt_severity()?;
    let categories = prompt_categories()?;
    let disabled_attacks = prompt_load_attacks();

    Ok(ConfigOptions {
        target_url,
        severity,
        categories,
        disabled_attacks,
    })
}

/// Prompts the user to confirm overwriting an existing configuration file.
#[must_use]
pub fn confirm_overwrite() -> bool {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Overwrite?")
        .default(false)
        .interact()
        .unwrap_or(false)
}

fn prompt_target_url() -> anyhow::Result<Option<String>> {
    let url: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Project URL (blank to pass --url later)")
        .allow_empty(true)
        .validate_with(|input: &String| -> Result<(), &str> {
            let input = input.trim();
            if input.is_empty() || input.starts_with("http://") || input.starts_with("https://") {
                Ok(())
            } else {
                Err("expected an http(s) URL")
            }
        })
        .interact_text()
        .context("project URL")?;

    let url = url.trim();
    Ok((!url.is_empty()).then(|| url.to_string()))
}

fn prompt_severity() -> anyhow::Result<Severity> {
    let labels: Vec<&str> = Severity::ALL.iter().map(|s| s.as_str()).collect();
    let default = Severity::ALL.iter().position(|&s| s == DEFAULT_SEVERITY).unwrap_or(0);

    let selected = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Minimum severity?")
        .items(&labels)
        .default(default)
        .interact()
        .context("severity selection")?;

    Ok(Severity::ALL[selected])
}

fn prompt_categories() -> anyhow::Result<Vec<Category>> {
    let labels: Vec<&str> = Category::ALL.iter().map(|c| c.name()).collect();

    let chosen = MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Categories (space to toggle, none for all)")
        .items(&labels)
        .interact()
        .context("category selection")?;

    if chosen.len() == Category::ALL.len() {
        return Ok(Vec::new());
    }

    Ok(chosen.into_iter().map(|idx| Category::ALL[idx]).collect())
}

fn prompt_load_attacks() -> Vec<&'static str> {
    println!(
        "{} {} {}",
        colors::info().apply_to(indicators::INFO),
        colors::secondary().apply_to("load attacks"),
        colors::muted().apply_to(LOAD_ATTACKS.join(" "))
    );

    let skip = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Skip attacks that send bursts of requests?")
        .default(false)
        .interact()
        .unwrap_or(false);

    if skip { LOAD_ATTACKS.to_vec() } else { Vec::new() }
}
