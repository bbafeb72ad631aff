//! Init command - creates `.supaprobe.toml` configuration file.

mod prompts;
/// Configuration file templates for `supaprobe init`.
pub mod templates;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use console::style;
use supaprobe_core::CONFIG_FILENAME;

use self::templates::ConfigOptions;
use crate::ui::{colors, format_duration, indicators, print_command_header, print_info};

/// Executes the `supaprobe init` command, creating a `.supaprobe.toml`
/// configuration file either interactively or with default settings.
pub fn run(non_interactive: bool, minimal: bool, output_path: Option<PathBuf>) -> super::Result {
    print_command_header("init");

    let output_path = output_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));

    if output_path.exists() && !handle_existing(&output_path, non_interactive) {
        return Ok(());
    }

    let options = if non_interactive {
        ConfigOptions::default()
    } else {
        prompts::collect_interactive()?
    };

    execute(&output_path, &options, minimal)
}

fn handle_existing(path: &Path, non_interactive: bool) -> bool {
    println!(
        "{} {} already exists",
        colors::warning().apply_to(indicators::WARNING),
        style(path.display()).bold()
    );

    if non_interactive {
        println!(
            "  {}",
            colors::secondary().apply_to("use interactive mode to overwrite")
        );
        println!();
        return false;
    }

    println!();

    if prompts::confirm_overwrite() {
        true
    } else {
        println!();
        false
    }
}

fn execute(output_path: &Path, options: &ConfigOptions, minimal: bool) -> anyhow::Result<()> {
    let start = Instant::now();

    let config_content = templates::build_config(options, minimal);
    templates::write_config(output_path, &config_content)?;

    print_results(output_path, start.elapsed(), options.target_url.is_some());

    Ok(())
}

fn print_results(config_path: &Path, elapsed: Duration, has_target: bool) {
    println!();
    println!(
        "{} {} {}",
        colors::success().apply_to(indicators::ADDED),
        style(config_path.display()).bold(),
        colors::muted().apply_to(format!("({})", format_duration(elapsed)))
    );

    println!();
    if has_target {
        print_info("Set SUPABASE_ANON_KEY, then run `supaprobe scan`");
    } else {
        print_info("Run `supaprobe scan --url <project-url> --anon-key <key>` to probe your project");
    }
}
