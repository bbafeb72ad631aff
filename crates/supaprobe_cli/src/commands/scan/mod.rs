//! Scan command - runs attacks against a Supabase project.

mod context;
mod output;

use std::path::Path;

use anyhow::Context as _;
use supaprobe_core::prelude::*;

use self::context::{VerboseInfo, print_verbose_context};
use self::output::write_output;
use crate::target::{RunContext, cancel_on_ctrl_c, runtime};
use crate::ui::{
    colors, create_attack_progress, exit, print_command_header, print_info, print_warning, status_badge,
};
use crate::{OutputFormat, ScanArgs};

/// Executes the `supaprobe scan` command.
pub fn run(args: &ScanArgs) -> super::Result {
    let show_progress = should_show_progress(args);

    if show_progress {
        print_command_header("scan");
    }

    let context = RunContext::load(&args.target)?;
    let selection = build_selection(args, &context.config);
    let registry = AttackRegistry::builtin();
    let attacks = selection.resolve(&registry)?;

    if show_progress && args.verbose > 0 {
        let info = VerboseInfo::new(&context, &selection, attacks.len());
        print_verbose_context(&info, args.verbose);
    }

    if attacks.is_empty() {
        print_info("no attacks match the selected filters");
        return Ok(());
    }

    let report = execute(&context.runner, &attacks, show_progress, args.verbose)?;

    if context.runner.session().context().cancel.is_cancelled() {
        print_warning("scan cancelled; unfinished attacks are reported as errors");
    }

    let report_path = args
        .report
        .clone()
        .or_else(|| context.config.report_path.as_ref().map(Into::into));
    if let Some(path) = &report_path {
        save_report(&report, path)?;
    }

    write_output(args, &report)?;

    if show_progress && let Some(path) = &report_path {
        println!();
        print_info(&format!("report written to {}", path.display()));
    }

    handle_exit_code(args, &report);

    Ok(())
}

const fn should_show_progress(args: &ScanArgs) -> bool {
    args.output.is_none() && matches!(args.format, OutputFormat::Text)
}

fn build_selection(args: &ScanArgs, config: &Config) -> Selection {
    let mut selection = config.selection();

    if !args.categories.is_empty() {
        selection.categories.clone_from(&args.categories);
    }
    selection.ids.clone_from(&args.attacks);
    selection.tags.clone_from(&args.tags);
    selection.min_severity = args.severity.or(config.severity);

    selection
}

fn execute(
    runner: &Runner,
    attacks: &[&'static dyn Attack],
    show_progress: bool,
    verbose: u8,
) -> anyhow::Result<ScanReport> {
    let rt = runtime()?;

    let report = rt.block_on(async {
        cancel_on_ctrl_c(runner);

        if !show_progress {
            return runner.scan(attacks, |_| {}).await;
        }

        let pb = create_attack_progress(attacks.len());
        let report = runner
            .scan(attacks, |entry| {
                pb.inc(1);
                if verbose >= 2 {
                    pb.println(progress_line(entry));
                }
            })
            .await;
        pb.finish_and_clear();
        report
    });

    Ok(report)
}

fn progress_line(entry: &ReportEntry) -> String {
    let (icon, label) = status_badge(entry.result.status);
    format!(
        "{icon} {:<9} {:<34} {}",
        label,
        colors::accent().apply_to(&entry.result.attack_id),
        colors::muted().apply_to(format!("{}ms", entry.result.duration.as_millis()))
    )
}

fn save_report(report: &ScanReport, path: &Path) -> anyhow::Result<()> {
    report
        .save(path)
        .with_context(|| format!("writing report to {}", path.display()))
}

fn handle_exit_code(args: &ScanArgs, report: &ScanReport) {
    if args.exit_zero {
        return;
    }

    if report.has_breaches() {
        std::process::exit(exit::BREACHED);
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        scan: ScanArgs,
    }

    fn args(argv: &[&str]) -> ScanArgs {
        let mut full = vec!["supaprobe"];
        full.extend_from_slice(argv);
        Harness::parse_from(full).scan
    }

    #[test]
    fn flags_override_config_filters() {
        let config = Config {
            severity: Some(Severity::Low),
            categories: vec![Category::Storage],
            disabled_attacks: vec!["storage/bucket-create".into()],
            ..Config::default()
        };
        let selection = build_selection(&args(&["--category", "auth", "-s", "high", "--tag", "jwt"]), &config);

        assert_eq!(selection.categories, vec![Category::Auth]);
        assert_eq!(selection.min_severity, Some(Severity::High));
        assert_eq!(selection.tags, vec!["jwt"]);
        assert_eq!(selection.disabled, vec!["storage/bucket-create"]);
    }

    #[test]
    fn config_filters_apply_without_flags() {
        let config = Config {
            severity: Some(Severity::Critical),
            categories: vec![Category::Vault],
            ..Config::default()
        };
        let selection = build_selection(&args(&[]), &config);

        assert_eq!(selection.categories, vec![Category::Vault]);
        assert_eq!(selection.min_severity, Some(Severity::Critical));
    }

    #[test]
    fn progress_is_hidden_for_json_and_files() {
        assert!(should_show_progress(&args(&[])));
        assert!(!should_show_progress(&args(&["-f", "json"])));
        assert!(!should_show_progress(&args(&["-o", "out.txt"])));
    }
}
