//! Benchmark command - runs scored scenarios and writes a benchmark report.

use std::path::PathBuf;

use anyhow::Context as _;
use console::style;
use supaprobe_core::prelude::*;
use supaprobe_core::{DEFAULT_BENCHMARK_REPORT, SCENARIOS, plan, run_benchmark, select_scenarios};

use crate::BenchmarkArgs;
use crate::target::{RunContext, cancel_on_ctrl_c, runtime};
use crate::ui::{
    colors, create_attack_progress, exit, format_duration, format_tally, print_command_header, print_hint, print_info,
    print_warning, score_style,
};

const NAME_WIDTH: usize = 26;

/// Executes the `supaprobe benchmark` command.
pub fn run(args: &BenchmarkArgs) -> super::Result {
    print_command_header("benchmark");

    if args.list {
        print_scenarios();
        return Ok(());
    }

    let context = RunContext::load(&args.target)?;
    let registry = AttackRegistry::builtin();
    let scenarios = select_scenarios(&args.scenarios)?;
    let plans = plan(&registry, &scenarios, &context.config.disabled_attacks)?;
    let total: usize = plans.iter().map(|p| p.attacks.len()).sum();

    let rt = runtime()?;
    let report = rt.block_on(async {
        cancel_on_ctrl_c(&context.runner);

        let pb = create_attack_progress(total);
        let report = run_benchmark(&context.runner, &plans, |scenario, _| {
            pb.set_message(scenario.id);
            pb.inc(1);
        })
        .await;
        pb.finish_and_clear();
        report
    });

    if context.runner.session().context().cancel.is_cancelled() {
        print_warning("benchmark cancelled; unfinished attacks are reported as errors");
    }

    print_results(&report);

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BENCHMARK_REPORT));
    report
        .save(&output)
        .with_context(|| format!("writing benchmark report to {}", output.display()))?;

    println!();
    print_info(&format!("report written to {}", output.display()));

    if report.has_breaches() && !args.exit_zero {
        std::process::exit(exit::BREACHED);
    }

    Ok(())
}

fn print_scenarios() {
    let registry = AttackRegistry::builtin();

    println!(
        "{}",
        colors::muted().apply_to(format!("{} scenarios", SCENARIOS.len()))
    );
    println!();

    for scenario in SCENARIOS {
        let count = scenario.resolve(&registry, &[]).map_or(0, |a| a.len());
        print_hint(
            scenario.id,
            &format!("{} ({count} attacks)", scenario.description),
        );
    }
}

fn print_results(report: &BenchmarkReport) {
    for scenario in &report.scenarios {
        println!(
            "  {} {}  {}",
            style(format!("{:<NAME_WIDTH$}", scenario.name)).bold(),
            score_style(scenario.score).apply_to(format!("{:>5.1}%", scenario.score)),
            colors::muted().apply_to(format_tally(&scenario.report.summary))
        );
    }

    let elapsed = (report.finished_at - report.started_at).to_std().unwrap_or_default();

    println!();
    println!(
        "{} {} {} {}",
        colors::primary().apply_to("score"),
        score_style(report.score).apply_to(format!("{:.1}%", report.score)),
        colors::muted().apply_to("·"),
        colors::muted().apply_to(format!(
            "{} ({})",
            format_tally(&report.summary),
            format_duration(elapsed)
        ))
    );
}
