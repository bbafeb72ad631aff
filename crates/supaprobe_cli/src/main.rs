//! # Commands
//!
//! - `supaprobe scan` - Run attacks against a Supabase project
//! - `supaprobe attacks` - List the built-in attack vectors
//! - `supaprobe benchmark` - Run scored scenarios and write a benchmark report
//! - `supaprobe init` - Create configuration file
//! - `supaprobe completions` - Print shell completion scripts

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod commands;
mod target;
mod ui;

use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use console::style;
use supaprobe_core::prelude::*;

use crate::ui::colors;

const REPO_URL: &str = "https://github.com/supaprobe/supaprobe";

#[derive(Debug, Parser)]
#[command(
    name = "supaprobe",
    version,
    styles = ui::clap_styles(),
    arg_required_else_help = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(visible_alias = "s")]
    Scan(ScanArgs),

    #[command(visible_alias = "a")]
    Attacks(AttacksArgs),

    #[command(visible_alias = "b")]
    Benchmark(BenchmarkArgs),

    Init(InitArgs),

    Completions(CompletionsArgs),
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable terminal output.
    #[default]
    Text,
    /// The full JSON report.
    Json,
}

/// Target and credentials shared by `scan` and `benchmark`.
#[derive(Debug, Clone, clap::Args)]
pub struct TargetArgs {
    /// Base URL of the Supabase project.
    #[arg(short, long, env = "SUPABASE_URL", value_name = "URL")]
    pub url: Option<String>,

    /// Anonymous (publishable) API key.
    #[arg(long, env = "SUPABASE_ANON_KEY", value_name = "KEY", hide_env_values = true)]
    pub anon_key: Option<String>,

    /// Service-role key, enabling privileged comparison attacks.
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", value_name = "KEY", hide_env_values = true)]
    pub service_key: Option<String>,

    /// Path to `.supaprobe.toml` configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Per-attack time budget in seconds.
    #[arg(long, value_name = "SECS")]
    pub attack_timeout: Option<u64>,

    /// Number of attacks to run at once.
    #[arg(long)]
    pub concurrency: Option<usize>,
}

/// Arguments for the `supaprobe scan` command.
#[derive(Debug, Parser)]
pub struct ScanArgs {
    #[command(flatten)]
    #[allow(missing_docs, reason = "clap uses doc comments as help text")]
    pub target: TargetArgs,

    /// Only run attacks in this category (repeatable).
    #[arg(long = "category", value_name = "CATEGORY")]
    pub categories: Vec<Category>,

    /// Run this attack id (repeatable).
    #[arg(long = "attack", value_name = "ID")]
    pub attacks: Vec<String>,

    /// Only run attacks carrying this tag (repeatable).
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Minimum severity of attacks to run.
    #[arg(short, long)]
    pub severity: Option<Severity>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write the JSON report to this path.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Increase output verbosity (repeat for more detail).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Always exit with code 0, even when attacks succeed.
    #[arg(long)]
    pub exit_zero: bool,
}

/// Arguments for the `supaprobe attacks` command.
#[derive(Debug, Parser)]
pub struct AttacksArgs {
    /// Filter attacks by category.
    #[arg(short, long)]
    pub category: Option<String>,

    /// Filter attacks by severity level.
    #[arg(short, long)]
    pub severity: Option<String>,

    /// Show attack details including description and tags.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Arguments for the `supaprobe benchmark` command.
#[derive(Debug, Parser)]
pub struct BenchmarkArgs {
    #[command(flatten)]
    #[allow(missing_docs, reason = "clap uses doc comments as help text")]
    pub target: TargetArgs,

    /// Run only this scenario (repeatable).
    #[arg(long = "scenario", value_name = "ID")]
    pub scenarios: Vec<String>,

    /// List scenarios and exit.
    #[arg(short, long)]
    pub list: bool,

    /// Where to write the benchmark report.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Always exit with code 0, even when attacks succeed.
    #[arg(long)]
    pub exit_zero: bool,
}

/// Arguments for the `supaprobe init` command.
#[derive(Debug, Parser)]
pub struct InitArgs {
    /// Skip confirmation prompts.
    #[arg(short, long)]
    pub yes: bool,

    /// Generate a minimal configuration file.
    #[arg(short, long)]
    pub minimal: bool,

    /// Write the config file to a custom path.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `supaprobe completions` command.
#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

fn main() {
    #[cfg(feature = "tracing")]
    {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    }

    let cli = parse_cli();

    if let Err(e) = run(cli.command) {
        ui::print_error(&format!("{e:#}"));
        std::process::exit(ui::exit::ERROR);
    }
}

fn build_cli() -> clap::Command {
    Cli::command().about(build_about()).after_help(build_after_help())
}

fn parse_cli() -> Cli {
    let matches = build_cli().get_matches();

    #[expect(clippy::expect_used, reason = "clap already validated args; this cannot fail")]
    Cli::from_arg_matches(&matches).expect("failed to parse arguments")
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Scan(args) => commands::scan::run(&args),
        Command::Attacks(args) => {
            commands::attacks::run(args.category.as_deref(), args.severity.as_deref(), args.verbose)
        }
        Command::Benchmark(args) => commands::benchmark::run(&args),
        Command::Init(args) => commands::init::run(args.yes, args.minimal, args.output),
        Command::Completions(args) => {
            commands::completions::run(args.shell, &mut build_cli());
            Ok(())
        }
    }
}

fn build_about() -> String {
    format!(
        r"
  {} probes a Supabase project for exploitable misconfigurations.

  Runs attacks against REST, Auth, Storage, Realtime, Functions and
  GraphQL with only the anon key, and reports what got through.",
        colors::accent().apply_to("supaprobe").bold()
    )
}

fn build_after_help() -> String {
    format!(
        r"
  {}
    supaprobe scan --url https://xyz.supabase.co --anon-key eyJ...
    supaprobe scan --category rls --category storage
    supaprobe scan -f json -o report.json      Output as JSON
    supaprobe attacks -s critical              List critical attacks
    supaprobe benchmark                        Score every scenario
    supaprobe init                             Create config file

  Only scan projects you own or are authorised to test.

  Learn more: {}",
        style("Examples:").bold(),
        colors::accent().apply_to(REPO_URL).underlined()
    )
}
