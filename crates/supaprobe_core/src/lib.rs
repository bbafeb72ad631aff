//! Scan orchestration for supaprobe.
//!
//! This crate turns the attack registry from `supaprobe_attacks` into runs:
//! it loads configuration, narrows the registry to a selection, executes the
//! attacks and aggregates what they found into JSON reports.
//!
//! # Main Types
//!
//! - [`Config`] - User configuration loaded from `.supaprobe.toml`
//! - [`Selection`] - Category, id, severity and tag filters over the registry
//! - [`Runner`] - Executes attacks in order, optionally several at a time
//! - [`ScanReport`] / [`BenchmarkReport`] - Aggregated results with tallies
//! - [`Scenario`] - A named group of attacks scored together
//!
//! # Error Handling
//!
//! This crate uses [`thiserror`] for structured, typed errors:
//!
//! - [`ConfigError`] - Configuration loading/parsing failures
//! - [`SelectionError`] - Unknown attack or scenario ids
//! - [`ReportError`] - Report serialisation or write failures
//! - [`RunError`] - Top-level enum combining the above, returned by [`Runner::from_config`]
//!
//! The CLI crate (`supaprobe_cli`) uses `anyhow` for error propagation.

/// Built-in benchmark scenarios and the benchmark driver.
pub mod benchmark;
/// User configuration loaded from `.supaprobe.toml`.
pub mod config;
/// Error types for selection, reporting and whole runs.
pub mod error;
/// Filesystem helpers for atomic writes.
pub mod fs_util;
/// Common re-exports for internal use.
pub mod prelude;
/// Tallies and the JSON report formats.
pub mod report;
/// The async attack runner.
pub mod runner;
/// Filters that narrow the registry to one run's attacks.
pub mod selection;

pub use benchmark::{SCENARIOS, Scenario, ScenarioPlan, plan, run_benchmark, scenario, select_scenarios};
pub use config::{Config, ConfigError};
pub use error::{RunError, ReportError, SelectionError};
pub use report::{BenchmarkReport, ReportEntry, ScanReport, ScenarioReport, TOOL_NAME, Tally};
pub use runner::Runner;
pub use selection::Selection;

/// Default filename for supaprobe configuration.
pub const CONFIG_FILENAME: &str = ".supaprobe.toml";

/// Default path of the benchmark report.
pub const DEFAULT_BENCHMARK_REPORT: &str = "supaprobe-benchmark.json";
