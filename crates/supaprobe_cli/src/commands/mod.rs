//! CLI command handlers.

/// Attack registry listing and inspection.
pub mod attacks;
/// Scored scenario runs and the benchmark report.
pub mod benchmark;
/// Shell completion script generation.
pub mod completions;
/// Project initialisation and `.supaprobe.toml` creation.
pub mod init;
/// Attack runs against a single target.
pub mod scan;

/// Convenience alias for command return types.
pub type Result<T = ()> = anyhow::Result<T>;
