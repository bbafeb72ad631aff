//! Target resolution, session construction and the async runtime.

use std::path::Path;

use anyhow::Context as _;
use supaprobe_core::CONFIG_FILENAME;
use supaprobe_core::prelude::*;

use crate::TargetArgs;

/// Everything a command needs to start attacking a project.
#[derive(Debug)]
pub struct RunContext {
    /// The loaded configuration file (defaults when absent).
    pub config: Config,
    /// Runner configured with the effective timeouts and concurrency.
    pub runner: Runner,
}

impl RunContext {
    /// Loads configuration and merges it with command-line arguments.
    ///
    /// Flags (and their environment variables) win over the config file.
    pub fn load(args: &TargetArgs) -> anyhow::Result<Self> {
        let config_path = args.config.as_deref().unwrap_or(Path::new(CONFIG_FILENAME));
        let config = Config::load(config_path).context("loading config")?;

        let owned = |value: Option<&str>| value.map(str::to_string);
        let effective = Config {
            target_url: owned(pick(args.url.as_deref(), config.target_url.as_deref())),
            anon_key: owned(pick(args.anon_key.as_deref(), config.anon_key.as_deref())),
            service_key: owned(pick(args.service_key.as_deref(), config.service_key.as_deref())),
            timeout_secs: args.timeout.or(config.timeout_secs),
            attack_timeout_secs: args.attack_timeout.or(config.attack_timeout_secs),
            concurrency: args.concurrency.or(config.concurrency),
            ..config.clone()
        };

        let runner = Runner::from_config(&effective)?;

        Ok(Self { config, runner })
    }
}

fn pick<'a>(flag: Option<&'a str>, file: Option<&'a str>) -> Option<&'a str> {
    let present = |value: Option<&'a str>| value.map(str::trim).filter(|s| !s.is_empty());
    present(flag).or_else(|| present(file))
}

/// Builds the multi-threaded runtime commands run their attacks on.
pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create async runtime")
}

/// Cancels the run's token on Ctrl-C so unfinished attacks report `cancelled`.
///
/// Must be called from inside the runtime.
pub fn cancel_on_ctrl_c(runner: &Runner) {
    let cancel = runner.session().context().cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_over_file() {
        assert_eq!(pick(Some("https://a.co"), Some("https://b.co")), Some("https://a.co"));
        assert_eq!(pick(None, Some("https://b.co")), Some("https://b.co"));
    }

    #[test]
    fn blank_values_count_as_missing() {
        assert_eq!(pick(Some("  "), None), None);
        assert_eq!(pick(Some(""), Some("https://b.co")), Some("https://b.co"));
        assert_eq!(pick(None, None), None);
    }
}
