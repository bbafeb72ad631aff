//! Configuration file templates.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context as _;
use supaprobe_core::prelude::*;

/// Default minimum severity for generated configurations.
pub const DEFAULT_SEVERITY: Severity = Severity::Low;
/// Default number of attacks in flight.
pub const DEFAULT_CONCURRENCY: usize = 1;
/// Attacks that deliberately generate load against the target.
pub const LOAD_ATTACKS: &[&str] = &["dos/auth-rate-limit", "dos/pg-sleep-rpc"];

/// Answers that shape a generated `.supaprobe.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigOptions {
    /// Project URL to write as `target_url`, if known.
    pub target_url: Option<String>,
    /// Minimum severity to run.
    pub severity: Severity,
    /// Categories to run. Empty means all.
    pub categories: Vec<Category>,
    /// Attack ids to disable.
    pub disabled_attacks: Vec<&'static str>,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            target_url: None,
            severity: DEFAULT_SEVERITY,
            categories: Vec::new(),
            disabled_attacks: Vec::new(),
        }
    }
}

/// Generates the `.supaprobe.toml` configuration file content.
#[must_use]
pub fn build_config(options: &ConfigOptions, minimal: bool) -> String {
    if minimal {
        build_minimal_config(options)
    } else {
        build_full_config(options)
    }
}

fn build_minimal_config(options: &ConfigOptions) -> String {
    let mut cfg = String::new();

    if let Some(url) = &options.target_url {
        let _ = writeln!(cfg, "target_url = {}", quote(url));
    }
    let _ = writeln!(cfg, "severity = \"{}\"", options.severity.as_str());
    let _ = writeln!(cfg, "concurrency = {DEFAULT_CONCURRENCY}");

    if !options.categories.is_empty() {
        let _ = writeln!(cfg, "categories = {}", inline_list(options.categories.iter().map(|c| c.as_str())));
    }

    if !options.disabled_attacks.is_empty() {
        cfg.push_str("disabled_attacks = [\n");
        for id in &options.disabled_attacks {
            let _ = writeln!(cfg, "  \"{id}\",");
        }
        cfg.push_str("]\n");
    }

    cfg
}

fn build_full_config(options: &ConfigOptions) -> String {
    let target_line = options
        .target_url
        .as_ref()
        .map_or_else(|| "# target_url = \"https://<project>.supabase.co\"".into(), |url| {
            format!("target_url = {}", quote(url))
        });

    let categories_line = if options.categories.is_empty() {
        "# categories = [\"rls\", \"auth\", \"storage\"]".into()
    } else {
        format!("categories = {}", inline_list(options.categories.iter().map(|c| c.as_str())))
    };

    let disabled_section = if options.disabled_attacks.is_empty() {
        "# disabled_attacks = [\"dos/auth-rate-limit\"]".into()
    } else {
        let items: Vec<_> = options.disabled_attacks.iter().map(|id| format!("  \"{id}\"")).collect();
        format!("disabled_attacks = [\n{},\n]", items.join(",\n"))
    };

    let severity = options.severity.as_str();
    let request_timeout = supaprobe_attacks::DEFAULT_REQUEST_TIMEOUT.as_secs();
    let attack_timeout = supaprobe_attacks::DEFAULT_ATTACK_TIMEOUT.as_secs();

    format!(
        r#"# .supaprobe.toml
#
# Keys are read from SUPABASE_ANON_KEY and SUPABASE_SERVICE_ROLE_KEY.
# Avoid committing them here.

{target_line}
# anon_key = ""
# service_key = ""

severity = "{severity}"
{categories_line}

{disabled_section}

concurrency = {DEFAULT_CONCURRENCY}
# timeout_secs = {request_timeout}
# attack_timeout_secs = {attack_timeout}

# report_path = "supaprobe-report.json"
"#
    )
}

fn inline_list<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let quoted: Vec<String> = items.map(quote).collect();
    format!("[{}]", quoted.join(", "))
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Writes configuration content to the given file path.
pub fn write_config(path: &Path, content: &str) -> anyhow::Result<()> {
    std::fs::write(path, content).context("creating config file")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_default_config_parses() {
        let content = build_config(&ConfigOptions::default(), true);
        let config = Config::from_toml(&content).unwrap();
        assert_eq!(config.severity, Some(Severity::Low));
        assert_eq!(config.concurrency, Some(1));
        assert!(config.target_url.is_none());
    }

    #[test]
    fn full_config_parses_with_every_answer() {
        let options = ConfigOptions {
            target_url: Some("https://abc.supabase.co".into()),
            severity: Severity::High,
            categories: vec![Category::Rls, Category::Storage],
            disabled_attacks: LOAD_ATTACKS.to_vec(),
        };

        let config = Config::from_toml(&build_config(&options, false)).unwrap();
        assert_eq!(config.target_url.as_deref(), Some("https://abc.supabase.co"));
        assert_eq!(config.severity, Some(Severity::High));
        assert_eq!(config.categories, vec![Category::Rls, Category::Storage]);
        assert_eq!(config.disabled_attacks, vec!["dos/auth-rate-limit", "dos/pg-sleep-rpc"]);
    }

    #[test]
    fn full_default_config_leaves_optional_keys_commented() {
        let content = build_config(&ConfigOptions::default(), false);
        let config = Config::from_toml(&content).unwrap();
        assert!(config.categories.is_empty());
        assert!(config.disabled_attacks.is_empty());
        assert!(content.contains("# target_url"));
    }

    #[test]
    fn quoted_values_survive_round_trip() {
        let options = ConfigOptions {
            target_url: Some(r#"https://a.co/"x"\y"#.into()),
            ..ConfigOptions::default()
        };
        let config = Config::from_toml(&build_config(&options, true)).unwrap();
        assert_eq!(config.target_url.as_deref(), Some(r#"https://a.co/"x"\y"#));
    }

    #[test]
    fn load_attacks_exist_in_registry() {
        let registry = AttackRegistry::builtin();
        for id in LOAD_ATTACKS {
            assert!(registry.get(id).is_some(), "{id} missing");
        }
    }
}
