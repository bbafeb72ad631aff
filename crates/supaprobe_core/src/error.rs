use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while narrowing the registry to the attacks of a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// An explicitly requested attack id is not in the registry.
    #[error("unknown attack id '{0}' (run `supaprobe attacks` to list them)")]
    UnknownAttack(String),

    /// A requested benchmark scenario does not exist.
    #[error("unknown scenario '{0}' (run `supaprobe benchmark --list` to list them)")]
    UnknownScenario(String),
}

/// Errors that can occur when writing a scan or benchmark report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The report could not be serialised to JSON.
    #[error("failed to serialise report: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The report file could not be written.
    #[error("failed to write report '{path}': {source}")]
    Write {
        /// Destination of the report.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Write { path, .. } => Some(path),
            Self::Serialize(_) => None,
        }
    }
}

/// Top-level error type for the supaprobe scanning pipeline.
///
/// Unifies session setup, configuration, selection and report errors into a
/// single type for callers that orchestrate a full run.
#[derive(Debug, Error)]
pub enum RunError {
    /// No project URL was supplied.
    #[error("no target URL: pass --url, set SUPABASE_URL, or add target_url to .supaprobe.toml")]
    MissingTarget,

    /// No anon key was supplied.
    #[error("no anon key: pass --anon-key, set SUPABASE_ANON_KEY, or add anon_key to .supaprobe.toml")]
    MissingAnonKey,

    /// The target is invalid or the attack session could not be created.
    #[error(transparent)]
    Attack(#[from] supaprobe_attacks::AttackError),

    /// Configuration could not be read, parsed, or written.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// The requested attacks or scenarios could not be resolved.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// A report could not be saved.
    #[error(transparent)]
    Report(#[from] ReportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_attack_names_the_id() {
        let err = SelectionError::UnknownAttack("rls/nope".into());
        assert!(err.to_string().contains("rls/nope"));
    }

    #[test]
    fn report_write_error_exposes_path() {
        let err = ReportError::Write {
            path: PathBuf::from("/tmp/out.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.path(), Some(Path::new("/tmp/out.json")));
        assert!(err.to_string().contains("/tmp/out.json"));
    }

    #[test]
    fn run_error_is_transparent() {
        let err: RunError = SelectionError::UnknownScenario("x".into()).into();
        assert_eq!(err.to_string(), SelectionError::UnknownScenario("x".into()).to_string());
    }
}
