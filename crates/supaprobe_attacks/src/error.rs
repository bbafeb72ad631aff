//! Errors raised while preparing or executing an attack.

use std::time::Duration;

/// Errors that can occur while building a session or running a probe.
///
/// Inside a scan these never escape: the harness converts them into an
/// [`AttackResult`](crate::AttackResult) with status `error`.
#[derive(Debug, thiserror::Error)]
pub enum AttackError {
    /// The HTTP client could not be initialised.
    #[error("failed to initialize HTTP client: {0}")]
    ClientInit(String),

    /// The target URL is malformed or uses an unsupported scheme.
    #[error("invalid target URL '{url}': {reason}")]
    InvalidTarget {
        /// The URL as supplied by the caller.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An HTTP request to the target failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The attack exceeded its time budget.
    #[error("attack timed out after {0:?}")]
    Timeout(Duration),

    /// The run was cancelled before the attack finished.
    #[error("cancelled")]
    Cancelled,

    /// A response or token could not be decoded.
    #[error("failed to decode {what}: {reason}")]
    Decode {
        /// What was being decoded (e.g. `"JWT payload"`).
        what: &'static str,
        /// The underlying failure.
        reason: String,
    },
}

impl AttackError {
    pub(crate) fn decode(what: &'static str, reason: impl ToString) -> Self {
        Self::Decode {
            what,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_target_mentions_url() {
        let err = AttackError::InvalidTarget {
            url: "ftp://x".into(),
            reason: "unsupported scheme".into(),
        };
        assert!(err.to_string().contains("ftp://x"));
    }

    #[test]
    fn decode_helper_formats_reason() {
        let err = AttackError::decode("JWT payload", "bad base64");
        assert_eq!(err.to_string(), "failed to decode JWT payload: bad base64");
    }

    #[test]
    fn cancelled_displays_plainly() {
        assert_eq!(AttackError::Cancelled.to_string(), "cancelled");
    }
}
