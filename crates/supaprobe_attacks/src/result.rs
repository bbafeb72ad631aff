//! Verdicts produced by probes and the result records built from them.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AttackError;

/// Final outcome of a single attack execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackStatus {
    /// The heuristic found the misconfiguration exploitable.
    Breached,
    /// The target resisted the attack (or the surface does not exist).
    Secure,
    /// The attack could not complete (network failure, timeout, cancellation).
    Error,
}

impl fmt::Display for AttackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Breached => write!(f, "breached"),
            Self::Secure => write!(f, "secure"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// What a probe concluded, before the harness stamps timing onto it.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Whether the probe considers the target breached.
    pub breached: bool,
    /// One-line human-readable conclusion.
    pub summary: String,
    /// Structured context about what was tried.
    pub details: Option<Value>,
    /// Data proving the breach (status codes, snippets, matched values).
    pub evidence: Option<Value>,
}

impl Verdict {
    /// Creates a verdict stating the target was breached.
    #[must_use]
    pub fn breached(summary: impl Into<String>) -> Self {
        Self {
            breached: true,
            summary: summary.into(),
            details: None,
            evidence: None,
        }
    }

    /// Creates a verdict stating the target resisted the attack.
    #[must_use]
    pub fn secure(summary: impl Into<String>) -> Self {
        Self {
            breached: false,
            summary: summary.into(),
            details: None,
            evidence: None,
        }
    }

    /// Attaches evidence to the verdict.
    #[must_use]
    pub fn with_evidence(mut self, evidence: Value) -> Self {
        self.evidence = Some(evidence);
        self
    }

    /// Attaches structured details to the verdict.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// The record produced for every executed attack.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackResult {
    /// Identifier of the attack that produced this result.
    pub attack_id: String,
    /// Breached, secure or error.
    pub status: AttackStatus,
    /// Mirrors `status == Breached`.
    pub breached: bool,
    /// One-line human-readable conclusion.
    pub summary: String,
    /// Structured context about what was tried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Data proving the breach.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Value>,
    /// When the attack started.
    pub timestamp: DateTime<Utc>,
    /// Wall-clock time the attack took.
    #[serde(rename = "durationMs", with = "duration_ms")]
    pub duration: Duration,
}

impl AttackResult {
    /// Builds a result from a completed probe verdict.
    #[must_use]
    pub fn from_verdict(attack_id: &str, verdict: Verdict, timestamp: DateTime<Utc>, duration: Duration) -> Self {
        let status = if verdict.breached {
            AttackStatus::Breached
        } else {
            AttackStatus::Secure
        };

        Self {
            attack_id: attack_id.to_string(),
            status,
            breached: verdict.breached,
            summary: verdict.summary,
            details: verdict.details,
            evidence: verdict.evidence,
            timestamp,
            duration,
        }
    }

    /// Builds an error result from a failed probe.
    #[must_use]
    pub fn from_error(attack_id: &str, error: &AttackError, timestamp: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            attack_id: attack_id.to_string(),
            status: AttackStatus::Error,
            breached: false,
            summary: error.to_string(),
            details: None,
            evidence: None,
            timestamp,
            duration,
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn breached_verdict_maps_to_breached_status() {
        let result = AttackResult::from_verdict(
            "rls/profiles-read",
            Verdict::breached("rows returned"),
            Utc::now(),
            Duration::from_millis(12),
        );

        assert_eq!(result.status, AttackStatus::Breached);
        assert!(result.breached);
    }

    #[test]
    fn error_result_is_never_breached() {
        let result = AttackResult::from_error(
            "auth/settings",
            &AttackError::Timeout(Duration::from_secs(1)),
            Utc::now(),
            Duration::from_secs(1),
        );

        assert_eq!(result.status, AttackStatus::Error);
        assert!(!result.breached);
        assert!(result.summary.contains("timed out"));
    }

    #[test]
    fn serialises_with_camel_case_keys() {
        let result = AttackResult::from_verdict(
            "network/cors",
            Verdict::secure("fine").with_evidence(json!({"status": 200})),
            Utc::now(),
            Duration::from_millis(1500),
        );

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["attackId"], "network/cors");
        assert_eq!(value["durationMs"], 1500);
        assert_eq!(value["status"], "secure");
        assert!(value.get("details").is_none());
        assert_eq!(value["evidence"]["status"], 200);
    }

    #[test]
    fn deserialises_what_it_serialises() {
        let result = AttackResult::from_verdict("dos/x", Verdict::breached("slow"), Utc::now(), Duration::from_millis(7));
        let text = serde_json::to_string(&result).unwrap();
        let back: AttackResult = serde_json::from_str(&text).unwrap();
        assert_eq!(back.duration, Duration::from_millis(7));
        assert_eq!(back.status, AttackStatus::Breached);
    }

    #[test]
    fn status_display_is_lowercase() {
        assert_eq!(AttackStatus::Breached.to_string(), "breached");
        assert_eq!(AttackStatus::Error.to_string(), "error");
    }
}
