use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use supaprobe_attacks::{AttackMeta, AttackResult, AttackStatus, Category, Severity};

use crate::error::ReportError;

/// Name recorded in every report.
pub const TOOL_NAME: &str = "supaprobe";

/// Counts of outcomes over a set of attack results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// Number of attacks executed.
    pub total: usize,
    /// Attacks whose heuristic found the target exploitable.
    pub breached: usize,
    /// Attacks the target resisted.
    pub secure: usize,
    /// Attacks that could not complete.
    pub errors: usize,
}

impl Tally {
    /// Counts one outcome.
    pub fn record(&mut self, status: AttackStatus) {
        self.total += 1;
        match status {
            AttackStatus::Breached => self.breached += 1,
            AttackStatus::Secure => self.secure += 1,
            AttackStatus::Error => self.errors += 1,
        }
    }

    /// Adds another tally into this one.
    pub fn merge(&mut self, other: Self) {
        self.total += other.total;
        self.breached += other.breached;
        self.secure += other.secure;
        self.errors += other.errors;
    }

    /// Percentage of completed attacks that were secure, `100.0` when none completed.
    #[must_use]
    pub fn score(&self) -> f64 {
        let completed = self.breached + self.secure;
        if completed == 0 {
            return 100.0;
        }
        #[allow(clippy::cast_precision_loss, reason = "attack counts are far below 2^52")]
        let score = self.secure as f64 * 100.0 / completed as f64;
        (score * 10.0).round() / 10.0
    }
}

/// An attack result enriched with the metadata needed to read it on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    /// Display name of the attack.
    pub name: String,
    /// Category of the attack.
    pub category: Category,
    /// Severity of the attack.
    pub severity: Severity,
    /// The execution record.
    #[serde(flatten)]
    pub result: AttackResult,
}

impl ReportEntry {
    /// Pairs a result with the metadata of the attack that produced it.
    #[must_use]
    pub fn new(meta: &AttackMeta, result: AttackResult) -> Self {
        Self {
            name: meta.name.to_string(),
            category: meta.category,
            severity: meta.severity,
            result,
        }
    }
}

/// The JSON report written at the end of a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Always `"supaprobe"`.
    pub tool: String,
    /// Version of the tool that produced the report.
    pub version: String,
    /// Base URL that was scanned.
    pub target: String,
    /// When the first attack started.
    pub started_at: DateTime<Utc>,
    /// When the last attack finished.
    pub finished_at: DateTime<Utc>,
    /// Wall-clock duration of the run.
    pub duration_ms: u64,
    /// Outcome counts over every result.
    pub summary: Tally,
    /// Outcome counts per severity.
    pub by_severity: BTreeMap<Severity, Tally>,
    /// Outcome counts per category.
    pub by_category: BTreeMap<Category, Tally>,
    /// One entry per executed attack, in execution order.
    pub results: Vec<ReportEntry>,
}

impl ScanReport {
    /// Aggregates results into a report.
    #[must_use]
    pub fn new(target: &str, started_at: DateTime<Utc>, finished_at: DateTime<Utc>, results: Vec<ReportEntry>) -> Self {
        let mut summary = Tally::default();
        let mut by_severity: BTreeMap<Severity, Tally> = BTreeMap::new();
        let mut by_category: BTreeMap<Category, Tally> = BTreeMap::new();

        for entry in &results {
            let status = entry.result.status;
            summary.record(status);
            by_severity.entry(entry.severity).or_default().record(status);
            by_category.entry(entry.category).or_default().record(status);
        }

        let duration_ms = (finished_at - started_at)
            .num_milliseconds()
            .try_into()
            .unwrap_or_default();

        Self {
            tool: TOOL_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            target: target.to_string(),
            started_at,
            finished_at,
            duration_ms,
            summary,
            by_severity,
            by_category,
            results,
        }
    }

    /// Returns `true` if any attack breached the target.
    #[must_use]
    pub fn has_breaches(&self) -> bool {
        self.summary.breached > 0
    }

    /// Iterates over the breached entries.
    pub fn breaches(&self) -> impl Iterator<Item = &ReportEntry> {
        self.results.iter().filter(|e| e.result.breached)
    }

    /// Serialises the report to pretty JSON.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Atomically writes the report as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        write_json(path, &self.to_json()?)
    }
}

/// One scenario's slice of a benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    /// Scenario identifier.
    pub id: String,
    /// Scenario display name.
    pub name: String,
    /// Percentage of completed attacks that were secure.
    pub score: f64,
    /// The scenario's scan.
    pub report: ScanReport,
}

/// The JSON report written by `supaprobe benchmark`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkReport {
    /// Always `"supaprobe"`.
    pub tool: String,
    /// Version of the tool that produced the report.
    pub version: String,
    /// Base URL that was benchmarked.
    pub target: String,
    /// When the first scenario started.
    pub started_at: DateTime<Utc>,
    /// When the last scenario finished.
    pub finished_at: DateTime<Utc>,
    /// Percentage of completed attacks that were secure, over every scenario.
    pub score: f64,
    /// Outcome counts over every scenario.
    pub summary: Tally,
    /// Outcome counts per scenario id.
    pub by_scenario: BTreeMap<String, Tally>,
    /// Per-scenario reports, in run order.
    pub scenarios: Vec<ScenarioReport>,
}

impl BenchmarkReport {
    /// Aggregates scenario reports into a benchmark report.
    #[must_use]
    pub fn new(target: &str, started_at: DateTime<Utc>, finished_at: DateTime<Utc>, scenarios: Vec<ScenarioReport>) -> Self {
        let mut summary = Tally::default();
        let mut by_scenario = BTreeMap::new();
        for scenario in &scenarios {
            summary.merge(scenario.report.summary);
            by_scenario.insert(scenario.id.clone(), scenario.report.summary);
        }

        Self {
            tool: TOOL_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            target: target.to_string(),
            started_at,
            finished_at,
            score: summary.score(),
            summary,
            by_scenario,
            scenarios,
        }
    }

    /// Returns `true` if any scenario had a breach.
    #[must_use]
    pub fn has_breaches(&self) -> bool {
        self.summary.breached > 0
    }

    /// Serialises the report to pretty JSON.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Atomically writes the report as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        write_json(path, &self.to_json()?)
    }
}

fn write_json(path: &Path, json: &str) -> Result<(), ReportError> {
    crate::fs_util::atomic_write(path, json).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use supaprobe_attacks::{AttackError, AttackRegistry, Verdict};
    use tempfile::TempDir;

    use super::*;

    fn entry(id: &str, status: AttackStatus) -> ReportEntry {
        let registry = AttackRegistry::builtin();
        let meta = *registry.get(id).unwrap().meta();
        let result = match status {
            AttackStatus::Breached => {
                AttackResult::from_verdict(id, Verdict::breached("x"), Utc::now(), Duration::from_millis(5))
            }
            AttackStatus::Secure => AttackResult::from_verdict(id, Verdict::secure("x"), Utc::now(), Duration::ZERO),
            AttackStatus::Error => AttackResult::from_error(id, &AttackError::Cancelled, Utc::now(), Duration::ZERO),
        };
        ReportEntry::new(&meta, result)
    }

    fn sample() -> ScanReport {
        let now = Utc::now();
        ScanReport::new(
            "https://abc.supabase.co/",
            now,
            now + chrono::Duration::milliseconds(1500),
            vec![
                entry("rls/users-read", AttackStatus::Breached),
                entry("rls/profiles-read", AttackStatus::Secure),
                entry("auth/alg-none", AttackStatus::Error),
            ],
        )
    }

    #[test]
    fn tally_records_each_status() {
        let mut tally = Tally::default();
        tally.record(AttackStatus::Breached);
        tally.record(AttackStatus::Secure);
        tally.record(AttackStatus::Secure);
        tally.record(AttackStatus::Error);
        assert_eq!(
            tally,
            Tally {
                total: 4,
                breached: 1,
                secure: 2,
                errors: 1
            }
        );
    }

    #[test]
    fn score_ignores_errors_and_defaults_to_full_marks() {
        assert!((Tally::default().score() - 100.0).abs() < f64::EPSILON);

        let tally = Tally {
            total: 5,
            breached: 1,
            secure: 3,
            errors: 1,
        };
        assert!((tally.score() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn scan_report_aggregates_by_severity_and_category() {
        let report = sample();

        assert_eq!(report.summary.total, 3);
        assert_eq!(report.duration_ms, 1500);
        assert_eq!(report.by_category[&Category::Rls].total, 2);
        assert_eq!(report.by_category[&Category::Auth].errors, 1);
        assert_eq!(report.by_severity[&Severity::Critical].breached, 1);
        assert!(report.has_breaches());
        assert_eq!(report.breaches().count(), 1);
    }

    #[test]
    fn scan_report_json_uses_camel_case_and_flattened_results() {
        let value: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();

        assert_eq!(value["tool"], "supaprobe");
        assert_eq!(value["durationMs"], 1500);
        assert_eq!(value["bySeverity"]["critical"]["breached"], 1);
        assert_eq!(value["byCategory"]["rls"]["total"], 2);

        let first = &value["results"][0];
        assert_eq!(first["attackId"], "rls/users-read");
        assert_eq!(first["category"], "rls");
        assert_eq!(first["severity"], "critical");
        assert_eq!(first["breached"], true);
    }

    #[test]
    fn scan_report_save_writes_readable_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/report.json");

        sample().save(&path).unwrap();

        let restored: ScanReport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(restored.summary, sample().summary);
        assert_eq!(restored.results.len(), 3);
    }

    #[test]
    fn benchmark_report_sums_scenarios() {
        let now = Utc::now();
        let scan = sample();
        let scenarios = vec![
            ScenarioReport {
                id: "anon-data-exposure".into(),
                name: "Anonymous data exposure".into(),
                score: scan.summary.score(),
                report: scan.clone(),
            },
            ScenarioReport {
                id: "auth-hardening".into(),
                name: "Auth hardening".into(),
                score: scan.summary.score(),
                report: scan,
            },
        ];

        let report = BenchmarkReport::new("https://abc.supabase.co/", now, now, scenarios);

        assert_eq!(report.summary.total, 6);
        assert_eq!(report.by_scenario["auth-hardening"].breached, 1);
        assert!((report.score - 50.0).abs() < f64::EPSILON);
        assert!(report.has_breaches());
    }
}
