use chrono::Utc;
use supaprobe_attacks::{Attack, AttackRegistry, Category};
#[cfg(feature = "tracing")]
use tracing::info;

use crate::error::SelectionError;
use crate::report::{BenchmarkReport, ReportEntry, ScenarioReport};
use crate::runner::Runner;
use crate::selection::Selection;

/// A named group of attacks scored together in a benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scenario {
    /// Stable identifier used on the command line.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// What a good score in this scenario demonstrates.
    pub description: &'static str,
    /// Whole categories included in the scenario.
    pub categories: &'static [Category],
    /// Individual attack ids included in the scenario.
    pub attacks: &'static [&'static str],
}

impl Scenario {
    /// The selection matching this scenario's attacks.
    #[must_use]
    pub fn selection(&self) -> Selection {
        Selection {
            categories: self.categories.to_vec(),
            ids: self.attacks.iter().map(|id| (*id).to_string()).collect(),
            ..Selection::default()
        }
    }

    /// Resolves the scenario against `registry`, minus any `disabled` ids.
    pub fn resolve(
        &self,
        registry: &AttackRegistry,
        disabled: &[String],
    ) -> Result<Vec<&'static dyn Attack>, SelectionError> {
        let mut selection = self.selection();
        selection.disabled = disabled.to_vec();
        selection.resolve(registry)
    }
}

/// Built-in scenarios, in run order.
pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        id: "anon-data-exposure",
        name: "Anonymous data exposure",
        description: "Tables, views and vectors readable or writable with only the anon key.",
        categories: &[Category::Rls, Category::RlsPolicy, Category::MultiTenant, Category::AiVector],
        attacks: &["graphql/collection-read", "realtime/messages-read"],
    },
    Scenario {
        id: "auth-hardening",
        name: "Auth hardening",
        description: "Sign-up, sign-in and token handling resist abuse and enumeration.",
        categories: &[Category::Auth],
        attacks: &["dos/auth-rate-limit"],
    },
    Scenario {
        id: "storage-lockdown",
        name: "Storage lockdown",
        description: "Buckets and objects cannot be listed, created or uploaded anonymously.",
        categories: &[Category::Storage],
        attacks: &["backup/bucket-list"],
    },
    Scenario {
        id: "injection-surface",
        name: "Injection surface",
        description: "Filters, RPCs and business workflows reject tampered input.",
        categories: &[Category::Injection, Category::BusinessLogic],
        attacks: &["graphql/anon-mutation"],
    },
    Scenario {
        id: "platform-exposure",
        name: "Platform exposure",
        description: "Schemas, extensions, functions, logs and transport settings are not exposed.",
        categories: &[
            Category::PostgRest,
            Category::Extensions,
            Category::Functions,
            Category::Realtime,
            Category::GraphQl,
            Category::Logging,
            Category::Network,
        ],
        attacks: &[],
    },
    Scenario {
        id: "secrets-and-keys",
        name: "Secrets and keys",
        description: "No secrets, privileged keys or backups are reachable from the public API.",
        categories: &[Category::Vault, Category::ServiceRole, Category::Credentials, Category::Backup],
        attacks: &[],
    },
    Scenario {
        id: "availability",
        name: "Availability",
        description: "Expensive queries and request bursts are bounded.",
        categories: &[Category::Dos],
        attacks: &["graphql/deep-query"],
    },
];

/// Looks up a built-in scenario by id.
#[must_use]
pub fn scenario(id: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.id == id)
}

/// Picks scenarios by id, or all of them when `ids` is empty.
pub fn select_scenarios(ids: &[String]) -> Result<Vec<&'static Scenario>, SelectionError> {
    if ids.is_empty() {
        return Ok(SCENARIOS.iter().collect());
    }

    ids.iter()
        .map(|id| scenario(id).ok_or_else(|| SelectionError::UnknownScenario(id.clone())))
        .collect()
}

/// A scenario with its attacks already resolved.
#[derive(Clone)]
pub struct ScenarioPlan {
    /// The scenario being run.
    pub scenario: &'static Scenario,
    /// Its attacks, in registry order.
    pub attacks: Vec<&'static dyn Attack>,
}

impl std::fmt::Debug for ScenarioPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioPlan")
            .field("scenario", &self.scenario.id)
            .field("attacks", &self.attacks.len())
            .finish()
    }
}

/// Resolves every scenario up front so a bad id fails before any request is sent.
pub fn plan(
    registry: &AttackRegistry,
    scenarios: &[&'static Scenario],
    disabled: &[String],
) -> Result<Vec<ScenarioPlan>, SelectionError> {
    scenarios
        .iter()
        .map(|&scenario| {
            Ok(ScenarioPlan {
                scenario,
                attacks: scenario.resolve(registry, disabled)?,
            })
        })
        .collect()
}

/// Runs each planned scenario in turn and scores the whole benchmark.
///
/// Attacks shared by several scenarios run once per scenario.
pub async fn run_benchmark<F>(runner: &Runner, plans: &[ScenarioPlan], mut on_result: F) -> BenchmarkReport
where
    F: FnMut(&Scenario, &ReportEntry),
{
    let started_at = Utc::now();
    let mut scenarios = Vec::with_capacity(plans.len());

    for plan in plans {
        #[cfg(feature = "tracing")]
        info!(scenario = plan.scenario.id, attacks = plan.attacks.len(), "running scenario");

        let report = runner
            .scan(&plan.attacks, |entry| on_result(plan.scenario, entry))
            .await;

        scenarios.push(ScenarioReport {
            id: plan.scenario.id.to_string(),
            name: plan.scenario.name.to_string(),
            score: report.summary.score(),
            report,
        });
    }

    BenchmarkReport::new(
        runner.session().context().target_url.as_str(),
        started_at,
        Utc::now(),
        scenarios,
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use supaprobe_attacks::{AttackContext, AttackStatus, DEFAULT_REQUEST_TIMEOUT, SKIPPED_NO_SERVICE_KEY, Session};

    use super::*;

    #[test]
    fn scenario_ids_are_unique() {
        let ids: HashSet<_> = SCENARIOS.iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), SCENARIOS.len());
    }

    #[test]
    fn every_scenario_resolves_to_attacks() {
        let registry = AttackRegistry::builtin();
        for scenario in SCENARIOS {
            let resolved = scenario.resolve(&registry, &[]);
            assert!(resolved.is_ok(), "{}: {:?}", scenario.id, resolved.as_ref().err());
            assert!(!resolved.unwrap().is_empty(), "{} selects nothing", scenario.id);
        }
    }

    #[test]
    fn every_category_is_covered_by_some_scenario() {
        let covered: HashSet<_> = SCENARIOS.iter().flat_map(|s| s.categories.iter().copied()).collect();
        for category in Category::ALL {
            assert!(covered.contains(&category), "{category:?} not in any scenario");
        }
    }

    #[test]
    fn scenario_lookup() {
        assert_eq!(scenario("availability").map(|s| s.name), Some("Availability"));
        assert!(scenario("nope").is_none());
    }

    #[test]
    fn select_scenarios_defaults_to_all() {
        assert_eq!(select_scenarios(&[]).unwrap().len(), SCENARIOS.len());
    }

    #[test]
    fn select_scenarios_rejects_unknown_id() {
        let err = select_scenarios(&["auth-hardening".into(), "made-up".into()]).unwrap_err();
        assert_eq!(err, SelectionError::UnknownScenario("made-up".into()));
    }

    #[test]
    fn disabled_ids_are_dropped_from_plans() {
        let registry = AttackRegistry::builtin();
        let scenarios = select_scenarios(&["auth-hardening".into()]).unwrap();
        let plans = plan(&registry, &scenarios, &["dos/auth-rate-limit".into()]).unwrap();

        assert_eq!(plans.len(), 1);
        assert!(plans[0].attacks.iter().all(|a| a.meta().id != "dos/auth-rate-limit"));
        assert!(plans[0].attacks.iter().any(|a| a.meta().id == "auth/alg-none"));
    }

    #[tokio::test]
    async fn cancelled_benchmark_still_reports_every_scenario() {
        let registry = AttackRegistry::builtin();
        let scenarios = select_scenarios(&["storage-lockdown".into(), "secrets-and-keys".into()]).unwrap();
        let plans = plan(&registry, &scenarios, &[]).unwrap();

        let ctx = AttackContext::new("http://127.0.0.1:9", "anon").unwrap();
        ctx.cancel.cancel();
        let runner = Runner::new(Session::new(ctx, DEFAULT_REQUEST_TIMEOUT).unwrap());

        let mut per_scenario = Vec::new();
        let report = run_benchmark(&runner, &plans, |s, _| per_scenario.push(s.id)).await;

        assert_eq!(report.scenarios.len(), 2);
        assert_eq!(report.by_scenario.len(), 2);
        let expected: usize = plans.iter().map(|p| p.attacks.len()).sum();
        assert_eq!(report.summary.total, expected);
        assert_eq!(per_scenario.len(), expected);
        assert!(
            report
                .scenarios
                .iter()
                .flat_map(|s| &s.report.results)
                .all(|e| e.result.status == AttackStatus::Error || e.result.summary == SKIPPED_NO_SERVICE_KEY)
        );
        assert!((report.score - 100.0).abs() < f64::EPSILON);
    }
}
