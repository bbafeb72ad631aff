//! Property-based tests for `supaprobe_core`.
//!
//! These tests verify invariants that should hold for all inputs,
//! catching edge cases that hand-written tests might miss.

use std::time::Duration;

use chrono::Utc;
use proptest::prelude::*;
use supaprobe_attacks::{AttackError, Verdict};
use supaprobe_core::prelude::*;

fn status_strategy() -> impl Strategy<Value = AttackStatus> {
    prop_oneof![
        Just(AttackStatus::Breached),
        Just(AttackStatus::Secure),
        Just(AttackStatus::Error),
    ]
}

fn entries(picks: &[(usize, AttackStatus)]) -> Vec<ReportEntry> {
    let registry = AttackRegistry::builtin();
    let attacks = registry.attacks();

    picks
        .iter()
        .map(|&(index, status)| {
            let meta = attacks[index % attacks.len()].meta();
            let result = match status {
                AttackStatus::Breached => {
                    AttackResult::from_verdict(meta.id, Verdict::breached("in"), Utc::now(), Duration::ZERO)
                }
                AttackStatus::Secure => {
                    AttackResult::from_verdict(meta.id, Verdict::secure("out"), Utc::now(), Duration::ZERO)
                }
                AttackStatus::Error => AttackResult::from_error(meta.id, &AttackError::Cancelled, Utc::now(), Duration::ZERO),
            };
            ReportEntry::new(meta, result)
        })
        .collect()
}

fn assert_consistent(tally: &Tally) -> Result<(), TestCaseError> {
    prop_assert_eq!(tally.breached + tally.secure + tally.errors, tally.total);
    Ok(())
}

proptest! {
    /// Severity and category tallies both partition the summary.
    #[test]
    fn report_tallies_sum_to_total(picks in prop::collection::vec((0usize..500, status_strategy()), 0..60)) {
        let now = Utc::now();
        let report = ScanReport::new("https://abc.supabase.co/", now, now, entries(&picks));

        prop_assert_eq!(report.summary.total, report.results.len());
        assert_consistent(&report.summary)?;

        let by_severity: usize = report.by_severity.values().map(|t| t.total).sum();
        let by_category: usize = report.by_category.values().map(|t| t.total).sum();
        prop_assert_eq!(by_severity, report.summary.total);
        prop_assert_eq!(by_category, report.summary.total);

        for tally in report.by_severity.values().chain(report.by_category.values()) {
            assert_consistent(tally)?;
        }
    }

    /// Scores are percentages, whatever the mix of outcomes.
    #[test]
    fn score_is_a_percentage(breached in 0usize..1000, secure in 0usize..1000, errors in 0usize..1000) {
        let tally = Tally { total: breached + secure + errors, breached, secure, errors };
        let score = tally.score();
        prop_assert!((0.0..=100.0).contains(&score));
        if breached == 0 {
            prop_assert!((score - 100.0).abs() < f64::EPSILON);
        }
    }

    /// Merging tallies is the same as recording every outcome into one.
    #[test]
    fn merge_matches_recording(
        left in prop::collection::vec(status_strategy(), 0..40),
        right in prop::collection::vec(status_strategy(), 0..40),
    ) {
        let mut a = Tally::default();
        left.iter().for_each(|s| a.record(*s));
        let mut b = Tally::default();
        right.iter().for_each(|s| b.record(*s));
        let mut all = Tally::default();
        left.iter().chain(&right).for_each(|s| all.record(*s));

        a.merge(b);
        prop_assert_eq!(a, all);
    }

    /// Disabling an attack always removes it from the resolved selection.
    #[test]
    fn disabled_attack_is_never_selected(index in 0usize..500) {
        let registry = AttackRegistry::builtin();
        let id = registry.attacks()[index % registry.len()].meta().id;
        let selection = Selection { disabled: vec![id.to_string()], ..Selection::default() };

        let attacks = selection.resolve(&registry).unwrap();
        prop_assert_eq!(attacks.len(), registry.len() - 1);
        prop_assert!(attacks.iter().all(|a| a.meta().id != id));
    }
}
