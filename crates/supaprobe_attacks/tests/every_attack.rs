//! Runs every builtin attack against a bare mock project and an unreachable
//! host, checking that each one yields a well-formed result.

use std::time::Duration;

use supaprobe_attacks::{AttackContext, AttackRegistry, AttackResult, AttackStatus, Category, Session};
use wiremock::MockServer;

const BUDGET: Duration = Duration::from_secs(10);

fn session(url: &str) -> Session {
    let ctx = AttackContext::new(url, "anon-key")
        .unwrap()
        .with_service_key(Some("service-key".to_string()));
    Session::new(ctx, Duration::from_secs(2)).unwrap()
}

fn assert_well_formed(id: &str, result: &AttackResult) {
    assert_eq!(result.attack_id, id);
    assert_eq!(result.breached, result.status == AttackStatus::Breached, "{id}");
    assert!(!result.summary.is_empty(), "{id} has an empty summary");
}

#[tokio::test]
async fn every_attack_yields_a_result_against_an_empty_project() {
    let server = MockServer::start().await;
    let session = session(&server.uri());
    let registry = AttackRegistry::builtin();

    for attack in registry.attacks() {
        let id = attack.meta().id;
        let result = attack.execute(&session, BUDGET).await;
        assert_well_formed(id, &result);
    }
}

#[tokio::test]
async fn every_attack_yields_a_result_against_an_unreachable_host() {
    let session = session("http://127.0.0.1:9");
    let registry = AttackRegistry::builtin();

    for attack in registry.attacks() {
        let id = attack.meta().id;
        let result = attack.execute(&session, BUDGET).await;
        assert_well_formed(id, &result);
        assert!(!result.breached, "{id} breached an unreachable host");
    }
}

#[test]
fn by_category_partitions_the_registry() {
    let registry = AttackRegistry::builtin();
    let mut seen = Vec::new();

    for category in Category::ALL {
        let attacks = registry.by_category(category);
        assert!(!attacks.is_empty(), "{category:?} has no attacks");
        seen.extend(attacks.iter().map(|a| a.meta().id));
    }

    seen.sort_unstable();
    let before = seen.len();
    seen.dedup();
    assert_eq!(before, seen.len());
    assert_eq!(seen.len(), registry.len());
}
