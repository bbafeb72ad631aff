//! Rate limiting and requests that make the database do unbounded work.

use futures::future::join_all;
use serde_json::json;

use crate::attack::{Attack, BoxFuture};
use crate::check::{Check, RequestDef};
use crate::error::AttackError;
use crate::meta::{AttackMeta, Category, Severity};
use crate::result::Verdict;
use crate::rule::Rule;
use crate::session::{KeyRole, Service, Session};

pub(super) const CHECKS: &[Check] = &[
    crate::check! {
        id: "dos/deep-embed",
        name: "Deeply nested embedding",
        description: "Requests a self-referencing embed four levels deep and times the response.",
        category: Category::Dos,
        severity: Severity::Medium,
        tags: &["slow-query"],
        request: RequestDef::get(
            Service::Rest,
            "profiles?select=*,profiles(*,profiles(*,profiles(*)))",
        ),
        rule: Rule::SlowerThan(3000),
    },
    crate::check! {
        id: "dos/regex-filter",
        name: "Catastrophic regex filter",
        description: "Filters with a backtracking regular expression through the match operator.",
        category: Category::Dos,
        severity: Severity::Medium,
        tags: &["slow-query"],
        request: RequestDef::get(Service::Rest, "profiles?select=id&username=match.%5E(a%2B)%2B%24"),
        rule: Rule::SlowerThan(2000),
    },
    crate::check! {
        id: "dos/unbounded-range",
        name: "No maximum row limit",
        description: "Asks for a huge range in one request and times it; a slow full answer means db-max-rows is unset.",
        category: Category::Dos,
        severity: Severity::Low,
        tags: &["limits"],
        request: RequestDef::get(Service::Rest, "profiles?select=id").with_headers(&[
            ("Range-Unit", "items"),
            ("Range", "0-999999"),
            ("Prefer", "count=exact"),
        ]),
        rule: Rule::All(&[Rule::Success, Rule::SlowerThan(2000)]),
    },
    crate::check! {
        id: "dos/pg-sleep-rpc",
        name: "pg_sleep reachable via RPC",
        description: "Calls pg_sleep directly; exposed it lets anyone pin database connections.",
        category: Category::Dos,
        severity: Severity::High,
        tags: &["rpc"],
        request: RequestDef::post(Service::Rest, "rpc/pg_sleep", r#"{"seconds":1}"#),
        rule: Rule::Success,
    },
    crate::check! {
        id: "dos/cross-join-embed",
        name: "Many-to-many embed fan-out",
        description: "Embeds two unrelated relations at once and times the response.",
        category: Category::Dos,
        severity: Severity::Medium,
        tags: &["slow-query"],
        request: RequestDef::get(Service::Rest, "profiles?select=*,posts(*,comments(*)),orders(*,order_items(*))"),
        rule: Rule::SlowerThan(3000),
    },
    crate::check! {
        id: "dos/wide-in-filter",
        name: "Huge in() filter",
        description: "Filters with a long in() list and times the response.",
        category: Category::Dos,
        severity: Severity::Low,
        tags: &["slow-query"],
        request: RequestDef::get(
            Service::Rest,
            "profiles?select=id&id=in.(1,2,3,4,5,6,7,8,9,10,11,12,13,14,15,16,17,18,19,20,21,22,23,24,25,26,27,28,29,30,31,32,33,34,35,36,37,38,39,40)",
        ),
        rule: Rule::SlowerThan(2000),
    },
    crate::check! {
        id: "dos/leading-wildcard",
        name: "Leading wildcard scan",
        description: "Filters with ilike.*a* which cannot use an index.",
        category: Category::Dos,
        severity: Severity::Low,
        tags: &["slow-query"],
        request: RequestDef::get(Service::Rest, "profiles?select=id&username=ilike.*a*"),
        rule: Rule::SlowerThan(2000),
    },
    crate::check! {
        id: "dos/fts-unindexed",
        name: "Unindexed full-text search",
        description: "Runs a full-text query over a column without a tsvector index.",
        category: Category::Dos,
        severity: Severity::Low,
        tags: &["slow-query", "fts"],
        request: RequestDef::get(Service::Rest, "posts?select=id&body=wfts.a%20or%20b%20or%20c"),
        rule: Rule::SlowerThan(2000),
    },
    crate::check! {
        id: "dos/generate-series-rpc",
        name: "Set-returning function callable",
        description: "Calls generate_series through RPC with a large upper bound.",
        category: Category::Dos,
        severity: Severity::High,
        tags: &["rpc"],
        request: RequestDef::post(Service::Rest, "rpc/generate_series", r#"{"start":1,"stop":10000000}"#),
        rule: Rule::Success,
    },
    crate::check! {
        id: "dos/graphql-nested",
        name: "Nested GraphQL relations",
        description: "Asks pg_graphql for relations nested four deep and times it.",
        category: Category::Dos,
        severity: Severity::Medium,
        tags: &["slow-query", "graphql"],
        request: RequestDef::post(
            Service::GraphQl,
            "",
            r#"{"query":"{ profilesCollection(first: 100) { edges { node { postsCollection(first: 100) { edges { node { commentsCollection(first: 100) { edges { node { id } } } } } } } } } }"}"#,
        ),
        rule: Rule::SlowerThan(3000),
    },
    crate::check! {
        id: "dos/storage-list-unbounded",
        name: "Unbounded storage listing",
        description: "Lists a bucket with a huge limit and times it.",
        category: Category::Dos,
        severity: Severity::Low,
        tags: &["limits", "storage"],
        request: RequestDef::post(Service::Storage, "object/list/avatars", r#"{"prefix":"","limit":100000}"#),
        rule: Rule::SlowerThan(3000),
    },
    crate::check! {
        id: "dos/order-random",
        name: "Random ordering over a full table",
        description: "Orders by a computed expression that forces a full sort.",
        category: Category::Dos,
        severity: Severity::Low,
        tags: &["slow-query"],
        request: RequestDef::get(Service::Rest, "profiles?select=id&order=username.desc.nullslast,id.asc&limit=1&offset=100000"),
        rule: Rule::SlowerThan(2000),
    },
];

pub(super) const PROBES: &[&dyn Attack] = &[&RateLimitBurst::DEFAULT];

/// Fires concurrent password sign-ins and checks that GoTrue throttles them.
pub(super) struct RateLimitBurst {
    burst: usize,
}

impl RateLimitBurst {
    const DEFAULT: Self = Self { burst: 30 };
}

static RATE_LIMIT: AttackMeta = AttackMeta {
    id: "dos/auth-rate-limit",
    name: "Sign-in not rate limited",
    description: "Sends a concurrent burst of failed password sign-ins; no 429 means credential stuffing is unthrottled.",
    category: Category::Dos,
    severity: Severity::High,
    tags: &["rate-limit", "brute-force"],
    requires_service_key: false,
};

impl Attack for RateLimitBurst {
    fn meta(&self) -> &AttackMeta {
        &RATE_LIMIT
    }

    fn probe<'a>(&'a self, session: &'a Session) -> BoxFuture<'a, Result<Verdict, AttackError>> {
        Box::pin(async move {
            let body = json!({ "email": "supaprobe-burst@example.com", "password": "wrong-password" });
            let mut requests = Vec::with_capacity(self.burst);
            for _ in 0..self.burst {
                let builder = session.post_json(Service::Auth, "token?grant_type=password", KeyRole::Anon, &body)?;
                requests.push(session.observe(builder));
            }

            let responses: Vec<_> = join_all(requests).await.into_iter().filter_map(Result::ok).collect();
            if responses.is_empty() {
                return Err(AttackError::decode("burst responses", "every request in the burst failed"));
            }

            let throttled = responses.iter().filter(|r| r.status == 429).count();
            let evidence = json!({ "sent": self.burst, "answered": responses.len(), "throttled": throttled });

            let verdict = if throttled == 0 {
                Verdict::breached(format!("{} sign-in attempts answered without a single 429", responses.len()))
            } else {
                Verdict::secure(format!("{throttled} of {} attempts throttled", responses.len()))
            };
            Ok(verdict.with_evidence(evidence))
        })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::attack::DEFAULT_ATTACK_TIMEOUT;
    use crate::result::AttackStatus;
    use crate::session::{AttackContext, DEFAULT_REQUEST_TIMEOUT};

    const SMALL: RateLimitBurst = RateLimitBurst { burst: 8 };

    fn session_for(server: &MockServer) -> Session {
        let ctx = AttackContext::new(&server.uri(), "anon").unwrap();
        Session::new(ctx, DEFAULT_REQUEST_TIMEOUT).unwrap()
    }

    #[tokio::test]
    async fn unthrottled_burst_is_breached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
            .expect(8)
            .mount(&server)
            .await;

        let result = SMALL.execute(&session_for(&server), DEFAULT_ATTACK_TIMEOUT).await;

        assert_eq!(result.status, AttackStatus::Breached);
        assert_eq!(result.evidence.unwrap()["throttled"], 0);
    }

    #[tokio::test]
    async fn throttled_burst_is_secure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400))
            .up_to_n_times(3)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let result = SMALL.execute(&session_for(&server), DEFAULT_ATTACK_TIMEOUT).await;

        assert_eq!(result.status, AttackStatus::Secure);
        assert_eq!(result.evidence.unwrap()["throttled"], 5);
    }

    #[tokio::test]
    async fn unreachable_target_is_an_error() {
        let ctx = AttackContext::new("http://127.0.0.1:9", "anon").unwrap();
        let session = Session::new(ctx, DEFAULT_REQUEST_TIMEOUT).unwrap();

        let result = SMALL.execute(&session, DEFAULT_ATTACK_TIMEOUT).await;

        assert_eq!(result.status, AttackStatus::Error);
    }
}
