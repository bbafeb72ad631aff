//! Per-table policy analysis driven by the PostgREST OpenAPI document.

use futures::future::join_all;
use serde_json::json;
use tracing::debug;

use super::openapi::{self, MAX_TABLES};
use crate::attack::{Attack, BoxFuture};
use crate::check::{Check, RequestDef};
use crate::error::AttackError;
use crate::meta::{AttackMeta, Category, Severity};
use crate::result::Verdict;
use crate::rule::Rule;
use crate::session::{KeyRole, Service, Session};

const CATALOG: &[(&str, &str)] = &[("Accept-Profile", "pg_catalog")];

pub(super) const CHECKS: &[Check] = &[
    crate::check! {
        id: "rls-policy/policies-readable",
        name: "Policy definitions readable",
        description: "Reads pg_policies with the anon key; policy text tells an attacker exactly which filters to satisfy.",
        category: Category::RlsPolicy,
        severity: Severity::Medium,
        tags: &["schema", "enumeration"],
        request: RequestDef::get(Service::Rest, "pg_policies?select=tablename,policyname,qual&limit=20")
            .with_headers(CATALOG),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls-policy/rls-disabled",
        name: "Public tables without RLS",
        description: "Lists public tables whose rowsecurity flag is off.",
        category: Category::RlsPolicy,
        severity: Severity::Critical,
        tags: &["schema"],
        request: RequestDef::get(Service::Rest, "pg_tables?select=tablename&schemaname=eq.public&rowsecurity=is.false")
            .with_headers(CATALOG),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls-policy/using-true",
        name: "Policies that allow everything",
        description: "Looks for policies whose USING clause is the literal true.",
        category: Category::RlsPolicy,
        severity: Severity::High,
        tags: &["schema", "permissive"],
        request: RequestDef::get(Service::Rest, "pg_policies?select=tablename,policyname&qual=eq.true")
            .with_headers(CATALOG),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls-policy/public-role-writes",
        name: "Write policies granted to public",
        description: "Looks for ALL or INSERT policies that apply to the public role rather than authenticated.",
        category: Category::RlsPolicy,
        severity: Severity::High,
        tags: &["schema", "write"],
        request: RequestDef::get(
            Service::Rest,
            "pg_policies?select=tablename,policyname,cmd&roles=cs.%7Bpublic%7D&cmd=in.(ALL,INSERT,UPDATE)",
        )
        .with_headers(CATALOG),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls-policy/user-metadata",
        name: "Policies trust user_metadata",
        description: "Looks for policies reading raw_user_meta_data or user_metadata, which users can set on themselves.",
        category: Category::RlsPolicy,
        severity: Severity::High,
        tags: &["schema", "jwt"],
        request: RequestDef::get(Service::Rest, "pg_policies?select=tablename,policyname&qual=like.*user_meta*")
            .with_headers(CATALOG),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls-policy/security-definer-views",
        name: "Views bypassing RLS",
        description: "Lists public views without security_invoker; they run as their owner and skip the caller's policies.",
        category: Category::RlsPolicy,
        severity: Severity::Medium,
        tags: &["schema", "views"],
        request: RequestDef::get(Service::Rest, "views?select=table_name&table_schema=eq.public")
            .with_headers(&[("Accept-Profile", "information_schema")]),
        rule: Rule::Rows,
    },
];

pub(super) const PROBES: &[&dyn Attack] = &[&OpenTables, &WritableTables];

/// Reads one row from every advertised table with the anon key.
pub(super) struct OpenTables;

static OPEN_TABLES: AttackMeta = AttackMeta {
    id: "rls-policy/open-tables",
    name: "Discovered tables readable",
    description: "Lists tables from the OpenAPI document and reads one row from each with the anon key.",
    category: Category::RlsPolicy,
    severity: Severity::High,
    tags: &["read", "discovery"],
    requires_service_key: false,
};

impl Attack for OpenTables {
    fn meta(&self) -> &AttackMeta {
        &OPEN_TABLES
    }

    fn probe<'a>(&'a self, session: &'a Session) -> BoxFuture<'a, Result<Verdict, AttackError>> {
        Box::pin(async move {
            let tables = openapi::discover(session, KeyRole::Anon).await?;
            if tables.is_empty() {
                return Ok(Verdict::secure("no tables advertised to the anon key"));
            }

            let reads = tables
                .iter()
                .take(MAX_TABLES)
                .map(|table| async move { (table.name.as_str(), table.read(session, KeyRole::Anon, 1).await) });

            let mut readable = Vec::new();
            let mut unchecked = Vec::new();
            let mut last_error = None;
            let mut checked = 0usize;
            for (name, outcome) in join_all(reads).await {
                match outcome {
                    Ok(observed) => {
                        checked += 1;
                        if observed.row_count() > 0 {
                            readable.push(name);
                        }
                    }
                    Err(e) => {
                        debug!(table = name, error = %e, "table read failed");
                        unchecked.push(name);
                        last_error = Some(e);
                    }
                }
            }

            if checked == 0
                && let Some(e) = last_error
            {
                return Err(e);
            }

            let evidence = json!({
                "discovered": tables.len(),
                "checked": checked,
                "readable": readable,
                "unchecked": unchecked,
            });
            let verdict = if readable.is_empty() && unchecked.is_empty() {
                Verdict::secure(format!("none of {checked} discovered table(s) returned rows"))
            } else if readable.is_empty() {
                Verdict::secure(format!(
                    "none of {checked} discovered table(s) returned rows; {} could not be read",
                    unchecked.len()
                ))
            } else {
                Verdict::breached(format!(
                    "{} of {checked} discovered table(s) return rows to the anon key; manual review recommended",
                    readable.len()
                ))
            };
            Ok(verdict.with_evidence(evidence))
        })
    }
}

/// Flags tables for which the OpenAPI document advertises anon write methods.
pub(super) struct WritableTables;

static WRITABLE_TABLES: AttackMeta = AttackMeta {
    id: "rls-policy/write-grants",
    name: "Anon role holds write grants",
    description: "PostgREST only advertises POST, PATCH and DELETE for tables the role has privileges on; each one relies entirely on RLS.",
    category: Category::RlsPolicy,
    severity: Severity::Medium,
    tags: &["write", "discovery"],
    requires_service_key: false,
};

impl Attack for WritableTables {
    fn meta(&self) -> &AttackMeta {
        &WRITABLE_TABLES
    }

    fn probe<'a>(&'a self, session: &'a Session) -> BoxFuture<'a, Result<Verdict, AttackError>> {
        Box::pin(async move {
            let tables = openapi::discover(session, KeyRole::Anon).await?;
            let writable: Vec<&str> = tables
                .iter()
                .filter(|t| t.is_writable())
                .map(|t| t.name.as_str())
                .collect();

            let evidence = json!({ "discovered": tables.len(), "writable": writable });
            let verdict = if writable.is_empty() {
                Verdict::secure(format!("no write methods advertised on {} table(s)", tables.len()))
            } else {
                Verdict::breached(format!(
                    "anon role can write to {} table(s) unless RLS blocks it; manual review recommended",
                    writable.len()
                ))
            };
            Ok(verdict.with_evidence(evidence))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::attack::DEFAULT_ATTACK_TIMEOUT;
    use crate::result::AttackStatus;
    use crate::session::{AttackContext, DEFAULT_REQUEST_TIMEOUT};

    async fn server_with_schema() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "paths": {
                    "/": {"get": {}},
                    "/posts": {"get": {}},
                    "/profiles": {"get": {}, "patch": {}},
                    "/rpc/search": {"post": {}}
                }
            })))
            .mount(&server)
            .await;
        server
    }

    fn session_for(server: &MockServer) -> Session {
        let ctx = AttackContext::new(&server.uri(), "anon").unwrap();
        Session::new(ctx, DEFAULT_REQUEST_TIMEOUT).unwrap()
    }

    #[tokio::test]
    async fn readable_discovered_table_is_breached() {
        let server = server_with_schema().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let result = OpenTables.execute(&session_for(&server), DEFAULT_ATTACK_TIMEOUT).await;

        assert_eq!(result.status, AttackStatus::Breached);
        assert_eq!(result.evidence.unwrap()["readable"], json!(["posts"]));
    }

    #[tokio::test]
    async fn failed_table_read_is_reported_without_hiding_leaks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "paths": {"/leaky": {"get": {}}, "/slow": {"get": {}}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/leaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"ssn": "123"}])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let ctx = AttackContext::new(&server.uri(), "anon").unwrap();
        let session = Session::new(ctx, Duration::from_secs(1)).unwrap();
        let result = OpenTables.execute(&session, DEFAULT_ATTACK_TIMEOUT).await;

        assert_eq!(result.status, AttackStatus::Breached);
        let evidence = result.evidence.unwrap();
        assert_eq!(evidence["checked"], 1);
        assert_eq!(evidence["readable"], json!(["leaky"]));
        assert_eq!(evidence["unchecked"], json!(["slow"]));
    }

    #[tokio::test]
    async fn every_table_read_failing_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"paths": {"/slow": {"get": {}}}})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let ctx = AttackContext::new(&server.uri(), "anon").unwrap();
        let session = Session::new(ctx, Duration::from_secs(1)).unwrap();
        let result = OpenTables.execute(&session, DEFAULT_ATTACK_TIMEOUT).await;

        assert_eq!(result.status, AttackStatus::Error);
        assert!(!result.breached);
    }

    #[tokio::test]
    async fn table_names_are_percent_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"paths": {"/order items": {"get": {}}}})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/order%20items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .mount(&server)
            .await;

        let result = OpenTables.execute(&session_for(&server), DEFAULT_ATTACK_TIMEOUT).await;

        assert_eq!(result.status, AttackStatus::Breached);
        assert_eq!(result.evidence.unwrap()["readable"], json!(["order items"]));
    }

    #[tokio::test]
    async fn hidden_schema_is_secure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = OpenTables.execute(&session_for(&server), DEFAULT_ATTACK_TIMEOUT).await;

        assert_eq!(result.status, AttackStatus::Secure);
    }

    #[tokio::test]
    async fn advertised_write_methods_are_breached() {
        let server = server_with_schema().await;

        let result = WritableTables.execute(&session_for(&server), DEFAULT_ATTACK_TIMEOUT).await;

        assert_eq!(result.status, AttackStatus::Breached);
        assert_eq!(result.evidence.unwrap()["writable"], json!(["profiles"]));
    }
}
