//! Log, analytics and database-meta endpoints.

use crate::check::{Check, RequestDef};
use crate::meta::{Category, Severity};
use crate::rule::Rule;
use crate::session::{KeyRole, Service};

pub(super) const CHECKS: &[Check] = &[
    crate::check! {
        id: "logging/analytics",
        name: "Log analytics endpoint reachable",
        description: "Queries the Logflare analytics endpoint with the anon key.",
        category: Category::Logging,
        severity: Severity::High,
        tags: &["logs"],
        request: RequestDef::get(Service::Root, "analytics/v1/api/endpoints/logs.all"),
        rule: Rule::Success,
    },
    crate::check! {
        id: "logging/pg-meta",
        name: "postgres-meta reachable",
        description: "Lists tables through the postgres-meta service that backs the dashboard.",
        category: Category::Logging,
        severity: Severity::Critical,
        tags: &["admin"],
        request: RequestDef::get(Service::Root, "pg/tables"),
        rule: Rule::Success,
    },
    crate::check! {
        id: "logging/auth-audit",
        name: "Auth audit log readable",
        description: "Reads auth.audit_log_entries, which records sign-ins with IP addresses.",
        category: Category::Logging,
        severity: Severity::High,
        tags: &["logs", "pii"],
        request: RequestDef::get(Service::Rest, "audit_log_entries?select=*&limit=5")
            .with_headers(&[("Accept-Profile", "auth")]),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "logging/app-logs",
        name: "Application log table readable",
        description: "Reads a public logs table, which commonly captures request bodies and tokens.",
        category: Category::Logging,
        severity: Severity::Medium,
        tags: &["logs"],
        request: RequestDef::get(Service::Rest, "logs?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "logging/request-logs",
        name: "Request log table readable",
        description: "Reads a request_logs table that records headers and bodies.",
        category: Category::Logging,
        severity: Severity::High,
        tags: &["read", "secrets"],
        request: RequestDef::get(Service::Rest, "request_logs?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "logging/error-logs",
        name: "Error log table readable",
        description: "Reads error_logs, where stack traces and payloads end up.",
        category: Category::Logging,
        severity: Severity::Medium,
        tags: &["read", "information-disclosure"],
        request: RequestDef::get(Service::Rest, "error_logs?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "logging/log-insert",
        name: "Log table writable",
        description: "Inserts a forged entry into the logs table inside a rolled-back transaction; writable logs cannot be trusted in an investigation.",
        category: Category::Logging,
        severity: Severity::Medium,
        tags: &["write", "integrity"],
        request: RequestDef::post(Service::Rest, "logs", r#"{"level":"info","message":"supaprobe"}"#)
            .with_headers(&[("Prefer", "tx=rollback, return=representation")]),
        rule: Rule::Status(&[200, 201]),
    },
    crate::check! {
        id: "logging/analytics-query",
        name: "Log Explorer SQL reachable",
        description: "Runs a log query through the analytics endpoint without credentials.",
        category: Category::Logging,
        severity: Severity::High,
        tags: &["analytics"],
        request: RequestDef::get(Service::Root, "analytics/v1/api/endpoints/logs.all?sql=select%201").with_role(KeyRole::None),
        rule: Rule::Success,
    },
    crate::check! {
        id: "logging/pg-meta-roles",
        name: "pg-meta role listing reachable",
        description: "Lists database roles through the pg-meta service.",
        category: Category::Logging,
        severity: Severity::High,
        tags: &["admin", "enumeration"],
        request: RequestDef::get(Service::Root, "pg/roles"),
        rule: Rule::Success,
    },
    crate::check! {
        id: "logging/pg-meta-query",
        name: "pg-meta query endpoint reachable",
        description: "Posts a harmless query to the pg-meta query endpoint.",
        category: Category::Logging,
        severity: Severity::Critical,
        tags: &["admin", "sql"],
        request: RequestDef::post(Service::Root, "pg/query", r#"{"query":"select 1"}"#),
        rule: Rule::Success,
    },
    crate::check! {
        id: "logging/pg-stat-activity",
        name: "Live queries visible",
        description: "Reads pg_stat_activity, which shows query text from other sessions.",
        category: Category::Logging,
        severity: Severity::High,
        tags: &["read", "information-disclosure"],
        request: RequestDef::get(Service::Rest, "pg_stat_activity?select=usename,query&limit=5")
            .with_headers(&[("Accept-Profile", "pg_catalog")]),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "logging/studio-open",
        name: "Studio dashboard exposed",
        description: "Fetches the self-hosted Studio root without credentials.",
        category: Category::Logging,
        severity: Severity::High,
        tags: &["admin"],
        request: RequestDef::get(Service::Root, "project/default").with_role(KeyRole::None),
        rule: Rule::All(&[Rule::Success, Rule::BodyContains(&["supabase studio", "__next"])]),
    },
];
