//! PostgREST schema switching, metadata and error verbosity.

use crate::check::{Check, RequestDef};
use crate::meta::{Category, Severity};
use crate::rule::Rule;
use crate::session::{Service, Verb};

pub(super) const CHECKS: &[Check] = &[
    crate::check! {
        id: "postgrest/openapi",
        name: "OpenAPI schema exposed",
        description: "Fetches the root OpenAPI document, which lists every table and function the anon role can see.",
        category: Category::PostgRest,
        severity: Severity::Low,
        tags: &["enumeration"],
        request: RequestDef::get(Service::Rest, ""),
        rule: Rule::JsonPointer("/paths"),
    },
    crate::check! {
        id: "postgrest/auth-schema",
        name: "auth schema exposed",
        description: "Switches to the auth schema with Accept-Profile and reads auth.users.",
        category: Category::PostgRest,
        severity: Severity::Critical,
        tags: &["schema", "pii"],
        request: RequestDef::get(Service::Rest, "users?select=id,email&limit=5")
            .with_headers(&[("Accept-Profile", "auth")]),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "postgrest/pg-catalog",
        name: "pg_catalog exposed",
        description: "Switches to pg_catalog and lists database roles.",
        category: Category::PostgRest,
        severity: Severity::High,
        tags: &["schema", "enumeration"],
        request: RequestDef::get(Service::Rest, "pg_roles?select=rolname&limit=5")
            .with_headers(&[("Accept-Profile", "pg_catalog")]),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "postgrest/information-schema",
        name: "information_schema exposed",
        description: "Switches to information_schema and lists columns.",
        category: Category::PostgRest,
        severity: Severity::Medium,
        tags: &["schema", "enumeration"],
        request: RequestDef::get(Service::Rest, "columns?select=table_name,column_name&limit=5")
            .with_headers(&[("Accept-Profile", "information_schema")]),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "postgrest/schema-hint",
        name: "Table names leaked in errors",
        description: "Requests a misspelt table; the schema cache hint suggests real table names.",
        category: Category::PostgRest,
        severity: Severity::Low,
        tags: &["information-disclosure"],
        request: RequestDef::get(Service::Rest, "profile?select=id&limit=1"),
        rule: Rule::BodyContains(&["perhaps you meant"]),
    },
    crate::check! {
        id: "postgrest/storage-schema",
        name: "storage schema exposed",
        description: "Switches to the storage schema with Accept-Profile and reads storage.buckets.",
        category: Category::PostgRest,
        severity: Severity::Medium,
        tags: &["schema", "accept-profile"],
        request: RequestDef::get(Service::Rest, "buckets?select=id,public&limit=5")
            .with_headers(&[("Accept-Profile", "storage")]),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "postgrest/extensions-schema",
        name: "extensions schema exposed",
        description: "Switches to the extensions schema and lists its functions through the OpenAPI document.",
        category: Category::PostgRest,
        severity: Severity::Low,
        tags: &["schema", "accept-profile"],
        request: RequestDef::get(Service::Rest, "").with_headers(&[("Accept-Profile", "extensions")]),
        rule: Rule::JsonPointer("/paths"),
    },
    crate::check! {
        id: "postgrest/private-schema",
        name: "private schema exposed",
        description: "Switches to a schema named private; it exists to be unreachable from the API.",
        category: Category::PostgRest,
        severity: Severity::High,
        tags: &["schema", "accept-profile"],
        request: RequestDef::get(Service::Rest, "").with_headers(&[("Accept-Profile", "private")]),
        rule: Rule::JsonPointer("/paths"),
    },
    crate::check! {
        id: "postgrest/schema-list-leak",
        name: "Exposed schemas listed in errors",
        description: "Requests an unknown schema; the error lists every schema PostgREST serves.",
        category: Category::PostgRest,
        severity: Severity::Low,
        tags: &["schema", "information-disclosure"],
        request: RequestDef::get(Service::Rest, "profiles?select=id&limit=1")
            .with_headers(&[("Accept-Profile", "supaprobe_missing")]),
        rule: Rule::BodyContains(&["the schema must be one of the following"]),
    },
    crate::check! {
        id: "postgrest/content-profile-write",
        name: "Write into a non-default schema",
        description: "Inserts through Content-Profile into auth.users inside a rolled-back transaction.",
        category: Category::PostgRest,
        severity: Severity::Critical,
        tags: &["schema", "write", "content-profile"],
        request: RequestDef::post(Service::Rest, "users", r#"{"email":"supaprobe@example.com"}"#)
            .with_headers(&[("Content-Profile", "auth"), ("Prefer", "tx=rollback, return=representation")]),
        rule: Rule::Status(&[200, 201]),
    },
    crate::check! {
        id: "postgrest/prefer-tx-commit",
        name: "Clients control transaction end",
        description: "Sends Prefer: tx=commit on a harmless read; a Preference-Applied echo means transaction control is left to clients.",
        category: Category::PostgRest,
        severity: Severity::Low,
        tags: &["prefer"],
        request: RequestDef::get(Service::Rest, "profiles?select=id&limit=1").with_headers(&[("Prefer", "tx=commit")]),
        rule: Rule::HeaderContains("preference-applied", "tx=commit"),
    },
    crate::check! {
        id: "postgrest/prefer-count-exact",
        name: "Exact counts on demand",
        description: "Requests count=exact on a large table; row counts leak through Content-Range and cost a full scan.",
        category: Category::PostgRest,
        severity: Severity::Low,
        tags: &["prefer", "enumeration"],
        request: RequestDef::new(Verb::Head, Service::Rest, "profiles?select=id").with_headers(&[("Prefer", "count=exact")]),
        rule: Rule::All(&[Rule::Success, Rule::HeaderContains("content-range", "/")]),
    },
    crate::check! {
        id: "postgrest/prefer-missing-default",
        name: "Missing columns defaulted on insert",
        description: "Inserts with missing=default inside a rolled-back transaction, which fills server-side defaults that policies may trust.",
        category: Category::PostgRest,
        severity: Severity::Low,
        tags: &["prefer", "write"],
        request: RequestDef::post(Service::Rest, "profiles?columns=username", r#"[{"username":"supaprobe"}]"#)
            .with_headers(&[("Prefer", "missing=default, tx=rollback, return=representation")]),
        rule: Rule::Status(&[200, 201]),
    },
    crate::check! {
        id: "postgrest/prefer-handling-lenient",
        name: "Lenient preference handling",
        description: "Sends an unknown preference under handling=lenient; strict handling should reject it.",
        category: Category::PostgRest,
        severity: Severity::Low,
        tags: &["prefer"],
        request: RequestDef::get(Service::Rest, "profiles?select=id&limit=1")
            .with_headers(&[("Prefer", "handling=lenient, supaprobe=1")]),
        rule: Rule::Success,
    },
    crate::check! {
        id: "postgrest/max-affected",
        name: "Bulk updates without max-affected",
        description: "Patches every profile with max-affected=1 inside a rolled-back transaction; success on many rows means no guard rail.",
        category: Category::PostgRest,
        severity: Severity::Medium,
        tags: &["prefer", "write"],
        request: RequestDef::patch(Service::Rest, "profiles?id=not.is.null", r#"{"updated_at":"now()"}"#).with_headers(&[(
            "Prefer",
            "handling=strict, max-affected=1, tx=rollback, return=representation",
        )]),
        rule: Rule::All(&[Rule::Success, Rule::BodyMatches(r#"^\s*\[\s*\{[^\]]*\}\s*,\s*\{"#)]),
    },
    crate::check! {
        id: "postgrest/plan-explain",
        name: "Query plans exposed",
        description: "Asks for the execution plan with the pgrst.plan media type.",
        category: Category::PostgRest,
        severity: Severity::Medium,
        tags: &["information-disclosure"],
        request: RequestDef::get(Service::Rest, "profiles?select=id&limit=1")
            .with_headers(&[("Accept", "application/vnd.pgrst.plan+json")]),
        rule: Rule::BodyContains(&["Plan", "Node Type"]),
    },
    crate::check! {
        id: "postgrest/singular-object",
        name: "Singular object response leaks a row",
        description: "Requests a single object by a guessed id with the object media type.",
        category: Category::PostgRest,
        severity: Severity::Low,
        tags: &["read"],
        request: RequestDef::get(Service::Rest, "profiles?select=*&limit=1")
            .with_headers(&[("Accept", "application/vnd.pgrst.object+json")]),
        rule: Rule::JsonPointer("/id"),
    },
    crate::check! {
        id: "postgrest/rpc-get",
        name: "Functions callable over GET",
        description: "Calls a function with GET, which makes it reachable from links and image tags.",
        category: Category::PostgRest,
        severity: Severity::Low,
        tags: &["rpc", "csrf"],
        request: RequestDef::get(Service::Rest, "rpc/search?query=supaprobe"),
        rule: Rule::Success,
    },
    crate::check! {
        id: "postgrest/rpc-list",
        name: "Function signatures advertised",
        description: "Reads the OpenAPI document and looks for rpc paths.",
        category: Category::PostgRest,
        severity: Severity::Low,
        tags: &["rpc", "enumeration"],
        request: RequestDef::get(Service::Rest, ""),
        rule: Rule::BodyContains(&["\"/rpc/"]),
    },
    crate::check! {
        id: "postgrest/range-header",
        name: "Range header overrides limits",
        description: "Asks for rows 0-9999 via the Range header on a table without a limit parameter.",
        category: Category::PostgRest,
        severity: Severity::Low,
        tags: &["limits"],
        request: RequestDef::get(Service::Rest, "profiles?select=id").with_headers(&[("Range-Unit", "items"), ("Range", "0-9999")]),
        rule: Rule::HeaderContains("content-range", "0-"),
    },
    crate::check! {
        id: "postgrest/aggregates",
        name: "Aggregate functions enabled",
        description: "Selects count() over a table; aggregates let anyone compute statistics over rows they can only partly see.",
        category: Category::PostgRest,
        severity: Severity::Low,
        tags: &["enumeration"],
        request: RequestDef::get(Service::Rest, "profiles?select=count()"),
        rule: Rule::JsonPointer("/0/count"),
    },
];
