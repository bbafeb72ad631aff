//! Service-role keys used, leaked or effectively granted where an anon key belongs.

use futures::future::join_all;
use serde_json::json;
use tracing::debug;

use super::openapi::{self, MAX_TABLES};
use crate::attack::{Attack, BoxFuture};
use crate::check::{Check, RequestDef};
use crate::error::AttackError;
use crate::jwt::{self, KeyKind};
use crate::meta::{AttackMeta, Category, Severity};
use crate::result::Verdict;
use crate::rule::Rule;
use crate::session::{KeyRole, Service, Session};

/// A JWT whose payload contains `service_role` at any base64 alignment.
const SERVICE_ROLE_JWT: &str = r"eyJ[A-Za-z0-9_-]+\.eyJ[A-Za-z0-9_-]*(?:c2VydmljZV9yb2xl|NlcnZpY2Vfcm9s|zZXJ2aWNlX3Jv)[A-Za-z0-9_-]*\.";

pub(super) const CHECKS: &[Check] = &[
    crate::check! {
        id: "service-role/sql-runner",
        name: "Privileged SQL runner exposed",
        description: "Calls an exec_sql style function; these usually run as security definer with service-role privileges.",
        category: Category::ServiceRole,
        severity: Severity::Critical,
        tags: &["rpc", "privilege-escalation"],
        request: RequestDef::post(Service::Rest, "rpc/exec_sql", r#"{"query":"select current_user"}"#),
        rule: Rule::Success,
    },
    crate::check! {
        id: "service-role/sql-runner-alt",
        name: "Alternate SQL runner exposed",
        description: "Calls run_sql, another common name for a raw SQL helper.",
        category: Category::ServiceRole,
        severity: Severity::Critical,
        tags: &["rpc", "privilege-escalation"],
        request: RequestDef::post(Service::Rest, "rpc/run_sql", r#"{"sql":"select current_user"}"#),
        rule: Rule::Success,
    },
    crate::check! {
        id: "service-role/execute-sql",
        name: "execute_sql helper exposed",
        description: "Calls execute_sql with a harmless statement.",
        category: Category::ServiceRole,
        severity: Severity::Critical,
        tags: &["rpc", "privilege-escalation"],
        request: RequestDef::post(Service::Rest, "rpc/execute_sql", r#"{"query":"select 1"}"#),
        rule: Rule::Success,
    },
    crate::check! {
        id: "service-role/definer-current-user",
        name: "Security definer reports a privileged role",
        description: "Calls a whoami style function and looks for postgres or service_role in the answer.",
        category: Category::ServiceRole,
        severity: Severity::High,
        tags: &["rpc", "privilege-escalation"],
        request: RequestDef::post(Service::Rest, "rpc/whoami", "{}"),
        rule: Rule::All(&[Rule::Success, Rule::BodyContains(&["postgres", "service_role", "supabase_admin"])]),
    },
    crate::check! {
        id: "service-role/role-header-spoof",
        name: "Role claim accepted from a header",
        description: "Sends a Prefer and a custom role header naming service_role and reads auth.users.",
        category: Category::ServiceRole,
        severity: Severity::Critical,
        tags: &["headers", "forgery"],
        request: RequestDef::get(Service::Rest, "users?select=id&limit=1").with_headers(&[
            ("Accept-Profile", "auth"),
            ("X-Postgres-Role", "service_role"),
            ("Role", "service_role"),
        ]),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "service-role/key-in-settings",
        name: "Service key in public settings",
        description: "Reads a public settings table and looks for a JWT whose payload names service_role.",
        category: Category::ServiceRole,
        severity: Severity::Critical,
        tags: &["keys", "secrets"],
        request: RequestDef::get(Service::Rest, "settings?select=*&limit=20"),
        rule: Rule::BodyMatches(SERVICE_ROLE_JWT),
    },
    crate::check! {
        id: "service-role/key-in-function",
        name: "Function echoes a service key",
        description: "Calls a config function and looks for a service_role JWT in the body.",
        category: Category::ServiceRole,
        severity: Severity::Critical,
        tags: &["keys", "functions"],
        request: RequestDef::get(Service::Functions, "config"),
        rule: Rule::BodyMatches(SERVICE_ROLE_JWT),
    },
    crate::check! {
        id: "service-role/secret-key-in-bucket",
        name: "Secret key in public bucket",
        description: "Fetches a public .env from the public bucket and looks for a service key.",
        category: Category::ServiceRole,
        severity: Severity::Critical,
        tags: &["keys", "storage"],
        request: RequestDef::get(Service::Storage, "object/public/public/.env"),
        rule: Rule::BodyContains(&["SUPABASE_SERVICE_ROLE_KEY", "sb_secret_"]),
    },
    crate::check! {
        id: "service-role/grant-rpc",
        name: "Role grant function callable",
        description: "Calls a grant_admin style function with the anon key inside a rolled-back transaction.",
        category: Category::ServiceRole,
        severity: Severity::Critical,
        tags: &["rpc", "privilege-escalation"],
        request: RequestDef::post(Service::Rest, "rpc/grant_admin", r#"{"user_id":"00000000-0000-0000-0000-000000000000"}"#)
            .with_headers(&[("Prefer", "tx=rollback")]),
        rule: Rule::Success,
    },
    crate::check! {
        id: "service-role/bypassrls-roles",
        name: "Roles with BYPASSRLS listed",
        description: "Reads pg_roles for roles that bypass row-level security.",
        category: Category::ServiceRole,
        severity: Severity::Medium,
        tags: &["schema", "enumeration"],
        request: RequestDef::get(Service::Rest, "pg_roles?select=rolname&rolbypassrls=is.true")
            .with_headers(&[("Accept-Profile", "pg_catalog")]),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "service-role/admin-api-bearer",
        name: "Auth admin accepts the anon key as bearer",
        description: "Calls the GoTrue admin user list with the anon key in both headers.",
        category: Category::ServiceRole,
        severity: Severity::Critical,
        tags: &["admin"],
        request: RequestDef::get(Service::Auth, "admin/users?per_page=1"),
        rule: Rule::JsonPointer("/users"),
    },
];

pub(super) const PROBES: &[&dyn Attack] = &[&AnonKeyRole, &PrivilegeParity];

/// Decodes the supplied anon key and checks which role it carries.
pub(super) struct AnonKeyRole;

static ANON_KEY_ROLE: AttackMeta = AttackMeta {
    id: "service-role/anon-key-role",
    name: "Service-role key used as anon key",
    description: "Decodes the key the client ships as its anon key; a service_role claim means every user bypasses RLS.",
    category: Category::ServiceRole,
    severity: Severity::Critical,
    tags: &["jwt", "keys"],
    requires_service_key: false,
};

impl Attack for AnonKeyRole {
    fn meta(&self) -> &AttackMeta {
        &ANON_KEY_ROLE
    }

    fn probe<'a>(&'a self, session: &'a Session) -> BoxFuture<'a, Result<Verdict, AttackError>> {
        Box::pin(async move {
            let verdict = match jwt::classify_key(&session.context().anon_key) {
                KeyKind::ServiceRole => Verdict::breached("the anon key is a service_role key"),
                KeyKind::Anon => Verdict::secure("anon key carries the anon role"),
                KeyKind::Other(role) => Verdict::secure(format!("key carries role '{role}'; manual review recommended")),
                KeyKind::Opaque => Verdict::secure("key is not a decodable JWT; manual review recommended"),
            };
            Ok(verdict)
        })
    }
}

/// Compares what the anon and service-role keys can read from each table.
pub(super) struct PrivilegeParity;

static PRIVILEGE_PARITY: AttackMeta = AttackMeta {
    id: "service-role/privilege-parity",
    name: "Anon key matches service-role reads",
    description: "Discovers tables with the service-role key, then reads each with both keys; identical non-empty results mean RLS grants anon everything.",
    category: Category::ServiceRole,
    severity: Severity::High,
    tags: &["comparison"],
    requires_service_key: true,
};

impl Attack for PrivilegeParity {
    fn meta(&self) -> &AttackMeta {
        &PRIVILEGE_PARITY
    }

    fn probe<'a>(&'a self, session: &'a Session) -> BoxFuture<'a, Result<Verdict, AttackError>> {
        Box::pin(async move {
            let tables = openapi::discover(session, KeyRole::Service).await?;
            if tables.is_empty() {
                return Ok(Verdict::secure("service-role key sees no tables"));
            }

            let reads = tables.iter().take(MAX_TABLES).map(|table| async move {
                let anon = table.read(session, KeyRole::Anon, 5).await;
                let service = table.read(session, KeyRole::Service, 5).await;
                let rows = match (anon, service) {
                    (Ok(anon), Ok(service)) => Ok((anon.rows(), service.rows())),
                    (Err(e), _) | (_, Err(e)) => Err(e),
                };
                (table.name.as_str(), rows)
            });

            let mut identical = Vec::new();
            let mut unchecked = Vec::new();
            let mut last_error = None;
            let mut checked = 0usize;
            for (name, outcome) in join_all(reads).await {
                let (anon, service) = match outcome {
                    Ok(rows) => rows,
                    Err(e) => {
                        debug!(table = name, error = %e, "table comparison failed");
                        unchecked.push(name);
                        last_error = Some(e);
                        continue;
                    }
                };
                checked += 1;
                if let (Some(anon), Some(service)) = (anon, service)
                    && !anon.is_empty()
                    && anon == service
                {
                    identical.push(name);
                }
            }

            if checked == 0
                && let Some(e) = last_error
            {
                return Err(e);
            }

            let evidence = json!({ "checked": checked, "identical": identical, "unchecked": unchecked });
            let verdict = if identical.is_empty() {
                Verdict::secure(format!("anon reads differ from service-role reads on {checked} table(s)"))
            } else {
                Verdict::breached(format!(
                    "anon key reads the same rows as the service-role key on {} of {checked} table(s); manual review recommended",
                    identical.len()
                ))
            };
            Ok(verdict.with_evidence(evidence))
        })
    }
}
