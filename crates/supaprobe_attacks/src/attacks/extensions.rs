//! Dangerous Postgres extensions reachable through RPC.

use crate::check::{Check, RequestDef};
use crate::meta::{Category, Severity};
use crate::rule::Rule;
use crate::session::Service;

pub(super) const CHECKS: &[Check] = &[
    crate::check! {
        id: "extensions/http-ssrf",
        name: "pgsql-http callable",
        description: "Calls http_get against the cloud metadata address; success means server-side request forgery from the database.",
        category: Category::Extensions,
        severity: Severity::Critical,
        tags: &["ssrf", "rpc"],
        request: RequestDef::post(
            Service::Rest,
            "rpc/http_get",
            r#"{"uri":"http://169.254.169.254/latest/meta-data/"}"#,
        ),
        rule: Rule::Success,
    },
    crate::check! {
        id: "extensions/pg-net",
        name: "pg_net callable",
        description: "Queues an outbound request through net.http_get with the anon key.",
        category: Category::Extensions,
        severity: Severity::Critical,
        tags: &["ssrf", "rpc"],
        request: RequestDef::post(Service::Rest, "rpc/http_get", r#"{"url":"https://example.com/"}"#)
            .with_headers(&[("Content-Profile", "net")]),
        rule: Rule::Success,
    },
    crate::check! {
        id: "extensions/dblink",
        name: "dblink callable",
        description: "Opens a dblink connection from the anon role.",
        category: Category::Extensions,
        severity: Severity::Critical,
        tags: &["rpc"],
        request: RequestDef::post(
            Service::Rest,
            "rpc/dblink_connect",
            r#"{"connstr":"dbname=postgres"}"#,
        ),
        rule: Rule::Success,
    },
    crate::check! {
        id: "extensions/pg-stat-statements",
        name: "Query statistics readable",
        description: "Reads pg_stat_statements, which records query text from every role.",
        category: Category::Extensions,
        severity: Severity::High,
        tags: &["read", "information-disclosure"],
        request: RequestDef::get(Service::Rest, "pg_stat_statements?select=query&limit=5")
            .with_headers(&[("Accept-Profile", "extensions")]),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "extensions/installed-list",
        name: "Installed extensions listable",
        description: "Lists installed extensions and versions from pg_extension.",
        category: Category::Extensions,
        severity: Severity::Low,
        tags: &["enumeration"],
        request: RequestDef::get(Service::Rest, "pg_extension?select=extname,extversion")
            .with_headers(&[("Accept-Profile", "pg_catalog")]),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "extensions/http-post",
        name: "pgsql-http POST callable",
        description: "Calls http_post to an external host; the database becomes an outbound relay.",
        category: Category::Extensions,
        severity: Severity::Critical,
        tags: &["ssrf", "rpc"],
        request: RequestDef::post(
            Service::Rest,
            "rpc/http_post",
            r#"{"uri":"https://example.com/","content":"supaprobe","content_type":"text/plain"}"#,
        ),
        rule: Rule::Success,
    },
    crate::check! {
        id: "extensions/pg-net-responses",
        name: "pg_net responses readable",
        description: "Reads net._http_response, which stores bodies of every outbound call including auth headers echoed back.",
        category: Category::Extensions,
        severity: Severity::High,
        tags: &["read", "secrets"],
        request: RequestDef::get(Service::Rest, "_http_response?select=status_code,content&limit=5")
            .with_headers(&[("Accept-Profile", "net")]),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "extensions/pg-cron-jobs",
        name: "pg_cron jobs readable",
        description: "Reads cron.job, whose command text often embeds keys and URLs.",
        category: Category::Extensions,
        severity: Severity::High,
        tags: &["read", "secrets"],
        request: RequestDef::get(Service::Rest, "job?select=jobname,command&limit=5")
            .with_headers(&[("Accept-Profile", "cron")]),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "extensions/pg-cron-schedule",
        name: "pg_cron schedulable",
        description: "Calls cron.schedule with the anon key inside a rolled-back transaction.",
        category: Category::Extensions,
        severity: Severity::Critical,
        tags: &["rpc", "write"],
        request: RequestDef::post(
            Service::Rest,
            "rpc/schedule",
            r#"{"job_name":"supaprobe","schedule":"0 0 1 1 *","command":"select 1"}"#,
        )
        .with_headers(&[("Content-Profile", "cron"), ("Prefer", "tx=rollback")]),
        rule: Rule::Success,
    },
    crate::check! {
        id: "extensions/lo-import",
        name: "Large object import callable",
        description: "Calls lo_import with a server path; success reads files off the database host.",
        category: Category::Extensions,
        severity: Severity::Critical,
        tags: &["rpc", "file-read"],
        request: RequestDef::post(Service::Rest, "rpc/lo_import", r#"{"path":"/etc/passwd"}"#),
        rule: Rule::Success,
    },
    crate::check! {
        id: "extensions/pg-read-file",
        name: "pg_read_file callable",
        description: "Calls pg_read_file on the Postgres config.",
        category: Category::Extensions,
        severity: Severity::Critical,
        tags: &["rpc", "file-read"],
        request: RequestDef::post(Service::Rest, "rpc/pg_read_file", r#"{"filename":"postgresql.conf"}"#),
        rule: Rule::BodyContains(&["listen_addresses", "shared_buffers"]),
    },
    crate::check! {
        id: "extensions/wrappers-servers",
        name: "Foreign servers listed",
        description: "Reads pg_foreign_server; Wrappers connections often carry API keys in their options.",
        category: Category::Extensions,
        severity: Severity::High,
        tags: &["read", "secrets"],
        request: RequestDef::get(Service::Rest, "pg_foreign_server?select=srvname,srvoptions")
            .with_headers(&[("Accept-Profile", "pg_catalog")]),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "extensions/pgjwt-sign",
        name: "JWT signing function callable",
        description: "Calls extensions.sign, which mints tokens with any secret handed to it or stored in settings.",
        category: Category::Extensions,
        severity: Severity::High,
        tags: &["rpc", "jwt"],
        request: RequestDef::post(Service::Rest, "rpc/sign", r#"{"payload":{"role":"service_role"},"secret":"x"}"#)
            .with_headers(&[("Content-Profile", "extensions")]),
        rule: Rule::Success,
    },
    crate::check! {
        id: "extensions/plv8-eval",
        name: "plv8 evaluation callable",
        description: "Calls a plv8 eval helper with a harmless expression.",
        category: Category::Extensions,
        severity: Severity::Critical,
        tags: &["rpc", "code-execution"],
        request: RequestDef::post(Service::Rest, "rpc/plv8_eval", r#"{"code":"1+1"}"#),
        rule: Rule::BodyContains(&["2"]),
    },
];
