//! Realtime over its HTTP API.

use crate::check::{Check, RequestDef};
use crate::meta::{Category, Severity};
use crate::rule::Rule;
use crate::session::{KeyRole, Service};

pub(super) const CHECKS: &[Check] = &[
    crate::check! {
        id: "realtime/broadcast-anon",
        name: "Anonymous broadcast accepted",
        description: "Posts a broadcast message with the anon key; anyone could inject events into public channels.",
        category: Category::Realtime,
        severity: Severity::Medium,
        tags: &["broadcast"],
        request: RequestDef::post(
            Service::Realtime,
            "api/broadcast",
            r#"{"messages":[{"topic":"supaprobe","event":"message","payload":{"ok":true}}]}"#,
        ),
        rule: Rule::Status(&[200, 202]),
    },
    crate::check! {
        id: "realtime/tenant-api",
        name: "Realtime tenant API reachable",
        description: "Lists realtime tenants, an operator-only endpoint.",
        category: Category::Realtime,
        severity: Severity::Critical,
        tags: &["admin"],
        request: RequestDef::get(Service::Realtime, "api/tenants"),
        rule: Rule::Success,
    },
    crate::check! {
        id: "realtime/messages-read",
        name: "Realtime messages readable",
        description: "Reads realtime.messages through PostgREST; private-channel payloads leak when it has no policy.",
        category: Category::Realtime,
        severity: Severity::High,
        tags: &["read"],
        request: RequestDef::get(Service::Rest, "messages?select=topic,payload&limit=5")
            .with_headers(&[("Accept-Profile", "realtime")]),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "realtime/private-broadcast",
        name: "Private channel broadcast accepted",
        description: "Broadcasts to a private channel over HTTP with the anon key; private channels should require a realtime.messages policy.",
        category: Category::Realtime,
        severity: Severity::High,
        tags: &["broadcast", "private-channel"],
        request: RequestDef::post(
            Service::Realtime,
            "api/broadcast",
            r#"{"messages":[{"topic":"room:admin","event":"message","payload":{"text":"supaprobe"},"private":true}]}"#,
        ),
        rule: Rule::Status(&[200, 202]),
    },
    crate::check! {
        id: "realtime/presence-over-http",
        name: "Presence events injectable over HTTP",
        description: "Sends a presence-shaped broadcast to a private room; accepted events let anyone fake who is online.",
        category: Category::Realtime,
        severity: Severity::Medium,
        tags: &["presence", "private-channel"],
        request: RequestDef::post(
            Service::Realtime,
            "api/broadcast",
            r#"{"messages":[{"topic":"room:lobby","event":"presence","payload":{"type":"presence","event":"join","key":"supaprobe"},"private":true}]}"#,
        ),
        rule: Rule::Status(&[200, 202]),
    },
    crate::check! {
        id: "realtime/broadcast-no-key",
        name: "Broadcast accepted without an API key",
        description: "Broadcasts with no credentials at all.",
        category: Category::Realtime,
        severity: Severity::High,
        tags: &["broadcast", "auth-bypass"],
        request: RequestDef::post(
            Service::Realtime,
            "api/broadcast",
            r#"{"messages":[{"topic":"public","event":"message","payload":{}}]}"#,
        )
        .with_role(KeyRole::None),
        rule: Rule::Status(&[200, 202]),
    },
    crate::check! {
        id: "realtime/broadcast-flood",
        name: "Oversized broadcast batch accepted",
        description: "Sends a batch of broadcast messages in one request; no batch cap lets one client fan out heavy traffic.",
        category: Category::Realtime,
        severity: Severity::Low,
        tags: &["broadcast", "limits"],
        request: RequestDef::post(
            Service::Realtime,
            "api/broadcast",
            r#"{"messages":[{"topic":"a","event":"e","payload":{}},{"topic":"b","event":"e","payload":{}},{"topic":"c","event":"e","payload":{}},{"topic":"d","event":"e","payload":{}},{"topic":"e","event":"e","payload":{}}]}"#,
        ),
        rule: Rule::Status(&[200, 202]),
    },
    crate::check! {
        id: "realtime/channel-join-anon",
        name: "Channel join handshake without credentials",
        description: "Opens the realtime websocket handshake with no API key; a 101 upgrade means anyone can join channels.",
        category: Category::Realtime,
        severity: Severity::Medium,
        tags: &["channels", "auth-bypass"],
        request: RequestDef::get(Service::Realtime, "websocket?vsn=1.0.0")
            .with_role(KeyRole::None)
            .with_headers(&[
                ("Connection", "Upgrade"),
                ("Upgrade", "websocket"),
                ("Sec-WebSocket-Version", "13"),
                ("Sec-WebSocket-Key", "c3VwYXByb2JlLWhhbmRzaGFrZQ=="),
            ]),
        rule: Rule::Status(&[101]),
    },
    crate::check! {
        id: "realtime/channel-join-query-key",
        name: "Channel join with a forged key",
        description: "Opens the websocket handshake with a nonsense apikey query parameter.",
        category: Category::Realtime,
        severity: Severity::High,
        tags: &["channels", "forgery"],
        request: RequestDef::get(Service::Realtime, "websocket?vsn=1.0.0&apikey=supaprobe-not-a-key")
            .with_role(KeyRole::None)
            .with_headers(&[
                ("Connection", "Upgrade"),
                ("Upgrade", "websocket"),
                ("Sec-WebSocket-Version", "13"),
                ("Sec-WebSocket-Key", "c3VwYXByb2JlLWhhbmRzaGFrZQ=="),
            ]),
        rule: Rule::Status(&[101]),
    },
    crate::check! {
        id: "realtime/subscriptions-read",
        name: "Realtime subscriptions readable",
        description: "Reads realtime.subscription; it lists which users watch which tables and filters.",
        category: Category::Realtime,
        severity: Severity::High,
        tags: &["read", "channels"],
        request: RequestDef::get(Service::Rest, "subscription?select=*&limit=5")
            .with_headers(&[("Accept-Profile", "realtime")]),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "realtime/messages-insert",
        name: "Realtime messages writable",
        description: "Inserts into realtime.messages directly, bypassing broadcast authorisation.",
        category: Category::Realtime,
        severity: Severity::High,
        tags: &["write", "private-channel"],
        request: RequestDef::post(Service::Rest, "messages", r#"{"topic":"room:admin","extension":"broadcast","payload":{}}"#)
            .with_headers(&[
                ("Content-Profile", "realtime"),
                ("Prefer", "tx=rollback, return=representation"),
            ]),
        rule: Rule::Status(&[200, 201]),
    },
    crate::check! {
        id: "realtime/publication-tables",
        name: "Replicated tables listed",
        description: "Reads pg_publication_tables for supabase_realtime, which names every table streamed to clients.",
        category: Category::Realtime,
        severity: Severity::Low,
        tags: &["enumeration"],
        request: RequestDef::get(Service::Rest, "pg_publication_tables?select=tablename&pubname=eq.supabase_realtime")
            .with_headers(&[("Accept-Profile", "pg_catalog")]),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "realtime/send-rpc",
        name: "realtime.send callable",
        description: "Calls realtime.send with the anon key, which writes broadcast messages as the database.",
        category: Category::Realtime,
        severity: Severity::Medium,
        tags: &["rpc", "broadcast"],
        request: RequestDef::post(
            Service::Rest,
            "rpc/send",
            r#"{"payload":{},"event":"message","topic":"room:admin","private":true}"#,
        )
        .with_headers(&[("Content-Profile", "realtime")]),
        rule: Rule::Success,
    },
    crate::check! {
        id: "realtime/health-details",
        name: "Realtime health leaks internals",
        description: "Reads the realtime health route and looks for node names and database details.",
        category: Category::Realtime,
        severity: Severity::Low,
        tags: &["information-disclosure"],
        request: RequestDef::get(Service::Realtime, "api/health"),
        rule: Rule::BodyContains(&["db_connected", "node", "region"]),
    },
];
