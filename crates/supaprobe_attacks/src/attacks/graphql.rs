//! `pg_graphql` introspection, collection reads and mutations.

use crate::check::{Check, RequestDef};
use crate::meta::{Category, Severity};
use crate::rule::Rule;
use crate::session::Service;

pub(super) const CHECKS: &[Check] = &[
    crate::check! {
        id: "graphql/introspection",
        name: "GraphQL introspection enabled",
        description: "Runs an introspection query with the anon key; the schema reveals every exposed table and column.",
        category: Category::GraphQl,
        severity: Severity::Medium,
        tags: &["enumeration"],
        request: RequestDef::post(Service::GraphQl, "", r#"{"query":"{ __schema { types { name } } }"}"#),
        rule: Rule::JsonPointer("/data/__schema/types"),
    },
    crate::check! {
        id: "graphql/collection-read",
        name: "Collection readable over GraphQL",
        description: "Reads the profiles collection through pg_graphql.",
        category: Category::GraphQl,
        severity: Severity::High,
        tags: &["read"],
        request: RequestDef::post(
            Service::GraphQl,
            "",
            r#"{"query":"{ profilesCollection(first: 5) { edges { node { id } } } }"}"#,
        ),
        rule: Rule::JsonPointer("/data/profilesCollection/edges/0"),
    },
    crate::check! {
        id: "graphql/anon-mutation",
        name: "Anonymous GraphQL insert",
        description: "Inserts into the profiles collection through a GraphQL mutation.",
        category: Category::GraphQl,
        severity: Severity::High,
        tags: &["write"],
        request: RequestDef::post(
            Service::GraphQl,
            "",
            r#"{"query":"mutation { insertIntoprofilesCollection(objects: [{username: \"supaprobe\"}]) { affectedCount } }"}"#,
        ),
        rule: Rule::JsonPointer("/data/insertIntoprofilesCollection/affectedCount"),
    },
    crate::check! {
        id: "graphql/deep-query",
        name: "Unbounded query depth",
        description: "Sends a deeply nested introspection query and times it.",
        category: Category::GraphQl,
        severity: Severity::Low,
        tags: &["slow-query"],
        request: RequestDef::post(
            Service::GraphQl,
            "",
            r#"{"query":"{ __schema { types { fields { type { fields { type { fields { type { name } } } } } } } } }"}"#,
        ),
        rule: Rule::SlowerThan(3000),
    },
    crate::check! {
        id: "graphql/batch-queries",
        name: "Batched queries accepted",
        description: "Sends an array of operations in one request; batching multiplies every per-request limit.",
        category: Category::GraphQl,
        severity: Severity::Medium,
        tags: &["batching", "limits"],
        request: RequestDef::post(
            Service::GraphQl,
            "",
            r#"[{"query":"{ __typename }"},{"query":"{ __typename }"},{"query":"{ __typename }"}]"#,
        ),
        rule: Rule::All(&[Rule::Success, Rule::BodyMatches(r#"^\s*\[\s*\{"#)]),
    },
    crate::check! {
        id: "graphql/batch-login",
        name: "Batched mutations bypass rate limits",
        description: "Sends several mutations in one batched request; accepted batches let attackers brute force through one HTTP call.",
        category: Category::GraphQl,
        severity: Severity::High,
        tags: &["batching", "brute-force"],
        request: RequestDef::post(
            Service::GraphQl,
            "",
            r#"[{"query":"mutation { __typename }"},{"query":"mutation { __typename }"},{"query":"mutation { __typename }"},{"query":"mutation { __typename }"}]"#,
        ),
        rule: Rule::All(&[Rule::Success, Rule::BodyMatches(r#"^\s*\[(\s*\{[^\]]*\},?){4}"#)]),
    },
    crate::check! {
        id: "graphql/alias-amplification",
        name: "Alias amplification",
        description: "Repeats one field under many aliases in a single query; no alias cap lets one request fan out into many reads.",
        category: Category::GraphQl,
        severity: Severity::Medium,
        tags: &["aliasing", "limits"],
        request: RequestDef::post(
            Service::GraphQl,
            "",
            r#"{"query":"{ a1: profilesCollection(first: 100) { edges { node { id } } } a2: profilesCollection(first: 100) { edges { node { id } } } a3: profilesCollection(first: 100) { edges { node { id } } } a4: profilesCollection(first: 100) { edges { node { id } } } a5: profilesCollection(first: 100) { edges { node { id } } } }"}"#,
        ),
        rule: Rule::JsonPointer("/data/a5"),
    },
    crate::check! {
        id: "graphql/alias-typename-flood",
        name: "Unbounded alias count",
        description: "Requests __typename under fifty aliases.",
        category: Category::GraphQl,
        severity: Severity::Low,
        tags: &["aliasing", "limits"],
        request: RequestDef::post(
            Service::GraphQl,
            "",
            r#"{"query":"{ t1: __typename t2: __typename t3: __typename t4: __typename t5: __typename t6: __typename t7: __typename t8: __typename t9: __typename t10: __typename t11: __typename t12: __typename t13: __typename t14: __typename t15: __typename t16: __typename t17: __typename t18: __typename t19: __typename t20: __typename t21: __typename t22: __typename t23: __typename t24: __typename t25: __typename t26: __typename t27: __typename t28: __typename t29: __typename t30: __typename t31: __typename t32: __typename t33: __typename t34: __typename t35: __typename t36: __typename t37: __typename t38: __typename t39: __typename t40: __typename t41: __typename t42: __typename t43: __typename t44: __typename t45: __typename t46: __typename t47: __typename t48: __typename t49: __typename t50: __typename }"}"#,
        ),
        rule: Rule::JsonPointer("/data/t50"),
    },
    crate::check! {
        id: "graphql/field-suggestions",
        name: "Field suggestions leak schema",
        description: "Queries a misspelt field and looks for did-you-mean suggestions, which leak names even with introspection off.",
        category: Category::GraphQl,
        severity: Severity::Low,
        tags: &["enumeration"],
        request: RequestDef::post(
            Service::GraphQl,
            "",
            r#"{"query":"{ profilesCollectio { edges { node { id } } } }"}"#,
        ),
        rule: Rule::BodyContains(&["did you mean", "unknown field"]),
    },
    crate::check! {
        id: "graphql/type-introspection",
        name: "Type-level introspection allowed",
        description: "Introspects a single type with __type, which some filters forget to block.",
        category: Category::GraphQl,
        severity: Severity::Low,
        tags: &["enumeration"],
        request: RequestDef::post(
            Service::GraphQl,
            "",
            r#"{"query":"{ __type(name: \"Query\") { fields { name } } }"}"#,
        ),
        rule: Rule::JsonPointer("/data/__type/fields"),
    },
    crate::check! {
        id: "graphql/anon-update",
        name: "Anonymous GraphQL update",
        description: "Updates every profile through a GraphQL mutation with the anon key.",
        category: Category::GraphQl,
        severity: Severity::Critical,
        tags: &["write"],
        request: RequestDef::post(
            Service::GraphQl,
            "",
            r#"{"query":"mutation { updateprofilesCollection(set: {username: \"supaprobe\"}, atMost: 1) { affectedCount } }"}"#,
        ),
        rule: Rule::JsonPointer("/data/updateprofilesCollection/affectedCount"),
    },
    crate::check! {
        id: "graphql/anon-delete",
        name: "Anonymous GraphQL delete",
        description: "Deletes from the profiles collection with a filter that matches nothing real.",
        category: Category::GraphQl,
        severity: Severity::Critical,
        tags: &["write"],
        request: RequestDef::post(
            Service::GraphQl,
            "",
            r#"{"query":"mutation { deleteFromprofilesCollection(filter: {id: {eq: -1}}, atMost: 1) { affectedCount } }"}"#,
        ),
        rule: Rule::JsonPointer("/data/deleteFromprofilesCollection/affectedCount"),
    },
    crate::check! {
        id: "graphql/users-collection",
        name: "Users collection readable",
        description: "Reads a users collection through pg_graphql.",
        category: Category::GraphQl,
        severity: Severity::High,
        tags: &["read", "pii"],
        request: RequestDef::post(
            Service::GraphQl,
            "",
            r#"{"query":"{ usersCollection(first: 5) { edges { node { id } } } }"}"#,
        ),
        rule: Rule::JsonPointer("/data/usersCollection/edges/0"),
    },
    crate::check! {
        id: "graphql/node-lookup",
        name: "Global node lookup bypasses collection filters",
        description: "Fetches an object through the node interface by a guessed global id.",
        category: Category::GraphQl,
        severity: Severity::Medium,
        tags: &["read"],
        request: RequestDef::post(
            Service::GraphQl,
            "",
            r#"{"query":"{ node(nodeId: \"WyJwdWJsaWMiLCAicHJvZmlsZXMiLCAxXQ==\") { nodeId } }"}"#,
        ),
        rule: Rule::JsonPointer("/data/node/nodeId"),
    },
    crate::check! {
        id: "graphql/get-query",
        name: "Queries accepted over GET",
        description: "Runs a query through a GET URL, which makes cross-site request forgery and cache poisoning possible.",
        category: Category::GraphQl,
        severity: Severity::Low,
        tags: &["csrf"],
        request: RequestDef::get(Service::GraphQl, "?query=%7B__typename%7D"),
        rule: Rule::JsonPointer("/data/__typename"),
    },
    crate::check! {
        id: "graphql/error-verbosity",
        name: "Verbose GraphQL errors",
        description: "Sends invalid syntax and looks for internal paths or SQL in the error.",
        category: Category::GraphQl,
        severity: Severity::Low,
        tags: &["information-disclosure"],
        request: RequestDef::post(
            Service::GraphQl,
            "",
            r#"{"query":"{ profilesCollection(first: \"x\") { edges } }"}"#,
        ),
        rule: Rule::BodyContains(&["pg_graphql", "sqlstate", "resolve"]),
    },
];
