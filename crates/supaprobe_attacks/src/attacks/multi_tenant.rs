//! Cross-tenant reads in shared-schema deployments.

use crate::check::{Check, RequestDef};
use crate::meta::{Category, Severity};
use crate::rule::Rule;
use crate::session::Service;

pub(super) const CHECKS: &[Check] = &[
    crate::check! {
        id: "multi-tenant/tenant-list",
        name: "Tenant list readable",
        description: "Reads the tenants table with the anon key.",
        category: Category::MultiTenant,
        severity: Severity::High,
        tags: &["read", "enumeration"],
        request: RequestDef::get(Service::Rest, "tenants?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "multi-tenant/org-members",
        name: "Organisation memberships readable",
        description: "Reads organization_members, which maps users to tenants.",
        category: Category::MultiTenant,
        severity: Severity::High,
        tags: &["read", "pii"],
        request: RequestDef::get(Service::Rest, "organization_members?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "multi-tenant/cross-tenant-filter",
        name: "Cross-tenant rows via filter",
        description: "Reads projects of every organisation except a nil one; rows from many org_ids mean tenant isolation relies on client filters.",
        category: Category::MultiTenant,
        severity: Severity::Critical,
        tags: &["read", "idor"],
        request: RequestDef::get(
            Service::Rest,
            "projects?select=id,org_id&org_id=neq.00000000-0000-0000-0000-000000000000&limit=5",
        ),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "multi-tenant/header-spoof",
        name: "Tenant selected by request header",
        description: "Sends a spoofed x-tenant-id header; policies that trust request headers hand out another tenant's rows.",
        category: Category::MultiTenant,
        severity: Severity::High,
        tags: &["read", "idor"],
        request: RequestDef::get(Service::Rest, "projects?select=*&limit=5")
            .with_headers(&[("x-tenant-id", "1"), ("x-organization-id", "1")]),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "multi-tenant/workspace-list",
        name: "Workspaces readable",
        description: "Reads the workspaces table with the anon key.",
        category: Category::MultiTenant,
        severity: Severity::High,
        tags: &["read", "enumeration"],
        request: RequestDef::get(Service::Rest, "workspaces?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "multi-tenant/team-invites",
        name: "Team invitations readable",
        description: "Reads team_invitations; invite tokens let outsiders join a tenant.",
        category: Category::MultiTenant,
        severity: Severity::Critical,
        tags: &["read", "tokens"],
        request: RequestDef::get(Service::Rest, "team_invitations?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "multi-tenant/membership-insert",
        name: "Self-service tenant membership",
        description: "Adds a membership row to an arbitrary organisation inside a rolled-back transaction.",
        category: Category::MultiTenant,
        severity: Severity::Critical,
        tags: &["write", "privilege-escalation"],
        request: RequestDef::post(
            Service::Rest,
            "organization_members",
            r#"{"organization_id":1,"user_id":"00000000-0000-0000-0000-000000000000","role":"owner"}"#,
        )
        .with_headers(&[("Prefer", "tx=rollback, return=representation")]),
        rule: Rule::Status(&[200, 201]),
    },
    crate::check! {
        id: "multi-tenant/tenant-reassign",
        name: "Rows movable between tenants",
        description: "Rewrites org_id on projects inside a rolled-back transaction.",
        category: Category::MultiTenant,
        severity: Severity::Critical,
        tags: &["write", "idor"],
        request: RequestDef::patch(Service::Rest, "projects?id=not.is.null", r#"{"org_id":1}"#)
            .with_headers(&[("Prefer", "tx=rollback, return=representation")]),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "multi-tenant/tenant-settings",
        name: "Tenant settings readable",
        description: "Reads organization settings, which often embed integration credentials.",
        category: Category::MultiTenant,
        severity: Severity::High,
        tags: &["read", "secrets"],
        request: RequestDef::get(Service::Rest, "organization_settings?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "multi-tenant/tenant-storage",
        name: "Tenant folders listable across tenants",
        description: "Lists the root of a shared bucket; per-tenant folders should not be visible to each other.",
        category: Category::MultiTenant,
        severity: Severity::High,
        tags: &["storage", "enumeration"],
        request: RequestDef::post(Service::Storage, "object/list/tenants", r#"{"prefix":"","limit":20}"#),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "multi-tenant/claim-spoof",
        name: "Tenant taken from JWT metadata",
        description: "Calls a tenant lookup function that trusts user_metadata, which users can edit themselves.",
        category: Category::MultiTenant,
        severity: Severity::Medium,
        tags: &["rpc", "idor"],
        request: RequestDef::post(Service::Rest, "rpc/current_tenant", "{}"),
        rule: Rule::All(&[Rule::Success, Rule::BodyMatches(r"[0-9a-f-]{8,}")]),
    },
    crate::check! {
        id: "multi-tenant/billing-cross-read",
        name: "Billing of other tenants readable",
        description: "Reads organization billing rows with the anon key.",
        category: Category::MultiTenant,
        severity: Severity::Critical,
        tags: &["read", "financial"],
        request: RequestDef::get(Service::Rest, "billing?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "multi-tenant/audit-cross-read",
        name: "Tenant audit trail readable",
        description: "Reads a tenant audit_events table with the anon key.",
        category: Category::MultiTenant,
        severity: Severity::Medium,
        tags: &["read", "logs"],
        request: RequestDef::get(Service::Rest, "audit_events?select=*&limit=5"),
        rule: Rule::Rows,
    },
];
