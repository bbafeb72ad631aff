//! Backups, dumps and export artefacts.

use crate::check::{Check, RequestDef};
use crate::meta::{Category, Severity};
use crate::rule::Rule;
use crate::session::Service;

pub(super) const CHECKS: &[Check] = &[
    crate::check! {
        id: "backup/bucket-list",
        name: "Backup bucket listable",
        description: "Lists objects in a bucket named backups.",
        category: Category::Backup,
        severity: Severity::Critical,
        tags: &["storage"],
        request: RequestDef::post(Service::Storage, "object/list/backups", r#"{"prefix":"","limit":10}"#),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "backup/sql-dump",
        name: "Public SQL dump",
        description: "Fetches a conventional dump path from a public backups bucket.",
        category: Category::Backup,
        severity: Severity::Critical,
        tags: &["storage"],
        request: RequestDef::get(Service::Storage, "object/public/backups/backup.sql"),
        rule: Rule::All(&[Rule::Success, Rule::BodyContains(&["create table", "insert into", "copy "])]),
    },
    crate::check! {
        id: "backup/export-rpc",
        name: "Data export function callable",
        description: "Calls an export_data function with the anon key.",
        category: Category::Backup,
        severity: Severity::High,
        tags: &["rpc"],
        request: RequestDef::post(Service::Rest, "rpc/export_data", "{}"),
        rule: Rule::Success,
    },
    crate::check! {
        id: "backup/dump-gz",
        name: "Compressed dump in public bucket",
        description: "Fetches a gzipped dump from a public backups bucket.",
        category: Category::Backup,
        severity: Severity::Critical,
        tags: &["storage"],
        request: RequestDef::get(Service::Storage, "object/public/backups/backup.sql.gz"),
        rule: Rule::Success,
    },
    crate::check! {
        id: "backup/dump-root-bucket",
        name: "Dump in the public bucket",
        description: "Fetches dump.sql from a bucket named public.",
        category: Category::Backup,
        severity: Severity::Critical,
        tags: &["storage"],
        request: RequestDef::get(Service::Storage, "object/public/public/dump.sql"),
        rule: Rule::All(&[Rule::Success, Rule::BodyContains(&["create table", "insert into", "copy "])]),
    },
    crate::check! {
        id: "backup/db-backup-bucket",
        name: "db-backups bucket listable",
        description: "Lists a bucket named db-backups with the anon key.",
        category: Category::Backup,
        severity: Severity::Critical,
        tags: &["storage"],
        request: RequestDef::post(Service::Storage, "object/list/db-backups", r#"{"prefix":"","limit":10}"#),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "backup/exports-bucket",
        name: "Exports bucket listable",
        description: "Lists a bucket named exports, where CSV exports tend to accumulate.",
        category: Category::Backup,
        severity: Severity::High,
        tags: &["storage"],
        request: RequestDef::post(Service::Storage, "object/list/exports", r#"{"prefix":"","limit":10}"#),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "backup/csv-export",
        name: "CSV export publicly downloadable",
        description: "Fetches users.csv from a public exports bucket.",
        category: Category::Backup,
        severity: Severity::High,
        tags: &["storage", "pii"],
        request: RequestDef::get(Service::Storage, "object/public/exports/users.csv"),
        rule: Rule::All(&[Rule::Success, Rule::BodyContains(&["email"])]),
    },
    crate::check! {
        id: "backup/backup-table",
        name: "Backup copy of a table readable",
        description: "Reads users_backup, a copy table that rarely gets the original's policies.",
        category: Category::Backup,
        severity: Severity::Critical,
        tags: &["read", "pii"],
        request: RequestDef::get(Service::Rest, "users_backup?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "backup/profiles-old",
        name: "Stale table copy readable",
        description: "Reads profiles_old with the anon key.",
        category: Category::Backup,
        severity: Severity::High,
        tags: &["read", "pii"],
        request: RequestDef::get(Service::Rest, "profiles_old?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "backup/csv-table-export",
        name: "Whole-table CSV export",
        description: "Requests every profile as one CSV document through PostgREST content negotiation.",
        category: Category::Backup,
        severity: Severity::Medium,
        tags: &["read", "export"],
        request: RequestDef::get(Service::Rest, "profiles?select=*").with_headers(&[("Accept", "text/csv")]),
        rule: Rule::All(&[Rule::Success, Rule::BodyMatches(r"(?m)^[^,\n]+(,[^,\n]+)+\n[^\n]+")]),
    },
    crate::check! {
        id: "backup/restore-rpc",
        name: "Restore function callable",
        description: "Calls a restore_backup function with the anon key.",
        category: Category::Backup,
        severity: Severity::Critical,
        tags: &["rpc", "write"],
        request: RequestDef::post(Service::Rest, "rpc/restore_backup", r#"{"backup_id":"latest"}"#)
            .with_headers(&[("Prefer", "tx=rollback")]),
        rule: Rule::Success,
    },
    crate::check! {
        id: "backup/migrations-table",
        name: "Migration history readable",
        description: "Reads supabase_migrations.schema_migrations, which contains the full DDL of the project.",
        category: Category::Backup,
        severity: Severity::Medium,
        tags: &["schema", "read"],
        request: RequestDef::get(Service::Rest, "schema_migrations?select=version,statements&limit=5")
            .with_headers(&[("Accept-Profile", "supabase_migrations")]),
        rule: Rule::Rows,
    },
];
