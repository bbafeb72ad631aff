//! Supabase Vault secrets reachable from the Data API.

use crate::check::{Check, RequestDef};
use crate::meta::{Category, Severity};
use crate::rule::Rule;
use crate::session::{Service, Verb};

const VAULT_SCHEMA: &[(&str, &str)] = &[("Accept-Profile", "vault")];

pub(super) const CHECKS: &[Check] = &[
    crate::check! {
        id: "vault/decrypted-secrets",
        name: "Decrypted secrets view exposed",
        description: "Reads vault.decrypted_secrets through PostgREST with the anon key.",
        category: Category::Vault,
        severity: Severity::Critical,
        tags: &["secrets"],
        request: RequestDef::get(Service::Rest, "decrypted_secrets?select=name,decrypted_secret&limit=5")
            .with_headers(VAULT_SCHEMA),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "vault/secrets-table",
        name: "Vault secrets table exposed",
        description: "Reads the encrypted vault.secrets table; names and nonces alone help an attacker.",
        category: Category::Vault,
        severity: Severity::High,
        tags: &["secrets"],
        request: RequestDef::get(Service::Rest, "secrets?select=*&limit=5").with_headers(VAULT_SCHEMA),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "vault/secret-rpc",
        name: "Secret reader function exposed",
        description: "Calls a public wrapper that returns vault secrets by name.",
        category: Category::Vault,
        severity: Severity::Critical,
        tags: &["secrets", "rpc"],
        request: RequestDef::post(Service::Rest, "rpc/get_secret", r#"{"secret_name":"service_role_key"}"#),
        rule: Rule::All(&[Rule::Success, Rule::BodyMatches(r#"[A-Za-z0-9_\-\.]{20,}"#)]),
    },
    crate::check! {
        id: "vault/create-secret-rpc",
        name: "vault.create_secret callable",
        description: "Calls vault.create_secret with the anon key inside a rolled-back transaction; anyone could plant or overwrite named secrets.",
        category: Category::Vault,
        severity: Severity::Critical,
        tags: &["secrets", "rpc", "write"],
        request: RequestDef::post(Service::Rest, "rpc/create_secret", r#"{"new_secret":"supaprobe","new_name":"supaprobe_check"}"#)
            .with_headers(&[("Content-Profile", "vault"), ("Prefer", "tx=rollback")]),
        rule: Rule::Success,
    },
    crate::check! {
        id: "vault/update-secret-rpc",
        name: "vault.update_secret callable",
        description: "Calls vault.update_secret with the anon key inside a rolled-back transaction.",
        category: Category::Vault,
        severity: Severity::Critical,
        tags: &["secrets", "rpc", "write"],
        request: RequestDef::post(
            Service::Rest,
            "rpc/update_secret",
            r#"{"secret_id":"00000000-0000-0000-0000-000000000000","new_secret":"supaprobe"}"#,
        )
        .with_headers(&[("Content-Profile", "vault"), ("Prefer", "tx=rollback")]),
        rule: Rule::Status(&[200, 204]),
    },
    crate::check! {
        id: "vault/secrets-insert",
        name: "vault.secrets writable",
        description: "Inserts a row into vault.secrets directly inside a rolled-back transaction.",
        category: Category::Vault,
        severity: Severity::Critical,
        tags: &["secrets", "write"],
        request: RequestDef::post(Service::Rest, "secrets", r#"{"name":"supaprobe_check","secret":"x"}"#)
            .with_headers(&[("Content-Profile", "vault"), ("Prefer", "tx=rollback, return=representation")]),
        rule: Rule::Status(&[200, 201]),
    },
    crate::check! {
        id: "vault/secrets-delete",
        name: "vault.secrets deletable",
        description: "Deletes every vault secret inside a rolled-back transaction.",
        category: Category::Vault,
        severity: Severity::Critical,
        tags: &["secrets", "write"],
        request: RequestDef::new(Verb::Delete, Service::Rest, "secrets?id=not.is.null")
            .with_headers(&[("Content-Profile", "vault"), ("Prefer", "tx=rollback, return=representation")]),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "vault/secret-names",
        name: "Vault secret names listed",
        description: "Selects only names and descriptions from vault.secrets; the inventory alone tells an attacker what to look for.",
        category: Category::Vault,
        severity: Severity::Medium,
        tags: &["secrets", "enumeration"],
        request: RequestDef::get(Service::Rest, "secrets?select=name,description&limit=20").with_headers(VAULT_SCHEMA),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "vault/decrypted-view-public",
        name: "Decrypted secrets re-exported in public",
        description: "Reads a public view named decrypted_secrets that wraps the vault view.",
        category: Category::Vault,
        severity: Severity::Critical,
        tags: &["secrets"],
        request: RequestDef::get(Service::Rest, "decrypted_secrets?select=name,decrypted_secret&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "vault/read-secret-rpc",
        name: "read_secret wrapper exposed",
        description: "Calls a public read_secret wrapper with a common secret name.",
        category: Category::Vault,
        severity: Severity::Critical,
        tags: &["secrets", "rpc"],
        request: RequestDef::post(Service::Rest, "rpc/read_secret", r#"{"secret_name":"stripe_secret_key"}"#),
        rule: Rule::All(&[Rule::Success, Rule::BodyMatches(r#"[A-Za-z0-9_\-\.]{20,}"#)]),
    },
    crate::check! {
        id: "vault/pgsodium-keys",
        name: "pgsodium key table readable",
        description: "Reads pgsodium.key, which holds the key ids that decrypt vault data.",
        category: Category::Vault,
        severity: Severity::High,
        tags: &["secrets", "keys"],
        request: RequestDef::get(Service::Rest, "key?select=id,name,key_type&limit=5")
            .with_headers(&[("Accept-Profile", "pgsodium")]),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "vault/pgsodium-decrypt",
        name: "pgsodium decrypt function callable",
        description: "Calls pgsodium.crypto_aead_det_decrypt with the anon key.",
        category: Category::Vault,
        severity: Severity::Critical,
        tags: &["secrets", "rpc"],
        request: RequestDef::post(
            Service::Rest,
            "rpc/crypto_aead_det_decrypt",
            r#"{"message":"","additional":"","key_uuid":"00000000-0000-0000-0000-000000000000"}"#,
        )
        .with_headers(&[("Content-Profile", "pgsodium")]),
        rule: Rule::Any(&[Rule::Success, Rule::BodyContains(&["invalid ciphertext", "key not found"])]),
    },
    crate::check! {
        id: "vault/secret-table-public",
        name: "Secrets table in public schema",
        description: "Reads a public.secrets table, a common home-grown stand-in for Vault.",
        category: Category::Vault,
        severity: Severity::Critical,
        tags: &["secrets", "read"],
        request: RequestDef::get(Service::Rest, "secrets?select=*&limit=5"),
        rule: Rule::Rows,
    },
];
