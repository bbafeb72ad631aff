//! Row-level security: common tables read and written with the anon key.

use crate::check::{Check, RequestDef};
use crate::meta::{Category, Severity};
use crate::rule::Rule;
use crate::session::{Service, Verb};

const ROLLBACK: &[(&str, &str)] = &[("Prefer", "tx=rollback, return=representation")];

pub(super) const CHECKS: &[Check] = &[
    crate::check! {
        id: "rls/users-read",
        name: "Users table readable",
        description: "Reads public.users with the anon key; rows mean RLS is off or a policy allows anon reads.",
        category: Category::Rls,
        severity: Severity::Critical,
        tags: &["read", "pii"],
        request: RequestDef::get(Service::Rest, "users?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/profiles-read",
        name: "Profiles table readable",
        description: "Reads public.profiles with the anon key.",
        category: Category::Rls,
        severity: Severity::High,
        tags: &["read", "pii"],
        request: RequestDef::get(Service::Rest, "profiles?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/orders-read",
        name: "Orders table readable",
        description: "Reads public.orders with the anon key.",
        category: Category::Rls,
        severity: Severity::High,
        tags: &["read"],
        request: RequestDef::get(Service::Rest, "orders?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/payments-read",
        name: "Payments table readable",
        description: "Reads public.payments with the anon key.",
        category: Category::Rls,
        severity: Severity::Critical,
        tags: &["read", "financial"],
        request: RequestDef::get(Service::Rest, "payments?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/messages-read",
        name: "Messages table readable",
        description: "Reads public.messages with the anon key.",
        category: Category::Rls,
        severity: Severity::High,
        tags: &["read", "pii"],
        request: RequestDef::get(Service::Rest, "messages?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/anon-insert",
        name: "Anonymous insert accepted",
        description: "Inserts a profile row with the anon key inside a rolled-back transaction.",
        category: Category::Rls,
        severity: Severity::High,
        tags: &["write"],
        request: RequestDef::post(Service::Rest, "profiles", r#"{"username":"supaprobe"}"#)
            .with_headers(ROLLBACK),
        rule: Rule::Status(&[200, 201]),
    },
    crate::check! {
        id: "rls/anon-update",
        name: "Anonymous update accepted",
        description: "Updates every profile row with the anon key inside a rolled-back transaction.",
        category: Category::Rls,
        severity: Severity::Critical,
        tags: &["write"],
        request: RequestDef::patch(Service::Rest, "profiles?id=not.is.null", r#"{"updated_at":"now()"}"#)
            .with_headers(ROLLBACK),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/anon-delete",
        name: "Anonymous delete accepted",
        description: "Deletes profile rows with the anon key inside a rolled-back transaction.",
        category: Category::Rls,
        severity: Severity::Critical,
        tags: &["write"],
        request: RequestDef::new(Verb::Delete, Service::Rest, "profiles?id=not.is.null")
            .with_headers(ROLLBACK),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/customers-read",
        name: "Customers table readable",
        description: "Reads public.customers with the anon key.",
        category: Category::Rls,
        severity: Severity::Critical,
        tags: &["read", "pii"],
        request: RequestDef::get(Service::Rest, "customers?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/invoices-read",
        name: "Invoices table readable",
        description: "Reads public.invoices with the anon key.",
        category: Category::Rls,
        severity: Severity::High,
        tags: &["read", "financial"],
        request: RequestDef::get(Service::Rest, "invoices?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/subscriptions-read",
        name: "Subscriptions table readable",
        description: "Reads public.subscriptions; plan and billing state leak to anyone.",
        category: Category::Rls,
        severity: Severity::Medium,
        tags: &["read", "financial"],
        request: RequestDef::get(Service::Rest, "subscriptions?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/transactions-read",
        name: "Transactions table readable",
        description: "Reads public.transactions with the anon key.",
        category: Category::Rls,
        severity: Severity::Critical,
        tags: &["read", "financial"],
        request: RequestDef::get(Service::Rest, "transactions?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/wallets-read",
        name: "Wallet balances readable",
        description: "Reads public.wallets with the anon key.",
        category: Category::Rls,
        severity: Severity::Critical,
        tags: &["read", "financial"],
        request: RequestDef::get(Service::Rest, "wallets?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/bank-accounts-read",
        name: "Bank accounts readable",
        description: "Reads public.bank_accounts with the anon key.",
        category: Category::Rls,
        severity: Severity::Critical,
        tags: &["read", "financial", "pii"],
        request: RequestDef::get(Service::Rest, "bank_accounts?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/addresses-read",
        name: "Addresses table readable",
        description: "Reads public.addresses with the anon key.",
        category: Category::Rls,
        severity: Severity::High,
        tags: &["read", "pii"],
        request: RequestDef::get(Service::Rest, "addresses?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/contacts-read",
        name: "Contacts table readable",
        description: "Reads public.contacts with the anon key.",
        category: Category::Rls,
        severity: Severity::High,
        tags: &["read", "pii"],
        request: RequestDef::get(Service::Rest, "contacts?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/leads-read",
        name: "Sales leads readable",
        description: "Reads public.leads with the anon key.",
        category: Category::Rls,
        severity: Severity::Medium,
        tags: &["read", "pii"],
        request: RequestDef::get(Service::Rest, "leads?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/employees-read",
        name: "Employees table readable",
        description: "Reads public.employees with the anon key.",
        category: Category::Rls,
        severity: Severity::High,
        tags: &["read", "pii"],
        request: RequestDef::get(Service::Rest, "employees?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/patients-read",
        name: "Patient records readable",
        description: "Reads public.patients with the anon key.",
        category: Category::Rls,
        severity: Severity::Critical,
        tags: &["read", "pii", "health"],
        request: RequestDef::get(Service::Rest, "patients?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/medical-records-read",
        name: "Medical records readable",
        description: "Reads public.medical_records with the anon key.",
        category: Category::Rls,
        severity: Severity::Critical,
        tags: &["read", "health"],
        request: RequestDef::get(Service::Rest, "medical_records?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/notifications-read",
        name: "Notifications readable",
        description: "Reads public.notifications; they often quote private messages.",
        category: Category::Rls,
        severity: Severity::Medium,
        tags: &["read", "pii"],
        request: RequestDef::get(Service::Rest, "notifications?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/comments-read",
        name: "Comments readable including hidden ones",
        description: "Reads public.comments without filtering on moderation state.",
        category: Category::Rls,
        severity: Severity::Low,
        tags: &["read"],
        request: RequestDef::get(Service::Rest, "comments?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/private-notes-read",
        name: "Private notes readable",
        description: "Reads public.private_notes with the anon key.",
        category: Category::Rls,
        severity: Severity::High,
        tags: &["read"],
        request: RequestDef::get(Service::Rest, "private_notes?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/user-settings-read",
        name: "User settings readable",
        description: "Reads public.user_settings with the anon key.",
        category: Category::Rls,
        severity: Severity::Medium,
        tags: &["read"],
        request: RequestDef::get(Service::Rest, "user_settings?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/user-roles-read",
        name: "Role assignments readable",
        description: "Reads public.user_roles; it maps which accounts hold admin rights.",
        category: Category::Rls,
        severity: Severity::High,
        tags: &["read", "roles"],
        request: RequestDef::get(Service::Rest, "user_roles?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/admin-users-read",
        name: "Admin accounts readable",
        description: "Reads public.admin_users with the anon key.",
        category: Category::Rls,
        severity: Severity::Critical,
        tags: &["read", "roles"],
        request: RequestDef::get(Service::Rest, "admin_users?select=*&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/invitations-read",
        name: "Invitations readable",
        description: "Reads public.invitations; invite tokens let anyone join.",
        category: Category::Rls,
        severity: Severity::High,
        tags: &["read", "tokens"],
        request: RequestDef::get(Service::Rest, "invitations?select=email,token&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/draft-posts-read",
        name: "Unpublished posts readable",
        description: "Filters posts on status=draft; drafts should only be visible to their author.",
        category: Category::Rls,
        severity: Severity::Medium,
        tags: &["read"],
        request: RequestDef::get(Service::Rest, "posts?select=*&status=eq.draft&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/deleted-rows-read",
        name: "Soft-deleted rows readable",
        description: "Reads profiles with deleted_at set; policies often forget soft deletes.",
        category: Category::Rls,
        severity: Severity::Low,
        tags: &["read"],
        request: RequestDef::get(Service::Rest, "profiles?select=*&deleted_at=not.is.null&limit=5"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/orders-insert",
        name: "Anonymous order insert accepted",
        description: "Inserts an order with the anon key inside a rolled-back transaction.",
        category: Category::Rls,
        severity: Severity::High,
        tags: &["write"],
        request: RequestDef::post(Service::Rest, "orders", r#"{"total":0,"status":"paid"}"#)
            .with_headers(ROLLBACK),
        rule: Rule::Status(&[200, 201]),
    },
    crate::check! {
        id: "rls/orders-update",
        name: "Anonymous order update accepted",
        description: "Marks every order paid with the anon key inside a rolled-back transaction.",
        category: Category::Rls,
        severity: Severity::Critical,
        tags: &["write", "financial"],
        request: RequestDef::patch(Service::Rest, "orders?id=not.is.null", r#"{"status":"paid"}"#)
            .with_headers(ROLLBACK),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/messages-delete",
        name: "Anonymous message delete accepted",
        description: "Deletes messages with the anon key inside a rolled-back transaction.",
        category: Category::Rls,
        severity: Severity::High,
        tags: &["write"],
        request: RequestDef::new(Verb::Delete, Service::Rest, "messages?id=not.is.null")
            .with_headers(ROLLBACK),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "rls/role-grant-insert",
        name: "Anonymous role grant accepted",
        description: "Inserts an admin row into user_roles inside a rolled-back transaction.",
        category: Category::Rls,
        severity: Severity::Critical,
        tags: &["write", "roles"],
        request: RequestDef::post(Service::Rest, "user_roles", r#"{"user_id":"00000000-0000-0000-0000-000000000000","role":"admin"}"#)
            .with_headers(ROLLBACK),
        rule: Rule::Status(&[200, 201]),
    },
    crate::check! {
        id: "rls/profile-upsert",
        name: "Upsert overwrites other profiles",
        description: "Upserts a profile with merge-duplicates; a policy covering INSERT but not UPDATE lets the merge rewrite existing rows.",
        category: Category::Rls,
        severity: Severity::High,
        tags: &["write"],
        request: RequestDef::post(Service::Rest, "profiles?on_conflict=id", r#"{"id":1,"username":"supaprobe"}"#)
            .with_headers(&[("Prefer", "resolution=merge-duplicates, tx=rollback, return=representation")]),
        rule: Rule::Status(&[200, 201]),
    },
    crate::check! {
        id: "rls/bulk-insert",
        name: "Bulk insert accepted",
        description: "Inserts several profile rows in one request inside a rolled-back transaction.",
        category: Category::Rls,
        severity: Severity::Medium,
        tags: &["write"],
        request: RequestDef::post(Service::Rest, "profiles", r#"[{"username":"supaprobe-a"},{"username":"supaprobe-b"}]"#)
            .with_headers(ROLLBACK),
        rule: Rule::Status(&[200, 201]),
    },
    crate::check! {
        id: "rls/users-email-update",
        name: "User email rewrite accepted",
        description: "Changes every email in public.users inside a rolled-back transaction.",
        category: Category::Rls,
        severity: Severity::Critical,
        tags: &["write", "pii"],
        request: RequestDef::patch(Service::Rest, "users?id=not.is.null", r#"{"email":"supaprobe@example.com"}"#)
            .with_headers(ROLLBACK),
        rule: Rule::Rows,
    },
];
