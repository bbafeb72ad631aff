//! Mass assignment, price tampering and workflow bypasses.

use crate::check::{Check, RequestDef};
use crate::meta::{Category, Severity};
use crate::rule::Rule;
use crate::session::Service;

const ROLLBACK: &[(&str, &str)] = &[("Prefer", "tx=rollback, return=representation")];

pub(super) const CHECKS: &[Check] = &[
    crate::check! {
        id: "business-logic/price-tamper",
        name: "Product price writable",
        description: "Sets a product price to zero with the anon key inside a rolled-back transaction.",
        category: Category::BusinessLogic,
        severity: Severity::High,
        tags: &["write", "financial"],
        request: RequestDef::patch(Service::Rest, "products?id=not.is.null", r#"{"price":0}"#)
            .with_headers(ROLLBACK),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "business-logic/role-escalation",
        name: "Role column writable",
        description: "Promotes profiles to admin by writing the role column directly.",
        category: Category::BusinessLogic,
        severity: Severity::Critical,
        tags: &["write", "privilege-escalation"],
        request: RequestDef::patch(Service::Rest, "profiles?id=not.is.null", r#"{"role":"admin"}"#)
            .with_headers(ROLLBACK),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "business-logic/mass-assignment",
        name: "Order status assignable on insert",
        description: "Inserts an order that is already marked paid with a zero total.",
        category: Category::BusinessLogic,
        severity: Severity::High,
        tags: &["write", "financial"],
        request: RequestDef::post(Service::Rest, "orders", r#"{"status":"paid","total":0}"#)
            .with_headers(ROLLBACK),
        rule: Rule::Status(&[200, 201]),
    },
    crate::check! {
        id: "business-logic/negative-quantity",
        name: "Negative quantity accepted",
        description: "Adds a cart item with a negative quantity; a missing check constraint allows refunds out of thin air.",
        category: Category::BusinessLogic,
        severity: Severity::Medium,
        tags: &["write", "financial"],
        request: RequestDef::post(Service::Rest, "cart_items", r#"{"product_id":1,"quantity":-5}"#)
            .with_headers(ROLLBACK),
        rule: Rule::Status(&[200, 201]),
    },
    crate::check! {
        id: "business-logic/coupon-rpc",
        name: "Coupon function callable anonymously",
        description: "Applies a guessed coupon through RPC without a session; manual review recommended.",
        category: Category::BusinessLogic,
        severity: Severity::Low,
        tags: &["rpc"],
        request: RequestDef::post(Service::Rest, "rpc/apply_coupon", r#"{"code":"WELCOME"}"#),
        rule: Rule::Success,
    },
    crate::check! {
        id: "business-logic/discount-overflow",
        name: "Discount above one hundred percent",
        description: "Inserts an order with a 150% discount inside a rolled-back transaction.",
        category: Category::BusinessLogic,
        severity: Severity::High,
        tags: &["financial", "validation"],
        request: RequestDef::post(Service::Rest, "orders", r#"{"total":100,"discount_percent":150}"#)
            .with_headers(ROLLBACK),
        rule: Rule::Status(&[200, 201]),
    },
    crate::check! {
        id: "business-logic/currency-swap",
        name: "Currency switched after pricing",
        description: "Updates the currency of existing orders inside a rolled-back transaction.",
        category: Category::BusinessLogic,
        severity: Severity::High,
        tags: &["financial"],
        request: RequestDef::patch(Service::Rest, "orders?id=not.is.null", r#"{"currency":"IDR"}"#)
            .with_headers(ROLLBACK),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "business-logic/status-skip",
        name: "Order status jumps to fulfilled",
        description: "Moves orders straight to shipped without payment inside a rolled-back transaction.",
        category: Category::BusinessLogic,
        severity: Severity::High,
        tags: &["workflow"],
        request: RequestDef::patch(Service::Rest, "orders?status=eq.pending", r#"{"status":"shipped"}"#)
            .with_headers(ROLLBACK),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "business-logic/balance-credit",
        name: "Wallet balance writable",
        description: "Credits every wallet inside a rolled-back transaction.",
        category: Category::BusinessLogic,
        severity: Severity::Critical,
        tags: &["financial", "write"],
        request: RequestDef::patch(Service::Rest, "wallets?id=not.is.null", r#"{"balance":1000000}"#)
            .with_headers(ROLLBACK),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "business-logic/owner-reassign",
        name: "Row ownership transferable",
        description: "Rewrites user_id on posts inside a rolled-back transaction; policies that check only USING let rows move between owners.",
        category: Category::BusinessLogic,
        severity: Severity::High,
        tags: &["ownership", "write"],
        request: RequestDef::patch(Service::Rest, "posts?id=not.is.null", r#"{"user_id":"00000000-0000-0000-0000-000000000000"}"#)
            .with_headers(ROLLBACK),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "business-logic/verified-flag",
        name: "Verification flag self-assignable",
        description: "Sets is_verified on profiles inside a rolled-back transaction.",
        category: Category::BusinessLogic,
        severity: Severity::Medium,
        tags: &["mass-assignment"],
        request: RequestDef::patch(Service::Rest, "profiles?id=not.is.null", r#"{"is_verified":true}"#)
            .with_headers(ROLLBACK),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "business-logic/plan-upgrade",
        name: "Subscription plan self-upgradable",
        description: "Sets every subscription to the enterprise plan inside a rolled-back transaction.",
        category: Category::BusinessLogic,
        severity: Severity::High,
        tags: &["financial", "mass-assignment"],
        request: RequestDef::patch(Service::Rest, "subscriptions?id=not.is.null", r#"{"plan":"enterprise","status":"active"}"#)
            .with_headers(ROLLBACK),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "business-logic/credits-rpc",
        name: "Credit top-up function callable",
        description: "Calls an add_credits function with the anon key inside a rolled-back transaction.",
        category: Category::BusinessLogic,
        severity: Severity::Critical,
        tags: &["financial", "rpc"],
        request: RequestDef::post(Service::Rest, "rpc/add_credits", r#"{"amount":1000000}"#)
            .with_headers(ROLLBACK),
        rule: Rule::Success,
    },
    crate::check! {
        id: "business-logic/refund-rpc",
        name: "Refund function callable",
        description: "Calls a refund_order function for an arbitrary order inside a rolled-back transaction.",
        category: Category::BusinessLogic,
        severity: Severity::Critical,
        tags: &["financial", "rpc"],
        request: RequestDef::post(Service::Rest, "rpc/refund_order", r#"{"order_id":1}"#)
            .with_headers(ROLLBACK),
        rule: Rule::Success,
    },
    crate::check! {
        id: "business-logic/referral-self",
        name: "Self-referral accepted",
        description: "Inserts a referral where referrer and referee are the same user inside a rolled-back transaction.",
        category: Category::BusinessLogic,
        severity: Severity::Medium,
        tags: &["abuse", "validation"],
        request: RequestDef::post(
            Service::Rest,
            "referrals",
            r#"{"referrer_id":"00000000-0000-0000-0000-000000000000","referee_id":"00000000-0000-0000-0000-000000000000"}"#,
        )
        .with_headers(ROLLBACK),
        rule: Rule::Status(&[200, 201]),
    },
    crate::check! {
        id: "business-logic/timestamp-forge",
        name: "Server timestamps client-writable",
        description: "Backdates created_at on a new post inside a rolled-back transaction.",
        category: Category::BusinessLogic,
        severity: Severity::Low,
        tags: &["validation"],
        request: RequestDef::post(Service::Rest, "posts", r#"{"title":"supaprobe","created_at":"2000-01-01T00:00:00Z"}"#)
            .with_headers(ROLLBACK),
        rule: Rule::All(&[Rule::Status(&[200, 201]), Rule::BodyContains(&["2000-01-01"])]),
    },
];
