//! Attack vectors and the execution harness for supaprobe.
//!
//! This crate defines what an attack is ([`AttackMeta`] plus the [`Attack`]
//! trait), the HTTP [`Session`] probes talk through, declarative
//! single-request [`Check`]s, and the [`AttackRegistry`] holding every
//! builtin attack against a Supabase project.

mod attack;
/// Builtin attack vectors organised by category.
pub mod attacks;
mod check;
mod error;
/// JWT decoding and forging helpers used by key and signature probes.
pub mod jwt;
mod meta;
mod registry;
mod result;
mod rule;
mod session;

pub use attack::{Attack, BoxFuture, DEFAULT_ATTACK_TIMEOUT, SKIPPED_NO_SERVICE_KEY};
pub use check::{Check, RequestDef};
pub use error::AttackError;
pub use meta::{AttackMeta, Category, ParseCategoryError, ParseSeverityError, Severity};
pub use registry::AttackRegistry;
pub use result::{AttackResult, AttackStatus, Verdict};
pub use rule::Rule;
pub use session::{AttackContext, DEFAULT_REQUEST_TIMEOUT, KeyRole, Observed, Service, Session, Verb};

/// HTTP `User-Agent` header sent with every probe request.
pub(crate) const USER_AGENT: &str = concat!("supaprobe/", env!("CARGO_PKG_VERSION"));
