//! Attack metadata: severity levels, categories and the static descriptor
//! every attack vector carries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid severity string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSeverityError {
    invalid_value: Box<str>,
}

impl ParseSeverityError {
    fn new(value: &str) -> Self {
        Self {
            invalid_value: value.into(),
        }
    }

    /// Returns the invalid value that caused the parse failure.
    #[must_use]
    pub fn invalid_value(&self) -> &str {
        &self.invalid_value
    }
}

impl fmt::Display for ParseSeverityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid severity '{}': expected one of 'low', 'medium', 'high', 'critical'",
            self.invalid_value
        )
    }
}

impl std::error::Error for ParseSeverityError {}

/// How damaging a successful exploitation of an attack vector would be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Hardening gap with little direct impact.
    Low,
    /// Leaks metadata or enables follow-up attacks.
    Medium,
    /// Exposes user data or privileged functionality.
    High,
    /// Full data exposure, privilege escalation or key compromise.
    Critical,
}

impl Severity {
    /// All severity levels in ascending order.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Returns the lowercase identifier used in reports and CLI flags.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(ParseSeverityError::new(s)),
        }
    }
}

/// Error returned when parsing an unknown category identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCategoryError {
    invalid_value: Box<str>,
}

impl ParseCategoryError {
    /// Returns the invalid value that caused the parse failure.
    #[must_use]
    pub fn invalid_value(&self) -> &str {
        &self.invalid_value
    }
}

impl fmt::Display for ParseCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        write!(
            f,
            "invalid category '{}': expected one of {}",
            self.invalid_value,
            known.join(", ")
        )
    }
}

impl std::error::Error for ParseCategoryError {}

/// Topic group an attack vector belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Table reads and writes that row-level security should block.
    Rls,
    /// GoTrue sign-up, sign-in, recovery and admin endpoints.
    Auth,
    /// Bucket listing, object access and uploads.
    Storage,
    /// Edge Functions reachable without a user session.
    Functions,
    /// Realtime broadcast and presence over HTTP.
    Realtime,
    /// Filter, RPC and header injection through PostgREST.
    Injection,
    /// Mass assignment, price tampering and workflow bypasses.
    BusinessLogic,
    /// Requests that make the database do unbounded work.
    Dos,
    /// `pg_graphql` introspection and query abuse.
    #[serde(rename = "graphql")]
    GraphQl,
    /// Supabase Vault secrets reachable from the API.
    Vault,
    /// Cross-tenant reads in shared-schema deployments.
    MultiTenant,
    /// PostgREST schema switching, counting and metadata leaks.
    #[serde(rename = "postgrest")]
    PostgRest,
    /// Dangerous Postgres extensions exposed as RPC.
    Extensions,
    /// Transport security, CORS and response headers.
    Network,
    /// Log, analytics and meta endpoints.
    Logging,
    /// Embeddings and similarity-search functions.
    AiVector,
    /// Backups, dumps and export artefacts.
    Backup,
    /// Service-role keys used or leaked where an anon key belongs.
    ServiceRole,
    /// Secrets present in API responses.
    Credentials,
    /// Per-table policy analysis driven by schema discovery.
    RlsPolicy,
}

impl Category {
    /// All categories in registry order.
    pub const ALL: [Self; 20] = [
        Self::Rls,
        Self::Auth,
        Self::Storage,
        Self::Functions,
        Self::Realtime,
        Self::Injection,
        Self::BusinessLogic,
        Self::Dos,
        Self::GraphQl,
        Self::Vault,
        Self::MultiTenant,
        Self::PostgRest,
        Self::Extensions,
        Self::Network,
        Self::Logging,
        Self::AiVector,
        Self::Backup,
        Self::ServiceRole,
        Self::Credentials,
        Self::RlsPolicy,
    ];

    /// Returns the lowercase identifier used as the attack id prefix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rls => "rls",
            Self::Auth => "auth",
            Self::Storage => "storage",
            Self::Functions => "functions",
            Self::Realtime => "realtime",
            Self::Injection => "injection",
            Self::BusinessLogic => "business-logic",
            Self::Dos => "dos",
            Self::GraphQl => "graphql",
            Self::Vault => "vault",
            Self::MultiTenant => "multi-tenant",
            Self::PostgRest => "postgrest",
            Self::Extensions => "extensions",
            Self::Network => "network",
            Self::Logging => "logging",
            Self::AiVector => "ai-vector",
            Self::Backup => "backup",
            Self::ServiceRole => "service-role",
            Self::Credentials => "credentials",
            Self::RlsPolicy => "rls-policy",
        }
    }

    /// Returns the human-readable display name for this category.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rls => "Row-Level Security",
            Self::Auth => "Authentication",
            Self::Storage => "Storage",
            Self::Functions => "Edge Functions",
            Self::Realtime => "Realtime",
            Self::Injection => "Injection",
            Self::BusinessLogic => "Business Logic",
            Self::Dos => "Denial of Service",
            Self::GraphQl => "GraphQL",
            Self::Vault => "Vault",
            Self::MultiTenant => "Multi-Tenancy",
            Self::PostgRest => "PostgREST Edge Cases",
            Self::Extensions => "Postgres Extensions",
            Self::Network => "Network",
            Self::Logging => "Logging & Monitoring",
            Self::AiVector => "AI & Vector Search",
            Self::Backup => "Backup & Recovery",
            Self::ServiceRole => "Service-Role Exposure",
            Self::Credentials => "Credential Leaks",
            Self::RlsPolicy => "RLS Policy Analysis",
        }
    }

    /// Returns the recommended remediation for breaches in this category.
    #[must_use]
    pub const fn remediation(self) -> &'static str {
        match self {
            Self::Rls | Self::RlsPolicy => {
                "Enable RLS on every exposed table and add policies scoped to auth.uid()."
            }
            Self::Auth => "Review Auth settings: require email confirmation, strong passwords and rate limits.",
            Self::Storage => "Make buckets private and add storage.objects policies per bucket and path.",
            Self::Functions => "Verify the JWT inside each function and restrict CORS origins.",
            Self::Realtime => "Enable Realtime authorization and restrict channel policies.",
            Self::Injection => "Validate RPC arguments, avoid dynamic SQL and revoke EXECUTE from anon.",
            Self::BusinessLogic => "Move invariants into constraints, triggers or security-definer functions.",
            Self::Dos => "Set max_rows, statement_timeout for anon and add rate limiting in front of the API.",
            Self::GraphQl => "Disable introspection for anon or drop the pg_graphql extension if unused.",
            Self::Vault => "Never expose the vault schema; revoke access to decrypted_secrets from API roles.",
            Self::MultiTenant => "Scope every policy to the caller's tenant claim, never to a client header.",
            Self::PostgRest => "Limit db-schemas to public API schemas and revoke anon grants on system views.",
            Self::Extensions => "Move extensions to a private schema and revoke EXECUTE from anon.",
            Self::Network => "Enforce HTTPS, restrict CORS origins and set standard security headers.",
            Self::Logging => "Keep log, analytics and meta endpoints behind the service role.",
            Self::AiVector => "Add RLS to embedding tables and filter similarity functions by owner.",
            Self::Backup => "Store backups outside exposed schemas and buckets.",
            Self::ServiceRole => "Rotate the service-role key and keep it on the server only.",
            Self::Credentials => "Rotate the leaked credential and strip secrets from API-visible data.",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| ParseCategoryError { invalid_value: s.into() })
    }
}

/// Static descriptor of a single attack vector.
#[derive(Debug, Clone, Copy)]
pub struct AttackMeta {
    /// Unique identifier in `"category/name"` format (e.g. `"rls/profiles-read"`).
    pub id: &'static str,
    /// Short human-readable name.
    pub name: &'static str,
    /// What the attack tries and what a breach means.
    pub description: &'static str,
    /// Topic group the attack belongs to.
    pub category: Category,
    /// Impact of a successful breach.
    pub severity: Severity,
    /// Free-form labels used for filtering (e.g. `"idor"`, `"pii"`).
    pub tags: &'static [&'static str],
    /// Whether the attack needs the service-role key to run.
    pub requires_service_key: bool,
}

impl AttackMeta {
    /// Returns `true` if the attack carries the given tag (case-insensitive).
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}
