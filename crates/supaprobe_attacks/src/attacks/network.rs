//! Transport security, CORS and response headers.

use serde_json::json;

use crate::attack::{Attack, BoxFuture};
use crate::check::{Check, RequestDef};
use crate::error::AttackError;
use crate::meta::{AttackMeta, Category, Severity};
use crate::result::Verdict;
use crate::rule::Rule;
use crate::session::{KeyRole, Service, Session, Verb};

pub(super) const CHECKS: &[Check] = &[
    crate::check! {
        id: "network/cors-reflect",
        name: "API CORS reflects any origin",
        description: "Sends a REST preflight from an attacker origin and checks whether the origin is echoed with credentials allowed.",
        category: Category::Network,
        severity: Severity::Medium,
        tags: &["cors"],
        request: RequestDef::new(Verb::Options, Service::Rest, "profiles").with_headers(&[
            ("Origin", "https://evil.supaprobe.test"),
            ("Access-Control-Request-Method", "GET"),
        ]),
        rule: Rule::All(&[
            Rule::HeaderContains("access-control-allow-origin", "evil.supaprobe.test"),
            Rule::HeaderContains("access-control-allow-credentials", "true"),
        ]),
    },
    crate::check! {
        id: "network/hsts-missing",
        name: "HSTS header missing",
        description: "Checks the REST root for Strict-Transport-Security.",
        category: Category::Network,
        severity: Severity::Low,
        tags: &["headers", "tls"],
        request: RequestDef::get(Service::Rest, ""),
        rule: Rule::HeaderMissing("strict-transport-security"),
    },
    crate::check! {
        id: "network/version-banner",
        name: "Server version disclosed",
        description: "Looks for version banners in Server and X-Powered-By headers.",
        category: Category::Network,
        severity: Severity::Low,
        tags: &["headers", "information-disclosure"],
        request: RequestDef::get(Service::Rest, ""),
        rule: Rule::Any(&[
            Rule::HeaderContains("server", "postgrest/"),
            Rule::HeaderContains("x-powered-by", ""),
        ]),
    },
    crate::check! {
        id: "network/nosniff-missing",
        name: "X-Content-Type-Options missing",
        description: "Checks a public storage response for X-Content-Type-Options: nosniff.",
        category: Category::Network,
        severity: Severity::Low,
        tags: &["headers"],
        request: RequestDef::get(Service::Storage, "bucket"),
        rule: Rule::HeaderMissing("x-content-type-options"),
    },
    crate::check! {
        id: "network/cors-wildcard",
        name: "Wildcard CORS on the REST API",
        description: "Sends a cross-origin GET and checks for Access-Control-Allow-Origin: *.",
        category: Category::Network,
        severity: Severity::Low,
        tags: &["cors"],
        request: RequestDef::get(Service::Rest, "").with_headers(&[("Origin", "https://evil.supaprobe.test")]),
        rule: Rule::HeaderContains("access-control-allow-origin", "*"),
    },
    crate::check! {
        id: "network/cors-null-origin",
        name: "CORS trusts the null origin",
        description: "Sends Origin: null, which sandboxed iframes and local files use.",
        category: Category::Network,
        severity: Severity::Medium,
        tags: &["cors"],
        request: RequestDef::get(Service::Rest, "").with_headers(&[("Origin", "null")]),
        rule: Rule::HeaderContains("access-control-allow-origin", "null"),
    },
    crate::check! {
        id: "network/cors-auth",
        name: "Auth API CORS reflects any origin",
        description: "Sends an auth preflight from an attacker origin with credentials.",
        category: Category::Network,
        severity: Severity::Medium,
        tags: &["cors"],
        request: RequestDef::new(Verb::Options, Service::Auth, "token").with_headers(&[
            ("Origin", "https://evil.supaprobe.test"),
            ("Access-Control-Request-Method", "POST"),
        ]),
        rule: Rule::All(&[
            Rule::HeaderContains("access-control-allow-origin", "evil.supaprobe.test"),
            Rule::HeaderContains("access-control-allow-credentials", "true"),
        ]),
    },
    crate::check! {
        id: "network/cors-storage",
        name: "Storage CORS reflects any origin",
        description: "Sends a storage preflight from an attacker origin.",
        category: Category::Network,
        severity: Severity::Low,
        tags: &["cors"],
        request: RequestDef::new(Verb::Options, Service::Storage, "object/list/avatars").with_headers(&[
            ("Origin", "https://evil.supaprobe.test"),
            ("Access-Control-Request-Method", "POST"),
        ]),
        rule: Rule::HeaderContains("access-control-allow-origin", "evil.supaprobe.test"),
    },
    crate::check! {
        id: "network/frame-options-missing",
        name: "Clickjacking headers missing",
        description: "Checks a public storage response for X-Frame-Options or a frame-ancestors policy.",
        category: Category::Network,
        severity: Severity::Low,
        tags: &["headers"],
        request: RequestDef::get(Service::Storage, "bucket"),
        rule: Rule::All(&[
            Rule::HeaderMissing("x-frame-options"),
            Rule::HeaderMissing("content-security-policy"),
        ]),
    },
    crate::check! {
        id: "network/csp-missing-storage",
        name: "No CSP on stored content",
        description: "Fetches a public object and checks for a Content-Security-Policy header; without one, uploaded HTML runs in the project origin.",
        category: Category::Network,
        severity: Severity::Medium,
        tags: &["headers", "xss"],
        request: RequestDef::get(Service::Storage, "object/public/avatars/index.html"),
        rule: Rule::All(&[Rule::Success, Rule::HeaderMissing("content-security-policy")]),
    },
    crate::check! {
        id: "network/trace-enabled",
        name: "TRACE-style method echo",
        description: "Sends an OPTIONS request and checks whether TRACE is advertised in Allow.",
        category: Category::Network,
        severity: Severity::Low,
        tags: &["headers"],
        request: RequestDef::new(Verb::Options, Service::Root, ""),
        rule: Rule::HeaderContains("allow", "trace"),
    },
    crate::check! {
        id: "network/cache-private-data",
        name: "Authenticated responses cacheable",
        description: "Reads the auth settings and checks for a public Cache-Control directive.",
        category: Category::Network,
        severity: Severity::Low,
        tags: &["headers", "cache"],
        request: RequestDef::get(Service::Auth, "settings"),
        rule: Rule::HeaderContains("cache-control", "public"),
    },
    crate::check! {
        id: "network/host-header",
        name: "Host header reflected in redirects",
        description: "Sends a spoofed X-Forwarded-Host to the auth authorize route and checks whether it lands in the redirect.",
        category: Category::Network,
        severity: Severity::Medium,
        tags: &["headers", "open-redirect"],
        request: RequestDef::get(Service::Auth, "authorize?provider=github").with_headers(&[("X-Forwarded-Host", "evil.supaprobe.test")]),
        rule: Rule::HeaderContains("location", "evil.supaprobe.test"),
    },
];

pub(super) const PROBES: &[&dyn Attack] = &[&PlainHttp];

/// Checks whether the API answers over unencrypted HTTP.
pub(super) struct PlainHttp;

static PLAIN_HTTP: AttackMeta = AttackMeta {
    id: "network/plain-http",
    name: "API served over plain HTTP",
    description: "Requests the REST root over http://; an API answer instead of a redirect sends keys in cleartext.",
    category: Category::Network,
    severity: Severity::High,
    tags: &["tls"],
    requires_service_key: false,
};

impl Attack for PlainHttp {
    fn meta(&self) -> &AttackMeta {
        &PLAIN_HTTP
    }

    fn probe<'a>(&'a self, session: &'a Session) -> BoxFuture<'a, Result<Verdict, AttackError>> {
        Box::pin(async move {
            let target = &session.context().target_url;
            if target.scheme() == "http" {
                let observed = session.get(Service::Rest, "").await?;
                return Ok(Verdict::breached("target URL itself uses http://")
                    .with_details(json!({ "url": target.as_str() }))
                    .with_evidence(observed.evidence()));
            }

            let mut url = session.url(Service::Rest, "")?;
            if url.set_scheme("http").is_err() {
                return Err(AttackError::InvalidTarget {
                    url: url.to_string(),
                    reason: "cannot downgrade scheme".to_string(),
                });
            }
            let details = json!({ "url": url.as_str() });

            let builder = session.authorize(session.client().get(url), KeyRole::Anon);
            let observed = match session.observe(builder).await {
                Ok(observed) => observed,
                Err(AttackError::Http(_)) => {
                    return Ok(Verdict::secure("plain HTTP port does not answer").with_details(details));
                }
                Err(e) => return Err(e),
            };

            let redirects_to_https = (300..400).contains(&observed.status)
                && observed
                    .header("location")
                    .is_some_and(|l| l.starts_with("https://"));

            let verdict = if observed.is_success() {
                Verdict::breached(format!("plain HTTP answered with status {}", observed.status))
            } else if redirects_to_https {
                Verdict::secure("plain HTTP redirects to HTTPS")
            } else {
                Verdict::secure(format!("plain HTTP refused (status {})", observed.status))
            };
            Ok(verdict.with_details(details).with_evidence(observed.evidence()))
        })
    }
}
