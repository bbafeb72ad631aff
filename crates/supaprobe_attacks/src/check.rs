//! Declarative single-request checks.
//!
//! Most attack vectors are one request plus one heuristic. Those are written
//! as static [`Check`] tables with the [`check!`](crate::check!) macro instead
//! of hand-written probes.

use reqwest::header::CONTENT_TYPE;
use serde_json::json;

use crate::attack::{Attack, BoxFuture};
use crate::error::AttackError;
use crate::meta::AttackMeta;
use crate::result::Verdict;
use crate::rule::Rule;
use crate::session::{KeyRole, Service, Session, Verb};

/// A statically described HTTP request.
#[derive(Debug, Clone, Copy)]
pub struct RequestDef {
    /// HTTP method.
    pub verb: Verb,
    /// API surface the path is relative to.
    pub service: Service,
    /// Path under the service prefix, optionally with a query string.
    pub path: &'static str,
    /// Which key authenticates the request.
    pub role: KeyRole,
    /// Extra headers sent verbatim.
    pub headers: &'static [(&'static str, &'static str)],
    /// JSON body, sent with `Content-Type: application/json`.
    pub body: Option<&'static str>,
}

impl RequestDef {
    /// Anon-key request with no body or extra headers.
    #[must_use]
    pub const fn new(verb: Verb, service: Service, path: &'static str) -> Self {
        Self {
            verb,
            service,
            path,
            role: KeyRole::Anon,
            headers: &[],
            body: None,
        }
    }

    /// Anon-key `GET`.
    #[must_use]
    pub const fn get(service: Service, path: &'static str) -> Self {
        Self::new(Verb::Get, service, path)
    }

    /// Anon-key `POST` with a JSON body.
    #[must_use]
    pub const fn post(service: Service, path: &'static str, body: &'static str) -> Self {
        Self::new(Verb::Post, service, path).with_body(body)
    }

    /// Anon-key `PATCH` with a JSON body.
    #[must_use]
    pub const fn patch(service: Service, path: &'static str, body: &'static str) -> Self {
        Self::new(Verb::Patch, service, path).with_body(body)
    }

    /// Replaces the key role.
    #[must_use]
    pub const fn with_role(mut self, role: KeyRole) -> Self {
        self.role = role;
        self
    }

    /// Replaces the extra headers.
    #[must_use]
    pub const fn with_headers(mut self, headers: &'static [(&'static str, &'static str)]) -> Self {
        self.headers = headers;
        self
    }

    /// Replaces the JSON body.
    #[must_use]
    pub const fn with_body(mut self, body: &'static str) -> Self {
        self.body = Some(body);
        self
    }

    fn describe(&self) -> String {
        format!("{} /{}{}", self.verb.method(), self.service.prefix(), self.path)
    }
}

/// One request, one rule.
#[derive(Debug, Clone, Copy)]
pub struct Check {
    /// Attack descriptor.
    pub meta: AttackMeta,
    /// The request to send.
    pub request: RequestDef,
    /// The breach condition.
    pub rule: Rule,
}

impl Attack for Check {
    fn meta(&self) -> &AttackMeta {
        &self.meta
    }

    fn probe<'a>(&'a self, session: &'a Session) -> BoxFuture<'a, Result<Verdict, AttackError>> {
        Box::pin(async move {
            let req = &self.request;
            let mut builder = session.request(req.verb, req.service, req.path, req.role)?;
            for (name, value) in req.headers {
                builder = builder.header(*name, *value);
            }
            if let Some(body) = req.body {
                builder = builder.header(CONTENT_TYPE, "application/json").body(body);
            }

            let observed = session.observe(builder).await?;
            let details = json!({ "request": req.describe() });

            let verdict = match self.rule.evaluate(&observed) {
                Some(reason) => Verdict::breached(format!("{}: {reason}", self.meta.name)),
                None => Verdict::secure(format!("not exploitable (status {})", observed.status)),
            };

            Ok(verdict.with_details(details).with_evidence(observed.evidence()))
        })
    }
}

/// Creates a [`Check`](crate::Check) from an attack descriptor, request and rule.
#[macro_export]
macro_rules! check {
    (
        id: $id:expr,
        name: $name:expr,
        description: $description:expr,
        category: $category:expr,
        severity: $severity:expr,
        tags: $tags:expr,
        request: $request:expr,
        rule: $rule:expr $(,)?
    ) => {
        $crate::Check {
            meta: $crate::AttackMeta {
                id: $id,
                name: $name,
                description: $description,
                category: $category,
                severity: $severity,
                tags: $tags,
                requires_service_key: false,
            },
            request: $request,
            rule: $rule,
        }
    };
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::attack::DEFAULT_ATTACK_TIMEOUT;
    use crate::meta::{Category, Severity};
    use crate::result::AttackStatus;
    use crate::session::{AttackContext, DEFAULT_REQUEST_TIMEOUT};

    static PROFILES: Check = crate::check! {
        id: "rls/profiles",
        name: "Profiles readable",
        description: "test",
        category: Category::Rls,
        severity: Severity::High,
        tags: &[],
        request: RequestDef::get(Service::Rest, "profiles?select=*&limit=5"),
        rule: Rule::Rows,
    };

    static SIGNUP: Check = crate::check! {
        id: "auth/weak",
        name: "Weak password",
        description: "test",
        category: Category::Auth,
        severity: Severity::Medium,
        tags: &[],
        request: RequestDef::post(Service::Auth, "signup", r#"{"password":"1"}"#)
            .with_headers(&[("x-probe", "1")]),
        rule: Rule::Success,
    };

    async fn session_for(server: &MockServer) -> Session {
        let ctx = AttackContext::new(&server.uri(), "anon").unwrap();
        Session::new(ctx, DEFAULT_REQUEST_TIMEOUT).unwrap()
    }

    #[test]
    fn describe_renders_method_and_path() {
        assert_eq!(PROFILES.request.describe(), "GET /rest/v1/profiles?select=*&limit=5");
    }

    #[tokio::test]
    async fn rows_breach_when_table_is_readable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"id":1,"email":"a@b.c"}]"#))
            .mount(&server)
            .await;

        let session = session_for(&server).await;
        let result = PROFILES.execute(&session, DEFAULT_ATTACK_TIMEOUT).await;

        assert_eq!(result.status, AttackStatus::Breached);
        assert!(result.summary.contains("1 row returned"));
        assert_eq!(result.evidence.unwrap()["status"], 200);
    }

    #[tokio::test]
    async fn rls_denial_is_secure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let session = session_for(&server).await;
        let result = PROFILES.execute(&session, DEFAULT_ATTACK_TIMEOUT).await;

        assert_eq!(result.status, AttackStatus::Secure);
    }

    #[tokio::test]
    async fn body_and_headers_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .and(header("x-probe", "1"))
            .and(header("content-type", "application/json"))
            .and(body_string(r#"{"password":"1"}"#))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let session = session_for(&server).await;
        let result = SIGNUP.execute(&session, DEFAULT_ATTACK_TIMEOUT).await;

        assert_eq!(result.status, AttackStatus::Breached);
    }

    #[tokio::test]
    async fn unreachable_target_is_an_error() {
        let ctx = AttackContext::new("http://127.0.0.1:9", "anon").unwrap();
        let session = Session::new(ctx, DEFAULT_REQUEST_TIMEOUT).unwrap();

        let result = PROFILES.execute(&session, DEFAULT_ATTACK_TIMEOUT).await;

        assert_eq!(result.status, AttackStatus::Error);
        assert!(!result.breached);
    }
}
