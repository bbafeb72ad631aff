//! Run context and the HTTP session every probe talks through.

use std::fmt;
use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::USER_AGENT;
use crate::error::AttackError;

/// Default per-request timeout for the shared HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const EVIDENCE_SNIPPET_CHARS: usize = 240;

/// Caller-supplied parameters for one scan run. Read-only to probes.
#[derive(Clone)]
pub struct AttackContext {
    /// Base URL of the Supabase project, always ending in `/`.
    pub target_url: Url,
    /// The project's anonymous (publishable) API key.
    pub anon_key: String,
    /// The service-role key, when the caller wants privileged comparisons.
    pub service_key: Option<String>,
    /// Abort signal shared by every attack in the run.
    pub cancel: CancellationToken,
}

impl AttackContext {
    /// Validates the target URL and builds a context with a fresh cancellation token.
    pub fn new(target_url: &str, anon_key: impl Into<String>) -> Result<Self, AttackError> {
        let mut url = Url::parse(target_url.trim()).map_err(|e| AttackError::InvalidTarget {
            url: target_url.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(AttackError::InvalidTarget {
                url: target_url.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        url.set_query(None);
        url.set_fragment(None);
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            target_url: url,
            anon_key: anon_key.into(),
            service_key: None,
            cancel: CancellationToken::new(),
        })
    }

    /// Sets the optional service-role key.
    #[must_use]
    pub fn with_service_key(mut self, service_key: Option<String>) -> Self {
        self.service_key = service_key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Replaces the cancellation token with one owned by the caller.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the project host, used in evidence and report headers.
    #[must_use]
    pub fn host(&self) -> &str {
        self.target_url.host_str().unwrap_or_default()
    }

    fn key_for(&self, role: KeyRole) -> Option<&str> {
        match role {
            KeyRole::Anon => Some(self.anon_key.as_str()),
            KeyRole::Service => self.service_key.as_deref(),
            KeyRole::None => None,
        }
    }
}

impl fmt::Debug for AttackContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttackContext")
            .field("target_url", &self.target_url.as_str())
            .field("has_service_key", &self.service_key.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Supabase API surface a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// PostgREST at `/rest/v1/`.
    Rest,
    /// GoTrue at `/auth/v1/`.
    Auth,
    /// Storage API at `/storage/v1/`.
    Storage,
    /// Realtime at `/realtime/v1/`.
    Realtime,
    /// Edge Functions at `/functions/v1/`.
    Functions,
    /// `pg_graphql` at `/graphql/v1`.
    GraphQl,
    /// Paths relative to the project root.
    Root,
}

impl Service {
    /// Returns the path prefix this service lives under.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Rest => "rest/v1/",
            Self::Auth => "auth/v1/",
            Self::Storage => "storage/v1/",
            Self::Realtime => "realtime/v1/",
            Self::Functions => "functions/v1/",
            Self::GraphQl => "graphql/v1",
            Self::Root => "",
        }
    }
}

/// Which key a request authenticates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    /// `apikey` and bearer set to the anon key.
    Anon,
    /// `apikey` and bearer set to the service-role key.
    Service,
    /// No credentials at all.
    None,
}

/// HTTP method of a declarative request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// `GET`
    Get,
    /// `HEAD`
    Head,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// `OPTIONS`
    Options,
}

impl Verb {
    /// Converts to the `reqwest` method.
    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Head => Method::HEAD,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Patch => Method::PATCH,
            Self::Delete => Method::DELETE,
            Self::Options => Method::OPTIONS,
        }
    }
}

/// A fully-read response, captured so heuristics can inspect it freely.
#[derive(Debug, Clone)]
pub struct Observed {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body as text (lossy for binary payloads).
    pub body: String,
    /// Time from sending the request to reading the full body.
    pub elapsed: Duration,
}

impl Observed {
    /// Returns `true` for any 2xx status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Parses the body as JSON, if it is JSON.
    #[must_use]
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Returns the value of a header as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the rows of a JSON array body on success.
    #[must_use]
    pub fn rows(&self) -> Option<Vec<Value>> {
        if !self.is_success() {
            return None;
        }
        match self.json()? {
            Value::Array(rows) => Some(rows),
            _ => None,
        }
    }

    /// Number of rows in a successful JSON array body, zero otherwise.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows().map_or(0, |rows| rows.len())
    }

    /// Returns the beginning of the body, truncated on a character boundary.
    #[must_use]
    pub fn snippet(&self, max_chars: usize) -> String {
        let mut out: String = self.body.chars().take(max_chars).collect();
        if self.body.chars().count() > max_chars {
            out.push('…');
        }
        out
    }

    /// Standard evidence object: status, timing and a body snippet.
    #[must_use]
    pub fn evidence(&self) -> Value {
        json!({
            "status": self.status,
            "elapsedMs": u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX),
            "body": self.snippet(EVIDENCE_SNIPPET_CHARS),
        })
    }
}

/// Shared HTTP client plus the run context.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    context: AttackContext,
}

impl Session {
    /// Builds a session with its own client using the given request timeout.
    pub fn new(context: AttackContext, request_timeout: Duration) -> Result<Self, AttackError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AttackError::ClientInit(e.to_string()))?;

        Ok(Self { client, context })
    }

    /// Builds a session around an existing client.
    #[must_use]
    pub const fn with_client(client: Client, context: AttackContext) -> Self {
        Self { client, context }
    }

    /// The run context.
    #[must_use]
    pub const fn context(&self) -> &AttackContext {
        &self.context
    }

    /// The shared HTTP client.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Returns `true` when a service-role key was supplied.
    #[must_use]
    pub const fn has_service_key(&self) -> bool {
        self.context.service_key.is_some()
    }

    /// Resolves `path` (which may carry a query string) under a service prefix.
    pub fn url(&self, service: Service, path: &str) -> Result<Url, AttackError> {
        let relative = format!("{}{}", service.prefix(), path.trim_start_matches('/'));
        self.context
            .target_url
            .join(&relative)
            .map_err(|e| AttackError::InvalidTarget {
                url: relative,
                reason: e.to_string(),
            })
    }

    /// Resolves a single named resource under a service prefix, percent-encoding
    /// `name` as one path segment and attaching `query` verbatim.
    pub fn resource_url(&self, service: Service, name: &str, query: &str) -> Result<Url, AttackError> {
        let mut url = self.url(service, "")?;
        {
            let Ok(mut segments) = url.path_segments_mut() else {
                return Err(AttackError::InvalidTarget {
                    url: format!("{}{name}", service.prefix()),
                    reason: "target URL cannot carry a path".to_string(),
                });
            };
            segments.pop_if_empty().push(name);
        }
        url.set_query((!query.is_empty()).then_some(query));
        Ok(url)
    }

    /// Starts a request with the credentials for `role` already attached.
    pub fn request(&self, verb: Verb, service: Service, path: &str, role: KeyRole) -> Result<RequestBuilder, AttackError> {
        let url = self.url(service, path)?;
        Ok(self.request_url(verb, url, role))
    }

    /// Starts a request to an already resolved URL with credentials for `role`.
    #[must_use]
    pub fn request_url(&self, verb: Verb, url: Url, role: KeyRole) -> RequestBuilder {
        self.authorize(self.client.request(verb.method(), url), role)
    }

    /// Attaches `apikey` and bearer headers for `role` to an arbitrary request.
    #[must_use]
    pub fn authorize(&self, builder: RequestBuilder, role: KeyRole) -> RequestBuilder {
        match self.context.key_for(role) {
            Some(key) => builder
                .header("apikey", key)
                .header(AUTHORIZATION, format!("Bearer {key}")),
            None => builder,
        }
    }

    /// Starts a JSON `POST` with the given body.
    pub fn post_json(&self, service: Service, path: &str, role: KeyRole, body: &Value) -> Result<RequestBuilder, AttackError> {
        Ok(self
            .request(Verb::Post, service, path, role)?
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string()))
    }

    /// Sends a request and reads the whole response.
    pub async fn observe(&self, builder: RequestBuilder) -> Result<Observed, AttackError> {
        let request = builder.build()?;
        let method = request.method().clone();
        let url = request.url().clone();

        let started = Instant::now();
        let response = self.client.execute(request).await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;
        let elapsed = started.elapsed();

        debug!(%method, url = %url.path(), status, elapsed_ms = elapsed.as_millis(), "response");

        Ok(Observed {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
            elapsed,
        })
    }

    /// Convenience: anon-key `GET` against a service path.
    pub async fn get(&self, service: Service, path: &str) -> Result<Observed, AttackError> {
        self.observe(self.request(Verb::Get, service, path, KeyRole::Anon)?).await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn context_rejects_non_http_scheme() {
        let err = AttackContext::new("ftp://example.com", "anon").unwrap_err();
        assert!(matches!(err, AttackError::InvalidTarget { .. }));
    }

    #[test]
    fn context_rejects_garbage() {
        assert!(AttackContext::new("not a url", "anon").is_err());
    }

    #[test]
    fn context_normalises_trailing_slash() {
        let ctx = AttackContext::new("https://abc.supabase.co/proxy?x=1", "anon").unwrap();
        assert_eq!(ctx.target_url.as_str(), "https://abc.supabase.co/proxy/");
    }

    #[test]
    fn blank_service_key_is_dropped() {
        let ctx = AttackContext::new("https://abc.supabase.co", "anon")
            .unwrap()
            .with_service_key(Some("  ".into()));
        assert!(ctx.service_key.is_none());
    }

    #[test]
    fn debug_output_hides_keys() {
        let ctx = AttackContext::new("https://abc.supabase.co", "super-secret-anon").unwrap();
        assert!(!format!("{ctx:?}").contains("super-secret-anon"));
    }

    #[test]
    fn url_joins_service_prefix_and_query() {
        let ctx = AttackContext::new("https://abc.supabase.co", "anon").unwrap();
        let session = Session::new(ctx, DEFAULT_REQUEST_TIMEOUT).unwrap();

        let url = session.url(Service::Rest, "/profiles?select=*").unwrap();
        assert_eq!(url.as_str(), "https://abc.supabase.co/rest/v1/profiles?select=*");

        let url = session.url(Service::GraphQl, "").unwrap();
        assert_eq!(url.as_str(), "https://abc.supabase.co/graphql/v1");
    }

    #[test]
    fn resource_url_encodes_the_name_as_one_segment() {
        let ctx = AttackContext::new("https://abc.supabase.co", "anon").unwrap();
        let session = Session::new(ctx, DEFAULT_REQUEST_TIMEOUT).unwrap();

        let url = session.resource_url(Service::Rest, "odd name?x#y/z", "select=*&limit=1").unwrap();
        assert_eq!(url.path(), "/rest/v1/odd%20name%3Fx%23y%2Fz");
        assert_eq!(url.query(), Some("select=*&limit=1"));

        let url = session.resource_url(Service::Rest, "profiles", "").unwrap();
        assert_eq!(url.as_str(), "https://abc.supabase.co/rest/v1/profiles");
    }

    #[test]
    fn snippet_truncates_on_char_boundary() {
        let observed = Observed {
            status: 200,
            headers: HeaderMap::new(),
            body: "ééééé".into(),
            elapsed: Duration::ZERO,
        };
        assert_eq!(observed.snippet(2), "éé…");
        assert_eq!(observed.snippet(10), "ééééé");
    }

    #[test]
    fn rows_require_success_and_array() {
        let mut observed = Observed {
            status: 200,
            headers: HeaderMap::new(),
            body: r#"[{"id":1},{"id":2}]"#.into(),
            elapsed: Duration::ZERO,
        };
        assert_eq!(observed.row_count(), 2);

        observed.status = 401;
        assert_eq!(observed.row_count(), 0);

        observed.status = 200;
        observed.body = r#"{"id":1}"#.into();
        assert!(observed.rows().is_none());
    }

    #[tokio::test]
    async fn anon_requests_carry_apikey_and_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .and(header("apikey", "anon-key"))
            .and(header("Authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let ctx = AttackContext::new(&server.uri(), "anon-key").unwrap();
        let session = Session::new(ctx, DEFAULT_REQUEST_TIMEOUT).unwrap();

        let observed = session.get(Service::Rest, "profiles").await.unwrap();
        assert_eq!(observed.status, 200);
    }

    #[tokio::test]
    async fn service_role_without_key_sends_no_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/admin/users"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let ctx = AttackContext::new(&server.uri(), "anon-key").unwrap();
        let session = Session::new(ctx, DEFAULT_REQUEST_TIMEOUT).unwrap();

        let request = session
            .request(Verb::Get, Service::Auth, "admin/users", KeyRole::Service)
            .unwrap()
            .build()
            .unwrap();
        assert!(request.headers().get("apikey").is_none());
    }
}
