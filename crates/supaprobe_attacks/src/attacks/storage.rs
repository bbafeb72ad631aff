//! Storage API: bucket enumeration, object listing, uploads and traversal.

use chrono::Utc;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Value, json};
use tracing::debug;

use crate::attack::{Attack, BoxFuture};
use crate::check::{Check, RequestDef};
use crate::error::AttackError;
use crate::meta::{AttackMeta, Category, Severity};
use crate::result::Verdict;
use crate::rule::Rule;
use crate::session::{KeyRole, Service, Session, Verb};

pub(super) const CHECKS: &[Check] = &[
    crate::check! {
        id: "storage/bucket-list",
        name: "Buckets enumerable",
        description: "Lists storage buckets with the anon key.",
        category: Category::Storage,
        severity: Severity::Medium,
        tags: &["enumeration"],
        request: RequestDef::get(Service::Storage, "bucket"),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "storage/public-bucket",
        name: "Public bucket present",
        description: "Looks for buckets flagged public in the bucket list; public objects are served without any policy check.",
        category: Category::Storage,
        severity: Severity::Medium,
        tags: &["enumeration"],
        request: RequestDef::get(Service::Storage, "bucket"),
        rule: Rule::All(&[Rule::Success, Rule::BodyMatches(r#""public"\s*:\s*true"#)]),
    },
    crate::check! {
        id: "storage/object-list",
        name: "Objects listable",
        description: "Lists objects in the avatars bucket with the anon key.",
        category: Category::Storage,
        severity: Severity::High,
        tags: &["enumeration"],
        request: RequestDef::post(Service::Storage, "object/list/avatars", r#"{"prefix":"","limit":10}"#),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "storage/bucket-create",
        name: "Bucket creation allowed",
        description: "Creates a public bucket with the anon key.",
        category: Category::Storage,
        severity: Severity::Critical,
        tags: &["write"],
        request: RequestDef::post(Service::Storage, "bucket", r#"{"id":"supaprobe-bucket","name":"supaprobe-bucket","public":true}"#),
        rule: Rule::Success,
    },
    crate::check! {
        id: "storage/path-traversal",
        name: "Path traversal in object key",
        description: "Requests a public object whose key escapes the bucket with encoded ../ segments.",
        category: Category::Storage,
        severity: Severity::High,
        tags: &["traversal"],
        request: RequestDef::get(Service::Storage, "object/public/avatars/..%2F..%2Fprivate%2F.env"),
        rule: Rule::Success,
    },
    crate::check! {
        id: "storage/traversal-double-encoded",
        name: "Double-encoded traversal in object key",
        description: "Requests a public object whose key escapes the bucket with double-encoded ../ segments.",
        category: Category::Storage,
        severity: Severity::High,
        tags: &["traversal"],
        request: RequestDef::get(Service::Storage, "object/public/avatars/%252e%252e%252f%252e%252e%252fprivate%252f.env"),
        rule: Rule::Success,
    },
    crate::check! {
        id: "storage/traversal-backslash",
        name: "Backslash traversal in object key",
        description: "Requests a public object with ..\\ segments that some path normalisers treat as separators.",
        category: Category::Storage,
        severity: Severity::High,
        tags: &["traversal"],
        request: RequestDef::get(Service::Storage, "object/public/avatars/..%5C..%5Cprivate%5C.env"),
        rule: Rule::Success,
    },
    crate::check! {
        id: "storage/traversal-authenticated",
        name: "Traversal through authenticated download",
        description: "Downloads through the authenticated route with an encoded key that climbs into another bucket.",
        category: Category::Storage,
        severity: Severity::High,
        tags: &["traversal"],
        request: RequestDef::get(Service::Storage, "object/authenticated/avatars/..%2Fprivate%2Fsecret.txt"),
        rule: Rule::Success,
    },
    crate::check! {
        id: "storage/traversal-render",
        name: "Traversal through image transformation",
        description: "Asks the image renderer for a key outside the public bucket.",
        category: Category::Storage,
        severity: Severity::High,
        tags: &["traversal", "transform"],
        request: RequestDef::get(Service::Storage, "render/image/public/avatars/..%2F..%2Fprivate%2Favatar.png?width=10"),
        rule: Rule::Success,
    },
    crate::check! {
        id: "storage/list-prefix-traversal",
        name: "Listing escapes its prefix",
        description: "Lists the avatars bucket with a ../ prefix to reach sibling folders.",
        category: Category::Storage,
        severity: Severity::Medium,
        tags: &["traversal", "enumeration"],
        request: RequestDef::post(Service::Storage, "object/list/avatars", r#"{"prefix":"../","limit":10}"#),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "storage/sign-private",
        name: "Signed URL minted for a private object",
        description: "Asks for a signed URL on a private bucket object with only the anon key.",
        category: Category::Storage,
        severity: Severity::High,
        tags: &["signed-url"],
        request: RequestDef::post(Service::Storage, "object/sign/private/secret.txt", r#"{"expiresIn":60}"#),
        rule: Rule::Any(&[Rule::JsonPointer("/signedURL"), Rule::JsonPointer("/signedUrl")]),
    },
    crate::check! {
        id: "storage/sign-long-expiry",
        name: "Signed URL with year-long expiry",
        description: "Requests a signed URL valid for ten years; an accepted expiry turns a share link into a permanent one.",
        category: Category::Storage,
        severity: Severity::Medium,
        tags: &["signed-url"],
        request: RequestDef::post(Service::Storage, "object/sign/avatars/avatar.png", r#"{"expiresIn":315360000}"#),
        rule: Rule::Any(&[Rule::JsonPointer("/signedURL"), Rule::JsonPointer("/signedUrl")]),
    },
    crate::check! {
        id: "storage/sign-batch",
        name: "Batch signing of arbitrary paths",
        description: "Signs a batch of guessed paths in one request; every returned URL is a download link.",
        category: Category::Storage,
        severity: Severity::Medium,
        tags: &["signed-url", "enumeration"],
        request: RequestDef::post(Service::Storage, "object/sign/avatars", r#"{"expiresIn":60,"paths":["avatar.png","admin.png","backup.zip"]}"#),
        rule: Rule::BodyMatches(r#""signedURL"\s*:\s*"/"#),
    },
    crate::check! {
        id: "storage/signed-token-forged",
        name: "Signed URL token not verified",
        description: "Downloads through the signed route with a garbage token.",
        category: Category::Storage,
        severity: Severity::Critical,
        tags: &["signed-url", "forgery"],
        request: RequestDef::get(Service::Storage, "object/sign/private/secret.txt?token=supaprobe.invalid.token").with_role(KeyRole::None),
        rule: Rule::Success,
    },
    crate::check! {
        id: "storage/upload-sign",
        name: "Signed upload URL minted",
        description: "Creates a signed upload URL with the anon key; whoever holds it can write the object.",
        category: Category::Storage,
        severity: Severity::High,
        tags: &["signed-url", "write"],
        request: RequestDef::post(Service::Storage, "object/upload/sign/avatars/supaprobe.png", "{}"),
        rule: Rule::JsonPointer("/url"),
    },
    crate::check! {
        id: "storage/bucket-public-toggle",
        name: "Bucket made public",
        description: "Flips the avatars bucket to public with the anon key.",
        category: Category::Storage,
        severity: Severity::Critical,
        tags: &["write", "buckets"],
        request: RequestDef::new(Verb::Put, Service::Storage, "bucket/avatars").with_body(r#"{"public":true}"#),
        rule: Rule::Success,
    },
    crate::check! {
        id: "storage/bucket-empty",
        name: "Bucket emptied",
        description: "Asks storage to empty the avatars bucket with the anon key.",
        category: Category::Storage,
        severity: Severity::Critical,
        tags: &["write", "buckets"],
        request: RequestDef::post(Service::Storage, "bucket/avatars/empty", "{}"),
        rule: Rule::Success,
    },
    crate::check! {
        id: "storage/bucket-mime-widen",
        name: "Bucket MIME allow-list rewritten",
        description: "Rewrites the avatars bucket to accept every MIME type with the anon key.",
        category: Category::Storage,
        severity: Severity::High,
        tags: &["write", "buckets", "mime"],
        request: RequestDef::new(Verb::Put, Service::Storage, "bucket/avatars")
            .with_body(r#"{"allowed_mime_types":["*/*"]}"#),
        rule: Rule::Success,
    },
    crate::check! {
        id: "storage/object-move",
        name: "Objects moved across buckets",
        description: "Moves an object from a private bucket into a public one.",
        category: Category::Storage,
        severity: Severity::Critical,
        tags: &["write"],
        request: RequestDef::post(Service::Storage, "object/move", r#"{"bucketId":"private","sourceKey":"secret.txt","destinationKey":"../avatars/secret.txt"}"#),
        rule: Rule::Success,
    },
    crate::check! {
        id: "storage/object-copy",
        name: "Objects copied out of a private bucket",
        description: "Copies an object from a private bucket into a public one.",
        category: Category::Storage,
        severity: Severity::Critical,
        tags: &["write"],
        request: RequestDef::post(Service::Storage, "object/copy", r#"{"bucketId":"private","sourceKey":"secret.txt","destinationBucket":"avatars","destinationKey":"secret.txt"}"#),
        rule: Rule::Success,
    },
    crate::check! {
        id: "storage/private-list",
        name: "Private bucket listable",
        description: "Lists objects in a bucket named private with the anon key.",
        category: Category::Storage,
        severity: Severity::High,
        tags: &["enumeration"],
        request: RequestDef::post(Service::Storage, "object/list/private", r#"{"prefix":"","limit":10}"#),
        rule: Rule::Rows,
    },
    crate::check! {
        id: "storage/object-info",
        name: "Object metadata readable",
        description: "Reads object metadata from the info route with the anon key.",
        category: Category::Storage,
        severity: Severity::Low,
        tags: &["enumeration"],
        request: RequestDef::get(Service::Storage, "object/info/public/avatars/avatar.png"),
        rule: Rule::JsonPointer("/name"),
    },
    crate::check! {
        id: "storage/mime-unrestricted",
        name: "Buckets accept any MIME type",
        description: "Reads the bucket list for buckets without allowed_mime_types.",
        category: Category::Storage,
        severity: Severity::Medium,
        tags: &["mime", "buckets"],
        request: RequestDef::get(Service::Storage, "bucket"),
        rule: Rule::All(&[Rule::Success, Rule::BodyMatches(r#""allowed_mime_types"\s*:\s*null"#)]),
    },
    crate::check! {
        id: "storage/size-unrestricted",
        name: "Buckets accept any file size",
        description: "Reads the bucket list for buckets without a file_size_limit.",
        category: Category::Storage,
        severity: Severity::Low,
        tags: &["limits", "buckets"],
        request: RequestDef::get(Service::Storage, "bucket"),
        rule: Rule::All(&[Rule::Success, Rule::BodyMatches(r#""file_size_limit"\s*:\s*null"#)]),
    },
    crate::check! {
        id: "storage/transform-oversize",
        name: "Unbounded image transformation",
        description: "Asks the renderer for a huge resize and times it.",
        category: Category::Storage,
        severity: Severity::Low,
        tags: &["transform", "slow-query"],
        request: RequestDef::get(Service::Storage, "render/image/public/avatars/avatar.png?width=10000&height=10000&resize=fill"),
        rule: Rule::SlowerThan(3000),
    },
    crate::check! {
        id: "storage/objects-table",
        name: "storage.objects readable",
        description: "Reads storage.objects through PostgREST; owner ids and paths of every file leak.",
        category: Category::Storage,
        severity: Severity::High,
        tags: &["read", "schema"],
        request: RequestDef::get(Service::Rest, "objects?select=bucket_id,name,owner&limit=5")
            .with_headers(&[("Accept-Profile", "storage")]),
        rule: Rule::Rows,
    },
];

pub(super) const PROBES: &[&dyn Attack] = &[&Upload::PLAIN, &Upload::HTML, &Upload::SVG_SCRIPT, &Upload::DISGUISED_PNG];

/// Buckets tried when the bucket list is not readable.
const FALLBACK_BUCKETS: [&str; 4] = ["avatars", "public", "uploads", "images"];

/// Uploads a small object with the anon key to each bucket and removes it again.
///
/// The content type and payload vary per instance, so the same flow covers
/// plain anonymous writes and uploads that slip past MIME restrictions.
pub(super) struct Upload {
    meta: AttackMeta,
    extension: &'static str,
    content_type: &'static str,
    payload: &'static str,
}

impl Upload {
    const PLAIN: Self = Self {
        meta: AttackMeta {
            id: "storage/anon-upload",
            name: "Anonymous upload accepted",
            description: "Uploads a text object to each discovered bucket with the anon key, deleting it afterwards.",
            category: Category::Storage,
            severity: Severity::High,
            tags: &["write"],
            requires_service_key: false,
        },
        extension: "txt",
        content_type: "text/plain",
        payload: "supaprobe upload check",
    };

    const HTML: Self = Self {
        meta: AttackMeta {
            id: "storage/mime-html",
            name: "HTML upload accepted",
            description: "Uploads an HTML page with a script tag; served from the project domain it runs as stored XSS.",
            category: Category::Storage,
            severity: Severity::High,
            tags: &["write", "mime", "xss"],
            requires_service_key: false,
        },
        extension: "html",
        content_type: "text/html",
        payload: "<html><script>document.title='supaprobe'</script></html>",
    };

    const SVG_SCRIPT: Self = Self {
        meta: AttackMeta {
            id: "storage/mime-svg",
            name: "Scripted SVG upload accepted",
            description: "Uploads an SVG carrying an onload handler; image allow-lists often admit image/svg+xml.",
            category: Category::Storage,
            severity: Severity::High,
            tags: &["write", "mime", "xss"],
            requires_service_key: false,
        },
        extension: "svg",
        content_type: "image/svg+xml",
        payload: r#"<svg xmlns="http://www.w3.org/2000/svg" onload="document.title='supaprobe'"/>"#,
    };

    const DISGUISED_PNG: Self = Self {
        meta: AttackMeta {
            id: "storage/mime-mismatch",
            name: "Content type not verified",
            description: "Uploads HTML declared as image/png with a .png name; storage trusting the declared type lets any payload through.",
            category: Category::Storage,
            severity: Severity::Medium,
            tags: &["write", "mime"],
            requires_service_key: false,
        },
        extension: "png",
        content_type: "image/png",
        payload: "<html><script>document.title='supaprobe'</script></html>",
    };
}

async fn bucket_names(session: &Session) -> Result<Vec<String>, AttackError> {
    let observed = session.get(Service::Storage, "bucket").await?;
    let discovered: Vec<String> = observed
        .rows()
        .unwrap_or_default()
        .iter()
        .filter_map(|b| b.get("id").or_else(|| b.get("name")).and_then(Value::as_str))
        .map(str::to_owned)
        .collect();

    if discovered.is_empty() {
        Ok(FALLBACK_BUCKETS.iter().map(|b| (*b).to_string()).collect())
    } else {
        Ok(discovered)
    }
}

impl Attack for Upload {
    fn meta(&self) -> &AttackMeta {
        &self.meta
    }

    fn probe<'a>(&'a self, session: &'a Session) -> BoxFuture<'a, Result<Verdict, AttackError>> {
        Box::pin(async move {
            let object = format!("supaprobe-{}.{}", Utc::now().timestamp_millis(), self.extension);
            let buckets = bucket_names(session).await?;

            let mut refused = Vec::new();
            for bucket in &buckets {
                let url = session.resource_url(Service::Storage, "object", "")?;
                let url = object_url(url, bucket, &object)?;
                let builder = session
                    .request_url(Verb::Post, url.clone(), KeyRole::Anon)
                    .header(CONTENT_TYPE, self.content_type)
                    .body(self.payload);
                let observed = session.observe(builder).await?;

                if observed.is_success() {
                    let cleanup = session.request_url(Verb::Delete, url, KeyRole::Anon);
                    if let Err(e) = session.observe(cleanup).await {
                        debug!(bucket = %bucket, error = %e, "failed to remove uploaded object");
                    }
                    return Ok(Verdict::breached(format!(
                        "anon key uploaded {object} ({}) to bucket '{bucket}'",
                        self.content_type
                    ))
                    .with_details(json!({ "bucket": bucket, "object": object, "content_type": self.content_type }))
                    .with_evidence(observed.evidence()));
                }
                refused.push(json!({ "bucket": bucket, "status": observed.status }));
            }

            Ok(Verdict::secure(format!(
                "{} uploads refused in {} bucket(s)",
                self.content_type,
                buckets.len()
            ))
            .with_details(json!({ "attempts": refused })))
        })
    }
}

/// Appends `bucket` and `object` to an `.../object` URL as encoded segments.
fn object_url(mut url: Url, bucket: &str, object: &str) -> Result<Url, AttackError> {
    let Ok(mut segments) = url.path_segments_mut() else {
        return Err(AttackError::InvalidTarget {
            url: format!("object/{bucket}/{object}"),
            reason: "target URL cannot carry a path".to_string(),
        });
    };
    segments.push(bucket).push(object);
    drop(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::attack::DEFAULT_ATTACK_TIMEOUT;
    use crate::result::AttackStatus;
    use crate::session::{AttackContext, DEFAULT_REQUEST_TIMEOUT};

    fn session_for(server: &MockServer) -> Session {
        let ctx = AttackContext::new(&server.uri(), "anon").unwrap();
        Session::new(ctx, DEFAULT_REQUEST_TIMEOUT).unwrap()
    }

    #[tokio::test]
    async fn upload_into_discovered_bucket_is_breached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/storage/v1/bucket"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "docs", "public": false}])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/docs/supaprobe-\d+\.txt$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "docs/x"})))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let result = Upload::PLAIN.execute(&session_for(&server), DEFAULT_ATTACK_TIMEOUT).await;

        assert_eq!(result.status, AttackStatus::Breached);
        assert_eq!(result.details.unwrap()["bucket"], "docs");
    }

    #[tokio::test]
    async fn refused_uploads_fall_back_to_known_buckets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("[]"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .expect(4)
            .mount(&server)
            .await;

        let result = Upload::PLAIN.execute(&session_for(&server), DEFAULT_ATTACK_TIMEOUT).await;

        assert_eq!(result.status, AttackStatus::Secure);
        assert!(result.summary.contains("4 bucket"));
    }

    #[tokio::test]
    async fn html_upload_sends_declared_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/storage/v1/bucket"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "avatars", "public": true}])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/avatars/supaprobe-\d+\.html$"))
            .and(header("content-type", "text/html"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "avatars/x"})))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let result = Upload::HTML.execute(&session_for(&server), DEFAULT_ATTACK_TIMEOUT).await;

        assert_eq!(result.status, AttackStatus::Breached);
        assert_eq!(result.details.unwrap()["content_type"], "text/html");
    }

    #[tokio::test]
    async fn mime_restricted_bucket_is_secure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/storage/v1/bucket"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "avatars"}])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(415).set_body_string("mime type image/svg+xml is not supported"))
            .mount(&server)
            .await;

        let result = Upload::SVG_SCRIPT.execute(&session_for(&server), DEFAULT_ATTACK_TIMEOUT).await;

        assert_eq!(result.status, AttackStatus::Secure);
        assert!(result.summary.contains("image/svg+xml"));
    }

    #[test]
    fn object_url_encodes_bucket_and_key() {
        let base = Url::parse("https://abc.supabase.co/storage/v1/object").unwrap();
        let url = object_url(base, "my bucket", "a?b.txt").unwrap();
        assert_eq!(url.path(), "/storage/v1/object/my%20bucket/a%3Fb.txt");
    }
}
