//! Response heuristics for declarative checks.

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, PoisonError};

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::session::Observed;

/// A breach condition evaluated against a single captured response.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// Breached when the status code is one of these.
    Status(&'static [u16]),
    /// Breached on any 2xx status.
    Success,
    /// Breached on a 2xx JSON array with at least one element.
    Rows,
    /// Breached when the body contains any of these (case-insensitive).
    BodyContains(&'static [&'static str]),
    /// Breached when the regex matches the body.
    BodyMatches(&'static str),
    /// Breached on 2xx when the JSON pointer resolves to a non-null, non-false value.
    JsonPointer(&'static str),
    /// Breached when the header is absent.
    HeaderMissing(&'static str),
    /// Breached when the header value contains the needle (case-insensitive).
    HeaderContains(&'static str, &'static str),
    /// Breached when the response took longer than this many milliseconds.
    SlowerThan(u64),
    /// Breached when every inner rule is breached.
    All(&'static [Rule]),
    /// Breached when any inner rule is breached.
    Any(&'static [Rule]),
}

impl Rule {
    /// Returns the reason the response counts as a breach, or `None` if it does not.
    #[must_use]
    pub fn evaluate(&self, observed: &Observed) -> Option<String> {
        match *self {
            Self::Status(codes) => codes
                .contains(&observed.status)
                .then(|| format!("status {}", observed.status)),
            Self::Success => observed
                .is_success()
                .then(|| format!("request accepted with status {}", observed.status)),
            Self::Rows => match observed.row_count() {
                0 => None,
                1 => Some("1 row returned".to_string()),
                n => Some(format!("{n} rows returned")),
            },
            Self::BodyContains(needles) => {
                let body = observed.body.to_lowercase();
                needles
                    .iter()
                    .find(|n| body.contains(&n.to_lowercase()))
                    .map(|n| format!("response contains '{n}'"))
            }
            Self::BodyMatches(pattern) => first_match(pattern, &observed.body).map(|m| format!("response matches '{m}'")),
            Self::JsonPointer(pointer) => {
                if !observed.is_success() {
                    return None;
                }
                let json = observed.json()?;
                json.pointer(pointer)
                    .filter(|v| is_truthy(v))
                    .map(|v| format!("{pointer} = {}", compact(v)))
            }
            Self::HeaderMissing(name) => observed
                .header(name)
                .is_none()
                .then(|| format!("header '{name}' missing")),
            Self::HeaderContains(name, needle) => observed
                .header(name)
                .filter(|v| v.to_lowercase().contains(&needle.to_lowercase()))
                .map(|v| format!("{name}: {v}")),
            Self::SlowerThan(ms) => {
                let elapsed = observed.elapsed.as_millis();
                (elapsed > u128::from(ms)).then(|| format!("response took {elapsed}ms (threshold {ms}ms)"))
            }
            Self::All(rules) => {
                let reasons: Option<Vec<String>> = rules.iter().map(|r| r.evaluate(observed)).collect();
                reasons.filter(|r| !r.is_empty()).map(|r| r.join("; "))
            }
            Self::Any(rules) => rules.iter().find_map(|r| r.evaluate(observed)),
        }
    }

    /// Visits every regex used by this rule, including nested ones.
    pub fn regexes(&self, out: &mut Vec<&'static str>) {
        match *self {
            Self::BodyMatches(pattern) => out.push(pattern),
            Self::All(rules) | Self::Any(rules) => rules.iter().for_each(|r| r.regexes(out)),
            _ => {}
        }
    }
}

/// Compiled check patterns, keyed by their source text.
static PATTERNS: LazyLock<Mutex<HashMap<&'static str, Regex>>> = LazyLock::new(|| Mutex::new(HashMap::new()));

/// Returns the compiled form of `pattern`, compiling it at most once.
///
/// An invalid pattern is logged and never matches.
fn compiled(pattern: &'static str) -> Option<Regex> {
    let mut cache = PATTERNS.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(regex) = cache.get(pattern) {
        return Some(regex.clone());
    }
    match Regex::new(pattern) {
        Ok(regex) => {
            cache.insert(pattern, regex.clone());
            Some(regex)
        }
        Err(e) => {
            warn!(pattern, error = %e, "invalid check pattern");
            None
        }
    }
}

fn first_match(pattern: &'static str, body: &str) -> Option<String> {
    let regex = compiled(pattern)?;
    regex.find(body).map(|m| truncate(m.as_str(), 80))
}

fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

fn compact(value: &Value) -> String {
    truncate(&value.to_string(), 80)
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::header::{HeaderMap, HeaderValue};

    use super::*;

    fn observed(status: u16, body: &str) -> Observed {
        Observed {
            status,
            headers: HeaderMap::new(),
            body: body.to_string(),
            elapsed: Duration::from_millis(20),
        }
    }

    #[test]
    fn status_rule_matches_listed_codes() {
        let rule = Rule::Status(&[200, 206]);
        assert!(rule.evaluate(&observed(206, "")).is_some());
        assert!(rule.evaluate(&observed(401, "")).is_none());
    }

    #[test]
    fn rows_rule_ignores_empty_arrays_and_errors() {
        assert!(Rule::Rows.evaluate(&observed(200, "[]")).is_none());
        assert!(Rule::Rows.evaluate(&observed(401, r#"[{"a":1}]"#)).is_none());
        assert_eq!(
            Rule::Rows.evaluate(&observed(200, r#"[{"a":1},{"a":2}]"#)),
            Some("2 rows returned".to_string())
        );
    }

    #[test]
    fn body_contains_is_case_insensitive() {
        let rule = Rule::BodyContains(&["Syntax Error"]);
        assert!(rule.evaluate(&observed(400, "syntax error at or near")).is_some());
    }

    #[test]
    fn body_matches_reports_matched_text() {
        let rule = Rule::BodyMatches(r"sk_live_[0-9a-zA-Z]{8}");
        let reason = rule.evaluate(&observed(200, "key=sk_live_abcdEFGH123")).unwrap();
        assert!(reason.contains("sk_live_abcdEFGH"));
    }

    #[test]
    fn json_pointer_requires_truthy_value() {
        let rule = Rule::JsonPointer("/mailer_autoconfirm");
        assert!(rule.evaluate(&observed(200, r#"{"mailer_autoconfirm": true}"#)).is_some());
        assert!(rule.evaluate(&observed(200, r#"{"mailer_autoconfirm": false}"#)).is_none());
        assert!(rule.evaluate(&observed(500, r#"{"mailer_autoconfirm": true}"#)).is_none());
        assert!(rule.evaluate(&observed(200, r#"{"mailer_autoconfirm": null}"#)).is_none());
    }

    #[test]
    fn json_pointer_counts_empty_values_as_present() {
        let body = r#"{"users": [], "name": ""}"#;
        assert_eq!(
            Rule::JsonPointer("/users").evaluate(&observed(200, body)),
            Some("/users = []".to_string())
        );
        assert!(Rule::JsonPointer("/name").evaluate(&observed(200, body)).is_some());
        assert!(Rule::JsonPointer("/missing").evaluate(&observed(200, body)).is_none());
    }

    #[test]
    fn body_matches_reuses_compiled_pattern() {
        let rule = Rule::BodyMatches(r"token=[a-f0-9]{6}");
        assert!(rule.evaluate(&observed(200, "token=abc123")).is_some());
        assert!(rule.evaluate(&observed(200, "token=zzz")).is_none());
        assert!(PATTERNS.lock().unwrap().contains_key(r"token=[a-f0-9]{6}"));
    }

    #[test]
    fn invalid_pattern_never_matches() {
        assert!(Rule::BodyMatches(r"([unclosed").evaluate(&observed(200, "([unclosed")).is_none());
        assert!(!PATTERNS.lock().unwrap().contains_key(r"([unclosed"));
    }

    #[test]
    fn header_rules_read_headers() {
        let mut resp = observed(200, "");
        resp.headers
            .insert("access-control-allow-origin", HeaderValue::from_static("*"));

        assert!(Rule::HeaderContains("access-control-allow-origin", "*").evaluate(&resp).is_some());
        assert!(Rule::HeaderMissing("strict-transport-security").evaluate(&resp).is_some());
        assert!(Rule::HeaderMissing("access-control-allow-origin").evaluate(&resp).is_none());
    }

    #[test]
    fn slower_than_compares_elapsed() {
        let mut resp = observed(200, "");
        assert!(Rule::SlowerThan(100).evaluate(&resp).is_none());
        resp.elapsed = Duration::from_millis(250);
        assert!(Rule::SlowerThan(100).evaluate(&resp).is_some());
    }

    #[test]
    fn all_requires_every_rule() {
        let rule = Rule::All(&[Rule::Success, Rule::BodyContains(&["secret"])]);
        assert!(rule.evaluate(&observed(200, "a secret")).is_some());
        assert!(rule.evaluate(&observed(200, "nothing")).is_none());
        assert!(rule.evaluate(&observed(403, "a secret")).is_none());
    }

    #[test]
    fn empty_all_never_breaches() {
        assert!(Rule::All(&[]).evaluate(&observed(200, "")).is_none());
    }

    #[test]
    fn any_returns_first_reason() {
        let rule = Rule::Any(&[Rule::Status(&[418]), Rule::Success]);
        assert_eq!(
            rule.evaluate(&observed(201, "")),
            Some("request accepted with status 201".to_string())
        );
    }

    #[test]
    fn regexes_collects_nested_patterns() {
        let rule = Rule::Any(&[Rule::BodyMatches("a+"), Rule::All(&[Rule::BodyMatches("b+")])]);
        let mut out = Vec::new();
        rule.regexes(&mut out);
        assert_eq!(out, vec!["a+", "b+"]);
    }
}
