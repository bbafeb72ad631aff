//! Table discovery from the PostgREST OpenAPI document.

use reqwest::Url;
use serde_json::Value;

use crate::error::AttackError;
use crate::session::{KeyRole, Observed, Service, Session, Verb};

/// Upper bound on tables probed individually after discovery.
pub(super) const MAX_TABLES: usize = 25;

/// A table or view exposed by PostgREST, as advertised in its OpenAPI paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ExposedTable {
    pub name: String,
    pub methods: Vec<String>,
}

impl ExposedTable {
    pub fn is_writable(&self) -> bool {
        self.methods.iter().any(|m| matches!(m.as_str(), "post" | "patch" | "delete"))
    }

    /// The REST URL that selects up to `limit` rows from this table.
    pub fn read_url(&self, session: &Session, limit: usize) -> Result<Url, AttackError> {
        session.resource_url(Service::Rest, &self.name, &format!("select=*&limit={limit}"))
    }

    /// Reads up to `limit` rows from this table with `role`.
    pub async fn read(&self, session: &Session, role: KeyRole, limit: usize) -> Result<Observed, AttackError> {
        let url = self.read_url(session, limit)?;
        session.observe(session.request_url(Verb::Get, url, role)).await
    }
}

/// Fetches `/rest/v1/` with `role` and lists the exposed tables.
///
/// Returns an empty list when the document is not served (the surface is
/// hidden), and an error only when the request itself fails.
pub(super) async fn discover(session: &Session, role: KeyRole) -> Result<Vec<ExposedTable>, AttackError> {
    let observed = session
        .observe(session.request(Verb::Get, Service::Rest, "", role)?)
        .await?;
    if !observed.is_success() {
        return Ok(Vec::new());
    }
    Ok(observed.json().map(|doc| tables_from(&doc)).unwrap_or_default())
}

/// Extracts tables from an OpenAPI (Swagger 2) document, sorted by name.
pub(super) fn tables_from(doc: &Value) -> Vec<ExposedTable> {
    let Some(paths) = doc.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut tables: Vec<ExposedTable> = paths
        .iter()
        .filter_map(|(path, item)| {
            let name = path.strip_prefix('/')?;
            if name.is_empty() || name.starts_with("rpc/") || name.contains('/') {
                return None;
            }
            let methods = item
                .as_object()
                .map(|ops| ops.keys().map(|k| k.to_lowercase()).collect())
                .unwrap_or_default();
            Some(ExposedTable {
                name: name.to_string(),
                methods,
            })
        })
        .collect();

    tables.sort_by(|a, b| a.name.cmp(&b.name));
    tables
}
