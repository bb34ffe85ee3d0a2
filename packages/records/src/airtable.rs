//! Airtable REST API record store.
//!
//! Links are kept in one multi-value field of a table. Airtable's PATCH
//! replaces a field's whole value, so [`AirtableStore::link`] reads the
//! current links and writes back the union.
//!
//! Airtable allows 5 requests per second per base; the caller is
//! responsible for pacing. A 429 surfaces as [`RecordError::RateLimited`].
//!
//! See <https://airtable.com/developers/web/api/update-record>

use std::collections::BTreeSet;

use crate::{RecordError, RecordStore};

const API_BASE_URL: &str = "https://api.airtable.com/v0";

/// Airtable connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirtableConfig {
    /// Personal access token.
    pub token: String,
    /// Base id (`app...`).
    pub base: String,
    /// Table name or id.
    pub table: String,
    /// Name of the multi-value field holding linked parcel ids.
    pub link_field: String,
}

impl AirtableConfig {
    /// Reads `AIRTABLE_TOKEN`, `AIRTABLE_BASE`, `AIRTABLE_TABLE`, and
    /// `AIRTABLE_LINK_FIELD` through `lookup`.
    ///
    /// Returns `None` when any of them is missing or blank.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        Some(Self {
            token: get("AIRTABLE_TOKEN")?,
            base: get("AIRTABLE_BASE")?,
            table: get("AIRTABLE_TABLE")?,
            link_field: get("AIRTABLE_LINK_FIELD")?,
        })
    }
}

/// [`RecordStore`] over the Airtable REST API.
#[derive(Debug, Clone)]
pub struct AirtableStore {
    client: reqwest::Client,
    config: AirtableConfig,
    base_url: String,
}

impl AirtableStore {
    /// Creates a store with its own HTTP client.
    #[must_use]
    pub fn new(config: AirtableConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            base_url: API_BASE_URL.to_string(),
        }
    }

    /// Creates a store from environment variables, or `None` if they are
    /// not all set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        AirtableConfig::from_lookup(|var| std::env::var(var).ok()).map(Self::new)
    }

    /// The record's API URL. Every path segment is percent-encoded, so a
    /// record id can never add a query, a fragment, or another segment.
    fn record_url(&self, record_id: &str) -> Result<reqwest::Url, RecordError> {
        if record_id.trim().is_empty() || record_id.chars().all(|c| c == '.') {
            return Err(RecordError::NotFound {
                record_id: record_id.to_string(),
            });
        }

        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| RecordError::Parse {
            message: format!("Invalid Airtable base URL: {e}"),
        })?;
        url.path_segments_mut()
            .map_err(|()| RecordError::Parse {
                message: format!("Airtable base URL cannot take a path: {}", self.base_url),
            })?
            .push(&self.config.base)
            .push(&self.config.table)
            .push(record_id);
        Ok(url)
    }

    async fn check(
        resp: reqwest::Response,
        record_id: &str,
    ) -> Result<reqwest::Response, RecordError> {
        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RecordError::RateLimited);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RecordError::NotFound {
                record_id: record_id.to_string(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RecordError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }
}

#[async_trait::async_trait]
impl RecordStore for AirtableStore {
    async fn link(&self, record_id: &str, linked_ids: &[String]) -> Result<(), RecordError> {
        let mut merged: BTreeSet<String> = self.linked_ids(record_id).await?.into_iter().collect();
        merged.extend(linked_ids.iter().cloned());

        let body = link_body(&self.config.link_field, &merged);
        let resp = self
            .client
            .patch(self.record_url(record_id)?)
            .bearer_auth(&self.config.token)
            .json(&body)
            .send()
            .await?;
        Self::check(resp, record_id).await?;

        log::debug!(
            "PATCH {record_id}.{} with {} ids",
            self.config.link_field,
            merged.len()
        );
        Ok(())
    }

    async fn linked_ids(&self, record_id: &str) -> Result<Vec<String>, RecordError> {
        let resp = self
            .client
            .get(self.record_url(record_id)?)
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        let resp = Self::check(resp, record_id).await?;

        let body: serde_json::Value = resp.json().await?;
        parse_linked_ids(&body, &self.config.link_field)
    }
}

/// PATCH body setting the link field. `typecast` lets Airtable accept
/// plain strings for linked-record and multi-select fields.
fn link_body(field: &str, ids: &BTreeSet<String>) -> serde_json::Value {
    serde_json::json!({
        "fields": { field: ids },
        "typecast": true,
    })
}

/// Extracts the linked ids from a record response.
///
/// Airtable omits empty fields entirely, so a missing field is an empty
/// list. A field holding a single string is accepted as a one-element
/// list.
fn parse_linked_ids(body: &serde_json::Value, field: &str) -> Result<Vec<String>, RecordError> {
    let fields = body["fields"]
        .as_object()
        .ok_or_else(|| RecordError::Parse {
            message: "Airtable response has no fields object".to_string(),
        })?;

    match fields.get(field) {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(serde_json::Value::String(s)) => Ok(vec![s.clone()]),
        Some(serde_json::Value::Array(values)) => values
            .iter()
            .map(|v| {
                v.as_str().map(String::from).ok_or_else(|| RecordError::Parse {
                    message: format!("Non-string value in field '{field}'"),
                })
            })
            .collect(),
        Some(other) => Err(RecordError::Parse {
            message: format!("Unexpected value in field '{field}': {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_requires_every_variable() {
        let full = |var: &str| Some(format!("{var}-value"));
        let config = AirtableConfig::from_lookup(full).unwrap();
        assert_eq!(config.table, "AIRTABLE_TABLE-value");

        let missing_field = |var: &str| (var != "AIRTABLE_LINK_FIELD").then(|| "x".to_string());
        assert!(AirtableConfig::from_lookup(missing_field).is_none());

        let blank = |_: &str| Some("  ".to_string());
        assert!(AirtableConfig::from_lookup(blank).is_none());
    }

    fn store(table: &str) -> AirtableStore {
        AirtableStore::new(AirtableConfig {
            token: "t".into(),
            base: "appXYZ".into(),
            table: table.into(),
            link_field: "Parcels".into(),
        })
    }

    #[test]
    fn record_url_joins_parts() {
        assert_eq!(
            store("Landowners").record_url("rec123").unwrap().as_str(),
            "https://api.airtable.com/v0/appXYZ/Landowners/rec123"
        );
        assert_eq!(
            store("Land Owners").record_url("rec123").unwrap().as_str(),
            "https://api.airtable.com/v0/appXYZ/Land%20Owners/rec123"
        );
    }

    #[test]
    fn record_id_cannot_change_the_request() {
        let url = store("Landowners").record_url("rec1?x=1#y").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.airtable.com/v0/appXYZ/Landowners/rec1%3Fx=1%23y"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);

        let url = store("Landowners").record_url("../other/rec2").unwrap();
        assert_eq!(url.path_segments().map(Iterator::count), Some(4));

        for bad in ["", "  ", "..", "."] {
            assert!(matches!(
                store("Landowners").record_url(bad),
                Err(RecordError::NotFound { .. })
            ));
        }
    }

    #[test]
    fn parses_linked_ids() {
        let body = serde_json::json!({
            "id": "rec1",
            "fields": { "Parcels": ["08-001", "08-002"], "Owner Name": "Smith" }
        });
        assert_eq!(
            parse_linked_ids(&body, "Parcels").unwrap(),
            vec!["08-001", "08-002"]
        );
    }

    #[test]
    fn missing_field_is_empty() {
        let body = serde_json::json!({ "id": "rec1", "fields": {} });
        assert!(parse_linked_ids(&body, "Parcels").unwrap().is_empty());
    }

    #[test]
    fn malformed_response_is_a_parse_error() {
        let body = serde_json::json!({ "error": "NOT_AUTHORIZED" });
        assert!(matches!(
            parse_linked_ids(&body, "Parcels"),
            Err(RecordError::Parse { .. })
        ));

        let body = serde_json::json!({ "fields": { "Parcels": [1, 2] } });
        assert!(parse_linked_ids(&body, "Parcels").is_err());
    }

    #[test]
    fn link_body_sets_field() {
        let ids: BTreeSet<String> = ["B".to_string(), "A".to_string()].into();
        let body = link_body("Parcels", &ids);
        assert_eq!(body["fields"]["Parcels"], serde_json::json!(["A", "B"]));
        assert_eq!(body["typecast"], serde_json::json!(true));
    }
}
