#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Link between search results and an external record-keeping service.
//!
//! The external service is keyed by opaque record ids. A "link" associates
//! a set of parcel-derived ids (APNs) with one external record. The
//! service may accept a write and silently drop it (an unknown field name
//! is ignored, not rejected), so a successful response is never proof of
//! a link: [`link_and_verify`] always reads the record back.

pub mod airtable;
pub mod memory;

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

pub use airtable::AirtableStore;
pub use memory::MemoryRecordStore;

/// Errors talking to a record store.
#[derive(Debug, Error)]
pub enum RecordError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limit exceeded. Retry later.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The service returned an unexpected status.
    #[error("Record service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// Response parsing failed, or configuration is incomplete.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The record does not exist.
    #[error("Record not found: {record_id}")]
    NotFound {
        /// Requested record id.
        record_id: String,
    },
}

/// An external store of records that can hold links to parcel ids.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Adds `linked_ids` to the record's links. Existing links are kept.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if the write is rejected or fails.
    async fn link(&self, record_id: &str, linked_ids: &[String]) -> Result<(), RecordError>;

    /// Reads the ids currently linked to the record.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if the read fails.
    async fn linked_ids(&self, record_id: &str) -> Result<Vec<String>, RecordError>;
}

/// What a link attempt actually achieved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkReport {
    /// External record id.
    pub record_id: String,
    /// Ids that were requested, deduplicated and sorted.
    pub requested: Vec<String>,
    /// Requested ids confirmed present after the write.
    pub confirmed: Vec<String>,
    /// Requested ids still absent after the write.
    pub missing: Vec<String>,
}

impl LinkReport {
    /// Returns `true` if every requested id was confirmed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Links `ids` to `record_id`, then reads the record back to see which
/// links really landed.
///
/// Blank ids are dropped. An empty request performs no write.
///
/// # Errors
///
/// Returns [`RecordError`] if the link or the read-back fails. Ids that
/// were silently dropped are not an error; they are reported in
/// [`LinkReport::missing`].
pub async fn link_and_verify(
    store: &dyn RecordStore,
    record_id: &str,
    ids: &[String],
) -> Result<LinkReport, RecordError> {
    let requested: Vec<String> = ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if !requested.is_empty() {
        store.link(record_id, &requested).await?;
    }

    let present: BTreeSet<String> = store.linked_ids(record_id).await?.into_iter().collect();
    let (confirmed, missing): (Vec<String>, Vec<String>) = requested
        .iter()
        .cloned()
        .partition(|id| present.contains(id));

    if missing.is_empty() {
        log::info!("Linked {} ids to record {record_id}", confirmed.len());
    } else {
        log::warn!(
            "Record {record_id} accepted the link but {} of {} ids are absent on read-back",
            missing.len(),
            requested.len()
        );
    }

    Ok(LinkReport {
        record_id: record_id.to_string(),
        requested,
        confirmed,
        missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn verified_link_is_complete() {
        let store = MemoryRecordStore::new();
        store.insert_record("rec1").await;

        let report = link_and_verify(&store, "rec1", &ids(&["B", "A", "A", " "]))
            .await
            .unwrap();

        assert_eq!(report.requested, ids(&["A", "B"]));
        assert_eq!(report.confirmed, ids(&["A", "B"]));
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn silently_dropped_link_is_reported_missing() {
        let store = MemoryRecordStore::ignoring_writes();
        store.insert_record("rec1").await;

        let report = link_and_verify(&store, "rec1", &ids(&["A"]))
            .await
            .unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.missing, ids(&["A"]));
        assert!(report.confirmed.is_empty());
    }

    #[tokio::test]
    async fn unknown_record_is_an_error() {
        let store = MemoryRecordStore::new();
        let err = link_and_verify(&store, "nope", &ids(&["A"]))
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::NotFound { .. }));
    }

    #[tokio::test]
    async fn empty_request_only_reads() {
        let store = MemoryRecordStore::new();
        store.insert_record("rec1").await;
        store.link("rec1", &ids(&["X"])).await.unwrap();

        let report = link_and_verify(&store, "rec1", &[]).await.unwrap();
        assert!(report.requested.is_empty());
        assert!(report.is_complete());
    }
}
