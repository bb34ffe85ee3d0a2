#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Parcel search engine.
//!
//! Combines attribute predicates, vacancy inference, year-built logic,
//! and spatial predicates (city by boundary, zone by intersection) over a
//! shared [`parcel_map_spatial::GeometryStore`] snapshot, returning a
//! bounded result set ordered by descending acreage.
//!
//! A search is a pure read. Any number may run concurrently against the
//! same snapshot.

pub mod config;
pub mod engine;
pub mod filter;
pub mod predicates;

use thiserror::Error;

pub use config::{ConfigError, SearchConfig};
pub use engine::SearchEngine;

/// Errors returned by [`SearchEngine::search`].
///
/// A search matching nothing is `Ok(vec![])`, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The filter was rejected before any parcel was scanned.
    #[error("Invalid filter field '{field}': {message}")]
    InvalidFilter {
        /// Offending filter field, as named in the JSON filter.
        field: &'static str,
        /// Human-readable reason.
        message: String,
    },

    /// The search ran past its time budget. Retry with a narrower filter.
    #[error("Search exceeded its {budget_ms} ms budget after {elapsed_ms} ms")]
    Timeout {
        /// Time spent before giving up.
        elapsed_ms: u64,
        /// Configured budget.
        budget_ms: u64,
    },
}

impl SearchError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidFilter {
            field,
            message: message.into(),
        }
    }
}
