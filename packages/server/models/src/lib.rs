#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the parcel map server.
//!
//! These types are serialized to JSON for the REST API. Search filters and
//! result rows are the shared types from `parcel_map_parcel_models`; the
//! types here are the envelopes around them.

use parcel_map_parcel_models::ParcelResult;
use parcel_map_zoning_models::ZoneCategory;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Parcels in the current snapshot.
    pub parcels: usize,
    /// Zones in the current snapshot.
    pub zones: usize,
    /// Municipal boundaries in the current snapshot.
    pub boundaries: usize,
}

/// One entry of the canonical zone category list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiZoneCategory {
    /// Category identifier, as accepted in search filters.
    pub name: ZoneCategory,
    /// Display label (e.g. "Parks-and-Recreation").
    pub label: String,
}

impl From<ZoneCategory> for ApiZoneCategory {
    fn from(category: ZoneCategory) -> Self {
        Self {
            name: category,
            label: category.label().to_string(),
        }
    }
}

/// Search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSearchResponse {
    /// Number of rows returned (after the cap).
    pub count: usize,
    /// Result rows, ordered by descending acreage.
    pub results: Vec<ParcelResult>,
}

impl From<Vec<ParcelResult>> for ApiSearchResponse {
    fn from(results: Vec<ParcelResult>) -> Self {
        Self {
            count: results.len(),
            results,
        }
    }
}

/// Error body. `field` names the offending filter field for validation
/// errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
    /// Offending filter field, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    /// An error without a field.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            field: None,
        }
    }

    /// An error about one field.
    #[must_use]
    pub fn for_field(error: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            field: Some(field.into()),
        }
    }
}

/// Query parameters for `GET /api/parcels`.
#[derive(Debug, Clone, Deserialize)]
pub struct BboxQueryParams {
    /// Bounding box as `"west,south,east,north"`.
    pub bbox: Option<String>,
    /// Result cap.
    pub limit: Option<u32>,
}

/// Body of `POST /api/records/{record_id}/links`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRequest {
    /// APNs to link to the record.
    pub apns: Vec<String>,
}

/// Response of `POST /api/admin/reload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReloadResult {
    /// Parcels in the new snapshot.
    pub parcels: usize,
    /// Zones in the new snapshot.
    pub zones: usize,
    /// Municipal boundaries in the new snapshot.
    pub boundaries: usize,
}
