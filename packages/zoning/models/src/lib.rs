#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Canonical land-use category taxonomy.
//!
//! Every municipality labels its zoning and general-plan polygons with its
//! own vocabulary. This crate defines the small closed set of categories
//! those labels are folded into, plus the raw label fields themselves.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Canonical land-use category of a zone polygon.
///
/// This set is closed: the classifier always produces one of these, with
/// [`ZoneCategory::Other`] as the terminal fallback.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ZoneCategory {
    /// Single-family, estate, and rural residential
    ResidentialLow,
    /// Duplex, townhome, and small multi-unit residential
    ResidentialMedium,
    /// Apartments and high-density multi-family residential
    ResidentialHigh,
    /// Retail, office, and general commercial
    Commercial,
    /// Combined residential and commercial districts
    MixedUse,
    /// Manufacturing, business park, and professional-office districts
    Industrial,
    /// Parks, open space, and recreation
    ParksAndRecreation,
    /// Schools, colleges, and universities
    Education,
    /// Churches and other places of worship
    Religious,
    /// Hospitals and medical campuses
    HealthCare,
    /// Utility facilities and infrastructure
    Utilities,
    /// Cemeteries
    Cemeteries,
    /// Government, civic, and quasi-public facilities
    PublicInstitutional,
    /// Overlays, corridors, and anything no rule recognizes
    Other,
}

impl ZoneCategory {
    /// Returns the human-readable label (e.g. `"Residential-Low"`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ResidentialLow => "Residential-Low",
            Self::ResidentialMedium => "Residential-Medium",
            Self::ResidentialHigh => "Residential-High",
            Self::Commercial => "Commercial",
            Self::MixedUse => "Mixed-Use",
            Self::Industrial => "Industrial",
            Self::ParksAndRecreation => "Parks-and-Recreation",
            Self::Education => "Education",
            Self::Religious => "Religious",
            Self::HealthCare => "Health-Care",
            Self::Utilities => "Utilities",
            Self::Cemeteries => "Cemeteries",
            Self::PublicInstitutional => "Public-Institutional",
            Self::Other => "Other",
        }
    }

    /// Parses a category from either its label (`"Parks-and-Recreation"`),
    /// its serialized name (`"PARKS_AND_RECREATION"`), or any spacing and
    /// casing in between (`"parks and recreation"`).
    ///
    /// Returns `None` for unrecognized names.
    #[must_use]
    pub fn from_label(raw: &str) -> Option<Self> {
        let key: String = raw
            .trim()
            .chars()
            .map(|c| if c == '-' || c.is_whitespace() { '_' } else { c })
            .collect();
        key.parse().ok()
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::ResidentialLow,
            Self::ResidentialMedium,
            Self::ResidentialHigh,
            Self::Commercial,
            Self::MixedUse,
            Self::Industrial,
            Self::ParksAndRecreation,
            Self::Education,
            Self::Religious,
            Self::HealthCare,
            Self::Utilities,
            Self::Cemeteries,
            Self::PublicInstitutional,
            Self::Other,
        ]
    }
}

/// The raw, free-text label fields of a zone as delivered by its source
/// municipality. Any subset may be populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneLabels {
    /// Zone name (e.g. "Low Density Residential").
    pub zone_name: Option<String>,
    /// Zone code (e.g. "R-1-10", "P-O").
    pub zone_code: Option<String>,
    /// Zone type (e.g. "commercial").
    pub zone_type: Option<String>,
}

impl ZoneLabels {
    /// Creates a label set from optional string slices.
    #[must_use]
    pub fn new(zone_name: Option<&str>, zone_code: Option<&str>, zone_type: Option<&str>) -> Self {
        Self {
            zone_name: zone_name.map(String::from),
            zone_code: zone_code.map(String::from),
            zone_type: zone_type.map(String::from),
        }
    }

    /// Returns `true` if no label field carries any text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        [&self.zone_name, &self.zone_code, &self.zone_type]
            .iter()
            .all(|f| f.as_deref().is_none_or(|s| s.trim().is_empty()))
    }
}
