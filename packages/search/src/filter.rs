//! Filter validation and preparation.
//!
//! A [`ParcelFilter`] is checked and turned into a [`PreparedFilter`] once
//! per search, before any parcel is scanned: names are normalized, zone
//! category names parsed, and the city clause looked up against the
//! store's boundaries.

use std::collections::BTreeSet;

use parcel_map_parcel_models::{BoundingBox, ParcelFilter, Range};
use parcel_map_places::normalize_county;
use parcel_map_spatial::{CityFilter, GeometryStore, ParcelEntry};
use parcel_map_zoning_models::ZoneCategory;

use crate::SearchError;
use crate::config::SearchConfig;
use crate::predicates::{self, ClassMatcher};

/// A validated filter, ready to be evaluated against parcels.
#[derive(Debug)]
pub struct PreparedFilter {
    acres: Range<f64>,
    classes: Vec<ClassMatcher>,
    wants_vacant: bool,
    market_value: Range<f64>,
    year_built: Range<i32>,
    include_null_year: bool,
    county: Option<String>,
    cities: Option<CityFilter>,
    zones: Option<BTreeSet<ZoneCategory>>,
    bbox: Option<BoundingBox>,
    limit: usize,
    vacant_sqft_threshold: f64,
}

/// Outcome of evaluating one parcel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Whether the parcel has no meaningful improvements.
    pub inferred_vacant: bool,
}

impl PreparedFilter {
    /// Validates `filter` and prepares it against `store`.
    ///
    /// # Errors
    ///
    /// * [`SearchError::InvalidFilter`] if a range has `min > max` or a
    ///   non-finite bound, `limit` is zero, or `bbox` is malformed
    pub fn prepare(
        filter: &ParcelFilter,
        config: &SearchConfig,
        store: &GeometryStore,
    ) -> Result<Self, SearchError> {
        validate(filter)?;

        let classes: Vec<ClassMatcher> = filter
            .prop_classes
            .iter()
            .filter_map(|c| ClassMatcher::new(c))
            .collect();
        let wants_vacant = classes.iter().any(ClassMatcher::is_vacant);

        let county = filter
            .county
            .as_deref()
            .map(normalize_county)
            .filter(|c| !c.is_empty());

        let city_names: Vec<&str> = filter
            .cities
            .iter()
            .map(String::as_str)
            .filter(|c| !c.trim().is_empty())
            .collect();
        let cities = (!city_names.is_empty()).then(|| store.city_filter(&city_names));
        if let Some(cities) = &cities {
            if cities.boundary_count() == 0 {
                log::debug!(
                    "No municipal boundary matches {:?}; city clause uses attributes only",
                    cities.requested()
                );
            }
        }

        let zone_names: Vec<&str> = filter
            .zone_categories
            .iter()
            .map(String::as_str)
            .filter(|z| !z.trim().is_empty())
            .collect();
        let zones = (!zone_names.is_empty()).then(|| {
            zone_names
                .iter()
                .filter_map(|name| {
                    let parsed = ZoneCategory::from_label(name);
                    if parsed.is_none() {
                        log::debug!("Unknown zone category '{name}' matches nothing");
                    }
                    parsed
                })
                .collect::<BTreeSet<_>>()
        });

        Ok(Self {
            acres: filter.acres,
            classes,
            wants_vacant,
            market_value: filter.market_value,
            year_built: filter.year_built,
            include_null_year: filter.include_null_year,
            county,
            cities,
            zones,
            bbox: filter.bbox,
            limit: config.effective_limit(filter.limit),
            vacant_sqft_threshold: config.vacant_sqft_threshold,
        })
    }

    /// Result cap after defaulting and clamping.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Viewport clause, if any.
    #[must_use]
    pub const fn bbox(&self) -> Option<&BoundingBox> {
        self.bbox.as_ref()
    }

    /// Evaluates every clause against one parcel, cheapest first:
    /// attribute predicates, then the city clause (which may fall back to
    /// boundary intersection), then zone intersection.
    ///
    /// The bbox clause is applied by the caller through the parcel R-tree.
    #[must_use]
    pub fn evaluate(&self, store: &GeometryStore, entry: &ParcelEntry) -> Option<Evaluation> {
        let parcel = &entry.parcel;

        if !predicates::range_matches(&self.acres, entry.acreage().map(|(a, _)| a)) {
            return None;
        }
        if !predicates::range_matches(&self.market_value, parcel.total_mkt_value) {
            return None;
        }
        if !predicates::year_matches(
            &self.year_built,
            self.include_null_year,
            predicates::effective_year(parcel),
        ) {
            return None;
        }
        if let Some(county) = &self.county {
            let matches = parcel
                .county
                .as_deref()
                .is_some_and(|c| normalize_county(c) == *county);
            if !matches {
                return None;
            }
        }

        let inferred_vacant = predicates::is_inferred_vacant(parcel, self.vacant_sqft_threshold);
        if !self.classes.is_empty() {
            let by_inference = self.wants_vacant && inferred_vacant;
            let by_label = parcel
                .prop_class
                .as_deref()
                .is_some_and(|class| self.classes.iter().any(|m| m.matches(class)));
            if !by_inference && !by_label {
                return None;
            }
        }

        if let Some(cities) = &self.cities {
            let resolution =
                store.resolve_city(entry.geometry.as_ref(), parcel.city.as_deref(), cities);
            if !resolution.is_match() {
                return None;
            }
        }

        if let Some(zones) = &self.zones {
            if !store.resolve_zone(entry.geometry.as_ref(), zones) {
                return None;
            }
        }

        Some(Evaluation { inferred_vacant })
    }
}

fn validate(filter: &ParcelFilter) -> Result<(), SearchError> {
    validate_f64_range("acres", &filter.acres)?;
    validate_f64_range("marketValue", &filter.market_value)?;
    validate_range("yearBuilt", &filter.year_built)?;

    if filter.limit == Some(0) {
        return Err(SearchError::invalid("limit", "must be at least 1"));
    }

    if let Some(bbox) = &filter.bbox {
        if !bbox.is_valid() {
            return Err(SearchError::invalid(
                "bbox",
                "edges must be finite with west <= east and south <= north",
            ));
        }
    }

    Ok(())
}

fn validate_f64_range(field: &'static str, range: &Range<f64>) -> Result<(), SearchError> {
    if range.min.is_some_and(|v| !v.is_finite()) || range.max.is_some_and(|v| !v.is_finite()) {
        return Err(SearchError::invalid(field, "bounds must be finite numbers"));
    }
    validate_range(field, range)
}

fn validate_range<T>(field: &'static str, range: &Range<T>) -> Result<(), SearchError>
where
    T: Copy + PartialOrd + std::fmt::Display,
{
    match (range.min, range.max) {
        (Some(min), Some(max)) if min > max => Err(SearchError::invalid(
            field,
            format!("min ({min}) is greater than max ({max})"),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepare(filter: &ParcelFilter) -> Result<PreparedFilter, SearchError> {
        PreparedFilter::prepare(
            filter,
            &SearchConfig::default(),
            &GeometryStore::builder().build(),
        )
    }

    fn invalid_field(result: Result<PreparedFilter, SearchError>) -> &'static str {
        match result {
            Err(SearchError::InvalidFilter { field, .. }) => field,
            other => panic!("expected InvalidFilter, got {other:?}"),
        }
    }

    #[test]
    fn inverted_acreage_is_rejected() {
        let filter = ParcelFilter {
            acres: Range::new(Some(10.0), Some(5.0)),
            ..ParcelFilter::default()
        };
        assert_eq!(invalid_field(prepare(&filter)), "acres");
    }

    #[test]
    fn inverted_years_are_rejected() {
        let filter = ParcelFilter {
            year_built: Range::new(Some(2010), Some(1990)),
            ..ParcelFilter::default()
        };
        assert_eq!(invalid_field(prepare(&filter)), "yearBuilt");
    }

    #[test]
    fn non_finite_value_is_rejected() {
        let filter = ParcelFilter {
            market_value: Range::new(Some(f64::INFINITY), None),
            ..ParcelFilter::default()
        };
        assert_eq!(invalid_field(prepare(&filter)), "marketValue");
    }

    #[test]
    fn zero_limit_is_rejected() {
        let filter = ParcelFilter {
            limit: Some(0),
            ..ParcelFilter::default()
        };
        assert_eq!(invalid_field(prepare(&filter)), "limit");
    }

    #[test]
    fn malformed_bbox_is_rejected() {
        let filter = ParcelFilter {
            bbox: Some(BoundingBox::new(-111.0, 41.0, -112.0, 42.0)),
            ..ParcelFilter::default()
        };
        assert_eq!(invalid_field(prepare(&filter)), "bbox");
    }

    #[test]
    fn equal_bounds_are_valid() {
        let filter = ParcelFilter {
            acres: Range::new(Some(5.0), Some(5.0)),
            ..ParcelFilter::default()
        };
        assert!(prepare(&filter).is_ok());
    }

    #[test]
    fn oversized_limit_is_clamped() {
        let filter = ParcelFilter {
            limit: Some(1_000_000),
            ..ParcelFilter::default()
        };
        assert_eq!(prepare(&filter).unwrap().limit(), 5000);
    }

    #[test]
    fn unknown_zone_names_leave_an_empty_clause() {
        let filter = ParcelFilter {
            zone_categories: vec!["NOT_A_CATEGORY".into()],
            ..ParcelFilter::default()
        };
        let prepared = prepare(&filter).unwrap();
        assert_eq!(prepared.zones, Some(BTreeSet::new()));
    }

    #[test]
    fn blank_lists_mean_no_clause() {
        let filter = ParcelFilter {
            cities: vec![" ".into()],
            zone_categories: vec![String::new()],
            prop_classes: vec!["".into()],
            county: Some("  ".into()),
            ..ParcelFilter::default()
        };
        let prepared = prepare(&filter).unwrap();
        assert!(prepared.cities.is_none());
        assert!(prepared.zones.is_none());
        assert!(prepared.classes.is_empty());
        assert!(prepared.county.is_none());
    }

    #[test]
    fn county_is_normalized_once() {
        let filter = ParcelFilter {
            county: Some("davis county".into()),
            ..ParcelFilter::default()
        };
        assert_eq!(prepare(&filter).unwrap().county.as_deref(), Some("DAVIS"));
    }
}
