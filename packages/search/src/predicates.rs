//! Per-parcel attribute predicates.
//!
//! Each predicate spells out what a null attribute does; see
//! [`parcel_map_parcel_models::ParcelFilter`] for the policy table.

use parcel_map_parcel_models::{Parcel, Range};

/// The class label satisfied by inferred vacancy as well as by its label.
pub const VACANT_CLASS: &str = "VACANT";

/// One requested property class, pre-tokenized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMatcher {
    literal: String,
    tokens: Vec<String>,
}

impl ClassMatcher {
    /// Prepares a requested class. Returns `None` for a blank label.
    #[must_use]
    pub fn new(requested: &str) -> Option<Self> {
        let tokens = class_tokens(requested);
        if tokens.is_empty() {
            return None;
        }
        Some(Self {
            literal: requested.trim().to_uppercase(),
            tokens,
        })
    }

    /// Returns `true` for the special `"Vacant"` class.
    #[must_use]
    pub fn is_vacant(&self) -> bool {
        self.tokens.len() == 1 && self.tokens[0] == VACANT_CLASS
    }

    /// Whether a parcel's recorded class satisfies this requested class.
    ///
    /// Matches when every token of the requested class appears among the
    /// parcel class's tokens, or when the parcel class starts with the
    /// requested class literally (case-insensitive).
    #[must_use]
    pub fn matches(&self, parcel_class: &str) -> bool {
        let parcel_tokens = class_tokens(parcel_class);
        if self.tokens.iter().all(|t| parcel_tokens.contains(t)) {
            return true;
        }
        parcel_class.trim().to_uppercase().starts_with(&self.literal)
    }
}

/// Splits a class label on whitespace and punctuation into uppercase
/// tokens.
fn class_tokens(label: &str) -> Vec<String> {
    label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_uppercase)
        .collect()
}

/// Inferred vacancy: no meaningful building square footage (null or at
/// most `sqft_threshold`), no positive year built, and no positive unit
/// count. The recorded class label is ignored.
#[must_use]
pub fn is_inferred_vacant(parcel: &Parcel, sqft_threshold: f64) -> bool {
    let no_building = parcel
        .bldg_sqft
        .is_none_or(|sqft| !sqft.is_finite() || sqft <= sqft_threshold);
    let no_year = parcel.built_yr.is_none_or(|y| y <= 0);
    let no_units = parcel.house_cnt.is_none_or(|n| n <= 0);

    no_building && no_year && no_units
}

/// A positive year built, or `None`. Zero and negative years are
/// placeholder values in several import vintages.
#[must_use]
pub fn effective_year(parcel: &Parcel) -> Option<i32> {
    parcel.built_yr.filter(|&y| y > 0)
}

/// Year-built clause. An unbounded range matches everything; otherwise a
/// null year matches only when `include_null` is set.
#[must_use]
pub fn year_matches(range: &Range<i32>, include_null: bool, year: Option<i32>) -> bool {
    if !range.is_bounded() {
        return true;
    }
    year.map_or(include_null, |y| range.contains(y))
}

/// Numeric range clause where a null (or non-finite) value is excluded
/// whenever a bound is set.
#[must_use]
pub fn range_matches(range: &Range<f64>, value: Option<f64>) -> bool {
    if !range.is_bounded() {
        return true;
    }
    value
        .filter(|v| v.is_finite())
        .is_some_and(|v| range.contains(v))
}
