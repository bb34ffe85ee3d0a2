#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Zone label classification.
//!
//! Maps the free-text name/code/type fields of a zoning polygon to one of
//! the canonical [`ZoneCategory`] values. The classifier is pure and
//! stateless; it runs on the write path whenever a zone's labels change,
//! and its output is stored alongside the zone.

pub mod rules;

use parcel_map_zoning_models::{ZoneCategory, ZoneLabels};

pub use rules::{RULES, ZoneRule};

/// Classifies a zone from its (possibly missing) label fields.
///
/// The three inputs are lowercased and joined into one search string for
/// phrase triggers, and each field's leading code token is taken for code
/// triggers. The ordered [`RULES`] are evaluated top to bottom; the first
/// rule that matches decides the category. Falls back to
/// [`ZoneCategory::Other`] when nothing matches, so this never fails.
#[must_use]
pub fn classify(
    zone_name: Option<&str>,
    zone_code: Option<&str>,
    zone_type: Option<&str>,
) -> ZoneCategory {
    matching_rule(zone_name, zone_code, zone_type).map_or(ZoneCategory::Other, |r| r.category)
}

/// Classifies a [`ZoneLabels`] value. See [`classify`].
#[must_use]
pub fn classify_labels(labels: &ZoneLabels) -> ZoneCategory {
    classify(
        labels.zone_name.as_deref(),
        labels.zone_code.as_deref(),
        labels.zone_type.as_deref(),
    )
}

/// Returns the first rule matching the given labels, or `None` when the
/// labels fall through to the terminal `Other` category.
#[must_use]
pub fn matching_rule(
    zone_name: Option<&str>,
    zone_code: Option<&str>,
    zone_type: Option<&str>,
) -> Option<&'static ZoneRule> {
    let fields: Vec<String> = [zone_name, zone_code, zone_type]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect();
    if fields.is_empty() {
        return None;
    }

    // " ; " keeps a phrase from spanning two fields.
    let text = fields.join(" ; ");
    let code_tokens: Vec<&str> = fields
        .iter()
        .filter_map(|f| rules::leading_code_token(f))
        .collect();

    rules::compiled()
        .iter()
        .find(|compiled| compiled.is_match(&text, &code_tokens))
        .map(|compiled| compiled.rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_examples() {
        assert_eq!(
            classify(Some("Low Density Residential"), None, None),
            ZoneCategory::ResidentialLow
        );
        assert_eq!(classify(Some("P-O"), None, None), ZoneCategory::Industrial);
        assert_eq!(
            classify(Some("P"), None, None),
            ZoneCategory::ParksAndRecreation
        );
        assert_eq!(
            classify(None, None, Some("commercial")),
            ZoneCategory::Commercial
        );
        assert_eq!(classify(Some("Foobar Zone"), None, None), ZoneCategory::Other);
    }

    #[test]
    fn all_null_is_other() {
        assert_eq!(classify(None, None, None), ZoneCategory::Other);
        assert_eq!(classify(Some(""), Some("  "), None), ZoneCategory::Other);
        assert!(matching_rule(None, None, None).is_none());
    }

    #[test]
    fn total_over_assorted_inputs() {
        let samples = [
            None,
            Some(""),
            Some("R-1-10"),
            Some("???"),
            Some("P"),
            Some("Öffentlich"),
            Some("c-2 / general commercial"),
            Some("zone 42"),
        ];
        for a in samples {
            for b in samples {
                for c in samples {
                    let cat = classify(a, b, c);
                    assert!(ZoneCategory::all().contains(&cat));
                }
            }
        }
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(
            classify(Some("HIGH DENSITY RESIDENTIAL"), None, None),
            ZoneCategory::ResidentialHigh
        );
        assert_eq!(
            classify(Some("high density residential"), None, None),
            ZoneCategory::ResidentialHigh
        );
    }

    #[test]
    fn fields_are_combined() {
        assert_eq!(
            classify(Some("Zone A"), Some("C-2"), None),
            ZoneCategory::Commercial
        );
        assert_eq!(
            classify(None, Some("R-1-8"), Some("zoning")),
            ZoneCategory::ResidentialLow
        );
    }

    #[test]
    fn phrase_does_not_span_fields() {
        // "low" ends the name and "density" starts the type; the
        // separator keeps them from reading as "low density".
        assert_eq!(
            classify(Some("Meadow Low"), None, Some("density bonus")),
            ZoneCategory::Other
        );
    }

    #[test]
    fn classify_labels_matches_classify() {
        let labels = ZoneLabels::new(Some("Neighborhood Commercial"), Some("NC"), None);
        assert_eq!(classify_labels(&labels), ZoneCategory::Commercial);
    }

    #[test]
    fn deterministic() {
        for _ in 0..3 {
            assert_eq!(
                classify(Some("Mixed Use Residential"), Some("MU-1"), None),
                ZoneCategory::MixedUse
            );
        }
    }
}
