//! The ordered zone classification rule table.
//!
//! Rules are evaluated top to bottom and the first match wins, so order is
//! significant: specific multi-word phrases come before generic short
//! codes, and a category may appear more than once (e.g. business parks
//! are claimed for `Industrial` before the generic "park" rule runs).
//!
//! Three trigger kinds exist:
//!
//! * **phrases** match whole words anywhere in the joined label text;
//!   internal spaces also accept `-`, `_`, and `/` so "mixed use" matches
//!   "Mixed-Use".
//! * **codes** match a field's leading code token exactly. The token is
//!   the first run of letters, digits, and hyphens in the field, so "p"
//!   matches "P" and "P (Parks)" but neither "P-O" nor "Park", and never a
//!   word inside prose such as "Phase I" or "Redwood Rd".
//! * **code families** match a leading code token that starts with the
//!   prefix and may continue with a hyphen suffix: "r-1" matches "R-1" and
//!   "R-1-10" but not "R-10".

use std::sync::LazyLock;

use parcel_map_zoning_models::ZoneCategory;
use regex::Regex;

/// One entry of the ordered rule table.
#[derive(Debug)]
pub struct ZoneRule {
    /// Short identifier, useful when explaining a classification.
    pub name: &'static str,
    /// Category assigned when this rule matches.
    pub category: ZoneCategory,
    /// Whole-word phrases.
    pub phrases: &'static [&'static str],
    /// Exact, boundary-anchored codes.
    pub codes: &'static [&'static str],
    /// Boundary-anchored code prefixes that may carry a `-suffix`.
    pub code_families: &'static [&'static str],
}

/// The ordered rule table. First match wins; no match means
/// [`ZoneCategory::Other`].
pub static RULES: &[ZoneRule] = &[
    // ── Overlays are never split by underlying use ──────────────────
    ZoneRule {
        name: "overlay",
        category: ZoneCategory::Other,
        phrases: &["overlay", "overlay district", "corridor"],
        codes: &[],
        code_families: &[],
    },
    // ── Mixed use (before residential/commercial, which it mentions) ─
    ZoneRule {
        name: "mixed-use",
        category: ZoneCategory::MixedUse,
        phrases: &[
            "mixed use",
            "mixeduse",
            "mixed residential commercial",
            "live work",
            "town center",
        ],
        codes: &[],
        code_families: &["mu", "mxd", "mx", "tc"],
    },
    // ── Residential by density ──────────────────────────────────────
    ZoneRule {
        name: "residential-high",
        category: ZoneCategory::ResidentialHigh,
        phrases: &[
            "high density residential",
            "residential high",
            "high density",
            "multi family",
            "multifamily",
            "multiple family",
            "apartment",
            "apartments",
        ],
        codes: &[],
        code_families: &["rh", "hdr", "r-4", "r4", "r-5", "r5", "rmf"],
    },
    ZoneRule {
        name: "residential-medium",
        category: ZoneCategory::ResidentialMedium,
        phrases: &[
            "medium density residential",
            "residential medium",
            "medium density",
            "moderate density",
            "townhome",
            "townhomes",
            "townhouse",
            "duplex",
            "two family",
            "twin home",
            "mobile home",
            "manufactured home",
        ],
        codes: &[],
        code_families: &["rm", "mdr", "r-2", "r2", "r-3", "r3"],
    },
    ZoneRule {
        name: "residential-low",
        category: ZoneCategory::ResidentialLow,
        phrases: &[
            "low density residential",
            "residential low",
            "very low density",
            "low density",
            "single family",
            "rural residential",
            "residential estate",
            "estate residential",
            "ranchette",
        ],
        codes: &["re", "r-e"],
        code_families: &["r-1", "r1", "rl", "ldr", "vldr", "rr", "ra", "re-1", "rs"],
    },
    // ── Single-purpose institutional uses ───────────────────────────
    ZoneRule {
        name: "education",
        category: ZoneCategory::Education,
        phrases: &[
            "school",
            "schools",
            "education",
            "educational",
            "university",
            "college",
            "academy",
        ],
        codes: &[],
        code_families: &[],
    },
    ZoneRule {
        name: "religious",
        category: ZoneCategory::Religious,
        phrases: &[
            "church",
            "churches",
            "religious",
            "worship",
            "temple",
            "chapel",
            "mosque",
            "synagogue",
            "lds",
        ],
        codes: &[],
        code_families: &[],
    },
    ZoneRule {
        name: "health-care",
        category: ZoneCategory::HealthCare,
        phrases: &[
            "hospital",
            "medical",
            "health care",
            "healthcare",
            "clinic",
            "assisted living",
        ],
        codes: &[],
        code_families: &[],
    },
    ZoneRule {
        name: "cemeteries",
        category: ZoneCategory::Cemeteries,
        phrases: &["cemetery", "cemeteries", "memorial gardens", "mortuary"],
        codes: &[],
        code_families: &[],
    },
    ZoneRule {
        name: "utilities",
        category: ZoneCategory::Utilities,
        phrases: &[
            "utility",
            "utilities",
            "substation",
            "water treatment",
            "wastewater",
            "sewer",
            "power plant",
            "well site",
        ],
        codes: &["u"],
        code_families: &["ut"],
    },
    // ── Office / business parks claimed before the generic park rule ─
    ZoneRule {
        name: "industrial-parks-and-office",
        category: ZoneCategory::Industrial,
        phrases: &[
            "business park",
            "research park",
            "industrial park",
            "office park",
            "technology park",
            "tech park",
            "professional office",
            "research and development",
        ],
        codes: &["p-o", "po", "r-d", "rd"],
        code_families: &["bp", "b-p", "bpk"],
    },
    // ── Parks and open space ────────────────────────────────────────
    ZoneRule {
        name: "parks-and-recreation",
        category: ZoneCategory::ParksAndRecreation,
        phrases: &[
            "park",
            "parks",
            "recreation",
            "recreational",
            "open space",
            "golf",
            "golf course",
            "trail",
            "trails",
            "natural area",
            "nature preserve",
        ],
        codes: &["p", "os", "pr", "p-r", "rec"],
        code_families: &["os", "p-os"],
    },
    // ── Generic industrial ──────────────────────────────────────────
    ZoneRule {
        name: "industrial",
        category: ZoneCategory::Industrial,
        phrases: &[
            "industrial",
            "industry",
            "manufacturing",
            "warehouse",
            "warehousing",
        ],
        codes: &["m", "i", "ind", "li", "hi", "mg"],
        code_families: &["m-1", "m1", "m-2", "m2", "i-1", "i1", "i-2", "i2"],
    },
    // ── Generic commercial ──────────────────────────────────────────
    ZoneRule {
        name: "commercial",
        category: ZoneCategory::Commercial,
        phrases: &[
            "commercial",
            "retail",
            "office",
            "business",
            "shopping",
            "neighborhood center",
        ],
        codes: &["c", "cg", "cn", "cc", "gc", "nc", "rc", "cs", "ch"],
        code_families: &["c-1", "c1", "c-2", "c2", "c-3", "c3", "c-h"],
    },
    // ── Residential without a density qualifier ─────────────────────
    ZoneRule {
        name: "residential",
        category: ZoneCategory::ResidentialLow,
        phrases: &["residential", "residence", "single family residential"],
        codes: &["r", "a-r"],
        code_families: &[],
    },
    // ── Remaining public and civic uses ─────────────────────────────
    ZoneRule {
        name: "public-institutional",
        category: ZoneCategory::PublicInstitutional,
        phrases: &[
            "public",
            "institutional",
            "civic",
            "government",
            "municipal",
            "quasi public",
            "semi public",
            "library",
            "fire station",
            "police",
            "airport",
        ],
        codes: &["pi", "p-i", "pf", "p-f", "qp", "pqp", "cf"],
        code_families: &[],
    },
];

/// A rule with its phrase and code triggers compiled.
pub(crate) struct CompiledRule {
    pub rule: &'static ZoneRule,
    /// Matches the joined, lowercased label text.
    phrases: Option<Regex>,
    /// Matches a single leading code token.
    codes: Option<Regex>,
}

impl CompiledRule {
    /// Returns `true` if a phrase occurs in `text` or a code trigger
    /// matches any of `code_tokens`.
    pub fn is_match(&self, text: &str, code_tokens: &[&str]) -> bool {
        self.phrases.as_ref().is_some_and(|p| p.is_match(text))
            || self
                .codes
                .as_ref()
                .is_some_and(|c| code_tokens.iter().any(|t| c.is_match(t)))
    }
}

static COMPILED: LazyLock<Vec<CompiledRule>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|rule| CompiledRule {
            rule,
            phrases: phrase_pattern(rule)
                .map(|p| Regex::new(&p).expect("valid zone phrase pattern")),
            codes: code_pattern(rule).map(|p| Regex::new(&p).expect("valid zone code pattern")),
        })
        .collect()
});

/// Returns the compiled rule table, building it on first use.
pub(crate) fn compiled() -> &'static [CompiledRule] {
    &COMPILED
}

/// The leading code token of a lowercased label field: its first run of
/// letters, digits, and hyphens.
pub(crate) fn leading_code_token(field: &str) -> Option<&str> {
    field
        .split_whitespace()
        .next()?
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .find(|t| !t.is_empty())
}

fn phrase_pattern(rule: &ZoneRule) -> Option<String> {
    if rule.phrases.is_empty() {
        return None;
    }
    let alternatives: Vec<String> = rule
        .phrases
        .iter()
        .map(|phrase| {
            let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
            format!(r"\b{}\b", words.join(r"[\s\-_/]+"))
        })
        .collect();
    Some(format!("(?:{})", alternatives.join("|")))
}

fn code_pattern(rule: &ZoneRule) -> Option<String> {
    let mut alternatives: Vec<String> = rule
        .codes
        .iter()
        .map(|code| format!("{}$", regex::escape(code)))
        .collect();
    alternatives.extend(
        rule.code_families
            .iter()
            .map(|family| format!("{}(?:$|-)", regex::escape(family))),
    );

    if alternatives.is_empty() {
        None
    } else {
        Some(format!("^(?:{})", alternatives.join("|")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{classify, matching_rule};

    fn name(raw: &str) -> ZoneCategory {
        classify(Some(raw), None, None)
    }

    fn code(raw: &str) -> ZoneCategory {
        classify(None, Some(raw), None)
    }

    #[test]
    fn every_rule_compiles_and_has_a_trigger() {
        assert_eq!(compiled().len(), RULES.len());
        for rule in RULES {
            assert!(
                !(rule.phrases.is_empty() && rule.codes.is_empty() && rule.code_families.is_empty()),
                "rule {} has no triggers",
                rule.name
            );
        }
    }

    #[test]
    fn rule_names_are_unique() {
        let mut seen = std::collections::BTreeSet::new();
        for rule in RULES {
            assert!(seen.insert(rule.name), "duplicate rule name {}", rule.name);
        }
    }

    #[test]
    fn overlay_routes_to_other() {
        assert_eq!(name("Commercial Overlay"), ZoneCategory::Other);
        assert_eq!(name("Main Street Corridor"), ZoneCategory::Other);
        assert_eq!(
            matching_rule(Some("Sensitive Lands Overlay"), None, None).map(|r| r.name),
            Some("overlay")
        );
    }

    #[test]
    fn mixed_use() {
        assert_eq!(name("Mixed-Use"), ZoneCategory::MixedUse);
        assert_eq!(name("mixed use residential"), ZoneCategory::MixedUse);
        assert_eq!(code("MU-2"), ZoneCategory::MixedUse);
        assert_eq!(code("MXD"), ZoneCategory::MixedUse);
    }

    #[test]
    fn residential_high() {
        assert_eq!(name("Multi-Family Residential"), ZoneCategory::ResidentialHigh);
        assert_eq!(name("Residential - High"), ZoneCategory::ResidentialHigh);
        assert_eq!(code("R-4"), ZoneCategory::ResidentialHigh);
        assert_eq!(code("RMF-30"), ZoneCategory::ResidentialHigh);
    }

    #[test]
    fn residential_medium() {
        assert_eq!(name("Medium Density Residential"), ZoneCategory::ResidentialMedium);
        assert_eq!(name("Townhomes"), ZoneCategory::ResidentialMedium);
        assert_eq!(code("R-2"), ZoneCategory::ResidentialMedium);
        assert_eq!(code("RM-15"), ZoneCategory::ResidentialMedium);
    }

    #[test]
    fn residential_low() {
        assert_eq!(name("Single Family"), ZoneCategory::ResidentialLow);
        assert_eq!(name("Rural Residential"), ZoneCategory::ResidentialLow);
        assert_eq!(code("R-1-10"), ZoneCategory::ResidentialLow);
        assert_eq!(code("RE"), ZoneCategory::ResidentialLow);
    }

    #[test]
    fn residential_family_prefix_does_not_overreach() {
        // R-10 is not part of the R-1 family; it falls to the bare
        // residential rule only if some other trigger matches.
        assert_eq!(code("R-10"), ZoneCategory::Other);
    }

    #[test]
    fn education_religious_health() {
        assert_eq!(name("Elementary School"), ZoneCategory::Education);
        assert_eq!(name("Park Elementary School"), ZoneCategory::Education);
        assert_eq!(name("LDS Church"), ZoneCategory::Religious);
        assert_eq!(name("Place of Worship"), ZoneCategory::Religious);
        assert_eq!(name("Hospital"), ZoneCategory::HealthCare);
        assert_eq!(name("Medical Office"), ZoneCategory::HealthCare);
    }

    #[test]
    fn cemeteries_before_parks() {
        assert_eq!(name("City Cemetery"), ZoneCategory::Cemeteries);
        assert_eq!(name("Memorial Gardens Park"), ZoneCategory::Cemeteries);
    }

    #[test]
    fn utilities() {
        assert_eq!(name("Public Utilities"), ZoneCategory::Utilities);
        assert_eq!(code("U"), ZoneCategory::Utilities);
    }

    #[test]
    fn business_park_is_industrial_not_park() {
        assert_eq!(name("Business Park"), ZoneCategory::Industrial);
        assert_eq!(name("Office Park"), ZoneCategory::Industrial);
        assert_eq!(code("BP-1"), ZoneCategory::Industrial);
    }

    #[test]
    fn professional_office_is_industrial() {
        assert_eq!(code("P-O"), ZoneCategory::Industrial);
        assert_eq!(name("Professional Office"), ZoneCategory::Industrial);
    }

    #[test]
    fn parks() {
        assert_eq!(name("City Park"), ZoneCategory::ParksAndRecreation);
        assert_eq!(name("Open Space"), ZoneCategory::ParksAndRecreation);
        assert_eq!(code("OS"), ZoneCategory::ParksAndRecreation);
        assert_eq!(code("P"), ZoneCategory::ParksAndRecreation);
    }

    #[test]
    fn single_letter_p_is_boundary_anchored() {
        // None of these contain a standalone "p" token.
        assert_ne!(name("Parking Structure"), ZoneCategory::ParksAndRecreation);
        assert_ne!(code("PUD"), ZoneCategory::ParksAndRecreation);
        assert_ne!(code("P-O"), ZoneCategory::ParksAndRecreation);
        assert_ne!(name("Shopping"), ZoneCategory::ParksAndRecreation);
    }

    #[test]
    fn industrial() {
        assert_eq!(name("Light Industrial"), ZoneCategory::Industrial);
        assert_eq!(code("M-1"), ZoneCategory::Industrial);
        assert_eq!(code("I-2"), ZoneCategory::Industrial);
    }

    #[test]
    fn commercial() {
        assert_eq!(name("General Commercial"), ZoneCategory::Commercial);
        assert_eq!(name("Retail"), ZoneCategory::Commercial);
        assert_eq!(code("C-2"), ZoneCategory::Commercial);
        assert_eq!(code("CG"), ZoneCategory::Commercial);
        assert_eq!(code("C"), ZoneCategory::Commercial);
    }

    #[test]
    fn commercial_code_does_not_match_inside_words() {
        assert_eq!(code("CCC"), ZoneCategory::Other);
        assert_eq!(code("C-20"), ZoneCategory::Other);
    }

    #[test]
    fn bare_residential() {
        assert_eq!(name("Residential"), ZoneCategory::ResidentialLow);
        assert_eq!(code("R"), ZoneCategory::ResidentialLow);
    }

    #[test]
    fn public_institutional() {
        assert_eq!(name("Civic Center"), ZoneCategory::PublicInstitutional);
        assert_eq!(name("Public Facilities"), ZoneCategory::PublicInstitutional);
        assert_eq!(code("PF"), ZoneCategory::PublicInstitutional);
    }

    #[test]
    fn public_park_prefers_park() {
        assert_eq!(name("Public Park"), ZoneCategory::ParksAndRecreation);
        assert_eq!(name("Public School"), ZoneCategory::Education);
    }

    #[test]
    fn general_plan_density_abbreviations() {
        assert_eq!(code("LDR"), ZoneCategory::ResidentialLow);
        assert_eq!(code("VLDR"), ZoneCategory::ResidentialLow);
        assert_eq!(code("MDR"), ZoneCategory::ResidentialMedium);
        assert_eq!(code("HDR-2"), ZoneCategory::ResidentialHigh);
        assert_eq!(name("LDR - Low Density"), ZoneCategory::ResidentialLow);
    }

    #[test]
    fn short_codes_ignore_words_in_prose() {
        assert_eq!(
            name("Planned Development Phase I"),
            ZoneCategory::Other
        );
        assert_eq!(name("Redwood Rd Commercial"), ZoneCategory::Commercial);
        assert_eq!(name("Lot P Retail"), ZoneCategory::Commercial);
        // The same short codes still work as a field's own code.
        assert_eq!(code("I"), ZoneCategory::Industrial);
        assert_eq!(code("RD"), ZoneCategory::Industrial);
        assert_eq!(name("P (Parks)"), ZoneCategory::ParksAndRecreation);
    }

    #[test]
    fn leading_token_stops_at_punctuation() {
        assert_eq!(leading_code_token("c-2/general"), Some("c-2"));
        assert_eq!(leading_code_token("(r-1-8) single"), Some("r-1-8"));
        assert_eq!(leading_code_token("planned development"), Some("planned"));
        assert_eq!(leading_code_token("   "), None);
    }

    #[test]
    fn unrecognized_is_other() {
        assert_eq!(name("Agricultural"), ZoneCategory::Other);
        assert_eq!(code("X-9"), ZoneCategory::Other);
    }
}
