#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Place-name normalization.
//!
//! Provides a deterministic normalization pipeline applied symmetrically
//! to stored keys (municipal boundary names, parcel city/county
//! attributes) and to incoming filter values. Both sides of every
//! place-name comparison must go through the same function here, otherwise
//! matching silently fails.

use regex::Regex;
use std::sync::LazyLock;

/// Punctuation that does not contribute to place-name matching.
static PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,#'/\\\-]+").expect("valid regex"));

/// Trailing tokens naming a county-level jurisdiction.
const COUNTY_SUFFIXES: &[&str] = &["COUNTY", "CNTY", "PARISH", "BOROUGH"];

/// Leading token pairs naming a municipal jurisdiction ("CITY OF X").
const CITY_PREFIXES: &[[&str; 2]] = &[["CITY", "OF"], ["TOWN", "OF"]];

/// Normalizes a free-text place name.
///
/// The pipeline:
/// 1. Uppercase
/// 2. Strip punctuation (`.`, `,`, `#`, `'`, `/`, `\`, `-`)
/// 3. Collapse whitespace runs to a single space
/// 4. Trim
///
/// Total and idempotent: `normalize(&normalize(x)) == normalize(x)`.
#[must_use]
pub fn normalize(input: &str) -> String {
    tokens(input).join(" ")
}

/// Normalizes a county name, additionally stripping trailing jurisdiction
/// suffixes so `"Davis County"` and `"DAVIS"` compare equal.
///
/// A lone suffix token is kept rather than reduced to an empty string.
#[must_use]
pub fn normalize_county(input: &str) -> String {
    let mut parts = tokens(input);
    while parts.len() > 1
        && parts
            .last()
            .is_some_and(|last| COUNTY_SUFFIXES.contains(&last.as_str()))
    {
        parts.pop();
    }
    parts.join(" ")
}

/// Normalizes a city name, additionally stripping a leading `"CITY OF"` or
/// `"TOWN OF"` so `"City of Kaysville"` and `"kaysville"` compare equal.
///
/// Trailing `"CITY"` is deliberately kept: it is part of names like
/// `"SALT LAKE CITY"`.
#[must_use]
pub fn normalize_city(input: &str) -> String {
    let mut parts = tokens(input);
    while parts.len() > 2
        && CITY_PREFIXES
            .iter()
            .any(|[a, b]| parts[0] == *a && parts[1] == *b)
    {
        parts.drain(..2);
    }
    parts.join(" ")
}

/// Returns `true` if a normalized stored name satisfies a normalized
/// requested name: either they are equal, or the requested name's tokens
/// are a leading prefix of the stored name's tokens.
///
/// `"LAYTON"` matches `"LAYTON CITY"` but `"FARM"` does not match
/// `"FARMINGTON"`. An empty request matches nothing.
#[must_use]
pub fn name_matches(stored: &str, requested: &str) -> bool {
    if requested.is_empty() {
        return false;
    }
    stored == requested
        || stored
            .strip_prefix(requested)
            .is_some_and(|rest| rest.starts_with(' '))
}

fn tokens(input: &str) -> Vec<String> {
    let upper = input.to_uppercase();
    let no_punct = PUNCTUATION_RE.replace_all(&upper, " ");
    no_punct.split_whitespace().map(String::from).collect()
}
