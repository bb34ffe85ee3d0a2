//! Search execution: scan, order, cap, and shape result rows.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use parcel_map_parcel_models::{
    AcreageSource, BoundingBox, ParcelDetail, ParcelFilter, ParcelResult,
};
use parcel_map_spatial::{GeometryStore, ParcelEntry, geometry};

use crate::SearchError;
use crate::config::SearchConfig;
use crate::filter::PreparedFilter;

/// How many parcels are scanned between time-budget checks.
const BUDGET_CHECK_INTERVAL: usize = 1024;

/// Stateless search orchestrator. Holds only configuration, so one engine
/// can serve any number of concurrent searches.
#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    config: SearchConfig,
}

/// A matching parcel before it is shaped into a [`ParcelResult`].
struct Hit<'a> {
    entry: &'a ParcelEntry,
    acreage: Option<(f64, AcreageSource)>,
    inferred_vacant: bool,
}

struct Budget {
    started: Instant,
    budget: Duration,
}

impl Budget {
    fn check(&self) -> Result<(), SearchError> {
        let elapsed = self.started.elapsed();
        if elapsed > self.budget {
            return Err(SearchError::Timeout {
                elapsed_ms: millis(elapsed),
                budget_ms: millis(self.budget),
            });
        }
        Ok(())
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl SearchEngine {
    /// Creates an engine with the given configuration.
    #[must_use]
    pub const fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    #[must_use]
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Runs a search.
    ///
    /// Results are ordered by descending effective acreage (parcels with
    /// no acreage last), ties broken by ascending APN, and capped at the
    /// filter's limit (defaulted and clamped by configuration). Each row
    /// carries simplified, precision-reduced geometry.
    ///
    /// # Errors
    ///
    /// * [`SearchError::InvalidFilter`] if the filter fails validation;
    ///   nothing is scanned
    /// * [`SearchError::Timeout`] if the scan exceeds the time budget
    pub fn search(
        &self,
        store: &GeometryStore,
        filter: &ParcelFilter,
    ) -> Result<Vec<ParcelResult>, SearchError> {
        let budget = Budget {
            started: Instant::now(),
            budget: Duration::from_millis(self.config.timeout_ms),
        };
        self.search_within(store, filter, &budget)
    }

    fn search_within(
        &self,
        store: &GeometryStore,
        filter: &ParcelFilter,
        budget: &Budget,
    ) -> Result<Vec<ParcelResult>, SearchError> {
        let prepared = PreparedFilter::prepare(filter, &self.config, store)?;
        let parcels = store.parcels();

        let candidates: Box<dyn Iterator<Item = usize>> = match prepared.bbox() {
            Some(bbox) => Box::new(store.parcel_indices_in_bbox(bbox).into_iter()),
            None => Box::new(0..parcels.len()),
        };

        let mut scanned = 0usize;
        let mut hits: Vec<Hit<'_>> = Vec::new();

        for index in candidates {
            if scanned % BUDGET_CHECK_INTERVAL == 0 {
                budget.check()?;
            }
            scanned += 1;

            let entry = &parcels[index];
            if let Some(evaluation) = prepared.evaluate(store, entry) {
                hits.push(Hit {
                    entry,
                    acreage: entry.acreage(),
                    inferred_vacant: evaluation.inferred_vacant,
                });
            }
        }
        budget.check()?;

        let matched = hits.len();
        hits.sort_by(compare_hits);
        hits.truncate(prepared.limit());

        let results: Vec<ParcelResult> = hits.iter().map(|hit| self.to_result(hit)).collect();

        log::debug!(
            "Search scanned {scanned} parcels, matched {matched}, returned {} in {:.1?}",
            results.len(),
            budget.started.elapsed()
        );

        Ok(results)
    }

    /// Parcels intersecting a bounding box, for the tiling layer.
    ///
    /// # Errors
    ///
    /// * [`SearchError::InvalidFilter`] if `bbox` is malformed or `limit`
    ///   is zero
    /// * [`SearchError::Timeout`] if the scan exceeds the time budget
    pub fn in_bbox(
        &self,
        store: &GeometryStore,
        bbox: BoundingBox,
        limit: Option<u32>,
    ) -> Result<Vec<ParcelResult>, SearchError> {
        self.search(
            store,
            &ParcelFilter {
                bbox: Some(bbox),
                limit,
                ..ParcelFilter::default()
            },
        )
    }

    /// A single parcel with full-resolution geometry, its spatially
    /// resolved city (only when the attribute city is blank), and the
    /// categories of every zone it intersects.
    #[must_use]
    pub fn detail(&self, store: &GeometryStore, apn: &str) -> Option<ParcelDetail> {
        let entry = store.parcel(apn.trim())?;
        let acreage = entry.acreage();

        let has_city = entry
            .parcel
            .city
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty());
        let resolved_city = if has_city {
            None
        } else {
            entry
                .geometry
                .as_ref()
                .and_then(|g| store.city_for(g))
                .map(String::from)
        };

        let zone_categories = entry
            .geometry
            .as_ref()
            .map_or_else(Vec::new, |g| store.zone_categories_at(g));

        Some(ParcelDetail {
            parcel: entry.parcel.clone(),
            acres: acreage.map(|(a, _)| a),
            acreage_source: acreage.map(|(_, s)| s),
            resolved_city,
            zone_categories,
            geometry: entry.geometry.as_ref().map(geometry::to_geojson),
        })
    }

    fn to_result(&self, hit: &Hit<'_>) -> ParcelResult {
        let parcel = &hit.entry.parcel;
        let geometry = hit.entry.geometry.as_ref().map(|g| {
            geometry::to_geojson(&geometry::simplify_for_transport(
                g,
                self.config.simplify_tolerance,
                self.config.coordinate_precision,
            ))
        });

        ParcelResult {
            apn: parcel.apn.clone(),
            address: parcel.address.clone(),
            city: parcel.city.clone(),
            county: parcel.county.clone(),
            zip_code: parcel.zip_code.clone(),
            prop_class: parcel.prop_class.clone(),
            acres: hit.acreage.map(|(a, _)| a),
            acreage_source: hit.acreage.map(|(_, s)| s),
            total_mkt_value: parcel.total_mkt_value,
            land_mkt_value: parcel.land_mkt_value,
            built_yr: parcel.built_yr,
            bldg_sqft: parcel.bldg_sqft,
            owner_type: parcel.owner_type.clone(),
            inferred_vacant: hit.inferred_vacant,
            geometry,
        }
    }
}

/// Descending acreage with unknown acreage last, then ascending APN.
fn compare_hits(a: &Hit<'_>, b: &Hit<'_>) -> Ordering {
    let by_acres = match (a.acreage, b.acreage) {
        (Some((x, _)), Some((y, _))) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_acres.then_with(|| a.entry.parcel.apn.cmp(&b.entry.parcel.apn))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, MultiPolygon, Polygon};
    use parcel_map_parcel_models::{Parcel, Range};
    use parcel_map_zoning_models::{ZoneCategory, ZoneLabels};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![Polygon::new(
            LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
            vec![],
        )])
    }

    /// A ~0.001° square (about 2.3 acres at this latitude) with its
    /// south-west corner at `(x, y)`.
    fn lot(x: f64, y: f64) -> MultiPolygon<f64> {
        rect(x, y, x + 0.001, y + 0.001)
    }

    fn parcel(apn: &str, acres: Option<f64>) -> Parcel {
        Parcel {
            parcel_acres: acres,
            ..Parcel::new(apn)
        }
    }

    fn apns(results: &[ParcelResult]) -> Vec<&str> {
        results.iter().map(|r| r.apn.as_str()).collect()
    }

    fn engine() -> SearchEngine {
        SearchEngine::default()
    }

    /// Kaysville to the south, Layton to the north, one park zone and one
    /// commercial zone inside Kaysville.
    fn base() -> parcel_map_spatial::GeometryStoreBuilder {
        let mut b = GeometryStore::builder();
        b.add_boundary("Kaysville", rect(-111.96, 41.00, -111.90, 41.05))
            .add_boundary("Layton", rect(-111.96, 41.05, -111.90, 41.10))
            .upsert_zone(
                1,
                ZoneLabels::new(Some("City Park"), None, None),
                None,
                rect(-111.950, 41.010, -111.940, 41.020),
            )
            .upsert_zone(
                2,
                ZoneLabels::new(None, Some("C-2"), None),
                None,
                rect(-111.930, 41.010, -111.920, 41.020),
            );
        b
    }

    #[test]
    fn inferred_vacancy_overrides_class_label() {
        let mut b = base();
        let mut unimproved = parcel("A", Some(3.0));
        unimproved.prop_class = Some("Residential".into());
        let mut improved = parcel("B", Some(3.0));
        improved.prop_class = Some("Residential".into());
        improved.bldg_sqft = Some(2200.0);
        improved.built_yr = Some(1998);
        let mut labeled = parcel("C", Some(1.0));
        labeled.prop_class = Some("Vacant".into());
        labeled.bldg_sqft = Some(1200.0);
        b.add_parcel(unimproved, None)
            .add_parcel(improved, None)
            .add_parcel(labeled, None);
        let store = b.build();

        let results = engine()
            .search(
                &store,
                &ParcelFilter {
                    prop_classes: vec!["Vacant".into()],
                    ..ParcelFilter::default()
                },
            )
            .unwrap();

        assert_eq!(apns(&results), vec!["A", "C"]);
        assert!(results[0].inferred_vacant);
        assert!(!results[1].inferred_vacant);
    }

    #[test]
    fn acreage_falls_back_in_preference_order() {
        let mut b = base();
        let legacy = Parcel {
            size_acres: Some(2.5),
            ..Parcel::new("LEGACY")
        };
        b.add_parcel(legacy, Some(lot(-111.935, 41.030)))
            .add_parcel(Parcel::new("GEOM"), Some(lot(-111.937, 41.030)));
        let store = b.build();

        let results = engine().search(&store, &ParcelFilter::default()).unwrap();
        let legacy = results.iter().find(|r| r.apn == "LEGACY").unwrap();
        assert_eq!(legacy.acres, Some(2.5));
        assert_eq!(legacy.acreage_source, Some(AcreageSource::Legacy));

        let geom = results.iter().find(|r| r.apn == "GEOM").unwrap();
        assert_eq!(geom.acreage_source, Some(AcreageSource::Geometry));
        let acres = geom.acres.unwrap();
        assert!(acres > 2.0 && acres < 2.6, "got {acres}");
    }

    #[test]
    fn year_filter_excludes_null_unless_flagged() {
        let mut b = base();
        b.add_parcel(parcel("NULL_YEAR", Some(1.0)), None);
        let store = b.build();

        let mut filter = ParcelFilter {
            year_built: Range::new(Some(2000), None),
            ..ParcelFilter::default()
        };
        assert!(engine().search(&store, &filter).unwrap().is_empty());

        filter.include_null_year = true;
        assert_eq!(
            apns(&engine().search(&store, &filter).unwrap()),
            vec!["NULL_YEAR"]
        );
    }

    #[test]
    fn null_city_resolves_through_boundary() {
        let mut b = base();
        b.add_parcel(parcel("IN_KAYSVILLE", Some(1.0)), Some(lot(-111.935, 41.030)))
            .add_parcel(parcel("IN_LAYTON", Some(1.0)), Some(lot(-111.935, 41.070)));
        let store = b.build();

        let results = engine()
            .search(
                &store,
                &ParcelFilter {
                    cities: vec!["Kaysville".into()],
                    ..ParcelFilter::default()
                },
            )
            .unwrap();
        assert_eq!(apns(&results), vec!["IN_KAYSVILLE"]);
    }

    #[test]
    fn city_attribute_takes_fast_path() {
        let mut b = base();
        let far_away = Parcel {
            city: Some("Kaysville".into()),
            ..parcel("FAR", Some(1.0))
        };
        // Outside every boundary: only the attribute can match.
        b.add_parcel(far_away, Some(lot(-100.0, 30.0)));
        let store = b.build();

        let results = engine()
            .search(
                &store,
                &ParcelFilter {
                    cities: vec!["kaysville".into()],
                    ..ParcelFilter::default()
                },
            )
            .unwrap();
        assert_eq!(apns(&results), vec!["FAR"]);
    }

    #[test]
    fn zone_edge_overlap_is_returned() {
        let mut b = base();
        // Spans x -111.9405..-111.9375; the park ends at -111.940, so the
        // centroid (-111.939) is outside the park.
        b.add_parcel(
            parcel("EDGE", Some(1.0)),
            Some(rect(-111.9405, 41.015, -111.9375, 41.016)),
        )
        .add_parcel(parcel("OUTSIDE", Some(1.0)), Some(lot(-111.935, 41.030)))
        // Shares the park's east lot line without overlapping it.
        .add_parcel(
            parcel("NEIGHBOR", Some(1.0)),
            Some(rect(-111.940, 41.011, -111.939, 41.012)),
        );
        let store = b.build();

        let results = engine()
            .search(
                &store,
                &ParcelFilter {
                    zone_categories: vec!["Parks-and-Recreation".into()],
                    ..ParcelFilter::default()
                },
            )
            .unwrap();
        assert_eq!(apns(&results), vec!["EDGE"]);
    }

    #[test]
    fn cap_and_ordering_are_deterministic() {
        let mut b = base();
        for (apn, acres) in [
            ("P01", 1.0),
            ("P02", 7.0),
            ("P03", 3.0),
            ("P04", 7.0),
            ("P05", 9.0),
            ("P06", 2.0),
        ] {
            b.add_parcel(parcel(apn, Some(acres)), None);
        }
        b.add_parcel(parcel("P00", None), None);
        let store = b.build();

        let filter = ParcelFilter {
            limit: Some(3),
            ..ParcelFilter::default()
        };
        let first = engine().search(&store, &filter).unwrap();
        assert_eq!(apns(&first), vec!["P05", "P02", "P04"]);
        assert_eq!(first, engine().search(&store, &filter).unwrap());

        let everything = engine().search(&store, &ParcelFilter::default()).unwrap();
        assert_eq!(everything.last().unwrap().apn, "P00");
    }

    #[test]
    fn no_match_is_empty_and_inverted_range_is_an_error() {
        let mut b = base();
        b.add_parcel(parcel("A", Some(1.0)), None);
        let store = b.build();

        let none = engine()
            .search(
                &store,
                &ParcelFilter {
                    acres: Range::new(Some(50.0), None),
                    ..ParcelFilter::default()
                },
            )
            .unwrap();
        assert!(none.is_empty());

        let err = engine()
            .search(
                &store,
                &ParcelFilter {
                    acres: Range::new(Some(10.0), Some(5.0)),
                    ..ParcelFilter::default()
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            SearchError::InvalidFilter { field: "acres", .. }
        ));
    }

    #[test]
    fn unknown_references_match_nothing() {
        let mut b = base();
        b.add_parcel(parcel("A", Some(1.0)), Some(lot(-111.945, 41.015)));
        let store = b.build();

        for filter in [
            ParcelFilter {
                cities: vec!["Atlantis".into()],
                ..ParcelFilter::default()
            },
            ParcelFilter {
                zone_categories: vec!["SPACEPORT".into()],
                ..ParcelFilter::default()
            },
        ] {
            assert!(engine().search(&store, &filter).unwrap().is_empty());
        }
    }

    #[test]
    fn county_is_suffix_insensitive() {
        let mut b = base();
        let davis = Parcel {
            county: Some("DAVIS".into()),
            ..parcel("D", Some(1.0))
        };
        let weber = Parcel {
            county: Some("Weber County".into()),
            ..parcel("W", Some(1.0))
        };
        b.add_parcel(davis, None)
            .add_parcel(weber, None)
            .add_parcel(parcel("N", Some(1.0)), None);
        let store = b.build();

        let results = engine()
            .search(
                &store,
                &ParcelFilter {
                    county: Some("Davis County".into()),
                    ..ParcelFilter::default()
                },
            )
            .unwrap();
        assert_eq!(apns(&results), vec!["D"]);
    }

    #[test]
    fn market_value_excludes_nulls() {
        let mut b = base();
        let valued = Parcel {
            total_mkt_value: Some(350_000.0),
            ..parcel("V", Some(1.0))
        };
        b.add_parcel(valued, None)
            .add_parcel(parcel("N", Some(1.0)), None);
        let store = b.build();

        let results = engine()
            .search(
                &store,
                &ParcelFilter {
                    market_value: Range::new(Some(100_000.0), Some(400_000.0)),
                    ..ParcelFilter::default()
                },
            )
            .unwrap();
        assert_eq!(apns(&results), vec!["V"]);
    }

    #[test]
    fn bbox_query_uses_spatial_index() {
        let mut b = base();
        b.add_parcel(parcel("IN", Some(1.0)), Some(lot(-111.935, 41.030)))
            .add_parcel(parcel("OUT", Some(1.0)), Some(lot(-111.935, 41.070)))
            .add_parcel(parcel("NO_GEOM", Some(1.0)), None);
        let store = b.build();

        let results = engine()
            .in_bbox(
                &store,
                BoundingBox::new(-111.94, 41.02, -111.93, 41.04),
                None,
            )
            .unwrap();
        assert_eq!(apns(&results), vec!["IN"]);
        assert!(results[0].geometry.is_some());
    }

    #[test]
    fn exhausted_budget_times_out() {
        let mut b = base();
        b.add_parcel(parcel("A", Some(1.0)), None);
        let store = b.build();

        let budget = Budget {
            started: Instant::now(),
            budget: Duration::ZERO,
        };
        std::thread::sleep(Duration::from_millis(2));

        let err = engine()
            .search_within(&store, &ParcelFilter::default(), &budget)
            .unwrap_err();
        assert!(matches!(err, SearchError::Timeout { budget_ms: 0, .. }));
    }

    #[test]
    fn detail_resolves_missing_city_and_zones() {
        let mut b = base();
        b.add_parcel(
            parcel("PARK_EDGE", Some(1.0)),
            Some(rect(-111.9405, 41.015, -111.9375, 41.016)),
        );
        let with_city = Parcel {
            city: Some("Fruit Heights".into()),
            ..parcel("NAMED", Some(1.0))
        };
        b.add_parcel(with_city, Some(lot(-111.935, 41.030)));
        let store = b.build();

        let detail = engine().detail(&store, "PARK_EDGE").unwrap();
        assert_eq!(detail.resolved_city.as_deref(), Some("Kaysville"));
        assert_eq!(detail.zone_categories, vec![ZoneCategory::ParksAndRecreation]);
        assert!(detail.geometry.is_some());

        let named = engine().detail(&store, " NAMED ").unwrap();
        assert_eq!(named.resolved_city, None);
        assert!(named.zone_categories.is_empty());

        assert!(engine().detail(&store, "MISSING").is_none());
    }
}
