//! HTTP handler functions for the parcel map API.

use actix_web::{HttpResponse, web};
use parcel_map_parcel_models::{BoundingBox, ParcelFilter};
use parcel_map_records::RecordError;
use parcel_map_search::SearchError;
use parcel_map_server_models::{
    ApiError, ApiHealth, ApiReloadResult, ApiSearchResponse, ApiZoneCategory, BboxQueryParams,
    LinkRequest,
};
use parcel_map_zoning_models::ZoneCategory;

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let store = state.snapshot();
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        parcels: store.parcel_count(),
        zones: store.zone_count(),
        boundaries: store.boundary_count(),
    })
}

/// `GET /api/zone-categories`
///
/// Returns the closed set of canonical zone categories with display labels.
pub async fn zone_categories() -> HttpResponse {
    let categories: Vec<ApiZoneCategory> = ZoneCategory::all()
        .iter()
        .copied()
        .map(ApiZoneCategory::from)
        .collect();

    HttpResponse::Ok().json(categories)
}

/// `POST /api/parcels/search`
///
/// Runs the filter against the current snapshot on the blocking pool.
pub async fn search(
    state: web::Data<AppState>,
    filter: web::Json<ParcelFilter>,
) -> HttpResponse {
    let store = state.snapshot();
    let engine = state.engine.clone();
    let filter = filter.into_inner();

    match web::block(move || engine.search(&store, &filter)).await {
        Ok(Ok(results)) => HttpResponse::Ok().json(ApiSearchResponse::from(results)),
        Ok(Err(e)) => search_error_response(&e),
        Err(e) => {
            log::error!("Search task failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Search failed"))
        }
    }
}

/// `GET /api/parcels?bbox=w,s,e,n&limit=n`
///
/// Parcels intersecting a viewport, for the map's tiling layer.
pub async fn parcels_in_bbox(
    state: web::Data<AppState>,
    params: web::Query<BboxQueryParams>,
) -> HttpResponse {
    let Some(bbox) = params.bbox.as_deref().and_then(parse_bbox) else {
        return HttpResponse::BadRequest().json(ApiError::for_field(
            "bbox must be four comma-separated numbers: west,south,east,north",
            "bbox",
        ));
    };

    let store = state.snapshot();
    let engine = state.engine.clone();
    let limit = params.limit;

    match web::block(move || engine.in_bbox(&store, bbox, limit)).await {
        Ok(Ok(results)) => HttpResponse::Ok().json(ApiSearchResponse::from(results)),
        Ok(Err(e)) => search_error_response(&e),
        Err(e) => {
            log::error!("Bbox query task failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Bbox query failed"))
        }
    }
}

/// `GET /api/parcels/{apn}`
///
/// Resolving the city and zones runs polygon tests, so it goes to the
/// blocking pool like a search.
pub async fn parcel_detail(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let apn = path.into_inner();
    let store = state.snapshot();
    let engine = state.engine.clone();
    let lookup = apn.clone();

    match web::block(move || engine.detail(&store, &lookup)).await {
        Ok(Some(detail)) => HttpResponse::Ok().json(detail),
        Ok(None) => {
            HttpResponse::NotFound().json(ApiError::new(format!("Parcel not found: {apn}")))
        }
        Err(e) => {
            log::error!("Detail task failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Detail lookup failed"))
        }
    }
}

/// `POST /api/records/{record_id}/links`
///
/// Links APNs to an external record, then reads it back. The response
/// reports which links actually landed.
pub async fn link_records(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<LinkRequest>,
) -> HttpResponse {
    let Some(records) = state.records.clone() else {
        return HttpResponse::ServiceUnavailable()
            .json(ApiError::new("No record store is configured"));
    };
    let record_id = path.into_inner();

    match parcel_map_records::link_and_verify(records.as_ref(), &record_id, &body.apns).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => {
            log::error!("Linking record {record_id} failed: {e}");
            let body = ApiError::new(e.to_string());
            match e {
                RecordError::RateLimited => HttpResponse::TooManyRequests().json(body),
                RecordError::NotFound { .. } => HttpResponse::NotFound().json(body),
                RecordError::Http(_) | RecordError::Status { .. } | RecordError::Parse { .. } => {
                    HttpResponse::BadGateway().json(body)
                }
            }
        }
    }
}

/// `POST /api/admin/reload`
///
/// Rebuilds the snapshot from the database and swaps it in. Searches
/// already running keep the old snapshot.
pub async fn reload(state: web::Data<AppState>) -> HttpResponse {
    let path = state.db_path.clone();

    match web::block(move || crate::load_snapshot(&path)).await {
        Ok(Ok(store)) => {
            let result = ApiReloadResult {
                parcels: store.parcel_count(),
                zones: store.zone_count(),
                boundaries: store.boundary_count(),
            };
            state.replace_store(store);
            log::info!(
                "Reloaded snapshot: {} parcels, {} zones, {} boundaries",
                result.parcels,
                result.zones,
                result.boundaries
            );
            HttpResponse::Ok().json(result)
        }
        Ok(Err(e)) => {
            log::error!("Reload failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new(e.to_string()))
        }
        Err(e) => {
            log::error!("Reload task failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Reload failed"))
        }
    }
}

fn search_error_response(e: &SearchError) -> HttpResponse {
    match e {
        SearchError::InvalidFilter { field, .. } => {
            HttpResponse::BadRequest().json(ApiError::for_field(e.to_string(), *field))
        }
        SearchError::Timeout { .. } => {
            log::warn!("{e}");
            HttpResponse::GatewayTimeout().json(ApiError::new(e.to_string()))
        }
    }
}

/// Parses a bbox string "west,south,east,north" into a [`BoundingBox`].
fn parse_bbox(s: &str) -> Option<BoundingBox> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse().ok())
        .collect::<Option<_>>()?;
    if parts.len() == 4 {
        Some(BoundingBox::new(parts[0], parts[1], parts[2], parts[3]))
    } else {
        None
    }
}
