//! HTTP layer: CRUD over location records plus nearest-by-address search.
//!
//! All input validation lives here; the store beneath assumes well-formed
//! ids and coordinates. Absent ids translate to 404, validation failures to
//! a 400 with a JSON `errors` array, and geocoding backend failures to 502.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::db::LocationDatabase;
use crate::error::Error;
use crate::geocode::{Geocode, GeocodeError};
use crate::spatial::DistanceUnit;
use crate::types::{Config, Location, LocationId, NewLocation};

/// Sane maximum length for string fields.
const MAX_FIELD_LENGTH: usize = 100;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: LocationDatabase,
    pub geocoder: Arc<dyn Geocode>,
    pub config: Arc<Config>,
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/locations", post(create_location))
        .route("/locations/nearest", get(find_nearest))
        .route(
            "/locations/:id",
            get(get_location)
                .put(put_location)
                .patch(patch_location)
                .delete(delete_location),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Internal failure surfaced to the client as a 5xx.
enum ApiError {
    Internal(Error),
    GeocodeBackend(GeocodeError),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Internal(err) => {
                error!(%err, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Self::GeocodeBackend(err) => {
                error!(%err, "geocoding backend failure");
                StatusCode::BAD_GATEWAY.into_response()
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ValidationIssue {
    param: &'static str,
    msg: String,
}

impl ValidationIssue {
    fn new(param: &'static str, msg: impl Into<String>) -> Self {
        Self {
            param,
            msg: msg.into(),
        }
    }
}

fn validation_failure(issues: Vec<ValidationIssue>) -> Option<Response> {
    if issues.is_empty() {
        None
    } else {
        Some((StatusCode::BAD_REQUEST, Json(json!({ "errors": issues }))).into_response())
    }
}

fn check_name(name: &str) -> Option<ValidationIssue> {
    let trimmed = name.trim();
    // Character count, not byte length; the limit applies to any script.
    (trimmed.is_empty() || trimmed.chars().count() > MAX_FIELD_LENGTH)
        .then(|| ValidationIssue::new("name", format!("must be 1-{} characters", MAX_FIELD_LENGTH)))
}

fn check_address(address: &str) -> Option<ValidationIssue> {
    let trimmed = address.trim();
    (trimmed.is_empty() || trimmed.chars().count() > MAX_FIELD_LENGTH).then(|| {
        ValidationIssue::new(
            "address",
            format!("must be 1-{} characters", MAX_FIELD_LENGTH),
        )
    })
}

fn check_lat(lat: f64) -> Option<ValidationIssue> {
    (!(-90.0..=90.0).contains(&lat) || !lat.is_finite())
        .then(|| ValidationIssue::new("lat", "must be a latitude in [-90, 90]"))
}

fn check_lng(lng: f64) -> Option<ValidationIssue> {
    (!(-180.0..=180.0).contains(&lng) || !lng.is_finite())
        .then(|| ValidationIssue::new("lng", "must be a longitude in [-180, 180]"))
}

/// Full location content, required on POST and PUT.
#[derive(Debug, Deserialize)]
struct LocationPayload {
    name: String,
    address: String,
    lat: f64,
    lng: f64,
}

impl LocationPayload {
    fn issues(&self) -> Vec<ValidationIssue> {
        [
            check_name(&self.name),
            check_address(&self.address),
            check_lat(self.lat),
            check_lng(self.lng),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn into_new_location(self) -> NewLocation {
        NewLocation {
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Partial location content, accepted on PATCH.
#[derive(Debug, Default, Deserialize)]
struct LocationPatch {
    name: Option<String>,
    address: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
}

impl LocationPatch {
    fn issues(&self) -> Vec<ValidationIssue> {
        [
            self.name.as_deref().and_then(check_name),
            self.address.as_deref().and_then(check_address),
            self.lat.and_then(check_lat),
            self.lng.and_then(check_lng),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn apply_to(self, location: &mut Location) {
        if let Some(name) = self.name {
            location.name = name.trim().to_string();
        }
        if let Some(address) = self.address {
            location.address = address.trim().to_string();
        }
        if let Some(lat) = self.lat {
            location.lat = lat;
        }
        if let Some(lng) = self.lng {
            location.lng = lng;
        }
    }
}

async fn create_location(
    State(state): State<AppState>,
    Json(payload): Json<LocationPayload>,
) -> Result<Response, ApiError> {
    if let Some(rejection) = validation_failure(payload.issues()) {
        return Ok(rejection);
    }

    let location = state.db.add(payload.into_new_location())?;
    Ok((StatusCode::CREATED, Json(location)).into_response())
}

async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Response, ApiError> {
    match state.db.get(LocationId(id))? {
        Some(location) => Ok(Json(location).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

async fn put_location(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<LocationPayload>,
) -> Result<Response, ApiError> {
    if let Some(rejection) = validation_failure(payload.issues()) {
        return Ok(rejection);
    }

    // PUT replaces an existing record; it does not resurrect removed ids.
    let location = payload.into_new_location().into_location(LocationId(id));
    if !state.db.replace(location.clone())? {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }
    Ok(Json(location).into_response())
}

async fn patch_location(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(patch): Json<LocationPatch>,
) -> Result<Response, ApiError> {
    if let Some(rejection) = validation_failure(patch.issues()) {
        return Ok(rejection);
    }

    let Some(mut location) = state.db.get(LocationId(id))? else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    patch.apply_to(&mut location);
    state.db.update(location.clone())?;
    Ok(Json(location).into_response())
}

async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Response, ApiError> {
    let status = if state.db.remove(LocationId(id))? {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    Ok(status.into_response())
}

#[derive(Debug, Deserialize)]
struct NearestParams {
    address: String,
}

/// Geocode the address, then search outward through the configured radius
/// schedule, stopping at the first radius that yields a hit. Keeps the
/// common case (a nearby match) cheap without giving up on distant ones.
async fn find_nearest(
    State(state): State<AppState>,
    Query(params): Query<NearestParams>,
) -> Result<Response, ApiError> {
    if params.address.trim().is_empty() {
        let issues = vec![ValidationIssue::new("address", "must not be empty")];
        let body = json!({ "errors": issues });
        return Ok((StatusCode::BAD_REQUEST, Json(body)).into_response());
    }

    let coordinates = match state.geocoder.geocode(&params.address).await {
        Ok(coordinates) => coordinates,
        Err(err) if err.is_client_error() => {
            let body = json!({
                "errors": [{ "msg": "unable to geocode address", "value": params.address }]
            });
            return Ok((StatusCode::BAD_REQUEST, Json(body)).into_response());
        }
        Err(err) => return Err(ApiError::GeocodeBackend(err)),
    };

    for radius_miles in &state.config.search_radii_miles {
        let radius_meters = DistanceUnit::Miles.to_meters(*radius_miles);
        if let Some(location) = state.db.find_nearest(&coordinates, radius_meters)? {
            return Ok(Json(location).into_response());
        }
    }

    let max_radius = state
        .config
        .search_radii_miles
        .last()
        .copied()
        .unwrap_or_default();
    let body = json!({
        "errors": [{
            "msg": format!("no locations found within {} miles", max_radius),
            "value": params.address,
        }]
    });
    Ok(Json(body).into_response())
}
