//! Forward geocoding: address string to coordinates.
//!
//! The service only needs the first candidate the geocoder offers; multiple
//! results for an ambiguous address are ignored beyond that.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::types::Coordinates;

/// Errors from a forward-geocoding attempt.
///
/// `ZeroResults` is the caller's problem (an address nothing matches) and
/// maps to a 400 upstream; everything else indicates a failing or
/// misconfigured geocoding backend.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("no results for address")]
    ZeroResults,

    #[error("geocoding quota exceeded")]
    OverQueryLimit,

    #[error("geocoding request denied")]
    RequestDenied,

    #[error("invalid geocoding request")]
    InvalidRequest,

    #[error("unexpected geocoding status: {0}")]
    UnexpectedStatus(String),

    #[error("geocoding transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl GeocodeError {
    /// Whether this failure is attributable to the caller's input rather
    /// than the backend.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ZeroResults)
    }
}

/// Seam for address-to-coordinates resolution.
#[async_trait]
pub trait Geocode: Send + Sync {
    /// Resolve `address` to coordinates, returning the first match.
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError>;
}

/// Google Maps geocoding API response envelope. Only the fields the service
/// consumes are modeled.
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    // Conforms to `Coordinates` as-is: `{ "lat": ..., "lng": ... }`.
    location: Coordinates,
}

/// Geocoder backed by the Google Maps forward-geocoding endpoint.
pub struct GoogleGeocoder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GoogleGeocoder {
    /// Build a geocoder against the given endpoint.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("brewfinder/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl Geocode for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<GeocodeResponse>()
            .await?;

        match response.status.as_str() {
            "OK" => response
                .results
                .first()
                .map(|result| result.geometry.location)
                .ok_or(GeocodeError::ZeroResults),
            "ZERO_RESULTS" => Err(GeocodeError::ZeroResults),
            "OVER_QUERY_LIMIT" => Err(GeocodeError::OverQueryLimit),
            "REQUEST_DENIED" => Err(GeocodeError::RequestDenied),
            "INVALID_REQUEST" => Err(GeocodeError::InvalidRequest),
            other => Err(GeocodeError::UnexpectedStatus(other.to_string())),
        }
    }
}

/// Fixture geocoder returning a fixed coordinate for every address. For
/// tests that exercise the search path without a network dependency.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeocoder(pub Coordinates);

#[async_trait]
impl Geocode for FixedGeocoder {
    async fn geocode(&self, _address: &str) -> Result<Coordinates, GeocodeError> {
        Ok(self.0)
    }
}
