//! Record types, identifier newtypes, and service configuration.
//!
//! The public location id and the internal index entry tag are deliberately
//! distinct integer domains. Conflating them is the classic bug in designs
//! that layer logical updates over an insert-only index, so each gets its own
//! newtype and they never convert into one another.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Public identifier of a location record.
///
/// Assigned by the store on `add` (monotonically increasing, starting at 1)
/// and immutable for the lifetime of the record. Bulk loads and upserts may
/// supply their own ids; the store advances its counter past any id it sees
/// so freshly assigned ids never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub u64);

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Internal tag identifying one physical insertion into the spatial index.
///
/// Minted once per add/update, never reused, never removed from the index.
/// A tag that no longer appears in the live-tag map marks its index entry as
/// a tombstone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EntryTag(pub(crate) u64);

/// A latitude/longitude pair in degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A named, addressed point of interest keyed by a public id.
///
/// Field order matches the 5-column bulk-load CSV format
/// (`id,name,address,lat,lng`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

/// Location content without an id, as submitted by clients on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLocation {
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

impl NewLocation {
    pub(crate) fn into_location(self, id: LocationId) -> Location {
        Location {
            id,
            name: self.name,
            address: self.address,
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Service configuration.
///
/// Loadable from JSON and easy to extend; every field has a sensible default
/// so an empty document is a valid config.
///
/// # Example
///
/// ```rust
/// use brewfinder::Config;
///
/// let json = r#"{ "search_radii_miles": [1.0, 5.0] }"#;
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert_eq!(config.search_radii_miles, vec![1.0, 5.0]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Radius schedule, in miles, used by the nearest-location endpoint.
    /// Searched in order; the first radius that yields a hit wins.
    #[serde(default = "Config::default_search_radii")]
    pub search_radii_miles: Vec<f64>,

    /// Forward-geocoding endpoint URL.
    #[serde(default = "Config::default_geocode_endpoint")]
    pub geocode_endpoint: String,

    /// API key for the geocoding service. Usually supplied via the
    /// `GEOCODE_API_KEY` environment variable rather than the config file.
    #[serde(default)]
    pub geocode_api_key: Option<String>,
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn default_search_radii() -> Vec<f64> {
        vec![0.5, 1.0, 3.0, 7.0]
    }

    fn default_geocode_endpoint() -> String {
        "https://maps.googleapis.com/maps/api/geocode/json".to_string()
    }

    pub fn with_search_radii(mut self, radii_miles: Vec<f64>) -> Self {
        assert!(
            !radii_miles.is_empty(),
            "search radius schedule must contain at least one radius"
        );
        self.search_radii_miles = radii_miles;
        self
    }

    pub fn with_geocode_api_key(mut self, key: impl Into<String>) -> Self {
        self.geocode_api_key = Some(key.into());
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_radii_miles: Self::default_search_radii(),
            geocode_endpoint: Self::default_geocode_endpoint(),
            geocode_api_key: None,
        }
    }
}

/// Counts reported by [`crate::LocationDatabase::stats`].
///
/// `index_entries` only ever grows: superseded and removed records leave
/// their entries behind in the spatial index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatabaseStats {
    /// Number of live location records.
    pub live_locations: usize,
    /// Physical entry count of the spatial index, tombstones included.
    pub index_entries: usize,
}
