//! In-memory location-lookup service: CRUD over point-of-interest records
//! plus nearest-neighbor search by address.
//!
//! The store fakes update and delete on top of an insert-only spatial index
//! by tagging every physical insertion and tracking which tag is live per
//! record; index hits whose tag is no longer live are skipped as tombstones.
//!
//! ```rust
//! use brewfinder::{Coordinates, LocationDatabase, NewLocation};
//!
//! let db = LocationDatabase::new();
//! let cafe = db.add(NewLocation {
//!     name: "Four Barrel".to_string(),
//!     address: "375 Valencia St".to_string(),
//!     lat: 37.7670,
//!     lng: -122.4220,
//! })?;
//!
//! let nearest = db.find_nearest(&Coordinates::new(37.7668, -122.4218), 500.0)?;
//! assert_eq!(nearest.unwrap().id, cafe.id);
//! # Ok::<(), brewfinder::Error>(())
//! ```

pub mod db;
pub mod error;
pub mod geocode;
pub mod index;
pub mod routes;
pub mod spatial;
pub mod types;

pub use db::LocationDatabase;
pub use error::{Error, Result};
pub use geocode::{FixedGeocoder, Geocode, GeocodeError, GoogleGeocoder};
pub use index::GeoEntryIndex;
pub use routes::{router, AppState};
pub use spatial::{distance_between, DistanceUnit};
pub use types::{Config, Coordinates, DatabaseStats, Location, LocationId, NewLocation};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::db::LocationDatabase;
    pub use crate::error::{Error, Result};
    pub use crate::geocode::{Geocode, GoogleGeocoder};
    pub use crate::spatial::{distance_between, DistanceUnit};
    pub use crate::types::{Config, Coordinates, Location, LocationId, NewLocation};
}
