//! The in-memory location store.
//!
//! [`LocationDatabase`] composes three structures that must stay consistent
//! as a unit:
//!
//! - the **record store** (`locations`): public id to current record,
//! - the **live-tag map** (`live_tags`): index entry tag to public id, for
//!   the record's most recent insertion only,
//! - the **spatial index**: append-only `(lat, lng, tag)` triples with no
//!   delete or update primitive.
//!
//! Updates and removals never touch the index. Instead, a record's previous
//! tag is dropped from the live-tag map, orphaning its index entry; readers
//! dereference every index hit through the live-tag map and skip hits whose
//! tag is no longer present. The index footprint grows without bound across
//! the process lifetime in proportion to the number of writes; no
//! compaction or rebuild is attempted.

use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::index::GeoEntryIndex;
use crate::spatial;
use crate::types::{Coordinates, DatabaseStats, EntryTag, Location, LocationId, NewLocation};

/// First id handed out by [`LocationDatabase::add`] on an empty database.
const ID_BASE: u64 = 1;

/// In-memory store for location records with nearest-neighbor search.
///
/// Cheap to clone; clones share state. All operations take `&self` and
/// acquire a single reader-writer lock guarding the record store, the
/// live-tag map, and the spatial index as one unit, so no reader can
/// observe a partially applied write.
///
/// # Examples
///
/// ```rust
/// use brewfinder::{Coordinates, LocationDatabase, NewLocation};
///
/// let db = LocationDatabase::new();
/// let cafe = db.add(NewLocation {
///     name: "Ritual Coffee Roasters".to_string(),
///     address: "1026 Valencia St".to_string(),
///     lat: 37.7563,
///     lng: -122.4212,
/// })?;
///
/// let found = db.find_nearest(&Coordinates::new(37.7560, -122.4210), 500.0)?;
/// assert_eq!(found.unwrap().id, cafe.id);
/// # Ok::<(), brewfinder::Error>(())
/// ```
#[derive(Clone)]
pub struct LocationDatabase {
    inner: Arc<RwLock<DatabaseInner>>,
}

struct StoredLocation {
    location: Location,
    /// The live tag for this record; its previous tags are all orphaned.
    tag: EntryTag,
}

struct DatabaseInner {
    locations: FxHashMap<LocationId, StoredLocation>,
    live_tags: FxHashMap<EntryTag, LocationId>,
    index: GeoEntryIndex,
    next_id: u64,
    next_tag: u64,
}

impl LocationDatabase {
    /// Create an empty database.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(DatabaseInner {
                locations: FxHashMap::default(),
                live_tags: FxHashMap::default(),
                index: GeoEntryIndex::new(),
                next_id: ID_BASE,
                next_tag: 0,
            })),
        }
    }

    /// Load a database from a headerless 5-column CSV file
    /// (`id,name,address,lat,lng`), trimming surrounding whitespace.
    ///
    /// Records pass through [`update`](Self::update) in source order, so a
    /// later row with a duplicate id overwrites the earlier one. A malformed
    /// row aborts the load.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading locations");

        let db = Self::new();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_path(path)?;

        for record in reader.deserialize::<Location>() {
            let location = record?;
            debug!(id = %location.id, name = %location.name, "loaded location");
            db.update(location)?;
        }

        info!(count = db.len()?, path = %path.display(), "finished loading locations");
        Ok(db)
    }

    /// Insert a new record, assigning it the next unused id.
    ///
    /// Returns the fully materialized record. Never fails for well-formed
    /// input.
    pub fn add(&self, new_location: NewLocation) -> Result<Location> {
        let mut inner = self.write()?;
        let id = LocationId(inner.next_id);
        let location = new_location.into_location(id);
        inner.upsert(location.clone());
        Ok(location)
    }

    /// The current record for `id`, or `None` if no such record is live.
    pub fn get(&self, id: LocationId) -> Result<Option<Location>> {
        let inner = self.read()?;
        Ok(inner.locations.get(&id).map(|stored| stored.location.clone()))
    }

    /// Unconditional upsert by `location.id`.
    ///
    /// Acts as an insert for a brand-new id and as an in-place update for an
    /// existing one; in the latter case the record's prior index entry is
    /// orphaned before a fresh tag is minted. An id removed earlier is
    /// happily revived, indistinguishable from a fresh record.
    pub fn update(&self, location: Location) -> Result<()> {
        let mut inner = self.write()?;
        inner.upsert(location);
        Ok(())
    }

    /// Replace the record with `location.id`, but only if it is currently
    /// live.
    ///
    /// Returns whether a record was replaced. Unlike
    /// [`update`](Self::update) this never revives a missing or removed id,
    /// and the liveness check and the write happen under a single lock
    /// acquisition, so a concurrent removal cannot slip in between.
    pub fn replace(&self, location: Location) -> Result<bool> {
        let mut inner = self.write()?;
        if !inner.locations.contains_key(&location.id) {
            return Ok(false);
        }
        inner.upsert(location);
        Ok(true)
    }

    /// Remove the record with the given id.
    ///
    /// Returns whether a record was actually removed. The record's index
    /// entry stays in the spatial index permanently; dropping its tag from
    /// the live-tag map is what makes it dead.
    pub fn remove(&self, id: LocationId) -> Result<bool> {
        let mut inner = self.write()?;
        match inner.locations.remove(&id) {
            Some(stored) => {
                inner.live_tags.remove(&stored.tag);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The live record nearest to `center` within `radius_meters`, or
    /// `None` if no live record lies within the radius.
    ///
    /// Index candidates whose tag is missing from the live-tag map are
    /// tombstones (removed records or superseded updates) and are skipped.
    /// Among candidates at exactly equal distance the first one encountered
    /// wins; index return order is unspecified.
    pub fn find_nearest(
        &self,
        center: &Coordinates,
        radius_meters: f64,
    ) -> Result<Option<Location>> {
        let inner = self.read()?;

        let mut best: Option<(f64, &Location)> = None;
        for tag in inner.index.query_within_radius(center, radius_meters) {
            let Some(id) = inner.live_tags.get(&tag) else {
                continue; // tombstone: removed or superseded entry
            };
            // A live tag always maps to a stored record; tolerate a miss
            // rather than assert on it.
            let Some(stored) = inner.locations.get(id) else {
                continue;
            };

            let distance = spatial::distance_between(center, &stored.location.coordinates());
            match best {
                Some((best_distance, _)) if distance >= best_distance => {}
                _ => best = Some((distance, &stored.location)),
            }
        }

        Ok(best.map(|(_, location)| location.clone()))
    }

    /// Number of live records. The spatial index entry count is larger
    /// whenever updates or removals have occurred; see [`stats`](Self::stats).
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.locations.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.locations.is_empty())
    }

    /// Live record count alongside the physical index entry count.
    pub fn stats(&self) -> Result<DatabaseStats> {
        let inner = self.read()?;
        Ok(DatabaseStats {
            live_locations: inner.locations.len(),
            index_entries: inner.index.len(),
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, DatabaseInner>> {
        self.inner.read().map_err(|_| Error::Lock)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, DatabaseInner>> {
        self.inner.write().map_err(|_| Error::Lock)
    }
}

impl Default for LocationDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseInner {
    /// Store `location`, orphaning any prior index entry for its id and
    /// inserting a freshly tagged one.
    fn upsert(&mut self, location: Location) {
        if let Some(prev) = self.locations.get(&location.id) {
            self.live_tags.remove(&prev.tag);
        }

        let tag = EntryTag(self.next_tag);
        self.next_tag += 1;

        self.index.insert(location.lat, location.lng, tag);
        self.live_tags.insert(tag, location.id);

        // Keep `add` ids ahead of any caller-supplied id.
        if location.id.0 >= self.next_id {
            self.next_id = location.id.0 + 1;
        }

        self.locations
            .insert(location.id, StoredLocation { location, tag });
    }
}
