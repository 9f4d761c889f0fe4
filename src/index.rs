//! Insert-only spatial index over tagged coordinate entries.
//!
//! [`GeoEntryIndex`] answers "which tags lie within this radius / bounding
//! box" and nothing else. There is deliberately no removal or update
//! primitive: entries are append-only, and logical deletion is the caller's
//! problem (the database layers a live-tag map on top and treats index hits
//! absent from it as tombstones). The physical entry count therefore grows
//! monotonically for the lifetime of the process.

use rstar::{Point as RstarPoint, RTree, AABB};

use crate::spatial::{self, METERS_PER_DEGREE_LAT};
use crate::types::{Coordinates, EntryTag};

/// One physical entry in the index: a coordinate pair plus the tag minted
/// for this insertion event.
#[derive(Debug, Clone, PartialEq)]
struct IndexedEntry {
    lng: f64,
    lat: f64,
    tag: EntryTag,
}

impl IndexedEntry {
    /// Coordinate-only entry used to build query envelopes.
    fn anchor(lng: f64, lat: f64) -> Self {
        Self {
            lng,
            lat,
            tag: EntryTag::default(),
        }
    }
}

impl RstarPoint for IndexedEntry {
    type Scalar = f64;
    const DIMENSIONS: usize = 2;

    fn generate(mut generator: impl FnMut(usize) -> Self::Scalar) -> Self {
        Self {
            lng: generator(0),
            lat: generator(1),
            tag: EntryTag::default(),
        }
    }

    fn nth(&self, index: usize) -> Self::Scalar {
        match index {
            0 => self.lng,
            1 => self.lat,
            _ => unreachable!(),
        }
    }

    fn nth_mut(&mut self, index: usize) -> &mut Self::Scalar {
        match index {
            0 => &mut self.lng,
            1 => &mut self.lat,
            _ => unreachable!(),
        }
    }
}

/// Append-only R-tree of `(lat, lng, tag)` triples.
#[derive(Debug, Default)]
pub struct GeoEntryIndex {
    tree: RTree<IndexedEntry>,
}

impl GeoEntryIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Insert an entry. Entries are never mutated or removed afterwards.
    pub fn insert(&mut self, lat: f64, lng: f64, tag: EntryTag) {
        self.tree.insert(IndexedEntry { lng, lat, tag });
    }

    /// Tags of all entries within `radius_meters` of `center`, in
    /// unspecified order.
    ///
    /// Envelope queries on the R-tree narrow candidates cheaply, then an
    /// exact haversine check filters the corners of the box. A search
    /// straddling the antimeridian runs against two envelopes, one per side
    /// of the seam.
    pub fn query_within_radius(&self, center: &Coordinates, radius_meters: f64) -> Vec<EntryTag> {
        let mut tags = Vec::new();
        for envelope in radius_envelopes(center, radius_meters) {
            for entry in self.tree.locate_in_envelope(&envelope) {
                let candidate = Coordinates::new(entry.lat, entry.lng);
                if spatial::distance_between(center, &candidate) <= radius_meters {
                    tags.push(entry.tag);
                }
            }
        }
        tags
    }

    /// Tags of all entries inside the given bounding box, in unspecified
    /// order.
    pub fn query_within_bounds(&self, min: &Coordinates, max: &Coordinates) -> Vec<EntryTag> {
        let envelope = AABB::from_corners(
            IndexedEntry::anchor(min.lng, min.lat),
            IndexedEntry::anchor(max.lng, max.lat),
        );
        self.tree
            .locate_in_envelope(&envelope)
            .map(|entry| entry.tag)
            .collect()
    }

    /// Physical entry count, tombstones included.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// Bounding boxes that together contain every point within `radius_meters`
/// of `center`.
///
/// Longitude padding widens with latitude; near the poles it degenerates to
/// the full longitude range. A padded range poking past the antimeridian
/// wraps its overflow to the other side as a second envelope, since stored
/// longitudes always lie in `[-180, 180]`.
fn radius_envelopes(center: &Coordinates, radius_meters: f64) -> Vec<AABB<IndexedEntry>> {
    let lat_pad = radius_meters / METERS_PER_DEGREE_LAT;
    let lat_min = (center.lat - lat_pad).max(-90.0);
    let lat_max = (center.lat + lat_pad).min(90.0);

    let cos_lat = center.lat.to_radians().cos().abs();
    let lng_pad = if cos_lat > 1e-6 {
        lat_pad / cos_lat
    } else {
        180.0
    };

    if lng_pad >= 180.0 {
        return vec![AABB::from_corners(
            IndexedEntry::anchor(-180.0, lat_min),
            IndexedEntry::anchor(180.0, lat_max),
        )];
    }

    let lng_min = center.lng - lng_pad;
    let lng_max = center.lng + lng_pad;

    if lng_min < -180.0 {
        vec![
            AABB::from_corners(
                IndexedEntry::anchor(-180.0, lat_min),
                IndexedEntry::anchor(lng_max, lat_max),
            ),
            AABB::from_corners(
                IndexedEntry::anchor(lng_min + 360.0, lat_min),
                IndexedEntry::anchor(180.0, lat_max),
            ),
        ]
    } else if lng_max > 180.0 {
        vec![
            AABB::from_corners(
                IndexedEntry::anchor(lng_min, lat_min),
                IndexedEntry::anchor(180.0, lat_max),
            ),
            AABB::from_corners(
                IndexedEntry::anchor(-180.0, lat_min),
                IndexedEntry::anchor(lng_max - 360.0, lat_max),
            ),
        ]
    } else {
        vec![AABB::from_corners(
            IndexedEntry::anchor(lng_min, lat_min),
            IndexedEntry::anchor(lng_max, lat_max),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(n: u64) -> EntryTag {
        EntryTag(n)
    }

    #[test]
    fn test_radius_query_returns_tags_within_radius() {
        let mut index = GeoEntryIndex::new();
        index.insert(37.7609, -122.4350, tag(1));
        index.insert(37.7594, -122.4353, tag(2));
        index.insert(37.8817, -121.9141, tag(3)); // ~46 km away

        let center = Coordinates::new(37.7609, -122.4350);
        let mut tags = index.query_within_radius(&center, 1_000.0);
        tags.sort();
        assert_eq!(tags, vec![tag(1), tag(2)]);
    }

    #[test]
    fn test_radius_query_misses_everything_with_tiny_radius() {
        let mut index = GeoEntryIndex::new();
        index.insert(37.8817, -121.9141, tag(1));

        // ~75m off the indexed point, 16m radius
        let center = Coordinates::new(37.881, -121.914);
        assert!(index.query_within_radius(&center, 16.0).is_empty());
    }

    #[test]
    fn test_duplicate_insertions_accumulate() {
        let mut index = GeoEntryIndex::new();
        index.insert(37.76, -122.43, tag(1));
        index.insert(37.76, -122.43, tag(2));
        index.insert(37.76, -122.43, tag(3));

        assert_eq!(index.len(), 3);
        let center = Coordinates::new(37.76, -122.43);
        assert_eq!(index.query_within_radius(&center, 10.0).len(), 3);
    }

    #[test]
    fn test_bounds_query() {
        let mut index = GeoEntryIndex::new();
        index.insert(37.76, -122.43, tag(1));
        index.insert(37.88, -121.91, tag(2));

        let tags = index.query_within_bounds(
            &Coordinates::new(37.70, -122.50),
            &Coordinates::new(37.80, -122.40),
        );
        assert_eq!(tags, vec![tag(1)]);
    }

    #[test]
    fn test_radius_query_spans_the_antimeridian() {
        let mut index = GeoEntryIndex::new();
        index.insert(0.0, 179.999, tag(1));
        index.insert(0.0, -179.999, tag(2)); // ~222m across the seam
        index.insert(0.0, 179.0, tag(3)); // ~111 km west

        // Westward overflow: padded range dips below -180.
        let center = Coordinates::new(0.0, -179.999);
        let mut tags = index.query_within_radius(&center, 1_000.0);
        tags.sort();
        assert_eq!(tags, vec![tag(1), tag(2)]);

        // Eastward overflow: padded range pokes past +180.
        let center = Coordinates::new(0.0, 179.999);
        let mut tags = index.query_within_radius(&center, 1_000.0);
        tags.sort();
        assert_eq!(tags, vec![tag(1), tag(2)]);
    }

    #[test]
    fn test_high_latitude_radius_query() {
        let mut index = GeoEntryIndex::new();
        // Near Longyearbyen, where a naive symmetric degree pad under-covers
        // longitude.
        index.insert(78.2232, 15.6469, tag(1));
        index.insert(78.2232, 15.7500, tag(2)); // ~2.4 km east

        let center = Coordinates::new(78.2232, 15.6469);
        let mut tags = index.query_within_radius(&center, 5_000.0);
        tags.sort();
        assert_eq!(tags, vec![tag(1), tag(2)]);
    }
}
