use std::io::Write;

use brewfinder::spatial::DistanceUnit;
use brewfinder::{Coordinates, Location, LocationDatabase, LocationId, NewLocation};

fn miles(value: f64) -> f64 {
    DistanceUnit::Miles.to_meters(value)
}

fn location(id: u64, name: &str, lat: f64, lng: f64) -> Location {
    Location {
        id: LocationId(id),
        name: name.to_string(),
        address: format!("{} Mission St", id),
        lat,
        lng,
    }
}

/// Full lifecycle against a CSV-loaded database: search, move, remove.
#[test]
fn test_csv_load_then_search_update_remove() {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "1,Cafe One,1 Valencia St,37.760889,-122.435010").unwrap();
    writeln!(file, "2,Cafe Two,2 Valencia St,37.759418,-122.435263").unwrap();
    writeln!(file, "3,Cafe Three,3 Danville Blvd,37.881658,-121.914146").unwrap();
    file.flush().unwrap();

    let db = LocationDatabase::load(file.path()).expect("Failed to load database");
    assert_eq!(db.len().unwrap(), 3);

    let near_one = Coordinates::new(37.760889, -122.435020);
    let nearest = db.find_nearest(&near_one, miles(1.0)).unwrap().unwrap();
    assert_eq!(nearest.id, LocationId(1));

    // Move record 2 away; its orphaned index entry must not resurface.
    db.update(location(2, "Cafe Two", 37.764766, -122.449488))
        .unwrap();
    let tight = db.find_nearest(&Coordinates::new(37.759418, -122.435263), miles(0.05));
    match tight.unwrap() {
        Some(found) => assert_ne!(found.id, LocationId(2)),
        None => {}
    }

    // Remove record 1; the same 1-mile search now skips it.
    assert!(db.remove(LocationId(1)).unwrap());
    let after_remove = db.find_nearest(&near_one, miles(1.0)).unwrap();
    assert_ne!(after_remove.map(|l| l.id), Some(LocationId(1)));
}

/// Tombstones accumulate in the index but stay invisible to every read path.
#[test]
fn test_index_growth_is_invisible_to_readers() {
    let db = LocationDatabase::new();
    db.update(location(1, "Churner", 37.76, -122.43)).unwrap();

    for i in 0..50 {
        let lat = 37.76 + (i as f64) * 0.0001;
        db.update(location(1, "Churner", lat, -122.43)).unwrap();
    }

    let stats = db.stats().unwrap();
    assert_eq!(stats.live_locations, 1);
    assert_eq!(stats.index_entries, 51);

    // Only the final position is findable.
    let final_pos = Coordinates::new(37.76 + 49.0 * 0.0001, -122.43);
    let nearest = db.find_nearest(&final_pos, 50.0).unwrap().unwrap();
    assert_eq!(nearest.id, LocationId(1));

    let original_pos = Coordinates::new(37.76, -122.43);
    assert!(db.find_nearest(&original_pos, 50.0).unwrap().is_none());
}

/// Search radius smaller than the distance to every record returns nothing.
#[test]
fn test_radius_smaller_than_everything() {
    let db = LocationDatabase::new();
    db.update(location(1, "Lone Cafe", 37.881658, -121.914146))
        .unwrap();

    let center = Coordinates::new(37.881, -121.914);
    assert!(db.find_nearest(&center, miles(0.01)).unwrap().is_none());
    assert!(db.find_nearest(&center, miles(1.0)).unwrap().is_some());
}

/// Extreme but valid coordinates survive insertion and lookup.
#[test]
fn test_extreme_coordinates() {
    let db = LocationDatabase::new();
    db.update(location(1, "North Pole Stand", 90.0, 0.0)).unwrap();
    db.update(location(2, "South Pole Stand", -90.0, 0.0)).unwrap();
    db.update(location(3, "Date Line East", 0.0, 180.0)).unwrap();
    db.update(location(4, "Date Line West", 0.0, -180.0)).unwrap();

    assert_eq!(db.len().unwrap(), 4);

    let near_north = Coordinates::new(89.99, 0.0);
    let nearest = db.find_nearest(&near_north, 5_000.0).unwrap().unwrap();
    assert_eq!(nearest.id, LocationId(1));
}

/// A record just across the antimeridian is still found by a radius search
/// from the other side.
#[test]
fn test_nearest_across_the_antimeridian() {
    let db = LocationDatabase::new();
    db.update(location(1, "Taveuni Stand", 0.0, 179.999)).unwrap();

    let center = Coordinates::new(0.0, -179.999);
    let nearest = db.find_nearest(&center, 1_000.0).unwrap().unwrap();
    assert_eq!(nearest.id, LocationId(1));
}

/// A moderately large dataset stays responsive and correct.
#[test]
fn test_larger_dataset_nearest() {
    let db = LocationDatabase::new();

    // Grid of points roughly 111m apart around the Mission.
    let mut id = 0;
    for i in 0..40 {
        for j in 0..40 {
            id += 1;
            let lat = 37.70 + (i as f64) * 0.001;
            let lng = -122.48 + (j as f64) * 0.001;
            db.update(location(id, "Grid Cafe", lat, lng)).unwrap();
        }
    }
    assert_eq!(db.len().unwrap(), 1600);

    // Query point sits on a grid vertex; that vertex must win. Neighboring
    // vertices are ~111m away.
    let center = Coordinates::new(37.720, -122.460);
    let nearest = db.find_nearest(&center, 500.0).unwrap().unwrap();
    let winning_distance =
        brewfinder::spatial::distance_between(&center, &nearest.coordinates());
    assert!(winning_distance < 1.0);
}

/// Interleaved adds, removals, and revivals keep counters and state sane.
#[test]
fn test_mixed_lifecycle() {
    let db = LocationDatabase::new();

    let a = db
        .add(NewLocation {
            name: "A".to_string(),
            address: "1 A St".to_string(),
            lat: 37.70,
            lng: -122.40,
        })
        .unwrap();
    assert_eq!(a.id, LocationId(1));

    assert!(db.remove(a.id).unwrap());

    // Fresh add does not reuse the removed id.
    let b = db
        .add(NewLocation {
            name: "B".to_string(),
            address: "1 B St".to_string(),
            lat: 37.71,
            lng: -122.41,
        })
        .unwrap();
    assert_eq!(b.id, LocationId(2));

    // Caller-driven upsert can revive the removed id, though.
    db.update(location(1, "A Reborn", 37.70, -122.40)).unwrap();
    assert_eq!(db.get(LocationId(1)).unwrap().unwrap().name, "A Reborn");
    assert_eq!(db.len().unwrap(), 2);
}
