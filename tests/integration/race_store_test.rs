//! File-backed race store tests.

use chrono::{Duration, TimeZone, Utc};
use racelog::{Database, NewGpsPoint, StoreConfig};
use tempfile::tempdir;

#[test]
fn test_race_tracking_scenario() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("runner.db");

    let mut db = Database::open(&path).expect("Failed to open database");
    db.initialize().expect("Failed to initialize schema");

    let race = db.create_race().expect("Failed to create race");
    assert_eq!(race.id, 1);

    let t = Utc.with_ymd_and_hms(2024, 3, 10, 7, 30, 0).unwrap();
    db.insert_gps_point(&NewGpsPoint::new(race.id, 59.3293, 18.0686).at(t))
        .unwrap();
    let later = db
        .insert_gps_point(
            &NewGpsPoint::new(race.id, 59.3301, 18.0712).at(t + Duration::seconds(60)),
        )
        .unwrap();

    let last = db.last_point(race.id).unwrap().expect("Expected a last point");
    assert_eq!(last, later);

    db.purge().expect("Purge failed");

    assert!(db.points_for_race(race.id).unwrap().is_empty());
    assert!(db.list_races().unwrap().is_empty());
}

#[test]
fn test_data_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("runner.db");

    let (race_id, point_id) = {
        let db = Database::open(&path).unwrap();
        db.initialize().unwrap();
        let race = db.create_race().unwrap();
        let point = db
            .insert_gps_point(&NewGpsPoint::new(race.id, 48.85, 2.35))
            .unwrap();
        db.finish_race(race.id, race.start_time + Duration::minutes(30))
            .unwrap();
        (race.id, point.id)
    };

    let db = Database::open(&path).unwrap();
    db.initialize().expect("Re-initializing existing store failed");

    let race = db.get_race(race_id).unwrap().expect("Race lost on reopen");
    assert!(!race.is_active);
    assert_eq!(race.end_time, Some(race.start_time + Duration::minutes(30)));

    let owner = db.race_of_point(point_id).unwrap().expect("Point lost");
    assert_eq!(owner.id, race_id);
}

#[test]
fn test_open_creates_parent_directories() {
    let dir = tempdir().unwrap();
    let config = StoreConfig::with_database_path(dir.path().join("nested/data/runner.db"));

    let db = Database::open_with_config(&config).unwrap();
    db.initialize().unwrap();

    assert!(config.database_path.exists());
}
