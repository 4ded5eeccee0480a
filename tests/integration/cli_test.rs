//! Executable integration tests.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use racelog::{Database, NewGpsPoint};
use std::path::Path;
use tempfile::tempdir;

fn run_init(dir: &Path) {
    cargo_bin_cmd!("init_db")
        .current_dir(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Database tables created successfully!"));
}

#[test]
fn test_init_db_creates_default_file() {
    let dir = tempdir().unwrap();
    run_init(dir.path());

    assert!(dir.path().join("runner.db").exists());
}

#[test]
fn test_init_db_is_idempotent() {
    let dir = tempdir().unwrap();
    run_init(dir.path());
    run_init(dir.path());
}

#[test]
fn test_create_race_inserts_one_race() {
    let dir = tempdir().unwrap();
    run_init(dir.path());

    cargo_bin_cmd!("create_race")
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("New race created successfully!"))
        .stdout(predicate::str::contains("race id 1"));

    cargo_bin_cmd!("create_race")
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("race id 2"));

    let db = Database::open(&dir.path().join("runner.db")).unwrap();
    let races = db.list_races().unwrap();
    assert_eq!(races.len(), 2);
    assert!(races.iter().all(|r| r.is_active && r.end_time.is_none()));
}

#[test]
fn test_create_race_without_schema_exits_nonzero() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("create_race")
        .current_dir(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error creating race"));
}

#[test]
fn test_clean_db_removes_races_and_points() {
    let dir = tempdir().unwrap();
    run_init(dir.path());

    {
        let db = Database::open(&dir.path().join("runner.db")).unwrap();
        let race = db.create_race().unwrap();
        db.insert_gps_point(&NewGpsPoint::new(race.id, 1.0, 2.0)).unwrap();
        db.insert_gps_point(&NewGpsPoint::new(race.id, 1.5, 2.5)).unwrap();
    }

    cargo_bin_cmd!("clean_db")
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Database cleaned successfully!"));

    let db = Database::open(&dir.path().join("runner.db")).unwrap();
    assert_eq!(db.count_races().unwrap(), 0);
    assert_eq!(db.count_gps_points().unwrap(), 0);
}

#[test]
fn test_clean_db_failure_exits_nonzero() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("clean_db")
        .current_dir(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error cleaning database"));
}

#[test]
fn test_config_file_selects_database_path() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("racelog.toml"),
        "database_path = \"data/track.db\"\n",
    )
    .unwrap();

    run_init(dir.path());

    assert!(dir.path().join("data/track.db").exists());
    assert!(!dir.path().join("runner.db").exists());
}

#[test]
fn test_invalid_config_exits_nonzero() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("racelog.toml"), "[tables]\nraces = \"1bad\"\n").unwrap();

    cargo_bin_cmd!("init_db")
        .current_dir(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid table name"));
}

#[test]
fn test_failure_reason_reported_once() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("clean_db")
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .assert()
        .code(1)
        .stderr(predicate::function(|stderr: &str| {
            stderr.matches("no such table").count() == 1
        }));
}
