//! Database schema definitions.

use crate::storage::config::TableNames;

/// Current schema version.
pub const CURRENT_VERSION: i32 = 1;

/// Schema version tracking table.
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// SQL creating the race and GPS point tables under the given names.
///
/// Points reference races without `ON DELETE CASCADE`; purging must remove
/// points first.
pub fn schema_sql(tables: &TableNames) -> String {
    let races = &tables.races;
    let points = &tables.gps_points;

    format!(
        r#"
-- Races table
CREATE TABLE IF NOT EXISTS {races} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    start_time TEXT NOT NULL,
    end_time TEXT,
    is_active INTEGER NOT NULL DEFAULT 1
);

-- GPS points table
CREATE TABLE IF NOT EXISTS {points} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    lat REAL NOT NULL,
    lng REAL NOT NULL,
    timestamp TEXT NOT NULL,
    race_id INTEGER NOT NULL REFERENCES {races}(id)
);

CREATE INDEX IF NOT EXISTS idx_{points}_race_id ON {points}(race_id, timestamp);
"#
    )
}
