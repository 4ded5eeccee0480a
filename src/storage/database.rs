//! Race store backed by SQLite via rusqlite.

use crate::race::types::{GpsPoint, NewGpsPoint, PurgeSummary, Race};
use crate::storage::config::{StoreConfig, TableNames};
use crate::storage::schema::{schema_sql, CURRENT_VERSION, SCHEMA_VERSION_TABLE};
use chrono::{DateTime, Datelike, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Result as SqliteResult};
use std::path::Path;
use thiserror::Error;

const RACE_COLUMNS: &str = "id, start_time, end_time, is_active";
const POINT_COLUMNS: &str = "id, lat, lng, timestamp, race_id";

/// Database wrapper holding the race and GPS point tables.
pub struct Database {
    conn: Connection,
    tables: TableNames,
}

impl Database {
    /// Open or create a database at the given path with default table names.
    ///
    /// Tables are not created here; call [`Database::initialize`].
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Self::open_with_tables(path, TableNames::default())
    }

    /// Open the database described by a store configuration.
    pub fn open_with_config(config: &StoreConfig) -> Result<Self, DatabaseError> {
        Self::open_with_tables(&config.database_path, config.tables.clone())
    }

    fn open_with_tables(path: &Path, tables: TableNames) -> Result<Self, DatabaseError> {
        tables
            .validate()
            .map_err(|e| DatabaseError::InvalidConfig(e.to_string()))?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::IoError(e.to_string()))?;
            }
        }

        let conn =
            Connection::open(path).map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        Self::from_connection(conn, tables)
    }

    /// Open an in-memory database with the schema already created (for testing).
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self::from_connection(conn, TableNames::default())?;
        db.initialize()?;

        Ok(db)
    }

    fn from_connection(conn: Connection, tables: TableNames) -> Result<Self, DatabaseError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        Ok(Self { conn, tables })
    }

    /// Create the race and GPS point tables if they do not exist.
    ///
    /// Safe to call repeatedly.
    pub fn initialize(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(SCHEMA_VERSION_TABLE)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        self.conn
            .execute_batch(&schema_sql(&self.tables))
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        let current_version = self.get_schema_version()?;

        if current_version < CURRENT_VERSION {
            self.migrate(current_version)?;
        }

        Ok(())
    }

    /// Get the current schema version.
    fn get_schema_version(&self) -> Result<i32, DatabaseError> {
        let result: SqliteResult<i32> = self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        );

        match result {
            Ok(version) => Ok(version),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
        }
    }

    fn migrate(&self, from_version: i32) -> Result<(), DatabaseError> {
        if from_version < 1 {
            self.conn
                .execute(
                    "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                    params![CURRENT_VERSION, format_timestamp(&Utc::now())?],
                )
                .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

            tracing::info!("Database migrated to version {}", CURRENT_VERSION);
        }

        Ok(())
    }

    /// Get a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ========== Race Operations ==========

    /// Insert a new active race starting now.
    pub fn create_race(&self) -> Result<Race, DatabaseError> {
        let start_time = Utc::now().trunc_subsecs(6);

        self.conn
            .execute(
                &format!(
                    "INSERT INTO {} (start_time, end_time, is_active) VALUES (?1, NULL, 1)",
                    self.tables.races
                ),
                params![format_timestamp(&start_time)?],
            )
            .map_err(classify_error)?;

        let race = Race {
            id: self.conn.last_insert_rowid(),
            start_time,
            end_time: None,
            is_active: true,
        };

        tracing::debug!(race_id = race.id, "Created race");

        Ok(race)
    }

    /// Get a race by ID.
    pub fn get_race(&self, id: i64) -> Result<Option<Race>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE id = ?1",
                    RACE_COLUMNS, self.tables.races
                ),
                params![id],
                RaceRow::from_row,
            )
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        row.map(RaceRow::into_race).transpose()
    }

    /// List all races in creation order.
    pub fn list_races(&self) -> Result<Vec<Race>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM {} ORDER BY id",
                RACE_COLUMNS, self.tables.races
            ))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([], RaceRow::from_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut races = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            races.push(row.into_race()?);
        }

        Ok(races)
    }

    /// Record the end of a race and mark it inactive.
    pub fn finish_race(&self, id: i64, end_time: DateTime<Utc>) -> Result<(), DatabaseError> {
        let end_time = format_timestamp(&end_time)?;

        let rows_affected = self
            .conn
            .execute(
                &format!(
                    "UPDATE {} SET end_time = ?1, is_active = 0 WHERE id = ?2",
                    self.tables.races
                ),
                params![end_time, id],
            )
            .map_err(classify_error)?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Race {}", id)));
        }

        Ok(())
    }

    /// Count stored races.
    pub fn count_races(&self) -> Result<usize, DatabaseError> {
        self.count_rows(&self.tables.races)
    }

    // ========== GPS Point Operations ==========

    /// Store a GPS sample. The owning race must exist.
    pub fn insert_gps_point(&self, point: &NewGpsPoint) -> Result<GpsPoint, DatabaseError> {
        let timestamp = point.timestamp.trunc_subsecs(6);
        let stored_timestamp = format_timestamp(&timestamp)?;

        self.conn
            .execute(
                &format!(
                    "INSERT INTO {} (lat, lng, timestamp, race_id) VALUES (?1, ?2, ?3, ?4)",
                    self.tables.gps_points
                ),
                params![
                    point.lat,
                    point.lng,
                    stored_timestamp,
                    point.race_id
                ],
            )
            .map_err(classify_error)?;

        Ok(GpsPoint {
            id: self.conn.last_insert_rowid(),
            lat: point.lat,
            lng: point.lng,
            timestamp,
            race_id: point.race_id,
        })
    }

    /// All points owned by a race, oldest first.
    pub fn points_for_race(&self, race_id: i64) -> Result<Vec<GpsPoint>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM {} WHERE race_id = ?1 ORDER BY timestamp, id",
                POINT_COLUMNS, self.tables.gps_points
            ))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![race_id], PointRow::from_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut points = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            points.push(row.into_point()?);
        }

        Ok(points)
    }

    /// The most recent point of a race, or `None` if it has no points.
    ///
    /// Points sharing the latest timestamp resolve to the highest id.
    pub fn last_point(&self, race_id: i64) -> Result<Option<GpsPoint>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE race_id = ?1
                     ORDER BY timestamp DESC, id DESC LIMIT 1",
                    POINT_COLUMNS, self.tables.gps_points
                ),
                params![race_id],
                PointRow::from_row,
            )
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        row.map(PointRow::into_point).transpose()
    }

    /// The race that owns a point, or `None` if the point does not exist.
    pub fn race_of_point(&self, point_id: i64) -> Result<Option<Race>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT r.id, r.start_time, r.end_time, r.is_active
                     FROM {} r JOIN {} p ON p.race_id = r.id WHERE p.id = ?1",
                    self.tables.races, self.tables.gps_points
                ),
                params![point_id],
                RaceRow::from_row,
            )
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        row.map(RaceRow::into_race).transpose()
    }

    /// Count stored GPS points.
    pub fn count_gps_points(&self) -> Result<usize, DatabaseError> {
        self.count_rows(&self.tables.gps_points)
    }

    // ========== Purge ==========

    /// Delete every GPS point and then every race in one transaction.
    ///
    /// Either both tables are emptied or, on any failure, nothing changes.
    pub fn purge(&mut self) -> Result<PurgeSummary, DatabaseError> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        match delete_all(&tx, &self.tables) {
            Ok(summary) => {
                tx.commit()
                    .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

                tracing::info!(
                    points_deleted = summary.points_deleted,
                    races_deleted = summary.races_deleted,
                    "Purged race store"
                );

                Ok(summary)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    tracing::warn!("Rollback after failed purge also failed: {}", rollback_err);
                } else {
                    tracing::warn!("Purge failed, transaction rolled back");
                }
                Err(e)
            }
        }
    }

    fn count_rows(&self, table: &str) -> Result<usize, DatabaseError> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(count as usize)
    }
}

fn delete_all(conn: &Connection, tables: &TableNames) -> Result<PurgeSummary, DatabaseError> {
    // Points reference races, so they go first.
    let points_deleted = conn
        .execute(&format!("DELETE FROM {}", tables.gps_points), [])
        .map_err(classify_error)?;

    let races_deleted = conn
        .execute(&format!("DELETE FROM {}", tables.races), [])
        .map_err(classify_error)?;

    Ok(PurgeSummary {
        points_deleted,
        races_deleted,
    })
}

fn classify_error(e: rusqlite::Error) -> DatabaseError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            DatabaseError::ConstraintViolation(e.to_string())
        }
        _ => DatabaseError::QueryFailed(e.to_string()),
    }
}

/// Fixed-width UTC text so string order matches time order.
///
/// Only four-digit years have that shape and parse back, so others are refused.
fn format_timestamp(dt: &DateTime<Utc>) -> Result<String, DatabaseError> {
    if !(0..=9999).contains(&dt.year()) {
        return Err(DatabaseError::InvalidTimestamp(format!(
            "year {} is outside 0000-9999",
            dt.year()
        )));
    }

    Ok(dt.to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn parse_timestamp(value: &str, field: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::DeserializationError(format!("Invalid {}: {}", field, e)))
}

// Helper structs for database row conversion

struct RaceRow {
    id: i64,
    start_time: String,
    end_time: Option<String>,
    is_active: bool,
}

impl RaceRow {
    fn from_row(row: &rusqlite::Row<'_>) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get(0)?,
            start_time: row.get(1)?,
            end_time: row.get(2)?,
            is_active: row.get(3)?,
        })
    }

    fn into_race(self) -> Result<Race, DatabaseError> {
        let start_time = parse_timestamp(&self.start_time, "start time")?;

        let end_time = self
            .end_time
            .map(|s| parse_timestamp(&s, "end time"))
            .transpose()?;

        Ok(Race {
            id: self.id,
            start_time,
            end_time,
            is_active: self.is_active,
        })
    }
}

struct PointRow {
    id: i64,
    lat: f64,
    lng: f64,
    timestamp: String,
    race_id: i64,
}

impl PointRow {
    fn from_row(row: &rusqlite::Row<'_>) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get(0)?,
            lat: row.get(1)?,
            lng: row.get(2)?,
            timestamp: row.get(3)?,
            race_id: row.get(4)?,
        })
    }

    fn into_point(self) -> Result<GpsPoint, DatabaseError> {
        Ok(GpsPoint {
            id: self.id,
            lat: self.lat,
            lng: self.lng,
            timestamp: parse_timestamp(&self.timestamp, "point timestamp")?,
            race_id: self.race_id,
        })
    }
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
