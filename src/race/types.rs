//! Race and GPS point records.
//!
//! These are plain data. Relations between them (points of a race, race of a
//! point, latest point) are queries on [`crate::storage::Database`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked activity session that accumulates GPS samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    /// Store-assigned identifier
    pub id: i64,
    /// When the race started
    pub start_time: DateTime<Utc>,
    /// When the race ended (unset while ongoing)
    pub end_time: Option<DateTime<Utc>>,
    /// Whether the race is still running
    pub is_active: bool,
}

impl Race {
    /// Whether an end time has been recorded.
    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }
}

/// A single timestamped latitude/longitude sample belonging to one race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    /// Store-assigned identifier
    pub id: i64,
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lng: f64,
    /// When the sample was taken
    pub timestamp: DateTime<Utc>,
    /// Owning race
    pub race_id: i64,
}

/// A GPS sample that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGpsPoint {
    pub race_id: i64,
    pub lat: f64,
    pub lng: f64,
    pub timestamp: DateTime<Utc>,
}

impl NewGpsPoint {
    /// Create a sample for the given race stamped with the current time.
    pub fn new(race_id: i64, lat: f64, lng: f64) -> Self {
        Self {
            race_id,
            lat,
            lng,
            timestamp: Utc::now(),
        }
    }

    /// Override the sample timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Row counts removed by a purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    pub points_deleted: usize,
    pub races_deleted: usize,
}
