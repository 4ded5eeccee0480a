//! racelog - Race and GPS point storage
//!
//! An embedded SQLite store for races and the GPS samples recorded during
//! them. Provides schema setup, race creation, the latest-point query and a
//! transactional purge, plus the `init_db`, `create_race` and `clean_db`
//! executables built on top.

pub mod commands;
pub mod logging;
pub mod race;
pub mod storage;

// Re-export commonly used types
pub use race::types::{GpsPoint, NewGpsPoint, PurgeSummary, Race};
pub use storage::config::StoreConfig;
pub use storage::database::{Database, DatabaseError};
