//! Storage module for the race database and its configuration.

pub mod config;
pub mod database;
pub mod schema;

pub use config::{ConfigError, StoreConfig, TableNames};
pub use database::{Database, DatabaseError};
