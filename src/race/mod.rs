//! Race domain types.

pub mod types;

pub use types::{GpsPoint, NewGpsPoint, PurgeSummary, Race};
