//! # xtalkdb - Crosstalk Catalog Store
//!
//! Embedded SQLite catalog of CCD sensor crosstalk measurements.
//!
//! xtalkdb provides:
//! - Three linked tables: sensors, segments (amplifier regions) and results
//! - Scoped sessions that commit on success and roll back on failure
//! - Natural-key lookups that eagerly attach child associations
//! - Aggressor/victim cross-reference queries scoped to one sensor
//! - Crosstalk matrices, within one sensor or between two, built from stored results

pub mod model;
pub mod storage;
pub mod query;
pub mod config;
pub mod ui;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports for convenient access
pub use model::{
    CrosstalkResult, Method, NewResult, NewSegment, NewSensor, Segment, SegmentDetail,
    SegmentKey, Sensor, SensorKey,
};
pub use query::{crosstalk_matrix, find_segment, find_sensor, query_results, CrosstalkMatrix, MethodFilter};
pub use storage::{with_session, CatalogStats, CatalogStore, Session};

/// Result type alias for xtalkdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for xtalkdb operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A sensor, segment or amplifier could not be resolved
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid combination of lookup keys
    #[error("Usage error: {0}")]
    Usage(String),

    /// A natural key matched more than one row, or an insert broke a uniqueness constraint
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures of the underlying store rather than of the request
    pub fn is_store_io(&self) -> bool {
        matches!(self, Error::Store(_) | Error::Io(_))
    }
}
