//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - sensors(name, designation, manufacturer, num_amplifiers)
//! - segments(name, amplifier_number, sensor_id)
//! - results(aggressor_id, aggressor_signal, coefficient, error, method, victim_id)

pub mod schema;
pub mod session;
pub mod tables;

pub use session::{with_session, CatalogStore, Session};
pub use tables::CatalogStats;
