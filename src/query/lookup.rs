//! Natural-key lookups
//!
//! Sensors resolve by name or designation; segments resolve inside a
//! sensor by label or amplifier number. Child associations are loaded eagerly.

use crate::model::{Segment, SegmentDetail, SegmentKey, Sensor, SensorKey};
use crate::storage::tables::{row_to_sensor, SENSOR_COLUMNS};
use crate::storage::Session;
use crate::{Error, Result};

/// Resolve one sensor and attach its segments keyed by amplifier number.
///
/// Fails with `NotFound` when nothing matches and with `Conflict` when the
/// key matches more than one row.
pub fn find_sensor(session: &Session<'_>, key: &SensorKey) -> Result<Sensor> {
    let mut stmt = session.conn().prepare(&format!(
        "SELECT {SENSOR_COLUMNS} FROM sensors WHERE {} = ?1 ORDER BY id LIMIT 2",
        key.column()
    ))?;
    let mut rows = stmt
        .query_map([key.value()], row_to_sensor)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    if rows.len() > 1 {
        return Err(Error::Conflict(format!("more than one {}", key)));
    }
    let mut sensor = rows.pop().ok_or_else(|| Error::NotFound(key.to_string()))?;
    sensor.segments = session.segments_of(sensor.id)?;

    tracing::debug!(sensor = %sensor.name, segments = sensor.segments.len(), "resolved sensor");
    Ok(sensor)
}

/// Resolve a segment within its sensor and attach the results it takes part
/// in, split into aggressor and victim roles.
pub fn find_segment(
    session: &Session<'_>,
    segment_key: &SegmentKey,
    sensor_key: &SensorKey,
) -> Result<SegmentDetail> {
    let sensor = find_sensor(session, sensor_key)?;
    let segment = match segment_key {
        SegmentKey::Amplifier(amp) => sensor.segment(*amp),
        SegmentKey::Name(name) => sensor.segment_named(name),
    }
    .cloned()
    .ok_or_else(|| Error::NotFound(format!("{} on {}", segment_key, sensor_key)))?;

    let results_as_aggressor = session.results_by_role("aggressor_id", segment.id)?;
    let results_as_victim = session.results_by_role("victim_id", segment.id)?;

    tracing::debug!(
        segment = %segment.name,
        as_aggressor = results_as_aggressor.len(),
        as_victim = results_as_victim.len(),
        "resolved segment"
    );
    Ok(SegmentDetail {
        segment,
        results_as_aggressor,
        results_as_victim,
    })
}

/// Segment read out by `amplifier` on an already resolved sensor
pub(crate) fn resolve_amplifier(sensor: &Sensor, amplifier: u32) -> Result<&Segment> {
    sensor.segment(amplifier).ok_or_else(|| {
        Error::NotFound(format!("amplifier {} on sensor {:?}", amplifier, sensor.name))
    })
}
