//! Whole-table access and append-only inserts

use std::collections::BTreeMap;
use rusqlite::{params, Row};
use crate::{Error, Result};
use crate::model::{CrosstalkResult, Method, NewResult, NewSegment, NewSensor, Segment, Sensor};
use super::Session;

pub(crate) const SENSOR_COLUMNS: &str = "id, name, designation, manufacturer, num_amplifiers";
pub(crate) const SEGMENT_COLUMNS: &str = "id, name, amplifier_number, sensor_id";
pub(crate) const RESULT_COLUMNS: &str =
    "id, aggressor_id, aggressor_signal, coefficient, error, method, victim_id";

impl Session<'_> {
    // ========== Inserts ==========

    /// Insert a sensor, returning its id
    pub fn insert_sensor(&self, sensor: &NewSensor) -> Result<i64> {
        self.conn()
            .execute(
                "INSERT INTO sensors (name, designation, manufacturer, num_amplifiers) VALUES (?1, ?2, ?3, ?4)",
                params![sensor.name, sensor.designation, sensor.manufacturer, sensor.num_amplifiers],
            )
            .map_err(|e| constraint_error(e, || format!("sensor {:?} / {:?}", sensor.name, sensor.designation)))?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Insert a segment of an existing sensor, returning its id
    pub fn insert_segment(&self, segment: &NewSegment) -> Result<i64> {
        self.conn()
            .execute(
                "INSERT INTO segments (name, amplifier_number, sensor_id) VALUES (?1, ?2, ?3)",
                params![segment.name, segment.amplifier_number, segment.sensor_id],
            )
            .map_err(|e| {
                constraint_error(e, || {
                    format!(
                        "segment {:?} (amplifier {}) of sensor id {}",
                        segment.name, segment.amplifier_number, segment.sensor_id
                    )
                })
            })?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Insert a result between two existing segments, returning its id
    pub fn insert_result(&self, result: &NewResult) -> Result<i64> {
        self.conn()
            .execute(
                r#"
                INSERT INTO results (aggressor_id, aggressor_signal, coefficient, error, method, victim_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    result.aggressor_id,
                    result.aggressor_signal,
                    result.coefficient,
                    result.error,
                    result.method.canonical(),
                    result.victim_id,
                ],
            )
            .map_err(|e| {
                constraint_error(e, || {
                    format!("result {} -> {}", result.aggressor_id, result.victim_id)
                })
            })?;
        Ok(self.conn().last_insert_rowid())
    }

    // ========== Whole-table retrieval ==========

    /// Every sensor with its segments, ordered by id
    pub fn sensors(&self) -> Result<Vec<Sensor>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {SENSOR_COLUMNS} FROM sensors ORDER BY id"))?;
        let mut sensors = stmt
            .query_map([], row_to_sensor)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut by_sensor: BTreeMap<i64, BTreeMap<u32, Segment>> = BTreeMap::new();
        for segment in self.segments()? {
            by_sensor
                .entry(segment.sensor_id)
                .or_default()
                .insert(segment.amplifier_number, segment);
        }
        for sensor in &mut sensors {
            sensor.segments = by_sensor.remove(&sensor.id).unwrap_or_default();
        }
        Ok(sensors)
    }

    /// Every segment, ordered by id
    pub fn segments(&self) -> Result<Vec<Segment>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {SEGMENT_COLUMNS} FROM segments ORDER BY id"))?;
        let segments = stmt
            .query_map([], row_to_segment)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(segments)
    }

    /// Every result, ordered by id
    pub fn results(&self) -> Result<Vec<CrosstalkResult>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {RESULT_COLUMNS} FROM results ORDER BY id"))?;
        let results = stmt
            .query_map([], row_to_result)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(results)
    }

    /// Segments of one sensor keyed by amplifier number
    pub(crate) fn segments_of(&self, sensor_id: i64) -> Result<BTreeMap<u32, Segment>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {SEGMENT_COLUMNS} FROM segments WHERE sensor_id = ?1"
        ))?;
        let segments = stmt
            .query_map([sensor_id], row_to_segment)?
            .map(|r| r.map(|s| (s.amplifier_number, s)))
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
        Ok(segments)
    }

    /// Results where `column` (`aggressor_id` or `victim_id`) equals `segment_id`
    pub(crate) fn results_by_role(&self, column: &str, segment_id: i64) -> Result<Vec<CrosstalkResult>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {RESULT_COLUMNS} FROM results WHERE {column} = ?1 ORDER BY id"
        ))?;
        let results = stmt
            .query_map([segment_id], row_to_result)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(results)
    }

    // ========== Stats ==========

    fn count(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Row counts per table and result counts per method
    pub fn stats(&self) -> Result<CatalogStats> {
        let mut stmt = self
            .conn()
            .prepare(
                "SELECT UPPER(TRIM(method)) AS tag, COUNT(*) FROM results GROUP BY tag ORDER BY tag",
            )?;
        let methods = stmt
            .query_map([], |row| {
                let method: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((Method::from(method), count as usize))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(CatalogStats {
            sensors: self.count("sensors")?,
            segments: self.count("segments")?,
            results: self.count("results")?,
            methods,
        })
    }
}

/// Map constraint violations onto the catalog's error kinds
fn constraint_error(err: rusqlite::Error, subject: impl FnOnce() -> String) -> Error {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        if failure.code == rusqlite::ErrorCode::ConstraintViolation {
            let detail = message.clone().unwrap_or_else(|| failure.to_string());
            return match failure.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    Error::NotFound(format!("{}: referenced row does not exist ({})", subject(), detail))
                }
                _ => Error::Conflict(format!("{}: {}", subject(), detail)),
            };
        }
    }
    Error::Store(err)
}

/// Helper to convert a row to a Sensor (segments left empty)
pub(crate) fn row_to_sensor(row: &Row) -> rusqlite::Result<Sensor> {
    Ok(Sensor {
        id: row.get(0)?,
        name: row.get(1)?,
        designation: row.get(2)?,
        manufacturer: row.get(3)?,
        num_amplifiers: row.get(4)?,
        segments: BTreeMap::new(),
    })
}

pub(crate) fn row_to_segment(row: &Row) -> rusqlite::Result<Segment> {
    Ok(Segment {
        id: row.get(0)?,
        name: row.get(1)?,
        amplifier_number: row.get(2)?,
        sensor_id: row.get(3)?,
    })
}

pub(crate) fn row_to_result(row: &Row) -> rusqlite::Result<CrosstalkResult> {
    let method: String = row.get(5)?;
    Ok(CrosstalkResult {
        id: row.get(0)?,
        aggressor_id: row.get(1)?,
        aggressor_signal: row.get(2)?,
        coefficient: row.get(3)?,
        error: row.get(4)?,
        method: Method::from(method),
        victim_id: row.get(6)?,
    })
}

/// Catalog statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct CatalogStats {
    pub sensors: usize,
    pub segments: usize,
    pub results: usize,
    /// Result count per methodology tag, ordered by tag
    pub methods: Vec<(Method, usize)>,
}

impl std::fmt::Display for CatalogStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Catalog Statistics:")?;
        writeln!(f, "  Sensors: {}", self.sensors)?;
        writeln!(f, "  Segments: {}", self.segments)?;
        write!(f, "  Results: {}", self.results)?;
        for (method, count) in &self.methods {
            write!(f, "\n    {}: {}", method, count)?;
        }
        Ok(())
    }
}
