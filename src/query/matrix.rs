//! Crosstalk matrix - aggressor rows by victim columns, within one sensor or across two

use std::collections::HashMap;
use rusqlite::types::Value;
use serde::Serialize;
use crate::model::{Sensor, SensorKey};
use crate::storage::Session;
use crate::Result;
use super::lookup::find_sensor;
use super::results::MethodFilter;

/// One aggressor/victim cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MatrixCell {
    /// Mean coefficient over every matching result, `None` when unmeasured
    pub coefficient: Option<f64>,
    /// Mean of the recorded errors; results without one are left out
    pub error: Option<f64>,
    pub samples: usize,
}

/// One side of the matrix: a sensor and its amplifiers in ascending order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixAxis {
    pub sensor: String,
    pub designation: String,
    pub amplifiers: Vec<u32>,
}

impl MatrixAxis {
    fn of(sensor: &Sensor) -> Self {
        Self {
            sensor: sensor.name.clone(),
            designation: sensor.designation.clone(),
            amplifiers: sensor.segments.keys().copied().collect(),
        }
    }

    fn index_of(&self, amplifier: u32) -> Option<usize> {
        self.amplifiers.binary_search(&amplifier).ok()
    }
}

/// Mean crosstalk coefficients indexed by amplifier number.
///
/// Row `i` is the aggressor amplifier `aggressor.amplifiers[i]`, column `j`
/// the victim amplifier `victim.amplifiers[j]`. Both axes name the same
/// sensor unless a separate victim sensor was asked for.
#[derive(Debug, Clone, Serialize)]
pub struct CrosstalkMatrix {
    pub aggressor: MatrixAxis,
    pub victim: MatrixAxis,
    pub cells: Vec<Vec<MatrixCell>>,
}

impl CrosstalkMatrix {
    /// Cell for an aggressor/victim amplifier pair
    pub fn get(&self, aggressor: u32, victim: u32) -> Option<&MatrixCell> {
        let row = self.aggressor.index_of(aggressor)?;
        let col = self.victim.index_of(victim)?;
        Some(&self.cells[row][col])
    }

    /// Every victim cell of one aggressor
    pub fn row(&self, aggressor: u32) -> Option<&[MatrixCell]> {
        self.aggressor
            .index_of(aggressor)
            .map(|i| self.cells[i].as_slice())
    }

    /// Number of cells holding at least one measurement
    pub fn measured_pairs(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| cell.coefficient.is_some())
            .count()
    }

    pub fn is_cross_sensor(&self) -> bool {
        self.aggressor.sensor != self.victim.sensor
    }
}

#[derive(Clone, Copy, Default)]
struct Accumulator {
    coefficient_sum: f64,
    samples: usize,
    error_sum: f64,
    errors: usize,
}

impl Accumulator {
    fn add(&mut self, coefficient: f64, error: Option<f64>) {
        self.coefficient_sum += coefficient;
        self.samples += 1;
        if let Some(e) = error {
            self.error_sum += e;
            self.errors += 1;
        }
    }

    fn finish(self) -> MatrixCell {
        MatrixCell {
            coefficient: (self.samples > 0).then(|| self.coefficient_sum / self.samples as f64),
            error: (self.errors > 0).then(|| self.error_sum / self.errors as f64),
            samples: self.samples,
        }
    }
}

/// Build a crosstalk matrix from stored results.
///
/// Aggressors come from `aggressor_key`'s sensor and victims from
/// `victim_key`'s, which defaults to the aggressor sensor. Each cell averages
/// every result passing `methods`.
pub fn crosstalk_matrix(
    session: &Session<'_>,
    aggressor_key: &SensorKey,
    victim_key: Option<&SensorKey>,
    methods: &MethodFilter,
) -> Result<CrosstalkMatrix> {
    let aggressor_sensor = find_sensor(session, aggressor_key)?;
    let victim_sensor = match victim_key {
        Some(key) => Some(find_sensor(session, key)?),
        None => None,
    };
    let victim_sensor = victim_sensor.as_ref().unwrap_or(&aggressor_sensor);

    let row_of: HashMap<i64, usize> = aggressor_sensor
        .segments
        .values()
        .map(|segment| segment.id)
        .zip(0..)
        .collect();
    let col_of: HashMap<i64, usize> = victim_sensor
        .segments
        .values()
        .map(|segment| segment.id)
        .zip(0..)
        .collect();

    let mut params = vec![
        Value::Integer(aggressor_sensor.id),
        Value::Integer(victim_sensor.id),
    ];
    let method_clause = methods.sql_clause("r.method", &mut params);
    let sql = format!(
        r#"
        SELECT r.aggressor_id, r.victim_id, r.coefficient, r.error
        FROM results r
        JOIN segments a ON a.id = r.aggressor_id
        JOIN segments v ON v.id = r.victim_id
        WHERE a.sensor_id = ? AND v.sensor_id = ?{method_clause}
        "#
    );

    let mut acc = vec![vec![Accumulator::default(); col_of.len()]; row_of.len()];

    let mut stmt = session.conn().prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, f64>(2)?,
            row.get::<_, Option<f64>>(3)?,
        ))
    })?;
    for row in rows {
        let (aggressor_id, victim_id, coefficient, error) = row?;
        if let (Some(&i), Some(&j)) = (row_of.get(&aggressor_id), col_of.get(&victim_id)) {
            acc[i][j].add(coefficient, error);
        }
    }

    let cells = acc
        .into_iter()
        .map(|row| row.into_iter().map(Accumulator::finish).collect())
        .collect();

    let matrix = CrosstalkMatrix {
        aggressor: MatrixAxis::of(&aggressor_sensor),
        victim: MatrixAxis::of(victim_sensor),
        cells,
    };
    tracing::debug!(
        aggressor = %matrix.aggressor.sensor,
        victim = %matrix.victim.sensor,
        measured = matrix.measured_pairs(),
        "built crosstalk matrix"
    );
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Method;
    use crate::testutil::{self, DAVIS, TUCSON, TUCSON_DESIGNATION};
    use crate::Error;

    fn davis() -> SensorKey {
        SensorKey::Name(DAVIS.into())
    }

    #[test]
    fn test_matrix_means_lsq_cell() {
        let mut store = testutil::davis_store();
        let matrix = store
            .with_session(|s| crosstalk_matrix(s, &davis(), None, &Method::ModelLsq.into()))
            .unwrap();

        assert_eq!(matrix.aggressor.amplifiers, (0..16u32).collect::<Vec<_>>());
        assert_eq!(matrix.aggressor, matrix.victim);
        assert!(!matrix.is_cross_sensor());

        let cell = matrix.get(4, 5).unwrap();
        assert_eq!(cell.samples, testutil::DAVIS_4_5_LSQ);

        let expected: f64 = (0..testutil::DAVIS_4_5_LSQ)
            .map(testutil::davis_4_5_lsq_coefficient)
            .sum::<f64>()
            / testutil::DAVIS_4_5_LSQ as f64;
        assert!((cell.coefficient.unwrap() - expected).abs() < 1e-12);
        assert!((cell.error.unwrap() - 1e-7).abs() < 1e-15);

        assert_eq!(matrix.get(5, 4).unwrap().samples, testutil::DAVIS_5_4_LSQ);
        assert!(matrix.get(5, 4).unwrap().coefficient.unwrap() < 0.0);
        assert_eq!(matrix.get(0, 1).unwrap().coefficient, None);
        assert_eq!(matrix.get(0, 1).unwrap().error, None);
        assert_eq!(matrix.measured_pairs(), 3);
    }

    #[test]
    fn test_matrix_excludes_cross_sensor_results() {
        let mut store = testutil::davis_store();
        let matrix = store
            .with_session(|s| crosstalk_matrix(s, &SensorKey::Name(TUCSON.into()), None, &MethodFilter::Any))
            .unwrap();

        assert_eq!(matrix.measured_pairs(), 1);
        assert_eq!(matrix.get(4, 5).unwrap().samples, testutil::TUCSON_4_5_LSQ);
        assert_eq!(matrix.row(4).unwrap().len(), 16);
        assert!(matrix.get(4, 99).is_none());
    }

    #[test]
    fn test_matrix_across_two_sensors() {
        let mut store = testutil::davis_store();
        let tucson = SensorKey::Designation(TUCSON_DESIGNATION.into());
        let matrix = store
            .with_session(|s| crosstalk_matrix(s, &davis(), Some(&tucson), &MethodFilter::Any))
            .unwrap();

        assert!(matrix.is_cross_sensor());
        assert_eq!(matrix.aggressor.sensor, DAVIS);
        assert_eq!(matrix.victim.sensor, TUCSON);
        assert_eq!(matrix.measured_pairs(), 1);

        let cell = matrix.get(4, 5).unwrap();
        assert_eq!(cell.samples, testutil::CROSS_SENSOR);
        let expected = 9e-4 + 0.5e-6;
        assert!((cell.coefficient.unwrap() - expected).abs() < 1e-12);
        assert!((cell.error.unwrap() - 1e-7).abs() < 1e-15);

        // Same-sensor pairs of either sensor stay out of a cross-sensor matrix
        let reverse = store
            .with_session(|s| crosstalk_matrix(s, &tucson, Some(&davis()), &MethodFilter::Any))
            .unwrap();
        assert_eq!(reverse.measured_pairs(), 0);
    }

    #[test]
    fn test_matrix_victim_same_as_aggressor() {
        let mut store = testutil::davis_store();
        let implicit = store
            .with_session(|s| crosstalk_matrix(s, &davis(), None, &MethodFilter::Any))
            .unwrap();
        let explicit = store
            .with_session(|s| crosstalk_matrix(s, &davis(), Some(&davis()), &MethodFilter::Any))
            .unwrap();
        assert_eq!(implicit.cells, explicit.cells);
    }

    #[test]
    fn test_matrix_any_method_pools_samples() {
        let mut store = testutil::davis_store();
        let matrix = store
            .with_session(|s| crosstalk_matrix(s, &davis(), None, &MethodFilter::Any))
            .unwrap();
        assert_eq!(
            matrix.get(4, 5).unwrap().samples,
            testutil::DAVIS_4_5_LSQ + testutil::DAVIS_4_5_RATIO
        );
    }

    #[test]
    fn test_matrix_unknown_sensor() {
        let mut store = testutil::davis_store();
        let err = store
            .with_session(|s| crosstalk_matrix(s, &SensorKey::Name("Nowhere".into()), None, &MethodFilter::Any))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let err = store
            .with_session(|s| {
                crosstalk_matrix(s, &davis(), Some(&SensorKey::Name("Nowhere".into())), &MethodFilter::Any)
            })
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
