//! Aggressor/victim cross-reference queries

use rusqlite::types::Value;
use crate::model::{CrosstalkResult, Method, SensorKey};
use crate::storage::tables::{row_to_result, RESULT_COLUMNS};
use crate::storage::Session;
use crate::Result;
use super::lookup::{find_sensor, resolve_amplifier};

/// Restriction on the methodology tag of returned results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MethodFilter {
    /// Every methodology
    #[default]
    Any,
    /// Only results whose tag is in the set; an empty set matches nothing
    Only(Vec<Method>),
}

impl MethodFilter {
    pub fn only(methods: impl IntoIterator<Item = Method>) -> Self {
        let mut set: Vec<Method> = Vec::new();
        for method in methods {
            if !set.contains(&method) {
                set.push(method);
            }
        }
        MethodFilter::Only(set)
    }

    /// Check whether a tag passes the filter
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Only(set) => set.contains(method),
        }
    }

    /// SQL fragment restricting `column`, appending its parameters.
    /// Stored tags are folded the same way `Method` folds them.
    pub(crate) fn sql_clause(&self, column: &str, params: &mut Vec<Value>) -> String {
        match self {
            MethodFilter::Any => String::new(),
            MethodFilter::Only(set) if set.is_empty() => " AND 0".to_string(),
            MethodFilter::Only(set) => {
                params.extend(set.iter().map(|m| Value::Text(m.canonical())));
                let placeholders = vec!["?"; set.len()].join(", ");
                format!(" AND UPPER(TRIM({column})) IN ({placeholders})")
            }
        }
    }
}

impl From<Method> for MethodFilter {
    fn from(method: Method) -> Self {
        MethodFilter::Only(vec![method])
    }
}

impl From<Vec<Method>> for MethodFilter {
    fn from(methods: Vec<Method>) -> Self {
        MethodFilter::only(methods)
    }
}

/// Every result on `sensor_key` whose aggressor is the segment at
/// `aggressor_amplifier` and whose victim is the segment at
/// `victim_amplifier`, ordered by result id.
///
/// The two amplifiers play distinct roles and are not interchangeable. An
/// empty vector means the segments resolved but nothing was measured.
pub fn query_results(
    session: &Session<'_>,
    sensor_key: &SensorKey,
    aggressor_amplifier: u32,
    victim_amplifier: u32,
    methods: &MethodFilter,
) -> Result<Vec<CrosstalkResult>> {
    let sensor = find_sensor(session, sensor_key)?;
    let aggressor = resolve_amplifier(&sensor, aggressor_amplifier)?;
    let victim = resolve_amplifier(&sensor, victim_amplifier)?;

    let mut params = vec![Value::Integer(aggressor.id), Value::Integer(victim.id)];
    let method_clause = methods.sql_clause("method", &mut params);
    let sql = format!(
        "SELECT {RESULT_COLUMNS} FROM results WHERE aggressor_id = ? AND victim_id = ?{method_clause} ORDER BY id"
    );

    let mut stmt = session.conn().prepare(&sql)?;
    let results = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), row_to_result)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    tracing::debug!(
        sensor = %sensor.name,
        aggressor = %aggressor.name,
        victim = %victim.name,
        count = results.len(),
        "queried results"
    );
    Ok(results)
}
