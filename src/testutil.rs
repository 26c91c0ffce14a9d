//! Shared fixture: two 16-amplifier sensors with seeded results

use crate::model::{Method, NewResult, NewSegment, NewSensor};
use crate::storage::{CatalogStore, Session};
use crate::Result;

pub const DAVIS: &str = "Davis";
pub const DAVIS_DESIGNATION: &str = "ITL-3800C-029";
pub const TUCSON: &str = "Tucson";
pub const TUCSON_DESIGNATION: &str = "E2V-CCD250-160";

/// Davis, aggressor 4 -> victim 5, MODEL_LSQ
pub const DAVIS_4_5_LSQ: usize = 49;
/// Davis, aggressor 4 -> victim 5, RATIO
pub const DAVIS_4_5_RATIO: usize = 7;
/// Davis, aggressor 5 -> victim 4, MODEL_LSQ
pub const DAVIS_5_4_LSQ: usize = 3;
/// Davis, aggressor 4 -> victim 6, MODEL_LSQ
pub const DAVIS_4_6_LSQ: usize = 5;
/// Tucson, aggressor 4 -> victim 5, MODEL_LSQ
pub const TUCSON_4_5_LSQ: usize = 11;
/// Davis amplifier 4 -> Tucson amplifier 5, MODEL_LSQ
pub const CROSS_SENSOR: usize = 2;

pub const TOTAL_RESULTS: usize =
    DAVIS_4_5_LSQ + DAVIS_4_5_RATIO + DAVIS_5_4_LSQ + DAVIS_4_6_LSQ + TUCSON_4_5_LSQ + CROSS_SENSOR;

/// Segment label for amplifier 0..=15: C10..C17 then C07..C00
pub fn segment_name(amplifier: u32) -> String {
    if amplifier < 8 {
        format!("C1{}", amplifier)
    } else {
        format!("C0{}", 15 - amplifier)
    }
}

fn ratio() -> Method {
    Method::Other("RATIO".to_string())
}

/// Insert a sensor and its 16 segments, returning segment ids indexed by amplifier
fn seed_sensor(s: &Session<'_>, name: &str, designation: &str, manufacturer: &str) -> Result<Vec<i64>> {
    let sensor_id = s.insert_sensor(&NewSensor::new(name, designation, manufacturer, 16))?;
    (0..16)
        .map(|amp| s.insert_segment(&NewSegment::new(segment_name(amp), amp, sensor_id)))
        .collect()
}

fn seed_results(
    s: &Session<'_>,
    aggressor: i64,
    victim: i64,
    count: usize,
    method: Method,
    base: f64,
) -> Result<()> {
    for i in 0..count {
        let result = NewResult::new(
            aggressor,
            victim,
            40_000.0 + 100.0 * i as f64,
            base + 1e-6 * i as f64,
            method.clone(),
        );
        s.insert_result(&result.with_error(1e-7))?;
    }
    Ok(())
}

/// Coefficient of the `i`-th seeded Davis 4 -> 5 MODEL_LSQ result
pub fn davis_4_5_lsq_coefficient(i: usize) -> f64 {
    1e-4 + 1e-6 * i as f64
}

/// In-memory store holding the fixture
pub fn davis_store() -> CatalogStore {
    let mut store = CatalogStore::open_in_memory().expect("in-memory store");
    store
        .with_session(|s| {
            let davis = seed_sensor(s, DAVIS, DAVIS_DESIGNATION, "ITL")?;
            let tucson = seed_sensor(s, TUCSON, TUCSON_DESIGNATION, "E2V")?;

            // Interleave so that storage order differs from grouping order
            seed_results(s, davis[4], davis[5], DAVIS_4_5_LSQ / 2, Method::ModelLsq, 1e-4)?;
            seed_results(s, davis[4], davis[5], DAVIS_4_5_RATIO, ratio(), 5e-4)?;
            seed_results(s, davis[5], davis[4], DAVIS_5_4_LSQ, Method::ModelLsq, -3e-5)?;
            seed_results(
                s,
                davis[4],
                davis[5],
                DAVIS_4_5_LSQ - DAVIS_4_5_LSQ / 2,
                Method::ModelLsq,
                davis_4_5_lsq_coefficient(DAVIS_4_5_LSQ / 2),
            )?;
            seed_results(s, davis[4], davis[6], DAVIS_4_6_LSQ, Method::ModelLsq, 2e-5)?;
            seed_results(s, tucson[4], tucson[5], TUCSON_4_5_LSQ, Method::ModelLsq, 7e-4)?;
            seed_results(s, davis[4], tucson[5], CROSS_SENSOR, Method::ModelLsq, 9e-4)?;
            Ok(())
        })
        .expect("seed fixture");
    store
}
