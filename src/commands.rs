use std::path::Path;
use clap::ValueEnum;
use serde::Serialize;
use xtalkdb::ui::{self, Icons, Role};
use xtalkdb::{Method, MethodFilter, SegmentKey, SensorKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_human(self) -> bool {
        self == OutputFormat::Text
    }
}

fn emit_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn method_filter(methods: &[String]) -> anyhow::Result<MethodFilter> {
    if methods.is_empty() {
        return Ok(MethodFilter::Any);
    }
    let parsed = methods
        .iter()
        .map(|m| m.parse::<Method>())
        .collect::<xtalkdb::Result<Vec<_>>>()?;
    Ok(MethodFilter::only(parsed))
}

pub fn run_sensors(database: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let sensors = xtalkdb::with_session(database, |s| s.sensors())?;

    if format.is_human() {
        ui::header(Icons::SENSOR, &format!("Sensors in {}", database.display()));
        ui::table_or_empty(&ui::sensors_table(&sensors), "No sensors in store.");
    } else {
        emit_json(&sensors)?;
    }
    Ok(())
}

pub fn run_sensor(
    database: &Path,
    name: Option<&str>,
    designation: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let key = SensorKey::from_options(name, designation)?;
    let sensor = xtalkdb::with_session(database, |s| xtalkdb::find_sensor(s, &key))?;

    if format.is_human() {
        ui::header(Icons::SENSOR, &sensor.name);
        ui::info("Designation", &sensor.designation);
        ui::info("Manufacturer", &sensor.manufacturer);
        ui::info("Amplifiers", &sensor.num_amplifiers.to_string());
        ui::section("Segments");
        ui::table_or_empty(&ui::segments_table(sensor.segments.values()), "No segments.");
    } else {
        emit_json(&sensor)?;
    }
    Ok(())
}

pub struct SegmentArgs<'a> {
    pub segment: Option<&'a str>,
    pub amplifier: Option<u32>,
    pub sensor: Option<&'a str>,
    pub designation: Option<&'a str>,
}

pub fn run_segment(database: &Path, args: SegmentArgs<'_>, format: OutputFormat) -> anyhow::Result<()> {
    let segment_key = SegmentKey::from_options(args.segment, args.amplifier)?;
    let sensor_key = SensorKey::from_options(args.sensor, args.designation)?;
    let detail = xtalkdb::with_session(database, |s| {
        xtalkdb::find_segment(s, &segment_key, &sensor_key)
    })?;

    if format.is_human() {
        ui::header(
            Icons::SEARCH,
            &format!("Segment {} (amplifier {})", detail.segment.name, detail.segment.amplifier_number),
        );
        ui::section(&format!("{} As aggressor", Icons::AGGRESSOR));
        ui::table_or_empty(&ui::results_table(&detail.results_as_aggressor), "No results.");
        ui::section(&format!("{} As victim", Icons::VICTIM));
        ui::table_or_empty(&ui::results_table(&detail.results_as_victim), "No results.");
    } else {
        emit_json(&detail)?;
    }
    Ok(())
}

pub struct PairArgs<'a> {
    pub sensor: Option<&'a str>,
    pub designation: Option<&'a str>,
    pub aggressor: u32,
    pub victim: u32,
    pub methods: &'a [String],
}

pub fn run_results(database: &Path, args: PairArgs<'_>, format: OutputFormat) -> anyhow::Result<()> {
    let sensor_key = SensorKey::from_options(args.sensor, args.designation)?;
    let filter = method_filter(args.methods)?;
    let results = xtalkdb::with_session(database, |s| {
        xtalkdb::query_results(s, &sensor_key, args.aggressor, args.victim, &filter)
    })?;

    if format.is_human() {
        ui::header(
            Icons::SEARCH,
            &format!(
                "{}: amplifier {} -> amplifier {}",
                sensor_key,
                ui::paint(Role::Aggressor, args.aggressor),
                ui::paint(Role::Victim, args.victim),
            ),
        );
        ui::table_or_empty(&ui::results_table(&results), "No results for this pair.");
        ui::summary_row("Results:", &results.len().to_string());
    } else {
        emit_json(&results)?;
    }
    Ok(())
}

pub struct MatrixArgs<'a> {
    pub sensor: Option<&'a str>,
    pub designation: Option<&'a str>,
    pub victim_sensor: Option<&'a str>,
    pub victim_designation: Option<&'a str>,
    pub methods: &'a [String],
}

pub fn run_matrix(database: &Path, args: MatrixArgs<'_>, format: OutputFormat) -> anyhow::Result<()> {
    let aggressor_key = SensorKey::from_options(args.sensor, args.designation)?;
    let victim_key = match (args.victim_sensor, args.victim_designation) {
        (None, None) => None,
        (name, designation) => Some(SensorKey::from_options(name, designation)?),
    };
    let filter = method_filter(args.methods)?;
    let matrix = xtalkdb::with_session(database, |s| {
        xtalkdb::crosstalk_matrix(s, &aggressor_key, victim_key.as_ref(), &filter)
    })?;

    if format.is_human() {
        let title = if matrix.is_cross_sensor() {
            format!(
                "Crosstalk matrix {} ({}) -> {} ({})",
                ui::paint(Role::Aggressor, &matrix.aggressor.sensor),
                matrix.aggressor.designation,
                ui::paint(Role::Victim, &matrix.victim.sensor),
                matrix.victim.designation,
            )
        } else {
            format!(
                "Crosstalk matrix of {} ({})",
                matrix.aggressor.sensor, matrix.aggressor.designation
            )
        };
        ui::header(Icons::GRID, &title);
        println!("{}", ui::matrix_table(&matrix));
        ui::summary_row("Measured pairs:", &matrix.measured_pairs().to_string());
    } else {
        emit_json(&matrix)?;
    }
    Ok(())
}

pub fn run_stats(database: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let stats = xtalkdb::with_session(database, |s| s.stats())?;

    if format.is_human() {
        ui::header(Icons::STATS, &format!("Catalog statistics ({})", database.display()));
        let sensors = stats.sensors.to_string();
        let segments = stats.segments.to_string();
        let results = stats.results.to_string();
        let per_method: Vec<(String, String)> = stats
            .methods
            .iter()
            .map(|(method, count)| (format!("  {}", method), count.to_string()))
            .collect();

        let mut rows: Vec<(&str, &str)> = vec![
            ("Sensors", sensors.as_str()),
            ("Segments", segments.as_str()),
            ("Results", results.as_str()),
        ];
        rows.extend(per_method.iter().map(|(m, c)| (m.as_str(), c.as_str())));
        println!("{}", ui::stats_table(&rows));
    } else {
        emit_json(&stats)?;
    }
    Ok(())
}
