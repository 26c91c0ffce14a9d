use tabled::{builder::Builder, settings::Style, Table, Tabled};
use crate::model::{CrosstalkResult, Segment, Sensor};
use crate::query::CrosstalkMatrix;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
pub struct SensorRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Designation")]
    pub designation: String,
    #[tabled(rename = "Manufacturer")]
    pub manufacturer: String,
    #[tabled(rename = "Amps")]
    pub num_amplifiers: u32,
    #[tabled(rename = "Segments")]
    pub segments: usize,
}

impl From<&Sensor> for SensorRow {
    fn from(sensor: &Sensor) -> Self {
        Self {
            id: sensor.id,
            name: sensor.name.clone(),
            designation: sensor.designation.clone(),
            manufacturer: sensor.manufacturer.clone(),
            num_amplifiers: sensor.num_amplifiers,
            segments: sensor.segments.len(),
        }
    }
}

#[derive(Tabled)]
pub struct SegmentRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Segment")]
    pub name: String,
    #[tabled(rename = "Amp")]
    pub amplifier_number: u32,
    #[tabled(rename = "Sensor ID")]
    pub sensor_id: i64,
}

impl From<&Segment> for SegmentRow {
    fn from(segment: &Segment) -> Self {
        Self {
            id: segment.id,
            name: segment.name.clone(),
            amplifier_number: segment.amplifier_number,
            sensor_id: segment.sensor_id,
        }
    }
}

#[derive(Tabled)]
pub struct ResultRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Aggressor")]
    pub aggressor_id: i64,
    #[tabled(rename = "Victim")]
    pub victim_id: i64,
    #[tabled(rename = "Signal")]
    pub signal: String,
    #[tabled(rename = "Coefficient")]
    pub coefficient: String,
    #[tabled(rename = "Error")]
    pub error: String,
    #[tabled(rename = "Method")]
    pub method: String,
}

impl From<&CrosstalkResult> for ResultRow {
    fn from(result: &CrosstalkResult) -> Self {
        Self {
            id: result.id,
            aggressor_id: result.aggressor_id,
            victim_id: result.victim_id,
            signal: format!("{:.1}", result.aggressor_signal),
            coefficient: format!("{:.3e}", result.coefficient),
            error: result.error.map(|e| format!("{:.1e}", e)).unwrap_or_else(|| "-".to_string()),
            method: result.method.to_string(),
        }
    }
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

fn rows_table<'a, T, R>(items: impl IntoIterator<Item = &'a T>) -> String
where
    T: 'a,
    R: Tabled + From<&'a T>,
{
    let rows: Vec<R> = items.into_iter().map(R::from).collect();
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn sensors_table(sensors: &[Sensor]) -> String {
    rows_table::<_, SensorRow>(sensors)
}

pub fn segments_table<'a>(segments: impl IntoIterator<Item = &'a Segment>) -> String {
    rows_table::<_, SegmentRow>(segments)
}

pub fn results_table(results: &[CrosstalkResult]) -> String {
    rows_table::<_, ResultRow>(results)
}

/// Aggressor amplifiers down the side, victims across the top
pub fn matrix_table(matrix: &CrosstalkMatrix) -> String {
    let mut builder = Builder::default();

    let mut header = vec!["agg \\ vic".to_string()];
    header.extend(matrix.victim.amplifiers.iter().map(|amp| amp.to_string()));
    builder.push_record(header);

    for (amp, row) in matrix.aggressor.amplifiers.iter().zip(&matrix.cells) {
        let mut record = vec![amp.to_string()];
        record.extend(row.iter().map(|cell| match cell.coefficient {
            Some(c) => format!("{:.2e}", c),
            None => "·".to_string(),
        }));
        builder.push_record(record);
    }

    builder.build().with(Style::rounded()).to_string()
}
