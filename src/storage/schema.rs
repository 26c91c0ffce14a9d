//! Database schema definitions

/// Foreign keys are off by default in SQLite and must be enabled per connection
pub const ENABLE_FOREIGN_KEYS: &str = "PRAGMA foreign_keys = ON";

/// Tables an existing store file must already hold
pub const CATALOG_TABLES: &[&str] = &["sensors", "segments", "results"];

/// SQL to create the sensors table
pub const CREATE_SENSORS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sensors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    designation TEXT NOT NULL UNIQUE,
    manufacturer TEXT NOT NULL,
    num_amplifiers INTEGER NOT NULL
)
"#;

/// SQL to create the segments table
pub const CREATE_SEGMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS segments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    amplifier_number INTEGER NOT NULL,
    sensor_id INTEGER NOT NULL REFERENCES sensors(id),
    UNIQUE(sensor_id, amplifier_number),
    UNIQUE(sensor_id, name)
)
"#;

/// SQL to create the results table
/// Aggressor and victim are both segments; the pair is not unique
pub const CREATE_RESULTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    aggressor_id INTEGER NOT NULL REFERENCES segments(id),
    aggressor_signal REAL NOT NULL,
    coefficient REAL NOT NULL,
    error REAL,
    method TEXT NOT NULL,
    victim_id INTEGER NOT NULL REFERENCES segments(id)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_segments_sensor ON segments(sensor_id)",
    "CREATE INDEX IF NOT EXISTS idx_results_pair ON results(aggressor_id, victim_id)",
    "CREATE INDEX IF NOT EXISTS idx_results_victim ON results(victim_id)",
    "CREATE INDEX IF NOT EXISTS idx_results_method ON results(method)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_SENSORS_TABLE,
        CREATE_SEGMENTS_TABLE,
        CREATE_RESULTS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
