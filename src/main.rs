//! xtalkdb CLI - browse a crosstalk catalog from the terminal

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use commands::{MatrixArgs, OutputFormat, PairArgs, SegmentArgs};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use xtalkdb::{config, ui};

#[derive(Parser)]
#[command(name = "xtalkdb")]
#[command(version)]
#[command(about = "Browse a catalog of CCD sensor crosstalk measurements")]
#[command(long_about = r#"
xtalkdb reads a SQLite catalog of sensors, their amplifier segments and
aggressor/victim crosstalk results.

Example usage:
  xtalkdb sensors
  xtalkdb segment --amp 4 --sensor Davis
  xtalkdb results --sensor Davis --aggressor 4 --victim 5 --method MODEL_LSQ
  xtalkdb matrix --designation ITL-3800C-029 --format json
  xtalkdb matrix --sensor Davis --victim-sensor Tucson
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the store file (overrides the config file)
    #[arg(short = 'D', long, global = true)]
    database: Option<PathBuf>,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every sensor
    Sensors,

    /// Show one sensor and its segments
    Sensor {
        /// Informal sensor name
        #[arg(long)]
        name: Option<String>,

        /// Manufacturer designation
        #[arg(long)]
        designation: Option<String>,
    },

    /// Show one segment and the results it takes part in
    Segment {
        /// Segment label (e.g. C14)
        #[arg(long)]
        segment: Option<String>,

        /// Amplifier number
        #[arg(long)]
        amp: Option<u32>,

        /// Owning sensor name
        #[arg(long)]
        sensor: Option<String>,

        /// Owning sensor designation
        #[arg(long)]
        designation: Option<String>,
    },

    /// List results for an aggressor/victim amplifier pair
    Results {
        #[arg(long)]
        sensor: Option<String>,

        #[arg(long)]
        designation: Option<String>,

        /// Aggressor amplifier number
        #[arg(long)]
        aggressor: u32,

        /// Victim amplifier number
        #[arg(long)]
        victim: u32,

        /// Methodology tag to keep (repeatable; all methods when omitted)
        #[arg(long = "method")]
        methods: Vec<String>,
    },

    /// Show the mean crosstalk matrix of a sensor, or between two sensors
    Matrix {
        /// Aggressor sensor name
        #[arg(long)]
        sensor: Option<String>,

        /// Aggressor sensor designation
        #[arg(long)]
        designation: Option<String>,

        /// Victim sensor name (defaults to the aggressor sensor)
        #[arg(long)]
        victim_sensor: Option<String>,

        /// Victim sensor designation
        #[arg(long)]
        victim_designation: Option<String>,

        /// Methodology tag to keep (repeatable; all methods when omitted)
        #[arg(long = "method")]
        methods: Vec<String>,
    },

    /// Show row counts
    Stats,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ui::error(&format!("{:#}", err));
            exit_code(&err)
        }
    }
}

/// 2 for store and file failures, 1 for everything else
fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<xtalkdb::Error>() {
        Some(e) if e.is_store_io() => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let loaded = config::load_config(cli.config.as_deref())?;
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let database = config::resolve_database_path(
        cli.database.as_deref(),
        loaded.as_ref(),
        Some(&config_path),
    );
    tracing::debug!(database = %database.display(), "resolved store path");

    let format = cli.format;
    match cli.command {
        Commands::Sensors => commands::run_sensors(&database, format),

        Commands::Sensor { name, designation } => {
            commands::run_sensor(&database, name.as_deref(), designation.as_deref(), format)
        }

        Commands::Segment { segment, amp, sensor, designation } => commands::run_segment(
            &database,
            SegmentArgs {
                segment: segment.as_deref(),
                amplifier: amp,
                sensor: sensor.as_deref(),
                designation: designation.as_deref(),
            },
            format,
        ),

        Commands::Results { sensor, designation, aggressor, victim, methods } => commands::run_results(
            &database,
            PairArgs {
                sensor: sensor.as_deref(),
                designation: designation.as_deref(),
                aggressor,
                victim,
                methods: &methods,
            },
            format,
        ),

        Commands::Matrix { sensor, designation, victim_sensor, victim_designation, methods } => {
            commands::run_matrix(
                &database,
                MatrixArgs {
                    sensor: sensor.as_deref(),
                    designation: designation.as_deref(),
                    victim_sensor: victim_sensor.as_deref(),
                    victim_designation: victim_designation.as_deref(),
                    methods: &methods,
                },
                format,
            )
        }

        Commands::Stats => commands::run_stats(&database, format),
    }
}
