use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use enclosure::schedule::{self, ScheduleFile, ThermostatOffset};
use enclosure::BuildingInput;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "enclosure")]
#[command(about = "Builds layered envelope constructions for building energy models", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Builds every assembly in a JSON building description
    Build {
        /// Building description
        input: PathBuf,

        /// Write the model summary here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Log and skip assemblies that fail instead of aborting
        #[arg(long)]
        skip_invalid: bool,
    },
    /// Derives heating/cooling setpoints from a schedule column
    ThermostatOffset {
        /// CSV schedule driving the offsets
        #[arg(long)]
        schedule: PathBuf,

        /// 1-based column holding the driver values
        #[arg(long, default_value_t = 1)]
        column: usize,

        #[arg(long, default_value_t = 1)]
        rows_to_skip: usize,

        #[arg(long, default_value_t = 8760)]
        samples: usize,

        #[arg(long, default_value_t = 60)]
        minutes_per_item: u32,

        #[arg(long)]
        heating_setpoint: f64,

        #[arg(long)]
        cooling_setpoint: f64,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        heating_offset: f64,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        cooling_offset: f64,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = if cli.verbose {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Build {
            input,
            output,
            skip_invalid,
        } => {
            let json = std::fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let description = BuildingInput::from_json(&json)?;
            let outcome = description.build(skip_invalid)?;
            for (name, reason) in &outcome.skipped {
                eprintln!("skipped {name}: {reason}");
            }
            let summary = serde_json::to_string_pretty(&outcome.model.summary())?;

            if let Some(path) = output {
                std::fs::write(&path, summary)?;
                info!(path = %path.display(), "model summary written");
            } else {
                println!("{}", summary);
            }
        }
        Commands::ThermostatOffset {
            schedule: path,
            column,
            rows_to_skip,
            samples,
            minutes_per_item,
            heating_setpoint,
            cooling_setpoint,
            heating_offset,
            cooling_offset,
            output,
        } => {
            if samples == 0 {
                anyhow::bail!("--samples must be at least 1");
            }
            let source = ScheduleFile {
                name: "ThermostatDriver".to_string(),
                path,
                column,
                rows_to_skip,
                samples,
                minutes_per_item,
            };
            let offset = ThermostatOffset {
                heating_setpoint,
                cooling_setpoint,
                heating_offset,
                cooling_offset,
            };
            let (heating, cooling) = schedule::write_thermostat_offsets(&source, &offset, &output)?;
            println!("{}", serde_json::to_string_pretty(&[heating, cooling])?);
        }
    }

    Ok(())
}
