//! `dbc_tools` command line.
//!
//! Generates the reference database, checks, converts and inspects `.dbc` files
//! and estimates their bus load.

use std::fs;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use thiserror::Error;

use dbc_tools::{
    Database, Dialect, EncodeOptions, LoadError, ModelError, SaveError,
    busload::{self, BusLoad, BusSpeed},
    dbc, lint,
};

#[derive(Parser)]
#[command(name = "dbc_tools")]
#[command(author, version, about = "Read, check and write CAN databases (.dbc)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the reference database (ECU1, ECU2, EngineData/RPM)
    Generate {
        /// Output file
        #[arg(short, long, default_value = "example.dbc")]
        output: String,

        /// Output layout: legacy or standard
        #[arg(short, long, default_value_t = Dialect::Legacy)]
        dialect: Dialect,
    },

    /// Decode, validate and lint a .dbc file
    Check {
        /// File to check
        file: String,

        /// Exit with failure when lint reports warnings
        #[arg(long)]
        strict: bool,
    },

    /// Decode a .dbc file and write it again in the chosen layout
    Convert {
        /// Input .dbc file
        input: String,

        /// Output .dbc file
        output: String,

        /// Output layout: legacy or standard
        #[arg(short, long, default_value_t = Dialect::Standard)]
        dialect: Dialect,
    },

    /// Estimate the bus load at the usual CAN and CAN FD speeds
    Busload {
        /// File to analyse
        file: String,
    },

    /// Print the decoded model as JSON
    Inspect {
        /// File to inspect
        file: String,
    },

    /// Build a .dbc file from a JSON model (as printed by `inspect`)
    Import {
        /// JSON model
        json: String,

        /// Output .dbc file
        output: String,

        /// Output layout: legacy or standard
        #[arg(short, long, default_value_t = Dialect::Legacy)]
        dialect: Dialect,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error("Invalid database in '{path}': {source}")]
    Model {
        path: String,
        #[source]
        source: ModelError,
    },
    #[error("Failed to read '{path}'. \nError: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON model in '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            log::debug!("{e:?}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level: &str = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(command: Commands) -> Result<ExitCode, CliError> {
    match command {
        Commands::Generate { output, dialect } => {
            let db: Database = dbc::reference_database();
            dbc::save_to_file(&output, &db, &EncodeOptions::from(dialect))?;
            println!("DBC file created successfully!");
        }

        Commands::Check { file, strict } => {
            let db: Database = dbc::from_file(&file)?;
            let findings: Vec<lint::Finding> = lint::lint(&db);
            for finding in &findings {
                println!("{finding}");
            }
            let warnings: usize = findings
                .iter()
                .filter(|f| f.severity == lint::Severity::Warning)
                .count();
            println!(
                "{file}: {} nodes, {} messages, {} signals, {} warnings",
                db.nodes.len(),
                db.messages.len(),
                db.iter_signals().count(),
                warnings
            );
            if strict && warnings > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Convert {
            input,
            output,
            dialect,
        } => {
            let db: Database = dbc::from_file(&input)?;
            dbc::save_to_file(&output, &db, &EncodeOptions::from(dialect))?;
            log::info!("converted {input} to {output} ({dialect})");
        }

        Commands::Busload { file } => {
            let db: Database = dbc::from_file(&file)?;
            let mut unscheduled: usize = 0;
            for speed in BusSpeed::PRESETS {
                let load: BusLoad = busload::estimate(&db, speed);
                println!(
                    "{speed}: {:.2}% ({})",
                    load.total * 100.0,
                    load.rating().to_str()
                );
                unscheduled = load.unscheduled;
            }
            if unscheduled > 0 {
                println!("{unscheduled} messages without cycle time were not counted");
            }
        }

        Commands::Inspect { file } => {
            let db: Database = dbc::from_file(&file)?;
            let json: String =
                serde_json::to_string_pretty(&db).map_err(|source| CliError::Json {
                    path: file.clone(),
                    source,
                })?;
            println!("{json}");
        }

        Commands::Import {
            json,
            output,
            dialect,
        } => {
            let text: String = fs::read_to_string(&json).map_err(|source| CliError::Read {
                path: json.clone(),
                source,
            })?;
            let db: Database = serde_json::from_str(&text).map_err(|source| CliError::Json {
                path: json.clone(),
                source,
            })?;
            db.validate().map_err(|source| CliError::Model {
                path: json.clone(),
                source,
            })?;
            dbc::save_to_file(&output, &db, &EncodeOptions::from(dialect))?;
            log::info!("imported {json} into {output}");
        }
    }
    Ok(ExitCode::SUCCESS)
}
