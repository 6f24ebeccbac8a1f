//! Command-line front end for the sensor ledger core.
//!
//! # Responsibility
//! - Map one subcommand to one `DataPointService` call against a SQLite
//!   world-state file.
//! - Print results on stdout and errors on stderr with a non-zero exit.

use clap::{Parser, Subcommand};
use log::error;
use sensorledger_core::db::open_db;
use sensorledger_core::{
    default_log_level, init_logging, ContractSettings, DataPoint, DataPointService,
    SqliteStateStore, StaticIdentity,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Sensor readings catalog with threshold alerts.
#[derive(Parser, Debug)]
#[command(name = "sensorledger", version, about, long_about = None)]
struct Cli {
    /// SQLite world-state file
    #[arg(long, global = true, default_value = "./sensorledger.sqlite3")]
    db: PathBuf,

    /// TOML settings file (threshold, authorized_org, scan_page_size)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Organization the caller acts as
    #[arg(long, global = true, default_value = "Org1")]
    org: String,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, global = true)]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error; requires --log-dir
    #[arg(long, global = true, requires = "log_dir")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print core linkage info
    Ping,
    #[command(flatten)]
    Ledger(LedgerCommand),
}

/// Subcommands that run against the world-state file.
#[derive(Subcommand, Debug)]
enum LedgerCommand {
    /// Seed data1..data5
    Init,
    /// Create a data point
    Add {
        id: String,
        #[arg(allow_negative_numbers = true)]
        temperature: f64,
        owner: String,
    },
    /// Print the stored record JSON
    Read { id: String },
    /// Replace the temperature of a data point
    Update {
        id: String,
        #[arg(allow_negative_numbers = true)]
        temperature: f64,
    },
    /// Remove a data point
    Delete { id: String },
    /// Hand a data point to another organization
    Transfer { id: String, new_owner: String },
    /// Print whether a data point exists
    Exists { id: String },
    /// Print every stored entry as a JSON array
    List,
    /// Re-derive the alert of a data point (authorized organization only)
    Recheck { id: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String, Box<dyn Error>> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    match cli.command {
        Command::Ping => Ok(format!(
            "sensorledger_core ping={} version={}",
            sensorledger_core::ping(),
            sensorledger_core::core_version()
        )),
        Command::Ledger(command) => {
            run_ledger(command, &cli.db, cli.config.as_deref(), cli.org)
        }
    }
}

fn run_ledger(
    command: LedgerCommand,
    db: &Path,
    config: Option<&Path>,
    org: String,
) -> Result<String, Box<dyn Error>> {
    let settings = match config {
        Some(path) => ContractSettings::from_file(path)?,
        None => ContractSettings::default(),
    };
    let conn = open_db(db)?;
    let service = DataPointService::with_settings(SqliteStateStore::new(&conn), settings);

    let output = match command {
        LedgerCommand::Init => {
            service.init_ledger()?;
            "ledger initialized".to_string()
        }
        LedgerCommand::Add {
            id,
            temperature,
            owner,
        } => render(&service.add_data_point(&id, temperature, &owner)?)?,
        LedgerCommand::Read { id } => service.read_data_point(&id)?,
        LedgerCommand::Update { id, temperature } => {
            render(&service.update_data_point(&id, temperature)?)?
        }
        LedgerCommand::Delete { id } => {
            service.delete_data_point(&id)?;
            format!("deleted {id}")
        }
        LedgerCommand::Transfer { id, new_owner } => {
            render(&service.transfer_data_point(&id, &new_owner)?)?
        }
        LedgerCommand::Exists { id } => service.data_point_exists(&id)?.to_string(),
        LedgerCommand::List => service.get_all_data_points()?,
        LedgerCommand::Recheck { id } => {
            let caller = StaticIdentity::new(org);
            let outcome = service.consensus_on_threshold_crossed(&caller, &id)?;
            format!("{outcome:?}")
        }
    };
    Ok(output)
}

fn render(record: &DataPoint) -> Result<String, Box<dyn Error>> {
    Ok(serde_json::to_string_pretty(&record.canonical_value())?)
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, LedgerCommand};
    use clap::{error::ErrorKind, CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_level_without_log_dir_is_rejected() {
        let err = Cli::try_parse_from(["sensorledger", "--log-level", "debug", "ping"])
            .expect_err("log level alone must fail");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let cli = Cli::try_parse_from([
            "sensorledger",
            "--log-dir",
            "/tmp/sensorledger-logs",
            "--log-level",
            "debug",
            "ping",
        ])
        .expect("log level with dir");
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn ping_and_ledger_subcommands_parse_side_by_side() {
        let cli = Cli::try_parse_from(["sensorledger", "ping"]).expect("ping");
        assert!(matches!(cli.command, Command::Ping));

        let cli = Cli::try_parse_from(["sensorledger", "add", "x", "-5.5", "Org1"]).expect("add");
        assert!(matches!(
            cli.command,
            Command::Ledger(LedgerCommand::Add { ref id, temperature, .. })
                if id == "x" && temperature == -5.5
        ));
    }

    #[test]
    fn ping_runs_without_opening_a_database() {
        let dir = std::env::temp_dir().join("sensorledger-ping-missing-dir");
        let db = dir.join("nested").join("ledger.sqlite3");
        let cli = Cli::try_parse_from(["sensorledger", "--db", db.to_str().expect("utf-8"), "ping"])
            .expect("ping");
        let output = super::run(cli).expect("ping output");
        assert!(output.starts_with("sensorledger_core ping=pong"));
        assert!(!db.exists());
    }
}
