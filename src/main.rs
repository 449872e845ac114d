use chrono::Local;
use clap::{Parser, Subcommand};
use client_report::{
    ReportConfig, ReportDriver, ReportError, RecordStore, SqliteRecordStore, StoreError,
    default_template_report_file_name,
};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Generate client account-balance PDF reports.
#[derive(Parser, Debug)]
#[command(name = "client-report", version, about)]
struct Cli {
    /// JSON config file (defaults to $CLIENT_REPORT_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database holding the client records
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reset the database to the sample client list
    Seed,
    /// Tabular report built directly from layout primitives
    Tabular {
        /// File name prefix inside the output directory
        #[arg(long, conflicts_with = "output")]
        prefix: Option<String>,
        /// Exact output path
        #[arg(long)]
        output: Option<PathBuf>,
        /// Report on a single client, by name
        #[arg(long)]
        client: Option<String>,
    },
    /// Report produced from the XHTML template
    Template {
        /// Exact output path (defaults to ClientReport_HTML_<date>.pdf in the output directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("No client named '{0}'")]
    UnknownClient(String),
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Report(e.into())
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ReportConfig::load(cli.config.as_deref()).map_err(ReportError::from)?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    let mut store = SqliteRecordStore::open(&config.database_path)?;
    if let Command::Seed = cli.command {
        store.seed_sample_data()?;
        println!("Seeded {} clients into {}", store.count()?, config.database_path.display());
        return Ok(());
    }

    let driver = ReportDriver::new(store, config);
    match cli.command {
        Command::Seed => {}
        Command::Tabular { prefix, output, client } => {
            let records = driver.store().load_all()?;
            let path = match (client, output, prefix) {
                (Some(name), output, prefix) => {
                    let record = records
                        .iter()
                        .find(|r| r.name == name)
                        .ok_or(CliError::UnknownClient(name))?;
                    match (output, prefix) {
                        (Some(path), _) => driver.generate_tabular_report(std::slice::from_ref(record), path)?,
                        (None, Some(prefix)) => driver.generate_tabular_report(std::slice::from_ref(record), prefix)?,
                        (None, None) => driver.generate_single_client_report(record)?,
                    }
                }
                (None, Some(path), _) => driver.generate_tabular_report(&records, path)?,
                (None, None, Some(prefix)) => driver.generate_tabular_report(&records, prefix)?,
                (None, None, None) => driver.generate_client_report(&records)?,
            };
            println!("{}", path.display());
        }
        Command::Template { output } => {
            let path = match output {
                Some(path) => path,
                None => {
                    let output_dir = &driver.config().output_dir;
                    std::fs::create_dir_all(output_dir).map_err(ReportError::from)?;
                    output_dir.join(default_template_report_file_name(Local::now().date_naive()))
                }
            };
            driver.generate_template_report(&path)?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
