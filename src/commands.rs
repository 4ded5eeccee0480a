//! Entry-point operations behind the `init_db`, `create_race` and `clean_db`
//! executables.

use crate::storage::{Database, StoreConfig};
use anyhow::Context;
use std::process::ExitCode;

pub const SCHEMA_CREATED: &str = "Database tables created successfully!";
pub const DATABASE_CLEANED: &str =
    "Database cleaned successfully! All races and GPS points have been removed.";

/// One unit of work against the race store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Create the tables if missing
    InitSchema,
    /// Insert one new active race
    CreateRace,
    /// Delete all points, then all races
    Purge,
}

impl Command {
    fn failure_prefix(self) -> &'static str {
        match self {
            Command::InitSchema => "Error initializing database",
            Command::CreateRace => "Error creating race",
            Command::Purge => "Error cleaning database",
        }
    }
}

/// Run a command against the configured store and return the success message.
pub fn execute(command: Command, config: &StoreConfig) -> anyhow::Result<String> {
    let mut db = Database::open_with_config(config)
        .with_context(|| format!("opening {}", config.database_path.display()))?;

    match command {
        Command::InitSchema => {
            db.initialize()?;
            Ok(SCHEMA_CREATED.to_string())
        }
        Command::CreateRace => {
            let race = db.create_race()?;
            Ok(format!("New race created successfully! (race id {})", race.id))
        }
        Command::Purge => {
            db.purge()?;
            Ok(DATABASE_CLEANED.to_string())
        }
    }
}

/// Executable main body: set up logging, load configuration, run the command
/// and report. Exits 1 on any failure.
pub fn run(command: Command) -> ExitCode {
    crate::logging::init();

    let outcome = StoreConfig::load()
        .context("loading configuration")
        .and_then(|config| execute(command, &config));

    match outcome {
        Ok(message) => {
            println!("{}", message);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!(?command, "{:#}", e);
            eprintln!("{}: {:#}", command.failure_prefix(), e);
            ExitCode::FAILURE
        }
    }
}
