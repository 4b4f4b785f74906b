use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::info;

use crate::config::Config;
use crate::database::Database;
use crate::error::CpMigrateError;
use crate::migration::{InvocationMode, Registry, StepSettings, UpdateEngine};
use crate::notifier::TcpDaemonNotifier;
use crate::schema;

#[derive(Parser)]
#[command(
    name = "cpmigrate",
    version,
    about = "cpmigrate: database updates for the control panel"
)]
pub struct Cli {
    /// Path to the panel database (overrides the configured path)
    #[arg(long = "db", global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the database revision and whether updates are pending (default)
    Status,
    /// List the pending database updates
    Pending,
    /// Apply every pending database update
    Apply,
    /// Create the baseline schema in an empty database
    Init,
    /// Start the web server exposing the update page
    Serve,
}

impl Cli {
    pub fn handle_command_line() -> Result<(), CpMigrateError> {
        let args = Cli::parse();
        let config = Config::get()?;

        let db_path = args
            .db
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.database.path));

        match args.command.unwrap_or(Command::Status) {
            Command::Status => Self::status(config, &db_path),
            Command::Pending => Self::pending(config, &db_path),
            Command::Apply => Self::apply(config, &db_path),
            Command::Init => Self::init(&db_path),
            Command::Serve => Self::start_server(config, &db_path),
        }
    }

    fn build_engine(
        config: &Config,
        db_path: &Path,
        mode: InvocationMode,
    ) -> Result<UpdateEngine, CpMigrateError> {
        let db = Database::open(db_path)?;

        Ok(UpdateEngine::new(db, Registry::builtin(), mode)
            .with_settings(StepSettings::from(&config.panel))
            .with_notifier(Box::new(TcpDaemonNotifier::from_config(&config.daemon))))
    }

    fn status(config: &Config, db_path: &Path) -> Result<(), CpMigrateError> {
        let engine = Self::build_engine(config, db_path, InvocationMode::OneShot)?;

        println!("Database:                {}", db_path.display());
        println!("Next revision to apply:  {}", engine.current_revision()?);
        println!(
            "Highest known revision:  {}",
            engine.registry().highest_known_revision()
        );
        println!(
            "Updates available:       {}",
            if engine.is_update_available()? { "yes" } else { "no" }
        );

        Ok(())
    }

    fn pending(config: &Config, db_path: &Path) -> Result<(), CpMigrateError> {
        let engine = Self::build_engine(config, db_path, InvocationMode::OneShot)?;
        let details = engine.pending_update_details()?;

        if details.is_empty() && !engine.is_update_available()? {
            println!("No database updates available.");
            return Ok(());
        }

        for (revision, detail) in details {
            println!("{:>5}  {}", revision, detail);
        }

        Ok(())
    }

    fn apply(config: &Config, db_path: &Path) -> Result<(), CpMigrateError> {
        let mut engine = Self::build_engine(config, db_path, InvocationMode::OneShot)?;

        if !engine.is_update_available()? {
            println!("No database updates available.");
            return Ok(());
        }

        if engine.apply_all_updates() {
            println!("All database updates were successfully applied.");
            return Ok(());
        }

        let report = engine
            .last_error()
            .map(|failure| failure.to_text())
            .unwrap_or_else(|| "Database update failed.".to_string());

        Err(CpMigrateError::Error(report))
    }

    fn init(db_path: &Path) -> Result<(), CpMigrateError> {
        let mut db = Database::open(db_path)?;

        if schema::create_base_schema(&mut db, &Registry::builtin())? {
            println!("Created baseline schema in {}", db_path.display());
        } else {
            println!(
                "{} already holds panel tables; nothing to do.",
                db_path.display()
            );
        }

        Ok(())
    }

    fn start_server(config: &Config, db_path: &Path) -> Result<(), CpMigrateError> {
        let host = config.server.host.clone();
        let port = config.server.port;

        let engine = Self::build_engine(config, db_path, InvocationMode::Interactive)?;

        info!("Starting server on {}:{}", host, port);

        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| CpMigrateError::Error(format!("Failed to create runtime: {}", e)))?;

        rt.block_on(async {
            let web_server = crate::server::WebServer::new(host, port, engine);
            web_server.start().await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing_no_command_defaults_to_status() {
        let result = Cli::try_parse_from(["cpmigrate"]);
        assert!(result.is_ok(), "Should accept no command");

        let cli = result.unwrap();
        assert!(cli.command.is_none());
        assert!(cli.db.is_none());
        assert!(matches!(cli.command.unwrap_or(Command::Status), Command::Status));
    }

    #[test]
    fn test_cli_parsing_subcommands() {
        let cli = Cli::try_parse_from(["cpmigrate", "apply"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Apply)));

        let cli = Cli::try_parse_from(["cpmigrate", "pending"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Pending)));

        let cli = Cli::try_parse_from(["cpmigrate", "init"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Init)));

        let cli = Cli::try_parse_from(["cpmigrate", "serve"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Serve)));
    }

    #[test]
    fn test_cli_parsing_global_db_flag() {
        let cli = Cli::try_parse_from(["cpmigrate", "apply", "--db", "/tmp/panel.db"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/panel.db")));

        let cli = Cli::try_parse_from(["cpmigrate", "--db", "panel.db", "status"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("panel.db")));
        assert!(matches!(cli.command, Some(Command::Status)));
    }

    #[test]
    fn test_cli_parsing_invalid_arguments() {
        let result = Cli::try_parse_from(["cpmigrate", "nonexistent-command"]);
        assert!(result.is_err(), "Should reject unknown commands");

        let result = Cli::try_parse_from(["cpmigrate", "apply", "--invalid-flag"]);
        assert!(result.is_err(), "Should reject unknown flags on apply");
    }

    #[test]
    fn test_init_then_apply_on_new_database() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("panel.db");

        Cli::init(&db_path).unwrap();
        // A second init leaves the database alone.
        Cli::init(&db_path).unwrap();

        let db = Database::open(&db_path).unwrap();
        let mut engine = UpdateEngine::new(db, Registry::builtin(), InvocationMode::OneShot);
        assert!(engine.apply_all_updates(), "{:?}", engine.last_error());
        assert!(!engine.is_update_available().unwrap());
    }
}
