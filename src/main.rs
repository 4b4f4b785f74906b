mod api;
mod cli;
mod config;
mod database;
mod error;
mod migration;
mod notifier;
mod passwords;
mod schema;
mod server;
mod state_store;
mod steps;

use cli::Cli;
use config::Config;
use directories::ProjectDirs;
use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming,
};
use log::{debug, error};

const LOG_FILE_LIMIT: u64 = 10 * 1024 * 1024;
const LOG_FILES_KEPT: usize = 7;

fn setup_logging(project_dirs: &ProjectDirs, config: &Config) -> Result<LoggerHandle, FlexiLoggerError> {
    let log_dir = project_dirs.data_local_dir().join("logs");

    Logger::try_with_str(config.logging.log_spec())?
        .log_to_file(FileSpec::default().directory(log_dir).basename("cpmigrate"))
        .format_for_files(flexi_logger::detailed_format)
        .rotate(
            Criterion::Size(LOG_FILE_LIMIT),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(LOG_FILES_KEPT),
        )
        .duplicate_to_stderr(Duplicate::Warn)
        .start()
}

fn main() {
    let Some(project_dirs) = ProjectDirs::from("", "", "cpmigrate") else {
        eprintln!("Could not determine the data directory for cpmigrate");
        std::process::exit(1);
    };

    let config = Config::load_config(&project_dirs);

    // Logging stops when the handle is dropped.
    let _logger = match setup_logging(&project_dirs, &config) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Failed to start logging: {}", e);
            None
        }
    };

    if let Err(err) = Config::init(config) {
        eprintln!("{}", err);
        std::process::exit(1);
    }

    debug!("Command-line args: {:?}", std::env::args_os().collect::<Vec<_>>());

    if let Err(err) = Cli::handle_command_line() {
        error!("{:?}", err);
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
