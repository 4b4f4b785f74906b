use rusqlite::Error as RusqliteError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CpMigrateError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error), // Converts io::Error into CpMigrateError automatically

    #[error("Database error: {0}")]
    DatabaseError(#[from] RusqliteError), // Converts rusqlite::Error automatically

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid SQL identifier: '{0}'")]
    InvalidIdentifier(String),

    #[error("Invalid update registry: {0}")]
    InvalidRegistry(String),

    #[error("Daemon request failed: {0}")]
    Daemon(String),

    #[error("Error: {0}")]
    Error(String), // Allows custom application errors
}
