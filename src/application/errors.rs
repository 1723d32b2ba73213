//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BotError {
    /// Whether this error must stop the process (exit code 1) instead of
    /// being absorbed by the supervisor's restart logic.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BotError::Config(_))
    }
}

/// Errors a command unit may return from `execute`. The dispatcher logs
/// these and moves on; they never abort the batch.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Permission denied")]
    PermissionDenied,
}

/// Registry-internal load failures. These never escape the registry
/// boundary; every one degrades to "not found" plus a log line.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to load unit: {0}")]
    Load(String),

    #[error("Malformed unit: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
