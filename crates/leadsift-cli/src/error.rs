use anyhow::Error;
use leadsift_config::ConfigError;
use leadsift_core::CoreError;
use leadsift_sync::SyncError;
use std::io::ErrorKind;
use std::process::ExitCode;
use thiserror::Error as ThisError;

/// Process exit statuses. Anything unclassified is a plain failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Failure = 1,
    NotFound = 2,
    InvalidInput = 3,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

#[derive(Debug, ThisError)]
pub enum CliError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
}

pub fn invalid_input(message: impl Into<String>) -> Error {
    CliError::InvalidInput(message.into()).into()
}

pub fn not_found(message: impl Into<String>) -> Error {
    CliError::NotFound(message.into()).into()
}

/// Prints the error to stderr; `-v` includes the whole cause chain.
pub fn report_error(err: &Error, verbose: bool) {
    if verbose {
        eprintln!("error: {err:#}");
    } else {
        eprintln!("error: {err}");
    }
}

pub fn exit_code_for(err: &Error) -> ExitCode {
    err.chain()
        .find_map(classify)
        .unwrap_or(Exit::Failure)
        .into()
}

fn classify(cause: &(dyn std::error::Error + 'static)) -> Option<Exit> {
    if let Some(err) = cause.downcast_ref::<CliError>() {
        return Some(match err {
            CliError::InvalidInput(_) => Exit::InvalidInput,
            CliError::NotFound(_) => Exit::NotFound,
        });
    }
    if let Some(err) = cause.downcast_ref::<ConfigError>() {
        return Some(match err {
            ConfigError::MissingHomeDir => Exit::Failure,
            ConfigError::MissingConfigFile(_) => Exit::NotFound,
            _ => Exit::InvalidInput,
        });
    }
    if let Some(err) = cause.downcast_ref::<SyncError>() {
        return Some(match err {
            SyncError::Io(io) if io.kind() == ErrorKind::NotFound => Exit::NotFound,
            SyncError::MissingMessage(_) => Exit::NotFound,
            SyncError::Command(_) | SyncError::Io(_) => Exit::Failure,
            SyncError::Unavailable(_)
            | SyncError::Core(_)
            | SyncError::Parse(_)
            | SyncError::Json(_) => Exit::InvalidInput,
        });
    }
    cause
        .downcast_ref::<CoreError>()
        .map(|_| Exit::InvalidInput)
}
