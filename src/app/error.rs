//! Application Error Handling
//!
//! Errors surfaced by the run-control layer and the command file facility.

use std::path::PathBuf;

use thiserror::Error;

use crate::module::api::ModuleError;

/// Result type alias for application operations
pub type AppResult<T> = std::result::Result<T, AppError>;

/// Error types for the application layer
#[derive(Debug, Error)]
pub enum AppError {
    /// Command refused by run-control gating before reaching any module
    #[error("Command '{command}' is not allowed in state '{state}' (busy: {busy}, error: {error})")]
    InvalidCommand {
        command: String,
        state: String,
        busy: bool,
        error: bool,
    },

    /// Command file extension is neither `.json` nor `.jstream`
    #[error("Unsupported command file format: '{path}' (expected .json or .jstream)")]
    UnsupportedFormat { path: PathBuf },

    /// Command file content did not parse as the expected shape
    #[error("Corrupt command stream in '{path}': {cause}")]
    CorruptStream { path: PathBuf, cause: String },

    /// Command file could not be read
    #[error("Could not read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failure propagated from the module system
    #[error(transparent)]
    Module(#[from] ModuleError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_command_names_the_gate() {
        let error = AppError::InvalidCommand {
            command: "start".to_string(),
            state: "NONE".to_string(),
            busy: false,
            error: true,
        };
        let text = error.to_string();
        assert!(text.contains("start"));
        assert!(text.contains("NONE"));
        assert!(text.contains("error: true"));
    }

    #[test]
    fn test_module_errors_pass_through_transparently() {
        let inner = ModuleError::AlreadyInitialized;
        let expected = inner.to_string();
        let error: AppError = inner.into();
        assert_eq!(error.to_string(), expected);
    }
}
