//! Module Error Handling
//!
//! Error types for module construction, initialisation, and command
//! dispatch, including the aggregate failures the dispatch engine reports.

use std::fmt;

use crate::queue::api::{PushError, QueueError};

/// Result type alias for module operations
pub type ModuleResult<T> = std::result::Result<T, ModuleError>;

/// Error types for the module system
#[derive(Debug)]
pub enum ModuleError {
    /// Command arrived before a successful init
    NotInitialized { command: String },

    /// Init received after the manager already initialised
    AlreadyInitialized,

    /// Module instance could not be built
    CreationFailed {
        plugin: String,
        name: String,
        cause: String,
    },

    /// A module registered the same command twice
    CommandAlreadyRegistered { module: String, command: String },

    /// Command not present in a module's table
    UnknownCommand { module: String, command: String },

    /// Command not present in any module's table
    UnrecognizedCommand { command: String },

    /// No managed module instance with the requested name
    ModuleNotFound { name: String },

    /// Address pattern does not compile as a regex
    BadMatchPattern { pattern: String, cause: String },

    /// At least one module name was matched by more than one pattern
    ConflictingAddressing {
        command: String,
        modules: Vec<String>,
    },

    /// One or more handlers failed during dispatch
    DispatchFailed {
        command: String,
        modules: Vec<String>,
    },

    /// Payload did not parse as the expected shape
    InvalidCommandData { context: String, cause: String },

    /// Init data declares no endpoint with the requested label
    MissingEndpoint { module: String, label: String },

    /// Worker thread lifecycle misuse, join failure, or poisoned lock
    Threading { message: String },

    /// Queue operation failure surfaced through module code
    Queue(QueueError),

    /// Handler-level failure inside a module
    ExecutionFailed {
        module: String,
        command: String,
        cause: String,
    },
}

impl fmt::Display for ModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleError::NotInitialized { command } => {
                write!(
                    f,
                    "Command '{}' received before init; the manager is not initialised",
                    command
                )
            }
            ModuleError::AlreadyInitialized => {
                write!(f, "Init received twice; the manager is already initialised")
            }
            ModuleError::CreationFailed {
                plugin,
                name,
                cause,
            } => {
                write!(
                    f,
                    "Could not create module '{}' of type '{}': {}",
                    name, plugin, cause
                )
            }
            ModuleError::CommandAlreadyRegistered { module, command } => {
                write!(
                    f,
                    "Module '{}' registers command '{}' more than once",
                    module, command
                )
            }
            ModuleError::UnknownCommand { module, command } => {
                write!(f, "Module '{}' has no command '{}'", module, command)
            }
            ModuleError::UnrecognizedCommand { command } => {
                write!(f, "No module registers command '{}'", command)
            }
            ModuleError::ModuleNotFound { name } => {
                write!(f, "No module named '{}'", name)
            }
            ModuleError::BadMatchPattern { pattern, cause } => {
                write!(f, "Invalid match pattern '{}': {}", pattern, cause)
            }
            ModuleError::ConflictingAddressing { command, modules } => {
                write!(
                    f,
                    "Command '{}' addresses module(s) {} with more than one pattern",
                    command,
                    modules.join(", ")
                )
            }
            ModuleError::DispatchFailed { command, modules } => {
                write!(
                    f,
                    "Command '{}' failed in module(s): {}",
                    command,
                    modules.join(", ")
                )
            }
            ModuleError::InvalidCommandData { context, cause } => {
                write!(f, "Invalid data for {}: {}", context, cause)
            }
            ModuleError::MissingEndpoint { module, label } => {
                write!(
                    f,
                    "Module '{}' init data declares no '{}' endpoint",
                    module, label
                )
            }
            ModuleError::Threading { message } => {
                write!(f, "Threading error: {}", message)
            }
            ModuleError::Queue(err) => {
                write!(f, "Queue error: {}", err)
            }
            ModuleError::ExecutionFailed {
                module,
                command,
                cause,
            } => {
                write!(
                    f,
                    "Module '{}' failed executing '{}': {}",
                    module, command, cause
                )
            }
        }
    }
}

impl std::error::Error for ModuleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModuleError::Queue(err) => Some(err),
            _ => None,
        }
    }
}

impl From<QueueError> for ModuleError {
    fn from(err: QueueError) -> Self {
        ModuleError::Queue(err)
    }
}

impl<T> From<PushError<T>> for ModuleError {
    fn from(failed: PushError<T>) -> Self {
        ModuleError::Queue(failed.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_failed_names_every_module() {
        let error = ModuleError::DispatchFailed {
            command: "start".to_string(),
            modules: vec!["reader".to_string(), "writer".to_string()],
        };
        let text = error.to_string();
        assert!(text.contains("start"));
        assert!(text.contains("reader, writer"));
    }

    #[test]
    fn test_queue_error_converts_and_links_source() {
        use std::error::Error;

        let error: ModuleError = QueueError::NotFound {
            name: "missing".to_string(),
        }
        .into();
        assert!(error.to_string().contains("missing"));
        assert!(error.source().is_some());
    }
}
