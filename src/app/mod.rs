//! Application module
//!
//! Run-control layer: the `Application` state machine, the command file
//! facility, and the binary's CLI and startup path.

pub mod application;
pub mod cli;
pub mod commands;
pub mod error;
pub mod startup;

pub use application::Application;
pub use commands::{read_commands, Command};
pub use error::{AppError, AppResult};
