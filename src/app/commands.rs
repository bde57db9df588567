//! Command File Facility
//!
//! Reads run-control command sequences from files. `.json` files hold one
//! JSON array of command objects; `.jstream` files hold concatenated JSON
//! objects, one command each, in the JSON-streaming style.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::app::error::{AppError, AppResult};
use crate::module::api::CommandData;

fn any_state() -> String {
    "ANY".to_string()
}

/// One run-control command as read from a command file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub id: String,
    /// State the command is valid in; `"ANY"` skips the check.
    #[serde(default = "any_state")]
    pub entry_state: String,
    /// State to advance to on success; `"ANY"` leaves the state alone.
    #[serde(default = "any_state")]
    pub exit_state: String,
    #[serde(default)]
    pub data: CommandData,
}

/// Read a command sequence from `path`, dispatching on its extension.
pub fn read_commands(path: &Path) -> AppResult<Vec<Command>> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => {
            let text = read_file(path)?;
            serde_json::from_str(&text).map_err(|err| corrupt(path, err))
        }
        Some("jstream") => {
            let text = read_file(path)?;
            let mut commands = Vec::new();
            for item in serde_json::Deserializer::from_str(&text).into_iter::<Command>() {
                commands.push(item.map_err(|err| corrupt(path, err))?);
            }
            Ok(commands)
        }
        _ => Err(AppError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

fn read_file(path: &Path) -> AppResult<String> {
    fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn corrupt(path: &Path, err: serde_json::Error) -> AppError {
    AppError::CorruptStream {
        path: path.to_path_buf(),
        cause: err.to_string(),
    }
}
