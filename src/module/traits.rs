//! Module Trait System
//!
//! Core traits and data structures for pluggable data-flow modules: the
//! `DaqModule` trait every module implements and the `CommandTable` mapping
//! command names to boxed handlers with per-command valid-state sets.
//!
//! # Module Architecture
//!
//! Modules exist to move and transform data between queues. The flow is:
//! producer module → queue → processing module → queue → sink module.
//!
//! Modules are driven exclusively through their command surface: the
//! dispatch engine asks each module whether it accepts a command in the
//! current state (`has_command`), then invokes the registered handler.
//! Modules never mutate each other directly.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use crate::module::error::{ModuleError, ModuleResult};
use crate::queue::api::QueueRegistry;

/// State token accepted by a command regardless of the current state.
pub const ANY_STATE: &str = "ANY";

/// Opaque payload fragment delivered to command handlers.
pub type CommandData = serde_json::Value;

/// Handler invoked when a command addressed to its module executes.
pub type CommandHandler = Box<dyn Fn(&CommandData) -> ModuleResult<()> + Send + Sync>;

struct CommandEntry {
    valid_states: HashSet<String>,
    handler: CommandHandler,
}

/// Introspection row: one registered command and the states it is valid in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandSignature {
    pub command: String,
    /// Sorted valid-state tokens; may contain the `ANY` sentinel.
    pub states: Vec<String>,
}

/// Per-module table of named command handlers.
///
/// Built once while the module is constructed; the dispatch engine only
/// reads it afterwards. Duplicate registration is a reported error, not a
/// silent overwrite.
pub struct CommandTable {
    module: String,
    entries: HashMap<String, CommandEntry>,
}

impl CommandTable {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            entries: HashMap::new(),
        }
    }

    /// Register `handler` for `command`, valid in `states`.
    ///
    /// An entry whose states contain [`ANY_STATE`] accepts the command in
    /// every state.
    pub fn register<I, S, F>(&mut self, command: &str, states: I, handler: F) -> ModuleResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&CommandData) -> ModuleResult<()> + Send + Sync + 'static,
    {
        if self.entries.contains_key(command) {
            return Err(ModuleError::CommandAlreadyRegistered {
                module: self.module.clone(),
                command: command.to_string(),
            });
        }
        self.entries.insert(
            command.to_string(),
            CommandEntry {
                valid_states: states.into_iter().map(Into::into).collect(),
                handler: Box::new(handler),
            },
        );
        Ok(())
    }

    /// Whether `command` is registered and valid in `state`.
    pub fn has_command(&self, command: &str, state: &str) -> bool {
        self.entries.get(command).is_some_and(|entry| {
            entry.valid_states.contains(ANY_STATE) || entry.valid_states.contains(state)
        })
    }

    /// Whether `command` is registered at all, in any state.
    pub fn contains(&self, command: &str) -> bool {
        self.entries.contains_key(command)
    }

    /// Invoke the handler registered for `command`.
    pub fn execute(&self, command: &str, data: &CommandData) -> ModuleResult<()> {
        match self.entries.get(command) {
            Some(entry) => (entry.handler)(data),
            None => Err(ModuleError::UnknownCommand {
                module: self.module.clone(),
                command: command.to_string(),
            }),
        }
    }

    /// Registered commands with their valid states, sorted by command name.
    pub fn signatures(&self) -> Vec<CommandSignature> {
        let mut rows: Vec<CommandSignature> = self
            .entries
            .iter()
            .map(|(command, entry)| {
                let mut states: Vec<String> = entry.valid_states.iter().cloned().collect();
                states.sort_unstable();
                CommandSignature {
                    command: command.clone(),
                    states,
                }
            })
            .collect();
        rows.sort_by(|a, b| a.command.cmp(&b.command));
        rows
    }
}

/// Everything a module needs during init: the registry its queue endpoints
/// resolve against and the instance's init payload.
pub struct InitContext<'a> {
    pub registry: &'a Arc<QueueRegistry>,
    pub data: &'a CommandData,
}

/// A pluggable processing unit driven through its command table.
///
/// Implementations build their `CommandTable` at construction time and keep
/// mutable state behind interior mutability; the manager shares modules
/// across threads as `Arc<dyn DaqModule>` and may invoke handlers from any
/// dispatching thread.
pub trait DaqModule: Send + Sync {
    /// Instance name, unique within the manager.
    fn name(&self) -> &str;

    /// One-time setup: resolve queue endpoints and capture configuration.
    fn init(&self, ctx: &InitContext<'_>) -> ModuleResult<()>;

    /// The module's command table.
    fn table(&self) -> &CommandTable;

    /// Typed access to the concrete module behind the trait object.
    fn as_any(&self) -> &dyn Any;

    /// Whether this module accepts `command` in `state`.
    fn has_command(&self, command: &str, state: &str) -> bool {
        self.table().has_command(command, state)
    }

    /// Run the handler registered for `command`.
    fn execute_command(&self, command: &str, data: &CommandData) -> ModuleResult<()> {
        self.table().execute(command, data)
    }

    /// Introspection: registered commands and their valid states.
    fn commands(&self) -> Vec<CommandSignature> {
        self.table().signatures()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(command: &str, states: &[&str]) -> CommandTable {
        let mut table = CommandTable::new("unit");
        table
            .register(command, states.iter().copied(), |_| Ok(()))
            .unwrap();
        table
    }

    #[test]
    fn test_duplicate_registration_is_an_error() {
        let mut table = table_with("start", &["INITIAL"]);

        let result = table.register("start", ["RUNNING"], |_| Ok(()));
        match result {
            Err(ModuleError::CommandAlreadyRegistered { module, command }) => {
                assert_eq!(module, "unit");
                assert_eq!(command, "start");
            }
            other => panic!("Expected CommandAlreadyRegistered error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_any_sentinel_accepts_every_state() {
        let table = table_with("probe", &[ANY_STATE]);

        assert!(table.has_command("probe", "NONE"));
        assert!(table.has_command("probe", "RUNNING"));
        assert!(!table.has_command("other", "RUNNING"));
    }

    #[test]
    fn test_state_set_gates_the_command() {
        let table = table_with("start", &["INITIAL", "CONFIGURED"]);

        assert!(table.has_command("start", "INITIAL"));
        assert!(table.has_command("start", "CONFIGURED"));
        assert!(!table.has_command("start", "RUNNING"));
        assert!(table.contains("start"));
    }

    #[test]
    fn test_execute_unknown_command_fails() {
        let table = table_with("start", &["INITIAL"]);

        match table.execute("missing", &CommandData::Null) {
            Err(ModuleError::UnknownCommand { module, command }) => {
                assert_eq!(module, "unit");
                assert_eq!(command, "missing");
            }
            other => panic!("Expected UnknownCommand error, got {:?}", other),
        }
    }

    #[test]
    fn test_execute_passes_the_payload_through() {
        use std::sync::Mutex;

        let seen: Arc<Mutex<Vec<CommandData>>> = Arc::new(Mutex::new(Vec::new()));
        let mut table = CommandTable::new("unit");
        {
            let seen = Arc::clone(&seen);
            table
                .register("record", [ANY_STATE], move |data| {
                    seen.lock().unwrap().push(data.clone());
                    Ok(())
                })
                .unwrap();
        }

        let payload = serde_json::json!({"value": 7});
        table.execute("record", &payload).unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), &[payload]);
    }

    #[test]
    fn test_signatures_are_sorted_and_complete() {
        let mut table = CommandTable::new("unit");
        table.register("stop", ["RUNNING"], |_| Ok(())).unwrap();
        table
            .register("start", ["INITIAL", "CONFIGURED"], |_| Ok(()))
            .unwrap();

        let rows = table.signatures();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].command, "start");
        assert_eq!(rows[0].states, vec!["CONFIGURED", "INITIAL"]);
        assert_eq!(rows[1].command, "stop");
        assert_eq!(rows[1].states, vec!["RUNNING"]);
    }
}
