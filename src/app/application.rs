//! Run-Control Application
//!
//! Wraps one [`ModuleManager`] and tracks the run-control state token the
//! dispatch engine gates commands against. Commands carry entry and exit
//! states; the application refuses a command whose entry state does not
//! match, runs it while holding the `busy` latch, and latches `error` on
//! the first failure so later commands are refused too.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use log::info;

use crate::app::commands::Command;
use crate::app::error::{AppError, AppResult};
use crate::core::sync::{handle_rwlock_read, handle_rwlock_write};
use crate::module::api::{ModuleError, ModuleManager};
use crate::queue::api::{QueueRegistry, QueueSnapshot};

fn threading(message: String) -> AppError {
    AppError::Module(ModuleError::Threading { message })
}

/// One process-local run-control application.
pub struct Application {
    manager: ModuleManager,
    state: RwLock<String>,
    busy: AtomicBool,
    error: AtomicBool,
}

impl Application {
    pub fn new() -> Self {
        Self {
            manager: ModuleManager::new(Arc::new(QueueRegistry::new())),
            state: RwLock::new("NONE".to_string()),
            busy: AtomicBool::new(false),
            error: AtomicBool::new(false),
        }
    }

    /// The manager owning the modules and their registry.
    pub fn manager(&self) -> &ModuleManager {
        &self.manager
    }

    /// Current run-control state token.
    pub fn state(&self) -> AppResult<String> {
        Ok(handle_rwlock_read(self.state.read(), threading)?.clone())
    }

    fn set_state(&self, next: &str) -> AppResult<()> {
        *handle_rwlock_write(self.state.write(), threading)? = next.to_string();
        Ok(())
    }

    /// Whether a command is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Whether a previous command failed. Latched; refuses all later
    /// commands.
    pub fn is_error(&self) -> bool {
        self.error.load(Ordering::SeqCst)
    }

    fn is_cmd_valid(&self, command: &Command, state: &str) -> bool {
        if self.is_busy() || self.is_error() {
            return false;
        }
        command.entry_state == "ANY" || command.entry_state == state
    }

    /// Run one command through the module manager.
    ///
    /// On success `init` advances the state to `INITIAL`, and a
    /// non-`"ANY"` exit state advances it further. A refused command does
    /// not latch `error`; a failed one does.
    pub fn execute(&self, command: &Command) -> AppResult<()> {
        let state = self.state()?;
        if !self.is_cmd_valid(command, &state) {
            return Err(AppError::InvalidCommand {
                command: command.id.clone(),
                state,
                busy: self.is_busy(),
                error: self.is_error(),
            });
        }

        info!("Executing command '{}' in state '{}'", command.id, state);
        self.busy.store(true, Ordering::SeqCst);
        match self.manager.execute(&state, &command.id, &command.data) {
            Ok(()) => {
                self.busy.store(false, Ordering::SeqCst);
                if command.id == "init" {
                    self.set_state("INITIAL")?;
                }
                if command.exit_state != "ANY" {
                    self.set_state(&command.exit_state)?;
                }
                Ok(())
            }
            Err(err) => {
                self.busy.store(false, Ordering::SeqCst);
                self.error.store(true, Ordering::SeqCst);
                Err(err.into())
            }
        }
    }

    /// Run a command sequence in order, stopping at the first failure.
    pub fn run_commands(&self, commands: &[Command]) -> AppResult<()> {
        for command in commands {
            self.execute(command)?;
        }
        Ok(())
    }

    /// Occupancy and capacity of every live queue, for monitoring.
    pub fn queue_snapshots(&self) -> Vec<QueueSnapshot> {
        self.manager.registry().snapshots()
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}
