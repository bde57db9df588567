//! Module Manager and Command Dispatch
//!
//! Owns every module instance and routes commands to them. `init` is
//! handled by the manager itself: it configures the queue registry and
//! builds the module graph. Every other command goes through the dispatch
//! algorithm, which resolves regex addressing against the eligible module
//! set, rejects ambiguous addressing before touching any module, and
//! isolates per-module handler failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use log::{debug, error, info};
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::core::sync::{handle_rwlock_read, handle_rwlock_write};
use crate::module::error::{ModuleError, ModuleResult};
use crate::module::factory::make_module;
use crate::module::traits::{CommandData, DaqModule, InitContext};
use crate::module::types::{CommandEnvelope, InitSpec, ModuleCommands};
use crate::queue::api::QueueRegistry;

/// Owns module instances and dispatches commands to them.
///
/// Construct one per process with the registry its modules resolve their
/// queue endpoints against. The manager accepts exactly one successful
/// `init`; every other command fails until that has happened.
pub struct ModuleManager {
    registry: Arc<QueueRegistry>,
    modules: RwLock<HashMap<String, Arc<dyn DaqModule>>>,
    initialized: AtomicBool,
}

impl ModuleManager {
    pub fn new(registry: Arc<QueueRegistry>) -> Self {
        Self {
            registry,
            modules: RwLock::new(HashMap::new()),
            initialized: AtomicBool::new(false),
        }
    }

    /// The registry module endpoints resolve against.
    pub fn registry(&self) -> &Arc<QueueRegistry> {
        &self.registry
    }

    /// Whether `init` has completed successfully.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Execute a command against the managed modules.
    ///
    /// `init` is routed to the manager's own initialisation; anything else
    /// is dispatched to the modules accepting the command in `state`.
    pub fn execute(&self, state: &str, id: &str, data: &CommandData) -> ModuleResult<()> {
        debug!("Executing command '{}' in state '{}'", id, state);

        if id == "init" {
            return self.initialize(data);
        }
        if !self.is_initialized() {
            return Err(ModuleError::NotInitialized {
                command: id.to_string(),
            });
        }

        let envelope: CommandEnvelope = parse_payload("command envelope", data)?;
        self.dispatch(state, id, &envelope)
    }

    /// Configure queues and build the module graph from the init payload.
    ///
    /// All-or-nothing for the module map: instances are built and
    /// initialised into a local map which is only committed once every
    /// module succeeded. A failure after `configure` leaves the registry
    /// configured and the manager uninitialised.
    fn initialize(&self, data: &CommandData) -> ModuleResult<()> {
        if self.is_initialized() {
            return Err(ModuleError::AlreadyInitialized);
        }

        let spec: InitSpec = parse_payload("init spec", data)?;
        self.registry.configure(spec.queues)?;

        let mut built: HashMap<String, Arc<dyn DaqModule>> = HashMap::new();
        for module_spec in &spec.modules {
            debug!(
                "Constructing module '{}' of type '{}'",
                module_spec.name, module_spec.plugin
            );
            if built.contains_key(&module_spec.name) {
                return Err(ModuleError::CreationFailed {
                    plugin: module_spec.plugin.clone(),
                    name: module_spec.name.clone(),
                    cause: "duplicate instance name".to_string(),
                });
            }
            let module = make_module(&module_spec.plugin, &module_spec.name)?;
            module.init(&InitContext {
                registry: &self.registry,
                data: &module_spec.data,
            })?;
            built.insert(module_spec.name.clone(), module);
        }

        let count = built.len();
        let mut modules = handle_rwlock_write(self.modules.write(), |message| {
            ModuleError::Threading { message }
        })?;
        *modules = built;
        self.initialized.store(true, Ordering::SeqCst);
        info!("Initialised {} module(s)", count);
        Ok(())
    }

    /// Resolve addressing and run the command on every selected module.
    ///
    /// Modules are visited in map order within a group; callers must not
    /// depend on a particular order between modules of the same group.
    fn dispatch(&self, state: &str, id: &str, envelope: &CommandEnvelope) -> ModuleResult<()> {
        let modules = handle_rwlock_read(self.modules.read(), |message| ModuleError::Threading {
            message,
        })?;

        let eligible: Vec<String> = modules
            .iter()
            .filter(|(_, module)| module.has_command(id, state))
            .map(|(name, _)| name.clone())
            .collect();

        if eligible.is_empty() && !modules.values().any(|module| module.table().contains(id)) {
            return Err(ModuleError::UnrecognizedCommand {
                command: id.to_string(),
            });
        }

        let empty = CommandData::Null;
        let mut groups: Vec<(Vec<String>, &CommandData)> = Vec::new();

        if envelope.addressed.is_empty() {
            groups.push((eligible, &empty));
        } else {
            // Hit counts only cover non-empty patterns: the empty "all"
            // pattern never conflicts with an explicit address.
            let mut pattern_hits: HashMap<String, usize> = HashMap::new();
            for addressed in &envelope.addressed {
                if addressed.pattern.is_empty() {
                    groups.push((eligible.clone(), &addressed.payload));
                    continue;
                }
                let regex = Regex::new(&format!("^(?:{})$", addressed.pattern)).map_err(|err| {
                    ModuleError::BadMatchPattern {
                        pattern: addressed.pattern.clone(),
                        cause: err.to_string(),
                    }
                })?;
                let matches: Vec<String> = eligible
                    .iter()
                    .filter(|name| regex.is_match(name))
                    .cloned()
                    .collect();
                if matches.is_empty() {
                    debug!(
                        "Pattern '{}' of command '{}' matches no eligible module",
                        addressed.pattern, id
                    );
                    continue;
                }
                for name in &matches {
                    *pattern_hits.entry(name.clone()).or_insert(0) += 1;
                }
                groups.push((matches, &addressed.payload));
            }

            let mut conflicted: Vec<String> = pattern_hits
                .into_iter()
                .filter(|(_, hits)| *hits > 1)
                .map(|(name, _)| name)
                .collect();
            if !conflicted.is_empty() {
                conflicted.sort_unstable();
                return Err(ModuleError::ConflictingAddressing {
                    command: id.to_string(),
                    modules: conflicted,
                });
            }
        }

        let mut failed: Vec<String> = Vec::new();
        for (names, payload) in &groups {
            for name in names {
                if let Some(module) = modules.get(name) {
                    debug!("Executing '{}' -> '{}'", id, name);
                    if let Err(err) = module.execute_command(id, payload) {
                        error!("Module '{}' failed executing '{}': {}", name, id, err);
                        failed.push(name.clone());
                    }
                }
            }
        }

        if !failed.is_empty() {
            return Err(ModuleError::DispatchFailed {
                command: id.to_string(),
                modules: failed,
            });
        }
        Ok(())
    }

    /// Instance names of all managed modules, sorted.
    pub fn module_names(&self) -> ModuleResult<Vec<String>> {
        let modules = handle_rwlock_read(self.modules.read(), |message| ModuleError::Threading {
            message,
        })?;
        let mut names: Vec<String> = modules.keys().cloned().collect();
        names.sort_unstable();
        Ok(names)
    }

    /// Registered commands per module, sorted by module name.
    pub fn command_report(&self) -> ModuleResult<Vec<ModuleCommands>> {
        let modules = handle_rwlock_read(self.modules.read(), |message| ModuleError::Threading {
            message,
        })?;
        let mut report: Vec<ModuleCommands> = modules
            .iter()
            .map(|(name, module)| ModuleCommands {
                module: name.clone(),
                commands: module.commands(),
            })
            .collect();
        report.sort_by(|a, b| a.module.cmp(&b.module));
        Ok(report)
    }

    /// The managed module named `name`.
    pub fn module(&self, name: &str) -> ModuleResult<Arc<dyn DaqModule>> {
        let modules = handle_rwlock_read(self.modules.read(), |message| ModuleError::Threading {
            message,
        })?;
        modules
            .get(name)
            .cloned()
            .ok_or_else(|| ModuleError::ModuleNotFound {
                name: name.to_string(),
            })
    }
}

fn parse_payload<T>(context: &str, data: &CommandData) -> ModuleResult<T>
where
    T: DeserializeOwned + Default,
{
    if data.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(data.clone()).map_err(|err| ModuleError::InvalidCommandData {
        context: context.to_string(),
        cause: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manager() -> ModuleManager {
        ModuleManager::new(Arc::new(QueueRegistry::new()))
    }

    #[test]
    fn test_command_before_init_is_rejected() {
        let manager = manager();
        match manager.execute("NONE", "start", &CommandData::Null) {
            Err(ModuleError::NotInitialized { command }) => assert_eq!(command, "start"),
            other => panic!("Expected NotInitialized error, got {:?}", other),
        }
    }

    #[test]
    fn test_second_init_is_rejected() {
        let manager = manager();
        manager.execute("NONE", "init", &CommandData::Null).unwrap();
        assert!(manager.is_initialized());

        match manager.execute("INITIAL", "init", &CommandData::Null) {
            Err(ModuleError::AlreadyInitialized) => {}
            other => panic!("Expected AlreadyInitialized error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_init_payload_is_invalid_data() {
        let manager = manager();
        match manager.execute("NONE", "init", &json!([1, 2, 3])) {
            Err(ModuleError::InvalidCommandData { context, .. }) => {
                assert!(context.contains("init spec"));
            }
            other => panic!("Expected InvalidCommandData error, got {:?}", other),
        }
        assert!(!manager.is_initialized());
    }

    #[test]
    fn test_init_with_unknown_plugin_fails() {
        let manager = manager();
        let result = manager.execute(
            "NONE",
            "init",
            &json!({
                "modules": [{"plugin": "NoSuchThing", "name": "ghost"}]
            }),
        );
        match result {
            Err(ModuleError::CreationFailed { plugin, .. }) => assert_eq!(plugin, "NoSuchThing"),
            other => panic!("Expected CreationFailed error, got {:?}", other),
        }
        assert!(!manager.is_initialized());
    }

    #[test]
    fn test_module_lookup_on_empty_manager() {
        let manager = manager();
        match manager.module("anyone") {
            Err(ModuleError::ModuleNotFound { name }) => assert_eq!(name, "anyone"),
            other => panic!("Expected ModuleNotFound error, got {:?}", other.err()),
        }
    }
}
