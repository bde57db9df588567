//! Module Factory Registration
//!
//! Link-time plugin registry for module types. Module implementations use
//! the `daq_module!` macro to register a factory entry; `make_module` looks
//! the plugin name up at init time.

use std::sync::Arc;

use inventory;

use crate::module::error::{ModuleError, ModuleResult};
use crate::module::traits::DaqModule;

/// Entry for a module type in the link-time registry
pub struct ModuleFactoryEntry {
    /// Plugin type name used in module specs.
    pub plugin: &'static str,
    /// Builds an instance with the given instance name.
    pub build: fn(&str) -> ModuleResult<Arc<dyn DaqModule>>,
}

// Collect all module factory entries
inventory::collect!(ModuleFactoryEntry);

/// Macro for registering module types
///
#[macro_export]
macro_rules! daq_module {
    ($plugin:literal, $build_expr:expr) => {
        inventory::submit!($crate::module::api::ModuleFactoryEntry {
            plugin: $plugin,
            build: $build_expr,
        });
    };
}

/// Build a module instance from its registered plugin type.
pub fn make_module(plugin: &str, name: &str) -> ModuleResult<Arc<dyn DaqModule>> {
    for entry in inventory::iter::<ModuleFactoryEntry>() {
        if entry.plugin == plugin {
            return (entry.build)(name);
        }
    }
    Err(ModuleError::CreationFailed {
        plugin: plugin.to_string(),
        name: name.to_string(),
        cause: format!("unknown plugin (available: {})", available_plugins().join(", ")),
    })
}

/// Registered plugin type names, sorted for stable diagnostics.
pub fn available_plugins() -> Vec<&'static str> {
    let mut plugins: Vec<&'static str> = inventory::iter::<ModuleFactoryEntry>()
        .map(|entry| entry.plugin)
        .collect();
    plugins.sort_unstable();
    plugins
}
