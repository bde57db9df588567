//! Module System Component
//!
//! Pluggable data-flow modules and the command dispatch engine that drives
//! them. Modules are built from declarative specs at init time, wired to
//! queues through the registry, and controlled exclusively through named
//! commands addressed by regex.
//!
//! # Overview
//!
//! - **Command tables**: each module maps command names to handler closures
//!   with per-command valid-state sets; `"ANY"` opts out of state gating
//! - **Regex addressing**: one command can carry several payload fragments,
//!   each scoped to the module names matching its pattern
//! - **Conflict detection**: a module matched by more than one pattern
//!   aborts the dispatch before any handler runs
//! - **Failure isolation**: a failing handler never blocks its siblings;
//!   failures are aggregated into one dispatch error
//! - **Link-time factory**: module types register themselves with the
//!   `daq_module!` macro and are looked up by plugin name at init
//!
//! # Architecture
//!
//! ```text
//!            execute(state, id, data)
//!                      │
//!                      ▼
//!          ┌───────────────────────┐   init   ┌───────────────┐
//!          │     ModuleManager     │─────────▶│ QueueRegistry │
//!          │  name → DaqModule     │          └───────────────┘
//!          └───────────┬───────────┘
//!                      │ eligible set ∩ regex match
//!          ┌───────────┼───────────────┐
//!          ▼           ▼               ▼
//!    ┌──────────┐ ┌──────────┐  ┌──────────┐
//!    │ "source" │ │  "fan"   │  │  "sink"  │   CommandTable each:
//!    └──────────┘ └──────────┘  └──────────┘   id → (states, handler)
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use daqflow::module::ModuleManager;
//! use daqflow::queue::QueueRegistry;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ModuleManager::new(Arc::new(QueueRegistry::new()));
//! manager.execute("NONE", "init", &json!({
//!     "queues": [{"name": "numbers", "kind": "locking", "capacity": 16}],
//!     "modules": [{
//!         "plugin": "SequenceSource",
//!         "name": "source",
//!         "data": {
//!             "endpoints": [{"queue": "numbers", "label": "output", "dir": "output"}],
//!             "count": 4
//!         }
//!     }]
//! }))?;
//! assert_eq!(manager.module_names()?, vec!["source".to_string()]);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod api;
pub mod builtin;

mod error;
mod factory;
mod manager;
mod traits;
mod types;
mod worker;

pub use error::{ModuleError, ModuleResult};
pub use factory::{available_plugins, make_module, ModuleFactoryEntry};
pub use manager::ModuleManager;
pub use traits::{
    CommandData, CommandHandler, CommandSignature, CommandTable, DaqModule, InitContext, ANY_STATE,
};
pub use types::{
    endpoint, endpoints, endpoints_with_dir, parse_data, AddressedCmd, CommandEnvelope,
    EndpointDir, InitSpec, ModuleCommands, ModuleSpec, QueueEndpoint,
};
pub use worker::{WorkerThread, WorkerToken};

#[cfg(test)]
mod tests;
