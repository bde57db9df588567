//! Public API for the module system
//!
//! This module provides the complete public API for pluggable data-flow
//! modules and their command dispatch. External code should import from
//! here rather than directly from internal modules.

// Manager and dispatch
pub use crate::module::manager::ModuleManager;

// Contracts
pub use crate::module::traits::{
    CommandData, CommandHandler, CommandSignature, CommandTable, DaqModule, InitContext, ANY_STATE,
};

// Declarative model and endpoint helpers
pub use crate::module::types::{
    endpoint, endpoints, endpoints_with_dir, parse_data, AddressedCmd, CommandEnvelope,
    EndpointDir, InitSpec, ModuleCommands, ModuleSpec, QueueEndpoint,
};

// Factory registry
pub use crate::module::factory::{available_plugins, make_module, ModuleFactoryEntry};

// Worker lifecycle
pub use crate::module::worker::{WorkerThread, WorkerToken};

// Built-in modules
pub use crate::module::builtin::fanout::{FanOut, FanOutConfig, FanOutMode};
pub use crate::module::builtin::sink::{CollectorSink, SinkConfig};
pub use crate::module::builtin::source::{SequenceSource, SourceConfig};

// Error handling
pub use crate::module::error::{ModuleError, ModuleResult};
