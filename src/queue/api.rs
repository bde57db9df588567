//! Public API for the queue system
//!
//! This module provides the complete public API for the typed queue system.
//! External modules should import from here rather than directly from
//! internal modules.

// Registry and backends
pub use crate::queue::lockfree::LockFreeQueue;
pub use crate::queue::locking::LockingQueue;
pub use crate::queue::registry::QueueRegistry;

// Contracts
pub use crate::queue::traits::{Queue, QueueHandle, QueueStatus};

// Declarative model and introspection
pub use crate::queue::types::{QueueKind, QueueSnapshot, QueueSpec};

// Error handling
pub use crate::queue::error::{PushError, QueueError, QueueResult};
