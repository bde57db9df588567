//! Typed Queue Component
//!
//! Named, capacity-bounded FIFO channels connecting data-flow modules, plus
//! a registry that creates them lazily from declarative specs and enforces
//! element-type safety at first use.
//!
//! # Overview
//!
//! - **Bounded blocking**: `push`/`pop` block until room or data appears,
//!   never longer than the caller's timeout
//! - **Two backends**: a mutex/condvar deque and a lock-free MPMC ring,
//!   interchangeable behind the `Queue<T>` contract
//! - **Lazy typed materialisation**: the registry binds the element type on
//!   first `get::<T>` and rejects every later access under a different type
//! - **Advisory introspection**: occupancy and capacity are readable without
//!   blocking, for monitoring and backpressure decisions
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  get::<T>("a")   ┌───────────────────────────────┐
//! │  Module P  │─────────────────▶│         QueueRegistry         │
//! └─────┬──────┘                  │  specs: name → kind/capacity  │
//!       │ push                    │  live:  name → typed handle   │
//!       ▼                         └──────────────┬────────────────┘
//! ┌───────────────────┐                          │ materialise once
//! │   Queue<T> "a"    │◀─────────────────────────┘
//! │ ┌───┬───┬───┬───┐ │
//! │ │ 1 │ 2 │ 3 │   │ │  bounded FIFO, blocking push/pop
//! │ └───┴───┴───┴───┘ │
//! └─────┬─────────────┘
//!       │ pop
//! ┌─────┴──────┐
//! │  Module C  │
//! └────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use daqflow::queue::{QueueKind, QueueRegistry, QueueSpec};
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = QueueRegistry::new();
//! registry.configure(vec![QueueSpec {
//!     name: "hits".to_string(),
//!     kind: QueueKind::Locking,
//!     capacity: 100,
//! }])?;
//!
//! // First typed access creates the queue and binds the element type
//! let queue = registry.get::<i64>("hits")?;
//! queue.push(42, Duration::from_millis(10))?;
//! assert_eq!(queue.pop(Duration::from_millis(10))?, 42);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod api;

mod error;
mod lockfree;
mod locking;
mod registry;
mod traits;
mod types;

pub use error::{PushError, QueueError, QueueResult};
pub use lockfree::LockFreeQueue;
pub use locking::LockingQueue;
pub use registry::QueueRegistry;
pub use traits::{Queue, QueueHandle, QueueStatus};
pub use types::{QueueKind, QueueSnapshot, QueueSpec};

#[cfg(test)]
mod tests;
