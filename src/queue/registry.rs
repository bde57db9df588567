//! QueueRegistry - binds queue names to live typed queue instances
//!
//! The registry is configured exactly once from a list of declarative specs,
//! then materialises queues lazily: the first typed `get::<T>` for a name
//! creates the backend declared for it and binds the element type `T`; every
//! later access must ask for the same `T` or gets a type-mismatch error.
//!
//! The registry is an explicitly constructed object. Whoever needs it holds
//! an `Arc<QueueRegistry>`; there is no process-wide instance.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::debug;

use crate::queue::error::{QueueError, QueueResult};
use crate::queue::lockfree::LockFreeQueue;
use crate::queue::locking::LockingQueue;
use crate::queue::traits::{QueueHandle, QueueStatus};
use crate::queue::types::{QueueKind, QueueSnapshot, QueueSpec};

/// A materialised queue with its element type erased.
struct LiveQueue {
    /// Human-readable name of the bound element type.
    element_type: &'static str,
    /// Boxed `QueueHandle<T>`; every typed access goes through a checked
    /// downcast against this box.
    handle: Box<dyn Any + Send + Sync>,
    /// Type-erased view for introspection.
    status: Arc<dyn QueueStatus>,
}

impl LiveQueue {
    fn typed_handle<T: Send + 'static>(&self, name: &str) -> QueueResult<QueueHandle<T>> {
        self.handle
            .downcast_ref::<QueueHandle<T>>()
            .map(Arc::clone)
            .ok_or_else(|| QueueError::TypeMismatch {
                name: name.to_string(),
                bound: self.element_type.to_string(),
                requested: std::any::type_name::<T>().to_string(),
            })
    }
}

/// Registry of named queues, created on demand from configured specs.
///
/// # Thread Safety
///
/// Fully thread-safe behind `Arc<QueueRegistry>`. Concurrent first access
/// to the same name yields exactly one underlying queue; losers of the
/// materialisation race get a handle to the winner's instance.
pub struct QueueRegistry {
    /// `None` until `configure` succeeds.
    specs: RwLock<Option<HashMap<String, QueueSpec>>>,
    live: RwLock<HashMap<String, LiveQueue>>,
}

impl QueueRegistry {
    pub fn new() -> Self {
        Self {
            specs: RwLock::new(None),
            live: RwLock::new(HashMap::new()),
        }
    }

    /// Record the queue specs this registry will serve.
    ///
    /// Callable successfully once; a second call fails with
    /// `AlreadyConfigured`. Specs are validated up front (positive capacity,
    /// recognised kind, unique names) and a failed validation leaves the
    /// registry unconfigured, so a corrected retry is allowed.
    pub fn configure(&self, specs: Vec<QueueSpec>) -> QueueResult<()> {
        let mut configured = self.specs.write().unwrap();
        if configured.is_some() {
            return Err(QueueError::AlreadyConfigured);
        }

        let mut map = HashMap::with_capacity(specs.len());
        for spec in specs {
            if spec.capacity == 0 {
                return Err(QueueError::InvalidCapacity { name: spec.name });
            }
            if spec.kind == QueueKind::Unknown {
                return Err(QueueError::UnknownKind { name: spec.name });
            }
            let name = spec.name.clone();
            if map.insert(name.clone(), spec).is_some() {
                return Err(QueueError::DuplicateName { name });
            }
        }

        debug!("Queue registry configured with {} spec(s)", map.len());
        *configured = Some(map);
        Ok(())
    }

    /// Fetch the queue registered under `name` with element type `T`.
    ///
    /// The first call for a name materialises the declared backend and binds
    /// `T`; later calls return the same instance. Fails with `NotFound` for
    /// names no spec declares and with `TypeMismatch` when `T` differs from
    /// the bound element type.
    pub fn get<T: Send + 'static>(&self, name: &str) -> QueueResult<QueueHandle<T>> {
        {
            let live = self.live.read().unwrap();
            if let Some(entry) = live.get(name) {
                return entry.typed_handle::<T>(name);
            }
        }

        let spec = {
            let specs = self.specs.read().unwrap();
            specs
                .as_ref()
                .and_then(|configured| configured.get(name))
                .cloned()
                .ok_or_else(|| QueueError::NotFound {
                    name: name.to_string(),
                })?
        };

        let mut live = self.live.write().unwrap();
        // Another caller may have materialised this name while we waited for
        // the write lock; hand out its instance instead of a second one.
        if let Some(entry) = live.get(name) {
            return entry.typed_handle::<T>(name);
        }

        let entry = create_queue::<T>(&spec)?;
        let handle = entry.typed_handle::<T>(name)?;
        live.insert(name.to_string(), entry);
        Ok(handle)
    }

    /// Read-only rows for every materialised queue, sorted by name.
    pub fn snapshots(&self) -> Vec<QueueSnapshot> {
        let live = self.live.read().unwrap();
        let mut rows: Vec<QueueSnapshot> = live
            .values()
            .map(|entry| QueueSnapshot {
                name: entry.status.name().to_string(),
                kind: entry.status.kind(),
                capacity: entry.status.capacity(),
                occupancy: entry.status.occupancy(),
                element_type: entry.element_type,
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }
}

impl Default for QueueRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn create_queue<T: Send + 'static>(spec: &QueueSpec) -> QueueResult<LiveQueue> {
    let (handle, status): (QueueHandle<T>, Arc<dyn QueueStatus>) = match spec.kind {
        QueueKind::Locking => {
            let queue = Arc::new(LockingQueue::new(spec.name.clone(), spec.capacity));
            (queue.clone() as QueueHandle<T>, queue)
        }
        QueueKind::LockFree => {
            let queue = Arc::new(LockFreeQueue::new(spec.name.clone(), spec.capacity));
            (queue.clone() as QueueHandle<T>, queue)
        }
        QueueKind::Unknown => {
            return Err(QueueError::UnknownKind {
                name: spec.name.clone(),
            })
        }
    };

    debug!(
        "Materialised queue '{}' ({}, capacity {}) for element type {}",
        spec.name,
        spec.kind,
        spec.capacity,
        std::any::type_name::<T>()
    );

    Ok(LiveQueue {
        element_type: std::any::type_name::<T>(),
        handle: Box::new(handle),
        status,
    })
}
