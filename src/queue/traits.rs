//! Traits for the queue system
//!
//! This module contains the queue contracts every backend implements. The
//! registry hands out `QueueHandle<T>` trait objects, so callers never learn
//! which backend serves a given name except through timing.

use std::sync::Arc;
use std::time::Duration;

use crate::queue::error::{PushError, QueueResult};
use crate::queue::types::QueueKind;

/// Type-erased view of a live queue, independent of the element type.
///
/// The registry keeps one of these per materialised queue so occupancy and
/// capacity can be reported even where the element type is no longer known.
/// All methods are non-blocking.
pub trait QueueStatus: Send + Sync {
    /// The name this queue was declared under.
    fn name(&self) -> &str;

    /// Backend kind this queue was created with.
    fn kind(&self) -> QueueKind;

    /// Maximum number of elements the queue holds.
    fn capacity(&self) -> usize;

    /// Current number of elements. Advisory under concurrent use.
    fn occupancy(&self) -> usize;

    /// Whether a push would currently find room. Advisory only: a `true`
    /// result does not guarantee a subsequent push will not time out under
    /// contention.
    fn can_push(&self) -> bool {
        self.occupancy() < self.capacity()
    }

    /// Whether a pop would currently find an element. Advisory only.
    fn can_pop(&self) -> bool {
        self.occupancy() > 0
    }
}

/// Named, bounded FIFO channel with blocking push/pop bounded by a timeout.
pub trait Queue<T: Send>: QueueStatus {
    /// Block until there is room or `timeout` elapses.
    ///
    /// On timeout the element is handed back inside the error, so ownership
    /// never gets lost in a failed push.
    fn push(&self, value: T, timeout: Duration) -> Result<(), PushError<T>>;

    /// Block until an element is available or `timeout` elapses.
    ///
    /// Successful pops observe strict FIFO order relative to completed
    /// pushes on the same queue.
    fn pop(&self, timeout: Duration) -> QueueResult<T>;
}

impl<T: Send> std::fmt::Debug for dyn Queue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("capacity", &self.capacity())
            .field("occupancy", &self.occupancy())
            .finish()
    }
}

/// Shared handle to a live queue.
///
/// Every holder of the same queue name sees the same instance; the queue
/// lives as long as its longest-lived handle.
pub type QueueHandle<T> = Arc<dyn Queue<T>>;
