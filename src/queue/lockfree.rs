//! Lock-free queue backend
//!
//! A bounded MPMC ring for hot paths. The ring itself never blocks, so the
//! timeout contract is met by polling against a deadline with short pauses
//! between attempts.

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_queue::ArrayQueue;

use crate::queue::error::{PushError, QueueError, QueueResult};
use crate::queue::traits::{Queue, QueueStatus};
use crate::queue::types::QueueKind;

/// Pause between ring attempts while the deadline has not passed.
const POLL_INTERVAL: Duration = Duration::from_micros(100);

pub struct LockFreeQueue<T> {
    name: String,
    ring: ArrayQueue<T>,
}

impl<T: Send> LockFreeQueue<T> {
    /// `capacity` must be positive; the registry validates specs before any
    /// queue is created.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            ring: ArrayQueue::new(capacity),
        }
    }

    fn push_timeout(&self, timeout: Duration) -> QueueError {
        QueueError::PushTimeout {
            name: self.name.clone(),
            timeout_ms: timeout.as_millis() as u64,
            occupancy: self.ring.len(),
            capacity: self.ring.capacity(),
        }
    }

    fn pop_timeout(&self, timeout: Duration) -> QueueError {
        QueueError::PopTimeout {
            name: self.name.clone(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }
}

impl<T: Send> QueueStatus for LockFreeQueue<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> QueueKind {
        QueueKind::LockFree
    }

    fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    fn occupancy(&self) -> usize {
        self.ring.len()
    }

    fn can_push(&self) -> bool {
        !self.ring.is_full()
    }

    fn can_pop(&self) -> bool {
        !self.ring.is_empty()
    }
}

impl<T: Send> Queue<T> for LockFreeQueue<T> {
    fn push(&self, value: T, timeout: Duration) -> Result<(), PushError<T>> {
        let deadline = Instant::now() + timeout;
        let mut value = value;
        loop {
            match self.ring.push(value) {
                Ok(()) => return Ok(()),
                Err(rejected) => {
                    value = rejected;
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(PushError {
                            value,
                            error: self.push_timeout(timeout),
                        });
                    }
                    thread::sleep(POLL_INTERVAL.min(deadline - now));
                }
            }
        }
    }

    fn pop(&self, timeout: Duration) -> QueueResult<T> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(value) = self.ring.pop() {
                return Ok(value);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(self.pop_timeout(timeout));
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }
}
