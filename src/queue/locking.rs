//! Lock-based queue backend
//!
//! A bounded deque guarded by one mutex and two condition variables, one for
//! "no longer full" and one for "no longer empty". The total wait of a push
//! or pop is bounded by the caller's timeout even when the mutex itself is
//! contended: lock acquisition spends part of the budget in bounded retries,
//! and the condition wait gets whatever remains.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use crate::queue::error::{PushError, QueueError, QueueResult};
use crate::queue::traits::{Queue, QueueStatus};
use crate::queue::types::QueueKind;

/// Retry sub-intervals the lock-acquisition budget is split into.
const LOCK_RETRIES: u32 = 5;

pub struct LockingQueue<T> {
    name: String,
    capacity: usize,
    /// Occupancy mirror for lock-free `can_push`/`can_pop`; mutated only
    /// while the deque mutex is held.
    size: AtomicUsize,
    deque: Mutex<VecDeque<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T: Send> LockingQueue<T> {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            size: AtomicUsize::new(0),
            deque: Mutex::new(VecDeque::with_capacity(capacity)),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// Time-bounded lock acquisition.
    ///
    /// One immediate attempt, then retries spread over the timeout in
    /// `LOCK_RETRIES` pauses. Returns `None` when the budget runs out
    /// without the lock being acquired.
    fn try_lock_for(&self, timeout: Duration) -> Option<MutexGuard<'_, VecDeque<T>>> {
        let start = Instant::now();
        match self.deque.try_lock() {
            Ok(guard) => return Some(guard),
            Err(TryLockError::Poisoned(err)) => {
                panic!("queue '{}' mutex poisoned: {}", self.name, err)
            }
            Err(TryLockError::WouldBlock) => {}
        }
        if timeout.is_zero() {
            return None;
        }
        let pause = timeout / LOCK_RETRIES;
        while start.elapsed() < timeout {
            thread::sleep(pause);
            match self.deque.try_lock() {
                Ok(guard) => return Some(guard),
                Err(TryLockError::Poisoned(err)) => {
                    panic!("queue '{}' mutex poisoned: {}", self.name, err)
                }
                Err(TryLockError::WouldBlock) => {}
            }
        }
        None
    }

    fn push_timeout(&self, timeout: Duration) -> QueueError {
        QueueError::PushTimeout {
            name: self.name.clone(),
            timeout_ms: timeout.as_millis() as u64,
            occupancy: self.occupancy(),
            capacity: self.capacity,
        }
    }

    fn pop_timeout(&self, timeout: Duration) -> QueueError {
        QueueError::PopTimeout {
            name: self.name.clone(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }
}

impl<T: Send> QueueStatus for LockingQueue<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> QueueKind {
        QueueKind::Locking
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn occupancy(&self) -> usize {
        self.size.load(Ordering::SeqCst)
    }
}

impl<T: Send> Queue<T> for LockingQueue<T> {
    fn push(&self, value: T, timeout: Duration) -> Result<(), PushError<T>> {
        let start = Instant::now();
        let Some(mut deque) = self.try_lock_for(timeout) else {
            return Err(PushError {
                value,
                error: self.push_timeout(timeout),
            });
        };

        // Condition wait on whatever budget lock acquisition left over
        let remaining = timeout.saturating_sub(start.elapsed());
        if !remaining.is_zero() && deque.len() >= self.capacity {
            let (guard, _) = self
                .not_full
                .wait_timeout_while(deque, remaining, |d| d.len() >= self.capacity)
                .unwrap();
            deque = guard;
        }

        if deque.len() < self.capacity {
            deque.push_back(value);
            self.size.fetch_add(1, Ordering::SeqCst);
            self.not_empty.notify_one();
            Ok(())
        } else {
            Err(PushError {
                value,
                error: self.push_timeout(timeout),
            })
        }
    }

    fn pop(&self, timeout: Duration) -> QueueResult<T> {
        let start = Instant::now();
        let mut deque = self
            .try_lock_for(timeout)
            .ok_or_else(|| self.pop_timeout(timeout))?;

        let remaining = timeout.saturating_sub(start.elapsed());
        if !remaining.is_zero() && deque.is_empty() {
            let (guard, _) = self
                .not_empty
                .wait_timeout_while(deque, remaining, |d| d.is_empty())
                .unwrap();
            deque = guard;
        }

        match deque.pop_front() {
            Some(value) => {
                self.size.fetch_sub(1, Ordering::SeqCst);
                self.not_full.notify_one();
                Ok(value)
            }
            None => Err(self.pop_timeout(timeout)),
        }
    }
}
