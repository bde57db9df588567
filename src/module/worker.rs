//! Worker Thread Lifecycle
//!
//! Start/stop management for the background threads data-moving modules
//! run between their `start` and `stop` commands. Worker bodies receive a
//! [`WorkerToken`] and pause with [`WorkerToken::wait_for`] rather than
//! sleeping, so a stop request interrupts the pause instead of waiting it
//! out.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::core::sync::handle_mutex_poison;
use crate::module::error::{ModuleError, ModuleResult};

/// Stop signal shared between the owning module and its worker thread.
struct Signal {
    running: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

/// Handle a worker body polls to learn about stop requests.
#[derive(Clone)]
pub struct WorkerToken {
    signal: Arc<Signal>,
}

impl WorkerToken {
    /// Whether the worker should keep running.
    pub fn is_running(&self) -> bool {
        self.signal.running.load(Ordering::SeqCst)
    }

    /// Pause for up to `timeout`, waking early when a stop is requested.
    ///
    /// Returns the running flag after the pause, so worker loops can be
    /// written as `while token.wait_for(pause) { ... }`.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let guard = self.signal.lock.lock().unwrap();
        let _wait = self
            .signal
            .wake
            .wait_timeout_while(guard, timeout, |_| self.is_running())
            .unwrap();
        self.is_running()
    }
}

/// Owns at most one named worker thread.
///
/// `start` spawns the body with a fresh token; `stop` flips the running
/// flag, wakes any pause in progress, and joins the thread. Both calls
/// report lifecycle misuse (double start, stop without start) as
/// [`ModuleError::Threading`].
pub struct WorkerThread {
    signal: Arc<Signal>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerThread {
    pub fn new() -> Self {
        Self {
            signal: Arc::new(Signal {
                running: AtomicBool::new(false),
                lock: Mutex::new(()),
                wake: Condvar::new(),
            }),
            handle: Mutex::new(None),
        }
    }

    /// Whether a worker thread is currently running.
    pub fn is_running(&self) -> bool {
        self.signal.running.load(Ordering::SeqCst)
    }

    /// Spawn `body` on a named thread.
    pub fn start<F>(&self, name: &str, body: F) -> ModuleResult<()>
    where
        F: FnOnce(WorkerToken) + Send + 'static,
    {
        let mut handle = handle_mutex_poison(self.handle.lock(), |message| {
            ModuleError::Threading { message }
        })?;
        if self.is_running() {
            return Err(ModuleError::Threading {
                message: format!("worker '{}' is already running", name),
            });
        }

        self.signal.running.store(true, Ordering::SeqCst);
        let token = WorkerToken {
            signal: Arc::clone(&self.signal),
        };
        match thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(token))
        {
            Ok(spawned) => {
                *handle = Some(spawned);
                Ok(())
            }
            Err(err) => {
                self.signal.running.store(false, Ordering::SeqCst);
                Err(ModuleError::Threading {
                    message: format!("could not spawn worker '{}': {}", name, err),
                })
            }
        }
    }

    /// Request a stop, interrupt any pause, and join the worker thread.
    pub fn stop(&self) -> ModuleResult<()> {
        let mut handle = handle_mutex_poison(self.handle.lock(), |message| {
            ModuleError::Threading { message }
        })?;
        if !self.is_running() {
            return Err(ModuleError::Threading {
                message: "attempted to stop a worker that is not running".to_string(),
            });
        }

        self.signal.running.store(false, Ordering::SeqCst);
        {
            let _guard = handle_mutex_poison(self.signal.lock.lock(), |message| {
                ModuleError::Threading { message }
            })?;
            self.signal.wake.notify_all();
        }

        match handle.take() {
            Some(spawned) => spawned.join().map_err(|panic| ModuleError::Threading {
                message: format!("worker thread panicked: {}", panic_message(panic.as_ref())),
            }),
            None => Err(ModuleError::Threading {
                message: "no worker thread handle to join".to_string(),
            }),
        }
    }
}

impl Default for WorkerThread {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    #[test]
    fn test_worker_runs_until_stopped() {
        let worker = WorkerThread::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        worker
            .start("ticker", move |token| {
                while token.is_running() {
                    counter.fetch_add(1, Ordering::SeqCst);
                    token.wait_for(Duration::from_millis(1));
                }
            })
            .unwrap();
        assert!(worker.is_running());

        thread::sleep(Duration::from_millis(30));
        worker.stop().unwrap();

        assert!(!worker.is_running());
        assert!(ticks.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn test_double_start_is_a_threading_error() {
        let worker = WorkerThread::new();
        worker
            .start("first", |token| {
                while token.wait_for(Duration::from_millis(5)) {}
            })
            .unwrap();

        match worker.start("second", |_| {}) {
            Err(ModuleError::Threading { message }) => {
                assert!(message.contains("already running"));
            }
            other => panic!("Expected Threading error, got {:?}", other),
        }

        worker.stop().unwrap();
    }

    #[test]
    fn test_stop_without_start_is_a_threading_error() {
        let worker = WorkerThread::new();
        match worker.stop() {
            Err(ModuleError::Threading { message }) => {
                assert!(message.contains("not running"));
            }
            other => panic!("Expected Threading error, got {:?}", other),
        }
    }

    #[test]
    fn test_stop_interrupts_a_long_pause() {
        let worker = WorkerThread::new();
        worker
            .start("sleeper", |token| {
                while token.wait_for(Duration::from_secs(30)) {}
            })
            .unwrap();

        thread::sleep(Duration::from_millis(20));
        let begun = Instant::now();
        worker.stop().unwrap();

        assert!(begun.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_stop_surfaces_a_worker_panic() {
        let worker = WorkerThread::new();
        worker
            .start("doomed", |_token| panic!("worker body gave up"))
            .unwrap();

        thread::sleep(Duration::from_millis(20));
        match worker.stop() {
            Err(ModuleError::Threading { message }) => {
                assert!(message.contains("worker body gave up"));
            }
            other => panic!("Expected Threading error, got {:?}", other),
        }
    }

    #[test]
    fn test_wait_for_runs_out_the_clock_while_running() {
        let worker = WorkerThread::new();
        let observed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&observed);

        worker
            .start("observer", move |token| {
                let first = token.wait_for(Duration::from_millis(5));
                sink.lock().unwrap().push(first);
                while token.wait_for(Duration::from_millis(5)) {}
                sink.lock().unwrap().push(token.is_running());
            })
            .unwrap();

        thread::sleep(Duration::from_millis(40));
        worker.stop().unwrap();

        let seen = observed.lock().unwrap();
        assert_eq!(seen.as_slice(), &[true, false]);
    }
}
