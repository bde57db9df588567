//! Collector Sink Module
//!
//! Pops `i64` values from its `input` endpoint on a worker thread and
//! records them in arrival order. The collected values are readable
//! through [`CollectorSink::collected`], which is what pipeline tests
//! assert against.

use std::any::Any;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use log::trace;
use serde::Deserialize;

use crate::core::sync::{handle_mutex_poison, handle_rwlock_read, handle_rwlock_write};
use crate::daq_module;
use crate::module::error::{ModuleError, ModuleResult};
use crate::module::traits::{CommandTable, DaqModule, InitContext};
use crate::module::types;
use crate::module::worker::{WorkerThread, WorkerToken};
use crate::queue::api::QueueHandle;

// Register this module type with the factory
daq_module!("CollectorSink", CollectorSink::build);

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub pop_timeout_ms: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self { pop_timeout_ms: 100 }
    }
}

struct SinkShared {
    name: String,
    config: RwLock<SinkConfig>,
    input: RwLock<Option<QueueHandle<i64>>>,
    /// Shared with the worker thread while it runs.
    collected: Arc<Mutex<Vec<i64>>>,
    worker: WorkerThread,
}

impl SinkShared {
    fn threading(message: String) -> ModuleError {
        ModuleError::Threading { message }
    }

    fn init(&self, ctx: &InitContext<'_>) -> ModuleResult<()> {
        let ep = types::endpoint(&self.name, ctx.data, "input")?;
        let handle = ctx.registry.get::<i64>(&ep.queue)?;
        *handle_rwlock_write(self.input.write(), Self::threading)? = Some(handle);
        *handle_rwlock_write(self.config.write(), Self::threading)? =
            types::parse_data(&self.name, ctx.data)?;
        Ok(())
    }

    fn start(&self) -> ModuleResult<()> {
        let input = handle_rwlock_read(self.input.read(), Self::threading)?
            .clone()
            .ok_or_else(|| ModuleError::MissingEndpoint {
                module: self.name.clone(),
                label: "input".to_string(),
            })?;
        let timeout = Duration::from_millis(
            handle_rwlock_read(self.config.read(), Self::threading)?.pop_timeout_ms,
        );
        let name = self.name.clone();
        let collected = Arc::clone(&self.collected);
        self.worker.start(&self.name, move |token| {
            run_sink(token, name, input, timeout, collected)
        })
    }

    fn stop(&self) -> ModuleResult<()> {
        self.worker.stop()
    }
}

fn run_sink(
    token: WorkerToken,
    name: String,
    input: QueueHandle<i64>,
    timeout: Duration,
    collected: Arc<Mutex<Vec<i64>>>,
) {
    while token.is_running() {
        match input.pop(timeout) {
            Ok(value) => {
                trace!("Sink '{}' collected {}", name, value);
                collected.lock().unwrap().push(value);
            }
            Err(err) => trace!("Sink '{}' idle: {}", name, err),
        }
    }
}

/// Collects every value arriving on its input queue.
pub struct CollectorSink {
    shared: Arc<SinkShared>,
    table: CommandTable,
}

impl CollectorSink {
    pub fn build(name: &str) -> ModuleResult<Arc<dyn DaqModule>> {
        let shared = Arc::new(SinkShared {
            name: name.to_string(),
            config: RwLock::new(SinkConfig::default()),
            input: RwLock::new(None),
            collected: Arc::new(Mutex::new(Vec::new())),
            worker: WorkerThread::new(),
        });

        let mut table = CommandTable::new(name);
        {
            let shared = Arc::clone(&shared);
            table.register("start", ["INITIAL", "CONFIGURED"], move |_| shared.start())?;
        }
        {
            let shared = Arc::clone(&shared);
            table.register("stop", ["RUNNING"], move |_| shared.stop())?;
        }

        Ok(Arc::new(Self { shared, table }))
    }

    /// Values collected so far, in arrival order.
    pub fn collected(&self) -> ModuleResult<Vec<i64>> {
        let values = handle_mutex_poison(self.shared.collected.lock(), SinkShared::threading)?;
        Ok(values.clone())
    }
}

impl DaqModule for CollectorSink {
    fn name(&self) -> &str {
        &self.shared.name
    }

    fn init(&self, ctx: &InitContext<'_>) -> ModuleResult<()> {
        self.shared.init(ctx)
    }

    fn table(&self) -> &CommandTable {
        &self.table
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
