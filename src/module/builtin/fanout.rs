//! Fan-Out Module
//!
//! Pops from one input endpoint and distributes to every declared output
//! endpoint according to the configured mode. `broadcast` clones the value
//! to all outputs, `round_robin` lets the outputs take turns, and
//! `first_available` gives the value to the first output with room.

use std::any::Any;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use log::{trace, warn};
use serde::Deserialize;
use strum_macros::Display;

use crate::core::sync::{handle_rwlock_read, handle_rwlock_write};
use crate::daq_module;
use crate::module::error::{ModuleError, ModuleResult};
use crate::module::traits::{CommandTable, DaqModule, InitContext};
use crate::module::types::{self, EndpointDir};
use crate::module::worker::{WorkerThread, WorkerToken};
use crate::queue::api::QueueHandle;

// Register this module type with the factory, fixed to i64 elements
daq_module!("FanOut", FanOut::<i64>::build);

/// Distribution strategy across the output endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FanOutMode {
    /// Every output receives a clone of each value.
    Broadcast,
    /// Outputs take turns receiving values.
    #[default]
    RoundRobin,
    /// The first output with room receives the value.
    FirstAvailable,
}

/// Configuration accepted by the `configure` command.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FanOutConfig {
    pub mode: FanOutMode,
    /// Pause between first-available sweeps and idle polls.
    pub wait_ms: u64,
    pub pop_timeout_ms: u64,
    pub push_timeout_ms: u64,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            mode: FanOutMode::default(),
            wait_ms: 10,
            pop_timeout_ms: 100,
            push_timeout_ms: 100,
        }
    }
}

struct FanOutShared<T: Send + Clone + 'static> {
    name: String,
    config: RwLock<FanOutConfig>,
    input: RwLock<Option<QueueHandle<T>>>,
    outputs: RwLock<Vec<QueueHandle<T>>>,
    worker: WorkerThread,
}

impl<T: Send + Clone + 'static> FanOutShared<T> {
    fn threading(message: String) -> ModuleError {
        ModuleError::Threading { message }
    }

    fn init(&self, ctx: &InitContext<'_>) -> ModuleResult<()> {
        let input_ep = types::endpoint(&self.name, ctx.data, "input")?;
        let input = ctx.registry.get::<T>(&input_ep.queue)?;

        let output_eps = types::endpoints_with_dir(&self.name, ctx.data, EndpointDir::Output)?;
        if output_eps.is_empty() {
            return Err(ModuleError::MissingEndpoint {
                module: self.name.clone(),
                label: "output".to_string(),
            });
        }
        let mut outputs = Vec::with_capacity(output_eps.len());
        for ep in &output_eps {
            outputs.push(ctx.registry.get::<T>(&ep.queue)?);
        }

        *handle_rwlock_write(self.input.write(), Self::threading)? = Some(input);
        *handle_rwlock_write(self.outputs.write(), Self::threading)? = outputs;
        Ok(())
    }

    fn configure(&self, data: &crate::module::traits::CommandData) -> ModuleResult<()> {
        let config: FanOutConfig = types::parse_data(&self.name, data)?;
        trace!("Fan-out '{}' configured in {} mode", self.name, config.mode);
        *handle_rwlock_write(self.config.write(), Self::threading)? = config;
        Ok(())
    }

    fn start(&self) -> ModuleResult<()> {
        let input = handle_rwlock_read(self.input.read(), Self::threading)?
            .clone()
            .ok_or_else(|| ModuleError::MissingEndpoint {
                module: self.name.clone(),
                label: "input".to_string(),
            })?;
        let outputs = handle_rwlock_read(self.outputs.read(), Self::threading)?.clone();
        let config = handle_rwlock_read(self.config.read(), Self::threading)?.clone();
        let name = self.name.clone();
        self.worker.start(&self.name, move |token| {
            run_fanout(token, name, config, input, outputs)
        })
    }

    fn stop(&self) -> ModuleResult<()> {
        self.worker.stop()
    }
}

fn run_fanout<T: Send + Clone + 'static>(
    token: WorkerToken,
    name: String,
    config: FanOutConfig,
    input: QueueHandle<T>,
    outputs: Vec<QueueHandle<T>>,
) {
    let pop_timeout = Duration::from_millis(config.pop_timeout_ms);
    let push_timeout = Duration::from_millis(config.push_timeout_ms);
    let wait = Duration::from_millis(config.wait_ms);
    let mut cursor = 0usize;

    while token.is_running() {
        let value = match input.pop(pop_timeout) {
            Ok(value) => value,
            Err(err) => {
                trace!("Fan-out '{}' idle: {}", name, err);
                continue;
            }
        };

        match config.mode {
            FanOutMode::Broadcast => {
                for output in &outputs {
                    if let Err(failed) = output.push(value.clone(), push_timeout) {
                        warn!(
                            "Fan-out '{}' broadcast push onto '{}' timed out; data has been lost: {}",
                            name,
                            output.name(),
                            failed.error
                        );
                    }
                }
            }
            FanOutMode::RoundRobin => {
                let output = &outputs[cursor];
                if let Err(failed) = output.push(value, push_timeout) {
                    warn!(
                        "Fan-out '{}' push onto '{}' timed out; data has been lost: {}",
                        name,
                        output.name(),
                        failed.error
                    );
                }
                cursor = (cursor + 1) % outputs.len();
            }
            FanOutMode::FirstAvailable => {
                let mut pending = value;
                'deliver: loop {
                    for output in &outputs {
                        if !output.can_push() {
                            continue;
                        }
                        match output.push(pending, push_timeout) {
                            Ok(()) => break 'deliver,
                            Err(failed) => {
                                warn!(
                                    "Fan-out '{}' push onto '{}' timed out",
                                    name,
                                    output.name()
                                );
                                pending = failed.value;
                            }
                        }
                    }
                    if !token.wait_for(wait) {
                        break;
                    }
                }
            }
        }
    }
}

/// Distributes values from one input queue across several output queues.
pub struct FanOut<T: Send + Clone + 'static> {
    shared: Arc<FanOutShared<T>>,
    table: CommandTable,
}

impl<T: Send + Clone + 'static> FanOut<T> {
    pub fn build(name: &str) -> ModuleResult<Arc<dyn DaqModule>> {
        let shared = Arc::new(FanOutShared::<T> {
            name: name.to_string(),
            config: RwLock::new(FanOutConfig::default()),
            input: RwLock::new(None),
            outputs: RwLock::new(Vec::new()),
            worker: WorkerThread::new(),
        });

        let mut table = CommandTable::new(name);
        {
            let shared = Arc::clone(&shared);
            table.register("configure", ["INITIAL"], move |data| {
                shared.configure(data)
            })?;
        }
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
}

impl<T: Send + Clone + 'static> DaqModule for FanOut<T> {
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
