//! Sequence Source Module
//!
//! Pushes a run of consecutive `i64` values to its `output` endpoint on a
//! worker thread. The run is described by the init payload; a push that
//! times out is retried until it lands or the module is stopped.

use std::any::Any;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use log::{debug, info, trace, warn};
use serde::Deserialize;

use crate::core::sync::{handle_rwlock_read, handle_rwlock_write};
use crate::daq_module;
use crate::module::error::{ModuleError, ModuleResult};
use crate::module::traits::{CommandTable, DaqModule, InitContext};
use crate::module::types;
use crate::module::worker::{WorkerThread, WorkerToken};
use crate::queue::api::QueueHandle;

// Register this module type with the factory
daq_module!("SequenceSource", SequenceSource::build);

/// Run description accepted in the init payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// First value of the run.
    pub first: i64,
    /// Number of values to emit.
    pub count: u64,
    pub push_timeout_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            first: 1,
            count: 10,
            push_timeout_ms: 100,
        }
    }
}

struct SourceShared {
    name: String,
    config: RwLock<SourceConfig>,
    output: RwLock<Option<QueueHandle<i64>>>,
    worker: WorkerThread,
}

impl SourceShared {
    fn threading(message: String) -> ModuleError {
        ModuleError::Threading { message }
    }

    fn init(&self, ctx: &InitContext<'_>) -> ModuleResult<()> {
        let ep = types::endpoint(&self.name, ctx.data, "output")?;
        let handle = ctx.registry.get::<i64>(&ep.queue)?;
        *handle_rwlock_write(self.output.write(), Self::threading)? = Some(handle);

        let config: SourceConfig = types::parse_data(&self.name, ctx.data)?;
        info!(
            "Source '{}' will emit {} value(s) starting at {} into '{}'",
            self.name, config.count, config.first, ep.queue
        );
        *handle_rwlock_write(self.config.write(), Self::threading)? = config;
        Ok(())
    }

    fn start(&self) -> ModuleResult<()> {
        let output = handle_rwlock_read(self.output.read(), Self::threading)?
            .clone()
            .ok_or_else(|| ModuleError::MissingEndpoint {
                module: self.name.clone(),
                label: "output".to_string(),
            })?;
        let config = handle_rwlock_read(self.config.read(), Self::threading)?.clone();
        let name = self.name.clone();
        self.worker
            .start(&self.name, move |token| run_source(token, name, config, output))
    }

    fn stop(&self) -> ModuleResult<()> {
        self.worker.stop()
    }
}

fn run_source(token: WorkerToken, name: String, config: SourceConfig, output: QueueHandle<i64>) {
    let timeout = Duration::from_millis(config.push_timeout_ms);
    let mut value = config.first;
    let mut sent: u64 = 0;

    while token.is_running() && sent < config.count {
        match output.push(value, timeout) {
            Ok(()) => {
                trace!("Source '{}' pushed {}", name, value);
                value += 1;
                sent += 1;
            }
            Err(failed) => {
                warn!("Source '{}' push timed out, retrying: {}", name, failed.error);
            }
        }
    }
    debug!("Source '{}' emitted {} value(s)", name, sent);

    // Run complete; idle until stopped.
    while token.wait_for(Duration::from_millis(50)) {}
}

/// Emits a configurable run of consecutive integers.
pub struct SequenceSource {
    shared: Arc<SourceShared>,
    table: CommandTable,
}

impl SequenceSource {
    pub fn build(name: &str) -> ModuleResult<Arc<dyn DaqModule>> {
        let shared = Arc::new(SourceShared {
            name: name.to_string(),
            config: RwLock::new(SourceConfig::default()),
            output: RwLock::new(None),
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
}

impl DaqModule for SequenceSource {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::traits::ANY_STATE;
    use crate::queue::api::{QueueKind, QueueRegistry, QueueSpec};
    use serde_json::json;

    fn registry_with_queue(name: &str, capacity: usize) -> Arc<QueueRegistry> {
        let registry = Arc::new(QueueRegistry::new());
        registry
            .configure(vec![QueueSpec {
                name: name.to_string(),
                kind: QueueKind::Locking,
                capacity,
            }])
            .unwrap();
        registry
    }

    #[test]
    fn test_source_config_defaults() {
        let config = SourceConfig::default();
        assert_eq!(config.first, 1);
        assert_eq!(config.count, 10);
        assert_eq!(config.push_timeout_ms, 100);
    }

    #[test]
    fn test_commands_are_state_gated() {
        let module = SequenceSource::build("src").unwrap();
        assert!(module.has_command("start", "INITIAL"));
        assert!(module.has_command("start", "CONFIGURED"));
        assert!(!module.has_command("start", "RUNNING"));
        assert!(module.has_command("stop", "RUNNING"));
        assert!(!module.has_command("stop", ANY_STATE));
    }

    #[test]
    fn test_init_without_output_endpoint_fails() {
        let registry = registry_with_queue("numbers", 8);
        let module = SequenceSource::build("src").unwrap();

        let data = json!({"count": 3});
        let result = module.init(&InitContext {
            registry: &registry,
            data: &data,
        });
        match result {
            Err(ModuleError::MissingEndpoint { module, label }) => {
                assert_eq!(module, "src");
                assert_eq!(label, "output");
            }
            other => panic!("Expected MissingEndpoint error, got {:?}", other),
        }
    }

    #[test]
    fn test_source_emits_its_run() {
        let registry = registry_with_queue("numbers", 16);
        let module = SequenceSource::build("src").unwrap();

        let data = json!({
            "endpoints": [{"queue": "numbers", "label": "output", "dir": "output"}],
            "first": 5,
            "count": 4
        });
        module
            .init(&InitContext {
                registry: &registry,
                data: &data,
            })
            .unwrap();

        module
            .execute_command("start", &serde_json::Value::Null)
            .unwrap();

        let queue = registry.get::<i64>("numbers").unwrap();
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(queue.pop(Duration::from_millis(500)).unwrap());
        }
        assert_eq!(seen, vec![5, 6, 7, 8]);

        module
            .execute_command("stop", &serde_json::Value::Null)
            .unwrap();
    }
}
