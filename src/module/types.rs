//! Module Data Model
//!
//! Serde types for the init and dispatch payloads plus the endpoint
//! resolution helpers modules call from their init hooks.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::module::error::{ModuleError, ModuleResult};
use crate::module::traits::{CommandData, CommandSignature};
use crate::queue::api::QueueSpec;

/// Direction of a module's attachment to a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EndpointDir {
    /// The module pops from this queue.
    Input,
    /// The module pushes to this queue.
    Output,
}

/// One queue attachment declared in a module's init payload.
///
/// `label` is the module-local role name ("input", "output", ...); `queue`
/// is the registry name the label resolves to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEndpoint {
    pub queue: String,
    pub label: String,
    pub dir: EndpointDir,
}

/// One module instance to build during init.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSpec {
    /// Registered plugin type name.
    pub plugin: String,
    /// Instance name, unique within the manager.
    pub name: String,
    /// Opaque instance payload handed to the module's init hook.
    #[serde(default)]
    pub data: CommandData,
}

/// Payload of the `init` command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitSpec {
    #[serde(default)]
    pub queues: Vec<QueueSpec>,
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
}

/// One addressed payload fragment inside a command envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressedCmd {
    /// Regex selecting module instances by name; empty selects every
    /// eligible module.
    #[serde(rename = "match", default)]
    pub pattern: String,
    #[serde(default)]
    pub payload: CommandData,
}

/// Payload of every command other than `init`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// Ordered addressing groups; empty means broadcast with an empty
    /// payload.
    #[serde(default)]
    pub addressed: Vec<AddressedCmd>,
}

/// Introspection row: one module and its registered commands.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleCommands {
    pub module: String,
    pub commands: Vec<CommandSignature>,
}

/// Endpoint list declared in `data`, or empty when no `endpoints` key is
/// present.
pub fn endpoints(module: &str, data: &CommandData) -> ModuleResult<Vec<QueueEndpoint>> {
    match data.get("endpoints") {
        Some(list) => {
            serde_json::from_value(list.clone()).map_err(|err| ModuleError::InvalidCommandData {
                context: format!("endpoint list of module '{}'", module),
                cause: err.to_string(),
            })
        }
        None => Ok(Vec::new()),
    }
}

/// The endpoint labelled `label` in `data`.
pub fn endpoint(module: &str, data: &CommandData, label: &str) -> ModuleResult<QueueEndpoint> {
    endpoints(module, data)?
        .into_iter()
        .find(|ep| ep.label == label)
        .ok_or_else(|| ModuleError::MissingEndpoint {
            module: module.to_string(),
            label: label.to_string(),
        })
}

/// Parse the module-specific portion of an init or command payload.
///
/// `Null` yields the type's defaults; keys the type does not know (such as
/// `endpoints`) are ignored.
pub fn parse_data<T>(module: &str, data: &CommandData) -> ModuleResult<T>
where
    T: DeserializeOwned + Default,
{
    if data.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(data.clone()).map_err(|err| ModuleError::InvalidCommandData {
        context: format!("config of module '{}'", module),
        cause: err.to_string(),
    })
}

/// Declared endpoints with direction `dir`, in declaration order.
pub fn endpoints_with_dir(
    module: &str,
    data: &CommandData,
    dir: EndpointDir,
) -> ModuleResult<Vec<QueueEndpoint>> {
    Ok(endpoints(module, data)?
        .into_iter()
        .filter(|ep| ep.dir == dir)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::api::QueueKind;
    use serde_json::json;

    #[test]
    fn test_init_spec_parses_queues_and_modules() {
        let spec: InitSpec = serde_json::from_value(json!({
            "queues": [
                {"name": "numbers", "kind": "locking", "capacity": 10}
            ],
            "modules": [
                {"plugin": "SequenceSource", "name": "source", "data": {"count": 5}}
            ]
        }))
        .unwrap();

        assert_eq!(spec.queues.len(), 1);
        assert_eq!(spec.queues[0].name, "numbers");
        assert_eq!(spec.queues[0].kind, QueueKind::Locking);
        assert_eq!(spec.modules.len(), 1);
        assert_eq!(spec.modules[0].plugin, "SequenceSource");
        assert_eq!(spec.modules[0].data["count"], 5);
    }

    #[test]
    fn test_init_spec_sections_default_to_empty() {
        let spec: InitSpec = serde_json::from_value(json!({})).unwrap();
        assert!(spec.queues.is_empty());
        assert!(spec.modules.is_empty());

        let spec: InitSpec = serde_json::from_value(json!({"queues": []})).unwrap();
        assert!(spec.modules.is_empty());
    }

    #[test]
    fn test_envelope_uses_match_key_and_defaults() {
        let envelope: CommandEnvelope = serde_json::from_value(json!({
            "addressed": [
                {"match": "source.*", "payload": {"count": 3}},
                {}
            ]
        }))
        .unwrap();

        assert_eq!(envelope.addressed.len(), 2);
        assert_eq!(envelope.addressed[0].pattern, "source.*");
        assert_eq!(envelope.addressed[0].payload["count"], 3);
        assert_eq!(envelope.addressed[1].pattern, "");
        assert!(envelope.addressed[1].payload.is_null());

        let empty: CommandEnvelope = serde_json::from_value(json!({})).unwrap();
        assert!(empty.addressed.is_empty());
    }

    #[test]
    fn test_endpoint_found_by_label() {
        let data = json!({
            "endpoints": [
                {"queue": "numbers", "label": "output", "dir": "output"},
                {"queue": "errors", "label": "errs", "dir": "output"}
            ]
        });

        let ep = endpoint("source", &data, "output").unwrap();
        assert_eq!(ep.queue, "numbers");
        assert_eq!(ep.dir, EndpointDir::Output);
    }

    #[test]
    fn test_missing_endpoint_names_module_and_label() {
        let data = json!({"endpoints": []});

        match endpoint("source", &data, "output") {
            Err(ModuleError::MissingEndpoint { module, label }) => {
                assert_eq!(module, "source");
                assert_eq!(label, "output");
            }
            other => panic!("Expected MissingEndpoint error, got {:?}", other),
        }
    }

    #[test]
    fn test_absent_endpoints_key_is_empty_not_an_error() {
        let data = json!({"count": 5});
        assert!(endpoints("source", &data).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_endpoint_list_is_invalid_data() {
        let data = json!({"endpoints": [{"queue": "numbers"}]});

        match endpoints("source", &data) {
            Err(ModuleError::InvalidCommandData { context, .. }) => {
                assert!(context.contains("source"));
            }
            other => panic!("Expected InvalidCommandData error, got {:?}", other),
        }
    }

    #[test]
    fn test_endpoints_filtered_by_direction() {
        let data = json!({
            "endpoints": [
                {"queue": "in1", "label": "input", "dir": "input"},
                {"queue": "out1", "label": "first", "dir": "output"},
                {"queue": "out2", "label": "second", "dir": "output"}
            ]
        });

        let outputs = endpoints_with_dir("fan", &data, EndpointDir::Output).unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].queue, "out1");
        assert_eq!(outputs[1].queue, "out2");
    }
}
