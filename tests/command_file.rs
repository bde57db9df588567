//! Command file facility tests
//!
//! Cover both on-disk formats (`.json` arrays and `.jstream` concatenated
//! objects), the error paths for unsupported and corrupt files, and a file
//! driving a real application end to end.

use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use daqflow::app::{read_commands, AppError, Application, Command};
use daqflow::module::api::CollectorSink;

#[test]
fn test_json_file_yields_the_whole_array() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("run.json");
    fs::write(
        &path,
        r#"[
            {"id": "init", "data": {"modules": []}},
            {"id": "start", "entry_state": "INITIAL", "exit_state": "RUNNING"},
            {"id": "stop", "entry_state": "RUNNING", "exit_state": "INITIAL"}
        ]"#,
    )
    .expect("Failed to write command file");

    let commands = read_commands(&path).expect("array file should parse");
    assert_eq!(commands.len(), 3);
    assert_eq!(commands[0].id, "init");
    // Omitted states default to the wildcard.
    assert_eq!(commands[0].entry_state, "ANY");
    assert_eq!(commands[0].exit_state, "ANY");
    assert_eq!(commands[1].entry_state, "INITIAL");
    assert_eq!(commands[2].exit_state, "INITIAL");
}

#[test]
fn test_jstream_file_yields_each_concatenated_object() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("run.jstream");
    // Objects separated by newlines, plus one butted straight against the
    // next, which the streaming format also allows.
    fs::write(
        &path,
        "{\"id\": \"init\"}\n{\"id\": \"start\"}{\"id\": \"stop\"}\n",
    )
    .expect("Failed to write command file");

    let commands = read_commands(&path).expect("stream file should parse");
    let ids: Vec<&str> = commands.iter().map(|command| command.id.as_str()).collect();
    assert_eq!(ids, vec!["init", "start", "stop"]);
}

#[test]
fn test_unknown_extension_is_refused() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("run.yaml");
    fs::write(&path, "id: init").expect("Failed to write command file");

    match read_commands(&path) {
        Err(AppError::UnsupportedFormat { path: reported }) => {
            assert_eq!(reported, path);
        }
        other => panic!("Expected UnsupportedFormat error, got {:?}", other),
    }
}

#[test]
fn test_json_file_must_hold_an_array() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("single.json");
    fs::write(&path, r#"{"id": "init"}"#).expect("Failed to write command file");

    match read_commands(&path) {
        Err(AppError::CorruptStream { path: reported, .. }) => {
            assert_eq!(reported, path);
        }
        other => panic!("Expected CorruptStream error, got {:?}", other),
    }
}

#[test]
fn test_jstream_trailing_garbage_is_corrupt() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("bad.jstream");
    fs::write(&path, "{\"id\": \"init\"}\nnot-json\n").expect("Failed to write command file");

    match read_commands(&path) {
        Err(AppError::CorruptStream { .. }) => {}
        other => panic!("Expected CorruptStream error, got {:?}", other),
    }
}

#[test]
fn test_missing_file_reports_io_error() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("absent.json");

    match read_commands(&path) {
        Err(AppError::Io { path: reported, .. }) => {
            assert_eq!(reported, path);
        }
        other => panic!("Expected Io error, got {:?}", other),
    }
}

fn collected(app: &Application, name: &str) -> Vec<i64> {
    let module = app.manager().module(name).unwrap();
    module
        .as_any()
        .downcast_ref::<CollectorSink>()
        .expect("module should be a CollectorSink")
        .collected()
        .unwrap()
}

#[test]
fn test_commands_file_drives_an_application() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("pipeline.json");
    fs::write(
        &path,
        r#"[
            {"id": "init", "data": {
                "queues": [{"name": "numbers", "kind": "locking", "capacity": 16}],
                "modules": [
                    {"plugin": "SequenceSource", "name": "source", "data": {
                        "endpoints": [{"queue": "numbers", "label": "output", "dir": "output"}],
                        "first": 10, "count": 3
                    }},
                    {"plugin": "CollectorSink", "name": "sink", "data": {
                        "endpoints": [{"queue": "numbers", "label": "input", "dir": "input"}],
                        "pop_timeout_ms": 20
                    }}
                ]
            }},
            {"id": "start", "entry_state": "INITIAL", "exit_state": "RUNNING"}
        ]"#,
    )
    .expect("Failed to write command file");

    let commands = read_commands(&path).expect("command file should parse");
    let app = Application::new();
    app.run_commands(&commands).expect("sequence should succeed");
    assert_eq!(app.state().unwrap(), "RUNNING");

    let begun = Instant::now();
    while collected(&app, "sink").len() < 3 && begun.elapsed() < Duration::from_secs(2) {
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(collected(&app, "sink"), vec![10, 11, 12]);

    app.execute(&Command {
        id: "stop".to_string(),
        entry_state: "RUNNING".to_string(),
        exit_state: "INITIAL".to_string(),
        data: serde_json::Value::Null,
    })
    .expect("stop should succeed");
    assert_eq!(app.state().unwrap(), "INITIAL");
}

#[test]
fn test_init_exit_state_from_file_overrides_the_default() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("init.jstream");
    fs::write(
        &path,
        "{\"id\": \"init\", \"exit_state\": \"CONFIGURED\", \"data\": {\"modules\": []}}\n",
    )
    .expect("Failed to write command file");

    let commands = read_commands(&path).expect("stream file should parse");
    let app = Application::new();
    app.run_commands(&commands).expect("init should succeed");
    assert_eq!(app.state().unwrap(), "CONFIGURED");
}
