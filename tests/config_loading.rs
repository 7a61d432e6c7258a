// tests/config_loading.rs

mod common;
use crate::common::{init_tracing, CollectingSink};

use std::error::Error;
use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use agentflow::config::{load_and_validate, load_from_path};
use agentflow::{ConcurrencyMode, Context, DependsOn, FlowError, Scheduler, TaskGraph, TaskOutput};

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(dir: &TempDir, contents: &str) -> Result<std::path::PathBuf, Box<dyn Error>> {
    let path = dir.path().join("agentflow.toml");
    fs::write(&path, contents)?;
    Ok(path)
}

#[test]
fn full_config_file_is_loaded() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let path = write_config(
        &dir,
        r#"
[scheduler]
mode = "serial"
max_workers = 2

[memory]
separator = "/"
default_namespace = "root"

[events]
message_id_prefix = "turn"
part_id_max_len = 24
"#,
    )?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.scheduler.mode, ConcurrencyMode::Serial);
    assert_eq!(cfg.scheduler.max_workers, 2);
    assert_eq!(cfg.memory.separator, "/");
    assert_eq!(cfg.memory.default_namespace, "root");
    assert_eq!(cfg.events.message_id_prefix, "turn");
    assert_eq!(cfg.events.part_id_max_len, 24);
    Ok(())
}

#[test]
fn partial_config_falls_back_to_defaults() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_config(&dir, "[scheduler]\nmode = \"async\"\n")?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.scheduler.mode, ConcurrencyMode::Async);
    assert_eq!(cfg.scheduler.max_workers, 4);
    assert_eq!(cfg.memory.separator, ":");
    assert_eq!(cfg.events.message_id_prefix, "msg");
    Ok(())
}

#[test]
fn raw_loading_does_not_validate() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_config(&dir, "[scheduler]\nmax_workers = 0\n")?;

    let raw = load_from_path(&path)?;
    assert_eq!(raw.scheduler.max_workers, 0);

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, FlowError::ConfigError(_)));
    Ok(())
}

#[test]
fn unknown_section_is_rejected() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_config(&dir, "[tasks]\nfoo = 1\n")?;

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, FlowError::TomlError(_)));
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() -> TestResult {
    let dir = TempDir::new()?;
    let err = load_and_validate(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, FlowError::IoError(_)));
    Ok(())
}

#[test]
fn scheduler_is_wired_from_loaded_config() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_config(
        &dir,
        "[scheduler]\nmode = \"serial\"\n\n[memory]\nseparator = \"/\"\n\n[events]\nmessage_id_prefix = \"turn\"\n",
    )?;
    let cfg = load_and_validate(&path)?;

    let graph = TaskGraph::builder()
        .task("note", DependsOn::None, |input| {
            input.memory.scoped("notes").set("first", "hello");
            Ok(TaskOutput::new())
        })
        .build()?;

    let sink = CollectingSink::new();
    let scheduler = Scheduler::from_config(graph, &cfg, Arc::new(sink.clone()));
    assert_eq!(scheduler.mode(), ConcurrencyMode::Serial);

    scheduler.run(Context::new())?;

    let entry = scheduler.memory().entry("notes/first").ok_or("entry missing")?;
    assert_eq!(entry.namespace, "notes");
    assert!(sink.events().iter().all(|e| e.message_id().starts_with("turn_")));
    Ok(())
}
