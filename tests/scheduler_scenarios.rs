// tests/scheduler_scenarios.rs

mod common;
use crate::common::{init_tracing, CollectingSink, GraphFixture, ALL_MODES};

use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;

use agentflow::events::EventType;
use agentflow::{
    Context, DependsOn, EventContext, FlowError, Scheduler, SharedMemory, TaskGraph, TaskInput,
    TaskOutput, TaskRunState,
};

type TestResult = Result<(), Box<dyn Error>>;

/// A: none, B: [A], C: optional.
fn abc(activate_c: bool) -> GraphFixture {
    let fixture = GraphFixture::new()
        .root("A")
        .after("B", &["A"])
        .optional("C");
    if activate_c {
        fixture.activating("A", &["C"])
    } else {
        fixture
    }
}

#[test]
fn optional_task_runs_only_when_activated() -> TestResult {
    init_tracing();

    for mode in ALL_MODES {
        let fixture = abc(false);
        let outcome = Scheduler::new(fixture.build())
            .with_mode(mode)
            .run(Context::new())?;

        let recorder = fixture.recorder();
        assert_eq!(recorder.count("A"), 1, "mode {mode:?}");
        assert_eq!(recorder.count("B"), 1, "mode {mode:?}");
        assert_eq!(recorder.count("C"), 0, "mode {mode:?}");
        assert_eq!(outcome.context.keys().collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(outcome.state_of("C"), Some(TaskRunState::Skipped));
    }
    Ok(())
}

#[test]
fn activated_optional_task_runs_after_its_activator() -> TestResult {
    init_tracing();

    for mode in ALL_MODES {
        let fixture = abc(true);
        let outcome = Scheduler::new(fixture.build())
            .with_mode(mode)
            .run(Context::new())?;

        let recorder = fixture.recorder();
        assert_eq!(recorder.count("C"), 1, "mode {mode:?}");
        let a = recorder.run_of("A").ok_or("A did not run")?;
        let c = recorder.run_of("C").ok_or("C did not run")?;
        assert!(c.started >= a.finished);
        assert_eq!(c.wave, 2);
        assert!(c.saw.contains(&"A".to_string()));
        assert_eq!(outcome.context.keys().collect::<Vec<_>>(), ["A", "B", "C"]);
        assert_eq!(outcome.waves, 2);
    }
    Ok(())
}

#[test]
fn required_successor_never_starts_before_dependency_completes() -> TestResult {
    init_tracing();

    for mode in ALL_MODES {
        let graph = TaskGraph::builder()
            .task("slow", DependsOn::None, |_| {
                std::thread::sleep(Duration::from_millis(50));
                Ok(TaskOutput::from_value("done"))
            })
            .task("next", DependsOn::required(["slow"]), |input| {
                let seen = input.context.get("slow").cloned().unwrap_or_default();
                Ok(TaskOutput::from_value(seen))
            })
            .build()?;

        let outcome = Scheduler::new(graph).with_mode(mode).run(Context::new())?;
        assert_eq!(outcome.context.get("next"), Some(&json!("done")));
        assert_eq!(outcome.completed[0].task, "slow");
        assert_eq!(outcome.completed[1].wave, 2);
    }
    Ok(())
}

#[test]
fn diamond_runs_every_task_exactly_once() -> TestResult {
    init_tracing();

    for mode in ALL_MODES {
        let fixture = GraphFixture::new()
            .root("root")
            .after("left", &["root"])
            .after("right", &["root"])
            .after("join", &["left", "right"]);
        let outcome = Scheduler::new(fixture.build())
            .with_mode(mode)
            .run(Context::new())?;

        let recorder = fixture.recorder();
        for task in ["root", "left", "right", "join"] {
            assert_eq!(recorder.count(task), 1, "{task} in mode {mode:?}");
        }
        assert_eq!(outcome.waves, 3);
        let join = recorder.run_of("join").ok_or("join did not run")?;
        assert!(join.saw.contains(&"left".to_string()));
        assert!(join.saw.contains(&"right".to_string()));
    }
    Ok(())
}

#[test]
fn halt_stops_the_run_and_returns_the_halt_value() -> TestResult {
    init_tracing();

    for mode in ALL_MODES {
        let fixture = GraphFixture::new()
            .root("gate")
            .root("sibling")
            .after("after_gate", &["gate"])
            .halting("gate", json!({ "reason": "enough" }));
        let outcome = Scheduler::new(fixture.build())
            .with_mode(mode)
            .run(Context::new())?;

        assert_eq!(outcome.result(), json!({ "reason": "enough" }));
        assert_eq!(outcome.halt.as_ref().map(|h| h.task.as_str()), Some("gate"));
        assert!(!outcome.context.contains("sibling"));
        assert!(!outcome.context.contains("gate"));
        assert_eq!(fixture.recorder().count("after_gate"), 0);
        assert_eq!(outcome.state_of("after_gate"), Some(TaskRunState::Skipped));
        assert_eq!(outcome.state_of("gate"), Some(TaskRunState::Halted));
    }
    Ok(())
}

#[test]
fn halting_wave_siblings_still_run_in_every_mode() -> TestResult {
    init_tracing();

    for mode in ALL_MODES {
        // `gate` sorts first, so a serial backend meets the halt before `sibling`.
        let fixture = GraphFixture::new()
            .root("gate")
            .root("sibling")
            .halting("gate", "stop");
        let outcome = Scheduler::new(fixture.build())
            .with_mode(mode)
            .run(Context::new())?;

        assert_eq!(fixture.recorder().count("sibling"), 1, "mode {mode:?}");
        assert_eq!(
            outcome.state_of("sibling"),
            Some(TaskRunState::Completed),
            "mode {mode:?}"
        );
        assert_eq!(outcome.waves, 1, "mode {mode:?}");
    }
    Ok(())
}

#[test]
fn handler_error_aborts_with_task_name() -> TestResult {
    init_tracing();

    for mode in ALL_MODES {
        let fixture = GraphFixture::new()
            .root("ok")
            .root("broken")
            .after("never", &["ok", "broken"])
            .failing("broken", "disk full");
        let err = Scheduler::new(fixture.build())
            .with_mode(mode)
            .run(Context::new())
            .unwrap_err();

        assert_eq!(err.failed_task(), Some("broken"));
        assert!(matches!(err, FlowError::Execution { .. }));
        assert!(err.to_string().contains("broken"));
        assert!(err.to_string().contains("disk full"));
        assert_eq!(fixture.recorder().count("never"), 0);
    }
    Ok(())
}

#[test]
fn handler_panic_becomes_execution_error() -> TestResult {
    init_tracing();

    for mode in ALL_MODES {
        let graph = TaskGraph::builder()
            .task("explodes", DependsOn::None, |_| -> anyhow::Result<TaskOutput> {
                panic!("kaboom")
            })
            .build()?;

        let err = Scheduler::new(graph)
            .with_mode(mode)
            .run(Context::new())
            .unwrap_err();
        assert_eq!(err.failed_task(), Some("explodes"));
        assert!(err.to_string().contains("kaboom"), "got: {err}");
    }
    Ok(())
}

#[test]
fn graph_errors_are_reported_at_build_time() {
    fn noop(_: TaskInput) -> anyhow::Result<TaskOutput> {
        Ok(TaskOutput::new())
    }

    let err = TaskGraph::builder()
        .task("a", DependsOn::required(["ghost"]), noop)
        .build()
        .unwrap_err();
    assert!(matches!(err, FlowError::UnknownDependency { .. }));
    assert!(err.is_configuration());

    let err = TaskGraph::builder()
        .task("a", DependsOn::None, noop)
        .task("a", DependsOn::None, noop)
        .build()
        .unwrap_err();
    assert!(matches!(err, FlowError::DuplicateTask(_)));

    let err = TaskGraph::builder()
        .task("a", DependsOn::required(["b"]), noop)
        .task("b", DependsOn::required(["a"]), noop)
        .build()
        .unwrap_err();
    assert!(matches!(err, FlowError::DagCycle(_)));
}

#[test]
fn seed_context_is_visible_to_first_wave() -> TestResult {
    let graph = TaskGraph::builder()
        .task("greet", DependsOn::None, |input| {
            let name: String = input.context.get_as("user").unwrap_or_default();
            Ok(TaskOutput::from_value(format!("hello {name}")).with_entry("greeted", true))
        })
        .build()?;

    let mut seed = Context::new();
    seed.set("user", "ada");
    let outcome = Scheduler::new(graph)
        .with_mode(agentflow::ConcurrencyMode::Serial)
        .run(seed)?;

    assert_eq!(outcome.context.get("greet"), Some(&json!("hello ada")));
    assert_eq!(outcome.context.get("greeted"), Some(&json!(true)));
    assert_eq!(outcome.context.get("user"), Some(&json!("ada")));
    Ok(())
}

/// A waiter blocks on `shared:status` while a sibling publishes it.
#[test]
fn concurrent_writer_and_waiter_share_status() -> TestResult {
    init_tracing();

    for mode in [agentflow::ConcurrencyMode::Threads, agentflow::ConcurrencyMode::Async] {
        let graph = TaskGraph::builder()
            .task("waiter", DependsOn::None, |input| {
                let status = input
                    .memory
                    .wait_for("shared:status", Duration::from_secs(2))
                    .ok_or_else(|| anyhow::anyhow!("status never arrived"))?;
                Ok(TaskOutput::from_value(status))
            })
            .task("writer", DependsOn::None, |input| {
                std::thread::sleep(Duration::from_millis(100));
                input.memory.scoped("shared").set("status", "ready");
                Ok(TaskOutput::new())
            })
            .build()?;

        let memory = SharedMemory::new();
        let outcome = Scheduler::new(graph)
            .with_mode(mode)
            .with_memory(memory.clone())
            .run(Context::new())?;

        assert_eq!(outcome.context.get("waiter"), Some(&json!("ready")));
        let entry = memory.entry("shared:status").ok_or("entry missing")?;
        assert_eq!(entry.writer.as_deref(), Some("writer"));
        assert_eq!(entry.namespace, "shared");
    }
    Ok(())
}

#[test]
fn lifecycle_events_are_published_in_order() -> TestResult {
    let sink = CollectingSink::new();
    let events = EventContext::new(sink.clone());
    let fixture = abc(true);

    Scheduler::new(fixture.build())
        .with_mode(agentflow::ConcurrencyMode::Serial)
        .with_events(events.clone())
        .run(Context::new())?;

    let ordered = sink.ordered();
    assert_eq!(ordered.first().map(|e| e.event_type()), Some(&EventType::RunStarted));
    assert_eq!(ordered.last().map(|e| e.event_type()), Some(&EventType::RunFinished));
    assert_eq!(sink.tasks_for(&EventType::TaskStarted), ["A", "B", "C"]);
    assert_eq!(sink.tasks_for(&EventType::TaskActivated), ["C"]);

    // Task events come from per-task child contexts.
    for event in sink.of_type(&EventType::TaskCompleted) {
        assert_eq!(event.parent_run_id(), Some(events.run_id()));
        assert_eq!(event.scope(), event.data()["task"].as_str());
    }
    Ok(())
}

#[test]
fn async_mode_inside_a_runtime_is_rejected() -> TestResult {
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    let graph = GraphFixture::new().root("only").build();
    let scheduler = Scheduler::new(graph).with_mode(agentflow::ConcurrencyMode::Async);

    let result = runtime.block_on(async { scheduler.run(Context::new()) });
    assert!(matches!(result, Err(FlowError::Runtime(_))));
    Ok(())
}

#[test]
fn scheduler_can_be_run_repeatedly() -> TestResult {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let graph = TaskGraph::builder()
        .task("count", DependsOn::None, move |_| {
            Ok(TaskOutput::from_value(counter.fetch_add(1, Ordering::SeqCst) + 1))
        })
        .build()?;
    let scheduler = Scheduler::new(graph);

    let first = scheduler.run(Context::new())?;
    let second = scheduler.run(first.context.clone())?;
    assert_eq!(first.context.get("count"), Some(&json!(1)));
    assert_eq!(second.context.get("count"), Some(&json!(2)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}
