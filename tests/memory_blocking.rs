// tests/memory_blocking.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::json;

use agentflow::memory::with_writer;
use agentflow::{Change, SharedMemory, Wait};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn blocked_get_wakes_on_set() -> TestResult {
    init_tracing();
    let memory = SharedMemory::new();

    let writer = {
        let memory = memory.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(300));
            memory.set("answer", 42);
        })
    };

    let start = Instant::now();
    let value = memory.wait_for("answer", Duration::from_secs(2));
    let elapsed = start.elapsed();
    writer.join().map_err(|_| "writer thread panicked")?;

    assert_eq!(value, Some(json!(42)));
    assert!(elapsed >= Duration::from_millis(250), "woke too early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(700), "woke too late: {elapsed:?}");
    Ok(())
}

#[test]
fn get_on_missing_key_times_out_with_none() {
    let memory = SharedMemory::new();

    let start = Instant::now();
    let value = memory.get_with("missing", Duration::from_millis(500));
    let elapsed = start.elapsed();

    assert_eq!(value, None);
    assert!(elapsed >= Duration::from_millis(500));
    assert!(elapsed < Duration::from_millis(700), "overslept: {elapsed:?}");
}

#[test]
fn unrepresentable_timeout_waits_like_forever() -> TestResult {
    let memory = SharedMemory::new();

    let waiter = {
        let memory = memory.clone();
        thread::spawn(move || memory.wait_for("late", Duration::MAX))
    };
    thread::sleep(Duration::from_millis(100));
    memory.set("late", "here");

    let value = waiter.join().map_err(|_| "waiter thread panicked")?;
    assert_eq!(value, Some(json!("here")));
    Ok(())
}

#[test]
fn unrelated_sets_do_not_end_the_wait() -> TestResult {
    let memory = SharedMemory::new();

    let writer = {
        let memory = memory.clone();
        thread::spawn(move || {
            for i in 0..5 {
                memory.set("noise", i);
                thread::sleep(Duration::from_millis(20));
            }
            memory.set("signal", "go");
        })
    };

    let value = memory.get_with("signal", Wait::Forever);
    writer.join().map_err(|_| "writer thread panicked")?;
    assert_eq!(value, Some(json!("go")));
    Ok(())
}

#[test]
fn scoped_waiter_sees_write_through_root_handle() -> TestResult {
    let memory = SharedMemory::new();
    let team = memory.scoped("team");

    let writer = {
        let memory = memory.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            memory.set("team:plan", "outline");
        })
    };

    let value = team.wait_for("plan", Duration::from_secs(2));
    writer.join().map_err(|_| "writer thread panicked")?;
    assert_eq!(value, Some(json!("outline")));
    Ok(())
}

#[test]
fn subscription_fires_once_per_matching_set() -> TestResult {
    let memory = SharedMemory::new();
    let seen: Arc<Mutex<Vec<Change>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    memory.subscribe(&["results:*"], move |change: &Change| {
        sink.lock().unwrap().push(change.clone());
    })?;

    with_writer("researcher", || {
        memory.set("results:one", 1);
        memory.set("drafts:one", "ignored");
        memory.set("results:two", 2);
    });

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].key, "results:one");
    assert_eq!(seen[0].writer.as_deref(), Some("researcher"));
    assert_eq!(seen[1].value, json!(2));
    Ok(())
}

#[test]
fn concurrent_writers_to_distinct_keys_all_land() -> TestResult {
    let memory = SharedMemory::new();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let memory = memory.scoped(&format!("worker{i}"));
            thread::spawn(move || {
                for j in 0..50 {
                    memory.set(&format!("k{j}"), j);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().map_err(|_| "writer thread panicked")?;
    }

    let stats = memory.stats();
    assert_eq!(stats.entries, 400);
    assert_eq!(stats.namespaces, 8);
    Ok(())
}
