// tests/property_scheduler.rs

use std::collections::{BTreeSet, HashMap};

use proptest::prelude::*;

use agentflow::{ConcurrencyMode, Context, DependsOn, Scheduler, TaskOutput, TaskRunState};
use agentflow_test_utils::{FakeExecutor, GraphFixture};

#[derive(Debug, Clone)]
struct DagShape {
    /// Required dependencies per task, as indices below the task's own.
    /// Empty means a root.
    deps: Vec<Vec<usize>>,
    optional: Vec<bool>,
    /// For each task, optional tasks it activates.
    activations: Vec<Vec<usize>>,
}

fn name(i: usize) -> String {
    format!("task_{i:02}")
}

// Acyclicity is guaranteed by only letting task N depend on tasks 0..N-1.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = DagShape> {
    (1..=max_tasks).prop_flat_map(|n| {
        (
            proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..3), n),
            proptest::collection::vec(proptest::bool::weighted(0.25), n),
            proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..2), n),
        )
            .prop_map(move |(raw_deps, mut optional, raw_acts)| {
                // Task 0 is always a root so every run dispatches something.
                optional[0] = false;
                let deps = raw_deps
                    .into_iter()
                    .enumerate()
                    .map(|(i, ds)| {
                        let set: BTreeSet<usize> =
                            ds.into_iter().filter(|_| i > 0).map(|d| d % i.max(1)).collect();
                        set.into_iter().collect()
                    })
                    .collect();
                let activations = raw_acts
                    .into_iter()
                    .map(|acts| acts.into_iter().map(|a| a % n).collect())
                    .collect();
                DagShape {
                    deps,
                    optional,
                    activations,
                }
            })
    })
}

fn fixture(dag: &DagShape) -> GraphFixture {
    let mut fixture = GraphFixture::new();
    for (i, deps) in dag.deps.iter().enumerate() {
        let depends_on = if dag.optional[i] {
            DependsOn::Optional
        } else if deps.is_empty() {
            DependsOn::None
        } else {
            DependsOn::required(deps.iter().map(|d| name(*d)))
        };
        fixture = fixture.with(&name(i), depends_on);
    }
    for (i, acts) in dag.activations.iter().enumerate() {
        let targets: Vec<String> = acts.iter().map(|a| name(*a)).collect();
        let targets: Vec<&str> = targets.iter().map(String::as_str).collect();
        fixture = fixture.activating(&name(i), &targets);
    }
    fixture
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_task_runs_at_most_once_and_after_its_dependencies(dag in dag_strategy(12)) {
        let fixture = fixture(&dag);
        let outcome = Scheduler::new(fixture.build())
            .with_mode(ConcurrencyMode::Serial)
            .run(Context::new())
            .expect("run should succeed");

        let recorder = fixture.recorder();
        let waves: HashMap<String, usize> =
            recorder.runs().into_iter().map(|r| (r.task, r.wave)).collect();

        for (i, deps) in dag.deps.iter().enumerate() {
            let task = name(i);
            prop_assert!(recorder.count(&task) <= 1);

            let state = outcome.state_of(&task).expect("state for every task");
            prop_assert!(state == TaskRunState::Completed || state == TaskRunState::Skipped);
            prop_assert_eq!(state == TaskRunState::Completed, waves.contains_key(&task));
            prop_assert_eq!(outcome.context.contains(&task), waves.contains_key(&task));

            if let Some(wave) = waves.get(&task) {
                if !dag.optional[i] {
                    for dep in deps {
                        let dep_wave = waves.get(&name(*dep));
                        prop_assert!(dep_wave.is_some_and(|w| w < wave));
                    }
                }
            }

            // Roots always run; a satisfied required task always runs.
            if !dag.optional[i] && deps.iter().all(|d| waves.contains_key(&name(*d))) {
                prop_assert!(waves.contains_key(&task), "{} was satisfied but did not run", task);
            }
        }
    }

    #[test]
    fn serial_and_fake_backends_agree_on_waves(dag in dag_strategy(10)) {
        let fixture = fixture(&dag);
        let graph = fixture.build();

        let serial = Scheduler::new(graph.clone())
            .with_mode(ConcurrencyMode::Serial)
            .run(Context::new())
            .expect("serial run");

        let mut fake = FakeExecutor::new();
        for (i, acts) in dag.activations.iter().enumerate() {
            let mut output = TaskOutput::from_value(name(i));
            for a in acts {
                output = output.activate(name(*a));
            }
            fake = fake.with_output(&name(i), output);
        }
        let faked = Scheduler::new(graph).run_with(&mut fake, Context::new()).expect("fake run");

        prop_assert_eq!(serial.waves, faked.waves);
        prop_assert_eq!(serial.states, faked.states);
        prop_assert_eq!(serial.context, faked.context);
    }
}
