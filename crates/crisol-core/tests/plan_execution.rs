//! Ejecución de planes completos: agregación, corte por fallo, ganchos y
//! eventos.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crisol_api::backend::{StepContributor, StepDef};
use crisol_api::errors::StepError;
use crisol_api::event::{CollectingObserver, EventKind};
use crisol_api::plan::{ExecutionResult, NodeType, PlanNode, PlanNodeSnapshot};
use crisol_core::Engine;

fn step(name: &str) -> PlanNode {
    PlanNode::new(NodeType::Step, name)
}

fn test_case(name: &str, steps: Vec<PlanNode>) -> PlanNode {
    let mut case = PlanNode::new(NodeType::TestCase, name);
    for child in steps {
        case.add_child(child).unwrap();
    }
    case
}

fn plan(cases: Vec<PlanNode>) -> PlanNode {
    let mut plan = PlanNode::new(NodeType::Aggregator, "plan");
    for case in cases {
        plan.add_child(case).unwrap();
    }
    plan
}

fn counting_contributor(calls: Arc<AtomicUsize>) -> StepContributor {
    StepContributor::new("demo")
        .step(
            StepDef::new(
                "ok",
                Arc::new(move |_, _| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::Null)
                }),
            )
            .template("en", "a working step"),
        )
        .step(
            StepDef::new("fail", Arc::new(|_, _| Err(StepError::Assertion("boom".into()))))
                .template("en", "a failing step"),
        )
        .step(StepDef::void("pending").template("en", "a pending step"))
}

#[test]
fn a_green_plan_aggregates_to_passed() {
    let engine =
        Engine::with_core_types(vec![counting_contributor(Arc::new(AtomicUsize::new(0)))])
            .unwrap();
    let mut plan = plan(vec![
        test_case("first", vec![step("a working step"), step("a working step")]),
        test_case("second", vec![step("a working step")]),
    ]);
    assert_eq!(engine.run(&mut plan), Some(ExecutionResult::Passed));
    assert_eq!(plan.result(), Some(ExecutionResult::Passed));
    for case in &plan.children {
        assert_eq!(case.result(), Some(ExecutionResult::Passed));
        assert!(case.execution.duration().is_some());
    }
}

#[test]
fn the_worst_child_result_wins_at_every_level() {
    let engine =
        Engine::with_core_types(vec![counting_contributor(Arc::new(AtomicUsize::new(0)))])
            .unwrap();
    let mut plan = plan(vec![
        test_case("green", vec![step("a working step")]),
        test_case("pending", vec![step("a pending step")]),
        test_case("red", vec![step("a failing step")]),
    ]);
    assert_eq!(engine.run(&mut plan), Some(ExecutionResult::Failed));
    assert_eq!(plan.children[0].result(), Some(ExecutionResult::Passed));
    assert_eq!(plan.children[1].result(), Some(ExecutionResult::NotImplemented));
    assert_eq!(plan.children[2].result(), Some(ExecutionResult::Failed));
}

#[test]
fn after_a_failure_later_steps_are_skipped_and_never_invoked() {
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = Engine::with_core_types(vec![counting_contributor(Arc::clone(&calls))]).unwrap();
    let mut plan = plan(vec![test_case(
        "case",
        vec![step("a working step"), step("a failing step"), step("a working step")],
    )]);
    assert_eq!(engine.run(&mut plan), Some(ExecutionResult::Failed));

    let case = &plan.children[0];
    assert_eq!(case.children[0].result(), Some(ExecutionResult::Passed));
    assert_eq!(case.children[1].result(), Some(ExecutionResult::Failed));
    assert_eq!(case.children[2].result(), Some(ExecutionResult::Skipped));
    // el tercer paso nunca llega al handler
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn undefined_steps_mark_only_their_own_node() {
    let engine =
        Engine::with_core_types(vec![counting_contributor(Arc::new(AtomicUsize::new(0)))])
            .unwrap();
    let mut plan = plan(vec![test_case(
        "case",
        vec![step("an unknown step"), step("a working step")],
    )]);
    assert_eq!(engine.run(&mut plan), Some(ExecutionResult::Undefined));

    let case = &plan.children[0];
    assert_eq!(case.children[0].result(), Some(ExecutionResult::Undefined));
    assert_eq!(case.children[1].result(), Some(ExecutionResult::Passed));
}

#[test]
fn each_test_case_gets_a_fresh_backend() {
    // el corte por fallo de un caso no contamina al siguiente
    let engine =
        Engine::with_core_types(vec![counting_contributor(Arc::new(AtomicUsize::new(0)))])
            .unwrap();
    let mut plan = plan(vec![
        test_case("red", vec![step("a failing step"), step("a working step")]),
        test_case("green", vec![step("a working step")]),
    ]);
    assert_eq!(engine.run(&mut plan), Some(ExecutionResult::Failed));
    assert_eq!(plan.children[0].children[1].result(), Some(ExecutionResult::Skipped));
    assert_eq!(plan.children[1].result(), Some(ExecutionResult::Passed));
}

#[test]
fn hooks_bracket_each_test_case_even_on_failure() {
    let set_ups = Arc::new(AtomicUsize::new(0));
    let tear_downs = Arc::new(AtomicUsize::new(0));
    let up = Arc::clone(&set_ups);
    let down = Arc::clone(&tear_downs);
    let contributor = counting_contributor(Arc::new(AtomicUsize::new(0)))
        .on_set_up(Arc::new(move || {
            up.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
        .on_tear_down(Arc::new(move || {
            down.fetch_add(1, Ordering::SeqCst);
            Err(StepError::Failure("cleanup grumble".into()))
        }));
    let engine = Engine::with_core_types(vec![contributor]).unwrap();
    let mut plan = plan(vec![
        test_case("red", vec![step("a failing step")]),
        test_case("green", vec![step("a working step")]),
    ]);
    // el fallo del gancho de limpieza se registra pero no altera resultados
    assert_eq!(engine.run(&mut plan), Some(ExecutionResult::Failed));
    assert_eq!(set_ups.load(Ordering::SeqCst), 2);
    assert_eq!(tear_downs.load(Ordering::SeqCst), 2);
}

#[test]
fn events_arrive_in_document_order() {
    let observer = Arc::new(CollectingObserver::new());
    let engine =
        Engine::with_core_types(vec![counting_contributor(Arc::new(AtomicUsize::new(0)))])
            .unwrap()
            .with_observer(Arc::clone(&observer) as _);
    let mut plan = plan(vec![test_case("case", vec![step("a working step")])]);
    engine.run(&mut plan);

    let kinds: Vec<&'static str> = observer
        .events()
        .iter()
        .map(|event| match event.kind {
            EventKind::RunStarted { .. } => "run-started",
            EventKind::RunFinished { .. } => "run-finished",
            EventKind::NodeStarted { .. } => "node-started",
            EventKind::NodeFinished { .. } => "node-finished",
            EventKind::BeforeStep { .. } => "before-step",
            EventKind::AfterStep { .. } => "after-step",
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "run-started",
            "node-started", // plan
            "node-started", // caso
            "node-started", // paso
            "before-step",
            "after-step",
            "node-finished",
            "node-finished",
            "node-finished",
            "run-finished",
        ]
    );
    let run_ids: Vec<_> = observer.events().iter().map(|event| event.run_id).collect();
    assert!(run_ids.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn step_aggregators_share_the_backend_of_their_test_case() {
    let engine =
        Engine::with_core_types(vec![counting_contributor(Arc::new(AtomicUsize::new(0)))])
            .unwrap();
    let mut group = PlanNode::new(NodeType::StepAggregator, "grouped steps");
    group.add_child(step("a working step")).unwrap();
    group.add_child(step("a failing step")).unwrap();
    let mut plan = plan(vec![test_case(
        "case",
        vec![step("a working step"), group, step("a working step")],
    )]);
    assert_eq!(engine.run(&mut plan), Some(ExecutionResult::Failed));

    let case = &plan.children[0];
    assert_eq!(case.children[1].result(), Some(ExecutionResult::Failed));
    // el corte por fallo dentro del grupo alcanza al paso posterior al grupo
    assert_eq!(case.children[2].result(), Some(ExecutionResult::Skipped));
}

#[test]
fn parallel_runs_aggregate_like_sequential_ones() {
    let observer = Arc::new(CollectingObserver::new());
    let engine =
        Engine::with_core_types(vec![counting_contributor(Arc::new(AtomicUsize::new(0)))])
            .unwrap()
            .with_observer(Arc::clone(&observer) as _);
    let mut plan = plan(vec![
        test_case("green", vec![step("a working step")]),
        test_case("red", vec![step("a failing step")]),
        test_case("pending", vec![step("a pending step")]),
    ]);
    assert_eq!(engine.run_parallel(&mut plan), Some(ExecutionResult::Failed));
    assert_eq!(plan.result(), Some(ExecutionResult::Failed));
    for case in &plan.children {
        assert!(case.execution.has_finished());
    }

    // el flujo de eventos envuelve la raíz igual que en la ejecución
    // secuencial
    let events = observer.events();
    assert!(matches!(events.first().map(|e| &e.kind), Some(EventKind::RunStarted { .. })));
    assert!(matches!(events.get(1).map(|e| &e.kind), Some(EventKind::NodeStarted { node_id, .. }) if *node_id == plan.id));
    let last = events.len() - 1;
    assert!(matches!(events.get(last - 1).map(|e| &e.kind), Some(EventKind::NodeFinished { node_id, .. }) if *node_id == plan.id));
    assert!(matches!(events.last().map(|e| &e.kind), Some(EventKind::RunFinished { .. })));
}

#[test]
fn snapshots_preserve_the_result_tree() {
    let engine =
        Engine::with_core_types(vec![counting_contributor(Arc::new(AtomicUsize::new(0)))])
            .unwrap();
    let mut plan = plan(vec![test_case(
        "case",
        vec![step("a working step"), step("a failing step")],
    )]);
    engine.run(&mut plan);

    // el fallo del paso asciende por el caso y por la raíz
    let snapshot = PlanNodeSnapshot::from(&plan);
    assert_eq!(snapshot.count_result(ExecutionResult::Passed), 1);
    assert_eq!(snapshot.count_result(ExecutionResult::Failed), 3);

    let as_json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(as_json["children"][0]["children"][1]["result"], "FAILED");
}
