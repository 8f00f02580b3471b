//! Demostración de extremo a extremo: define unos pasos, construye un plan
//! pequeño, lo ejecuta y vuelca el árbol de resultados en JSON.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use crisol_api::backend::{StepArguments, StepContributor, StepDef};
use crisol_api::errors::StepError;
use crisol_api::event::CollectingObserver;
use crisol_api::plan::{NodeType, PlanNode, PlanNodeSnapshot};
use crisol_core::Engine;

fn contributor() -> StepContributor {
    StepContributor::new("demo")
        .step(
            StepDef::new(
                "users.given",
                Arc::new(|args: &StepArguments, _| Ok(json!({ "users": args.int("n")? }))),
            )
            .template("en", "given {n:int} users")
            .template("es", "dados {n:int} usuarios")
            .arg("n", "int"),
        )
        .step(
            StepDef::new(
                "users.verify",
                Arc::new(|args: &StepArguments, ctx| {
                    let expected = args.int("n")?;
                    let seen = ctx
                        .outputs
                        .iter()
                        .filter_map(|output| output.get("users"))
                        .filter_map(Value::as_i64)
                        .next_back();
                    if seen == Some(expected) {
                        Ok(Value::Null)
                    } else {
                        Err(StepError::Assertion(format!(
                            "expected {expected} users, saw {seen:?}"
                        )))
                    }
                }),
            )
            .template("en", "there (is|are) {n:int} user(s)")
            .template("es", "hay {n:int} usuario(s)")
            .arg("n", "int"),
        )
        .step(StepDef::void("users.report").template("en", "a report is generated"))
}

fn plan() -> Result<PlanNode, crisol_api::errors::CrisolError> {
    PlanNode::new(NodeType::Aggregator, "User management")
        .with_child(
            PlanNode::new(NodeType::TestCase, "Counting users")
                .with_child(PlanNode::new(NodeType::Step, "given 3 users").with_keyword("Given"))?
                .with_child(PlanNode::new(NodeType::Step, "there are 3 users").with_keyword("Then"))?
                .with_child(
                    PlanNode::new(NodeType::Step, "a report is generated").with_keyword("Then"),
                )?,
        )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let observer = Arc::new(CollectingObserver::default());
    let engine = Engine::with_core_types(vec![contributor()])?
        .with_observer(Arc::clone(&observer) as _);

    let mut plan = plan()?;
    let result = engine.run(&mut plan);
    info!(?result, events = observer.events().len(), "plan finished");

    let snapshot = PlanNodeSnapshot::from(&plan);
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
