//! Núcleo de ejecución de planes de prueba.
//!
//! Este crate aporta la maquinaria que convierte plantillas en lenguaje
//! natural en pasos ejecutables: el compilador de expresiones, el catálogo
//! de tipos de dato, la resolución de pasos con sugerencias, el backend de
//! despacho y el runner del árbol del plan. Los contratos compartidos viven
//! en `crisol-api`.

pub mod backend;
pub mod datatypes;
pub mod engine;
pub mod expression;
pub mod hinter;
pub mod resolver;
pub mod runner;
pub mod step;

pub use backend::{DefaultBackend, DefaultBackendFactory};
pub use datatypes::core_types;
pub use engine::Engine;
pub use hinter::StepHinter;
pub use resolver::{StepMatch, StepResolver};
pub use runner::PlanRunner;
pub use step::RunnableStep;

#[cfg(test)]
mod tests {
    use super::*;
    use crisol_api::backend::{StepContributor, StepDef};
    use crisol_api::plan::{ExecutionResult, NodeType, PlanNode};
    use serde_json::Value;
    use std::sync::Arc;

    #[test]
    fn the_engine_runs_a_minimal_plan_end_to_end() {
        let contributor = StepContributor::new("demo").step(
            StepDef::new("noop", Arc::new(|_, _| Ok(Value::Null))).template("en", "nothing happens"),
        );
        let engine = Engine::with_core_types(vec![contributor]).unwrap();

        let mut plan = PlanNode::new(NodeType::Aggregator, "plan")
            .with_child(
                PlanNode::new(NodeType::TestCase, "case")
                    .with_child(PlanNode::new(NodeType::Step, "nothing happens"))
                    .unwrap(),
            )
            .unwrap();

        assert_eq!(engine.run(&mut plan), Some(ExecutionResult::Passed));
        assert_eq!(plan.result(), Some(ExecutionResult::Passed));
    }
}
