//! Recorrido del árbol del plan y agregación de resultados.
//!
//! El runner recorre el plan en profundidad y en orden. Cada caso de prueba
//! recibe un backend recién creado, con sus ganchos de preparación antes del
//! primer paso y los de limpieza tras el último, pase lo que pase en medio.
//! El resultado de un nodo interior es el peor de los de sus hijos.

use std::sync::Arc;

use chrono::Utc;
use rayon::prelude::*;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crisol_api::backend::{Backend, BackendFactory};
use crisol_api::event::{Event, EventKind, EventObserver};
use crisol_api::plan::{ExecutionResult, NodeType, PlanNode};

pub struct PlanRunner {
    factory: Arc<dyn BackendFactory>,
    observers: Vec<Arc<dyn EventObserver>>,
}

impl PlanRunner {
    pub fn new(factory: Arc<dyn BackendFactory>) -> Self {
        PlanRunner { factory, observers: Vec::new() }
    }

    pub fn with_observer(mut self, observer: Arc<dyn EventObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Ejecuta el plan completo en orden y devuelve el resultado agregado.
    pub fn run(&self, plan: &mut PlanNode) -> Option<ExecutionResult> {
        let run_id = Uuid::new_v4();
        self.publish(run_id, EventKind::RunStarted { root_id: plan.id, name: plan.name.clone() });
        let result = self.run_node(run_id, plan, &mut None);
        self.publish(run_id, EventKind::RunFinished { root_id: plan.id, result });
        result
    }

    /// Ejecuta los subárboles de primer nivel en paralelo. Los pasos de cada
    /// caso de prueba siguen siendo estrictamente secuenciales.
    pub fn run_parallel(&self, plan: &mut PlanNode) -> Option<ExecutionResult> {
        let run_id = Uuid::new_v4();
        self.publish(run_id, EventKind::RunStarted { root_id: plan.id, name: plan.name.clone() });
        self.publish(
            run_id,
            EventKind::NodeStarted {
                node_id: plan.id,
                node_type: plan.node_type,
                name: plan.name.clone(),
            },
        );
        if let Err(error) = plan.execution.mark_started(Utc::now()) {
            error!(%error, "plan already started");
        }
        let results: Vec<Option<ExecutionResult>> = plan
            .children
            .par_iter_mut()
            .map(|child| self.run_node(run_id, child, &mut None))
            .collect();
        let result = results.into_iter().flatten().max();
        if let Some(aggregated) = result {
            if let Err(error) = plan.execution.mark_finished(Utc::now(), aggregated) {
                error!(%error, "plan already finished");
            }
        }
        self.publish(
            run_id,
            EventKind::NodeFinished { node_id: plan.id, node_type: plan.node_type, result },
        );
        self.publish(run_id, EventKind::RunFinished { root_id: plan.id, result });
        result
    }

    fn run_node(
        &self,
        run_id: Uuid,
        node: &mut PlanNode,
        inherited: &mut Option<Box<dyn Backend>>,
    ) -> Option<ExecutionResult> {
        self.publish(
            run_id,
            EventKind::NodeStarted {
                node_id: node.id,
                node_type: node.node_type,
                name: node.name.clone(),
            },
        );
        let result = if node.node_type.is_step_kind() {
            self.run_leaf(run_id, node, inherited)
        } else {
            self.run_children(run_id, node, inherited)
        };
        self.publish(
            run_id,
            EventKind::NodeFinished { node_id: node.id, node_type: node.node_type, result },
        );
        result
    }

    fn run_leaf(
        &self,
        run_id: Uuid,
        node: &mut PlanNode,
        backend: &mut Option<Box<dyn Backend>>,
    ) -> Option<ExecutionResult> {
        self.publish(run_id, EventKind::BeforeStep { node_id: node.id, name: node.name.clone() });
        match backend {
            Some(backend) => {
                if let Err(error) = backend.run_step(node) {
                    error!(%error, step = %node.name, "cannot dispatch step");
                }
            }
            None => warn!(step = %node.name, "step outside a test case cannot be executed"),
        }
        let result = node.result();
        debug!(step = %node.name, ?result, "step finished");
        self.publish(run_id, EventKind::AfterStep { node_id: node.id, result });
        result
    }

    fn run_children(
        &self,
        run_id: Uuid,
        node: &mut PlanNode,
        inherited: &mut Option<Box<dyn Backend>>,
    ) -> Option<ExecutionResult> {
        let is_test_case = node.node_type == NodeType::TestCase;
        let mut own_backend =
            if is_test_case { Some(self.factory.create_backend(node)) } else { None };
        let backend = if is_test_case { &mut own_backend } else { &mut *inherited };

        if let Err(error) = node.execution.mark_started(Utc::now()) {
            error!(%error, node = %node.name, "node already started");
        }
        if is_test_case {
            info!(test_case = %node.name, "running test case");
            if let Some(backend) = backend.as_mut() {
                backend.set_up();
            }
        }

        let mut aggregated: Option<ExecutionResult> = None;
        for child in &mut node.children {
            let child_result = self.run_node(run_id, child, backend);
            aggregated = aggregated.max(child_result);
        }

        if is_test_case {
            if let Some(backend) = backend.as_mut() {
                backend.tear_down();
            }
        }
        if let Some(result) = aggregated {
            if let Err(error) = node.execution.mark_finished(Utc::now(), result) {
                error!(%error, node = %node.name, "node already finished");
            }
        }
        aggregated
    }

    fn publish(&self, run_id: Uuid, kind: EventKind) {
        let event = Event { run_id, ts: Utc::now(), kind };
        for observer in &self.observers {
            observer.notify(&event);
        }
    }
}
