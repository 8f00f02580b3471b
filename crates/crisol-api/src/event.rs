//! Eventos de ciclo de vida de una ejecución.
//!
//! El runner publica un evento por transición observable; los observadores
//! externos (informes, consolas) los reciben en orden dentro de cada
//! ejecución. Los eventos transportan datos planos, nunca referencias al
//! árbol vivo.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::plan::{ExecutionResult, NodeType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventKind {
    /// Comienza la ejecución de un plan completo.
    RunStarted { root_id: Uuid, name: String },
    /// Termina la ejecución del plan, con su resultado agregado.
    RunFinished { root_id: Uuid, result: Option<ExecutionResult> },
    /// Un nodo entra en ejecución.
    NodeStarted { node_id: Uuid, node_type: NodeType, name: String },
    /// Un nodo alcanza un resultado terminal.
    NodeFinished { node_id: Uuid, node_type: NodeType, result: Option<ExecutionResult> },
    /// Inmediatamente antes de despachar una hoja.
    BeforeStep { node_id: Uuid, name: String },
    /// Inmediatamente después de despachar una hoja.
    AfterStep { node_id: Uuid, result: Option<ExecutionResult> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub run_id: Uuid,
    pub ts: DateTime<Utc>,
    pub kind: EventKind,
}

pub trait EventObserver: Send + Sync {
    fn notify(&self, event: &Event);
}

/// Observador que acumula eventos en memoria; útil en tests.
#[derive(Default)]
pub struct CollectingObserver {
    events: Mutex<Vec<Event>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl EventObserver for CollectingObserver {
    fn notify(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }
}
