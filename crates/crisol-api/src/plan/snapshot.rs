//! Copia profunda y serializable de un subárbol ejecutado.
//!
//! Los exportadores de informes consumen este snapshot, nunca el árbol vivo.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ExecutionResult, NodeType, PlanNode};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanNodeSnapshot {
    pub id: Uuid,
    pub node_type: NodeType,
    pub name: String,
    pub keyword: Option<String>,
    pub language: String,
    pub result: Option<ExecutionResult>,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
    pub error_trace: Option<String>,
    pub children: Vec<PlanNodeSnapshot>,
}

impl PlanNodeSnapshot {
    /// Número de nodos del subárbol (incluido este) con el resultado dado.
    pub fn count_result(&self, result: ExecutionResult) -> usize {
        let own = usize::from(self.result == Some(result));
        own + self.children.iter().map(|c| c.count_result(result)).sum::<usize>()
    }
}

impl From<&PlanNode> for PlanNodeSnapshot {
    fn from(node: &PlanNode) -> Self {
        PlanNodeSnapshot {
            id: node.id,
            node_type: node.node_type,
            name: node.name.clone(),
            keyword: node.keyword.clone(),
            language: node.language.clone(),
            result: node.execution.result,
            duration_ms: node.execution.duration().map(|d| d.num_milliseconds()),
            error_message: node.execution.error_message.clone(),
            error_trace: node.execution.error_trace.clone(),
            children: node.children.iter().map(PlanNodeSnapshot::from).collect(),
        }
    }
}
