//! Nodos del plan y su tipología.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CrisolError;

use super::{ExecutionResult, ExecutionState};

/// Clave de propiedad que fija el idioma de los datos de un paso,
/// independiente del idioma del texto.
pub const DATA_FORMAT_LANGUAGE: &str = "data.format.language";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Aggregator,
    TestCase,
    StepAggregator,
    Step,
    VirtualStep,
}

impl NodeType {
    /// Las hojas (`Step`, `VirtualStep`) nunca llevan hijos.
    pub fn accepts_children(self) -> bool {
        !matches!(self, NodeType::Step | NodeType::VirtualStep)
    }

    pub fn is_step_kind(self) -> bool {
        matches!(self, NodeType::Step | NodeType::VirtualStep)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NodeType::Aggregator => "AGGREGATOR",
            NodeType::TestCase => "TEST_CASE",
            NodeType::StepAggregator => "STEP_AGGREGATOR",
            NodeType::Step => "STEP",
            NodeType::VirtualStep => "VIRTUAL_STEP",
        };
        write!(f, "{label}")
    }
}

/// Nodo del plan de pruebas.
///
/// El constructor externo (plan-builder) monta la estructura; después solo
/// se mutan los campos de `execution`, y exclusivamente por el runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanNode {
    pub id: Uuid,
    pub node_type: NodeType,
    pub name: String,
    pub keyword: Option<String>,
    pub language: String,
    pub properties: IndexMap<String, String>,
    pub children: Vec<PlanNode>,
    pub execution: ExecutionState,
}

impl PlanNode {
    pub fn new(node_type: NodeType, name: impl Into<String>) -> Self {
        PlanNode {
            id: Uuid::new_v4(),
            node_type,
            name: name.into(),
            keyword: None,
            language: "en".to_owned(),
            properties: IndexMap::new(),
            children: Vec::new(),
            execution: ExecutionState::default(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Añade un hijo respetando la invariante de hoja.
    pub fn add_child(&mut self, child: PlanNode) -> Result<(), CrisolError> {
        if !self.node_type.accepts_children() {
            return Err(CrisolError::InvalidChild(self.node_type.to_string()));
        }
        self.children.push(child);
        Ok(())
    }

    /// Variante fluida de `add_child` para montar planes en línea.
    pub fn with_child(mut self, child: PlanNode) -> Result<Self, CrisolError> {
        self.add_child(child)?;
        Ok(self)
    }

    pub fn result(&self) -> Option<ExecutionResult> {
        self.execution.result
    }

    /// Todos los descendientes en orden de profundidad (sin incluir `self`).
    pub fn descendants(&self) -> Vec<&PlanNode> {
        let mut nodes = Vec::new();
        for child in &self.children {
            nodes.push(child);
            nodes.extend(child.descendants());
        }
        nodes
    }

    pub fn has_descendant(&self, id: Uuid) -> bool {
        self.descendants().iter().any(|node| node.id == id)
    }

    /// Número de descendientes de un tipo dado.
    pub fn count_type(&self, node_type: NodeType) -> usize {
        self.descendants()
            .iter()
            .filter(|node| node.node_type == node_type)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_reject_children() {
        let mut step = PlanNode::new(NodeType::Step, "a step");
        let error = step.add_child(PlanNode::new(NodeType::Step, "child"));
        assert!(matches!(error, Err(CrisolError::InvalidChild(_))));
    }

    #[test]
    fn descendants_walk_depth_first() {
        let plan = PlanNode::new(NodeType::Aggregator, "root")
            .with_child(
                PlanNode::new(NodeType::TestCase, "case")
                    .with_child(PlanNode::new(NodeType::Step, "one"))
                    .unwrap()
                    .with_child(PlanNode::new(NodeType::Step, "two"))
                    .unwrap(),
            )
            .unwrap();
        let names: Vec<&str> = plan.descendants().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["case", "one", "two"]);
        assert_eq!(plan.count_type(NodeType::Step), 2);
    }

    #[test]
    fn descendant_membership_covers_nested_steps_only() {
        let stranger = PlanNode::new(NodeType::Step, "stranger");
        let plan = PlanNode::new(NodeType::Aggregator, "root")
            .with_child(
                PlanNode::new(NodeType::TestCase, "case")
                    .with_child(PlanNode::new(NodeType::Step, "one"))
                    .unwrap(),
            )
            .unwrap();
        let step_id = plan.children[0].children[0].id;
        assert!(plan.has_descendant(step_id));
        assert!(plan.children[0].has_descendant(step_id));
        assert!(!plan.has_descendant(stranger.id));
        assert!(!plan.has_descendant(plan.id));
    }
}
