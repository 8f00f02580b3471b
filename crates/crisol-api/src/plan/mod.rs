//! Árbol del plan de pruebas.
//!
//! Un plan es un árbol ordenado de `PlanNode`: agregadores arriba, casos de
//! prueba en medio y pasos en las hojas. La estructura es inmutable tras la
//! planificación; los campos de ejecución se escriben una sola vez por el
//! runner dueño del subárbol.

mod execution;
mod node;
mod result;
mod snapshot;

pub use execution::ExecutionState;
pub use node::{NodeType, PlanNode, DATA_FORMAT_LANGUAGE};
pub use result::ExecutionResult;
pub use snapshot::PlanNodeSnapshot;
