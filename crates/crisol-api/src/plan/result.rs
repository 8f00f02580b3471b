//! Resultado terminal de la ejecución de un nodo.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Resultado de un nodo, en severidad ascendente.
///
/// El orden de declaración es contractual: el resultado de un padre es el
/// máximo de los resultados de sus hijos, y `Undefined` es más severo que
/// `Skipped` aunque parezca contraintuitivo.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionResult {
    /// El nodo se ejecutó correctamente.
    Passed,
    /// El nodo no tiene implementación (paso virtual o marcado void).
    NotImplemented,
    /// El nodo no llegó a ejecutarse por un fallo previo.
    Skipped,
    /// El texto del paso no casó con ninguna definición (o con varias).
    Undefined,
    /// Una aserción del paso falló.
    Failed,
    /// Cualquier otra avería durante la ejecución.
    Error,
}

impl ExecutionResult {
    pub fn is_passed(self) -> bool {
        self == ExecutionResult::Passed
    }

    /// Máxima severidad de una secuencia de resultados, si hay alguno.
    pub fn aggregate<I>(results: I) -> Option<ExecutionResult>
    where
        I: IntoIterator<Item = ExecutionResult>,
    {
        results.into_iter().max()
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExecutionResult::Passed => "PASSED",
            ExecutionResult::NotImplemented => "NOT_IMPLEMENTED",
            ExecutionResult::Skipped => "SKIPPED",
            ExecutionResult::Undefined => "UNDEFINED",
            ExecutionResult::Failed => "FAILED",
            ExecutionResult::Error => "ERROR",
        };
        write!(f, "{label}")
    }
}
