//! Estado de ejecución de un nodo: instantes, resultado y error.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CrisolError;

use super::ExecutionResult;

/// Campos mutables de un `PlanNode` durante la ejecución.
///
/// Cada transición se permite una sola vez; un doble `mark_started` o
/// `mark_finished` es un error de uso del runner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionState {
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub result: Option<ExecutionResult>,
    pub error_message: Option<String>,
    pub error_trace: Option<String>,
}

impl ExecutionState {
    pub fn mark_started(&mut self, at: DateTime<Utc>) -> Result<(), CrisolError> {
        if self.started_at.is_some() {
            return Err(CrisolError::Internal("node execution already started".into()));
        }
        self.started_at = Some(at);
        Ok(())
    }

    pub fn mark_finished(
        &mut self,
        at: DateTime<Utc>,
        result: ExecutionResult,
    ) -> Result<(), CrisolError> {
        self.mark_finished_with_error(at, result, None, None)
    }

    pub fn mark_finished_with_error(
        &mut self,
        at: DateTime<Utc>,
        result: ExecutionResult,
        error_message: Option<String>,
        error_trace: Option<String>,
    ) -> Result<(), CrisolError> {
        if self.finished_at.is_some() {
            return Err(CrisolError::Internal("node execution already finished".into()));
        }
        self.finished_at = Some(at);
        self.result = Some(result);
        self.error_message = error_message;
        self.error_trace = error_trace;
        Ok(())
    }

    /// Duración entre inicio y fin, si ambos existen.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(finish)) => Some(finish - start),
            _ => None,
        }
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn has_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn has_result(&self, result: ExecutionResult) -> bool {
        self.result == Some(result)
    }
}
