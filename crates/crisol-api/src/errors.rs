//! Errores del núcleo.
//!
//! Un único enum cubre los errores estáticos (plantillas, tipos, resolución)
//! y los de uso. Los fallos dentro del cuerpo de un paso se expresan con
//! `StepError`, que distingue aserción fallida de cualquier otra avería.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrisolError {
    #[error("duplicated type name '{0}'")]
    DuplicateType(String),
    #[error("wrong step definition '{definition}': unknown argument type '{type_name}'\navailable types are: {available}")]
    UnknownType { definition: String, type_name: String, available: String },
    #[error("cannot match step '{step}' with any defined step\n{hints}")]
    UndefinedStep { step: String, hints: String },
    #[error("step '{step}' matches more than one defined step:\n\t{candidates}")]
    AmbiguousStep { step: String, candidates: String },
    #[error("error parsing type {type_name} using language {locale}: '{value}'\n\texpected {hints}")]
    TypeParse { type_name: String, locale: String, value: String, hints: String },
    #[error("wrong step definition '{definition}': {reason}")]
    WrongStepDefinition { definition: String, reason: String },
    #[error("cannot find step definition for locale {locale} in '{key}'")]
    MissingTranslation { key: String, locale: String },
    #[error("cannot run step: wrong arguments (expected {expected} but received {received})")]
    WrongArguments { expected: String, received: String },
    #[error("plan node of type {0} cannot be executed")]
    NotExecutable(String),
    #[error("step '{step}' does not belong to test case '{test_case}'")]
    ForeignStep { step: String, test_case: String },
    #[error("plan node of type {0} cannot have children")]
    InvalidChild(String),
    #[error("internal: {0}")]
    Internal(String),
}

/// Fallo producido por el cuerpo de un paso.
///
/// `Assertion` marca el paso como FAILED; cualquier otra avería lo marca
/// como ERROR. Ambos detienen los pasos restantes del caso de prueba.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
    #[error("{0}")]
    Failure(String),
}

impl From<CrisolError> for StepError {
    fn from(error: CrisolError) -> Self {
        StepError::Failure(error.to_string())
    }
}
