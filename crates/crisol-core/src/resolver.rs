//! Resolución de un paso literal contra el catálogo de pasos ejecutables.
//!
//! La resolución exige unicidad: cero coincidencias es un paso no definido
//! (con sugerencias) y más de una es ambigüedad, que se reporta con todas
//! las plantillas implicadas para que el autor pueda desambiguar.

use std::sync::Arc;

use fancy_regex::{Captures, Regex};
use indexmap::IndexMap;
use tracing::warn;

use crisol_api::datatype::DataTypeRegistry;
use crisol_api::errors::CrisolError;

use crate::hinter::StepHinter;
use crate::step::RunnableStep;

/// Valores capturados por la plantilla ganadora, en orden de captura.
#[derive(Debug, Clone, Default)]
pub struct StepMatch {
    values: IndexMap<String, String>,
}

impl StepMatch {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub struct StepResolver {
    registry: Arc<DataTypeRegistry>,
    steps: Vec<Arc<RunnableStep>>,
    hinter: StepHinter,
}

impl StepResolver {
    pub fn new(registry: Arc<DataTypeRegistry>, steps: Vec<Arc<RunnableStep>>) -> Self {
        let hinter = StepHinter::new(Arc::clone(&registry), steps.clone());
        StepResolver { registry, steps, hinter }
    }

    pub fn steps(&self) -> &[Arc<RunnableStep>] {
        &self.steps
    }

    pub fn hinter(&self) -> &StepHinter {
        &self.hinter
    }

    /// Localiza el único paso cuya plantilla casa con el literal.
    ///
    /// Un paso cuya plantilla no compila se descarta con un aviso en vez de
    /// invalidar la resolución completa.
    pub fn resolve(
        &self,
        literal: &str,
        step_locale: &str,
        data_locale: &str,
    ) -> Result<(Arc<RunnableStep>, StepMatch), CrisolError> {
        let literal = literal.trim();
        let mut located: Vec<(Arc<RunnableStep>, StepMatch)> = Vec::new();
        for step in &self.steps {
            let pattern = match step.pattern(step_locale, data_locale, &self.registry) {
                Ok(pattern) => pattern,
                Err(error) => {
                    warn!(step = step.key(), %error, "discarding step with a broken template");
                    continue;
                }
            };
            if let Ok(Some(captures)) = pattern.captures(literal) {
                located.push((Arc::clone(step), extract(&pattern, &captures)));
            }
        }
        match located.len() {
            1 => Ok(located.remove(0)),
            0 => Err(CrisolError::UndefinedStep {
                step: literal.to_owned(),
                hints: self.hinter.hint_for(literal, step_locale, data_locale),
            }),
            _ => {
                let candidates: Vec<String> = located
                    .iter()
                    .map(|(step, _)| {
                        step.template(step_locale).unwrap_or(step.key()).to_owned()
                    })
                    .collect();
                Err(CrisolError::AmbiguousStep {
                    step: literal.to_owned(),
                    candidates: candidates.join("\n\t"),
                })
            }
        }
    }
}

fn extract(pattern: &Regex, captures: &Captures<'_>) -> StepMatch {
    let mut values = IndexMap::new();
    for name in pattern.capture_names().flatten() {
        if let Some(found) = captures.name(name) {
            values.insert(name.to_owned(), found.as_str().to_owned());
        }
    }
    StepMatch { values }
}
