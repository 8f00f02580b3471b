//! Paso ejecutable: plantillas traducidas, firma de argumentos y handler.

use std::sync::Arc;

use fancy_regex::Regex;
use indexmap::IndexMap;
use serde_json::Value;

use crisol_api::backend::{StepArguments, StepContext, StepDef, StepHandler};
use crisol_api::datatype::DataTypeRegistry;
use crisol_api::errors::{CrisolError, StepError};

use crate::expression;

pub struct RunnableStep {
    provider: String,
    key: String,
    templates: IndexMap<String, String>,
    arguments: Vec<(String, String)>,
    handler: StepHandler,
    void: bool,
}

impl std::fmt::Debug for RunnableStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnableStep")
            .field("provider", &self.provider)
            .field("key", &self.key)
            .field("templates", &self.templates)
            .field("arguments", &self.arguments)
            .field("void", &self.void)
            .finish_non_exhaustive()
    }
}

impl RunnableStep {
    pub fn from_def(provider: &str, def: StepDef) -> Self {
        let templates = def
            .templates
            .into_iter()
            .map(|(locale, template)| (locale, template.trim().to_owned()))
            .collect();
        RunnableStep {
            provider: provider.to_owned(),
            key: def.key,
            templates,
            arguments: def.arguments,
            handler: def.handler,
            void: def.void,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn arguments(&self) -> &[(String, String)] {
        &self.arguments
    }

    pub fn is_void(&self) -> bool {
        self.void
    }

    /// Plantilla para el idioma pedido; si no hay entrada exacta se intenta
    /// el subtag de lengua (`es-ES` -> `es`).
    pub fn template(&self, locale: &str) -> Result<&str, CrisolError> {
        if let Some(template) = self.templates.get(locale) {
            return Ok(template);
        }
        let language = locale.split(['-', '_']).next().unwrap_or(locale);
        self.templates
            .get(language)
            .map(String::as_str)
            .ok_or_else(|| CrisolError::MissingTranslation {
                key: self.key.clone(),
                locale: locale.to_owned(),
            })
    }

    pub fn pattern(
        &self,
        step_locale: &str,
        data_locale: &str,
        registry: &DataTypeRegistry,
    ) -> Result<Arc<Regex>, CrisolError> {
        expression::compile(self.template(step_locale)?, registry, data_locale)
    }

    pub fn run(&self, args: &StepArguments, ctx: &StepContext<'_>) -> Result<Value, StepError> {
        if args.len() != self.arguments.len() {
            let expected: Vec<&str> = self.arguments.iter().map(|(name, _)| name.as_str()).collect();
            let received: Vec<&str> = args.iter().map(|(name, _)| name).collect();
            return Err(StepError::Failure(
                CrisolError::WrongArguments {
                    expected: expected.join(", "),
                    received: received.join(", "),
                }
                .to_string(),
            ));
        }
        (self.handler)(args, ctx)
    }
}
