//! Backend por defecto: despacha cada hoja del caso de prueba contra el
//! catálogo de pasos.
//!
//! Un backend vive exactamente lo que dura un caso de prueba. La resolución
//! de pasos ocurre en el momento del despacho: un paso sin definición o
//! ambiguo deja UNDEFINED en su propio nodo y no impide ejecutar el resto;
//! solo FAILED y ERROR activan el corte por fallo que salta los pasos
//! posteriores como SKIPPED.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

use crisol_api::backend::{
    Backend, BackendFactory, HookHandler, StepArguments, StepContext, StepContributor,
};
use crisol_api::datatype::DataTypeRegistry;
use crisol_api::errors::{CrisolError, StepError};
use crisol_api::plan::{ExecutionResult, NodeType, PlanNode, DATA_FORMAT_LANGUAGE};

use crate::resolver::{StepMatch, StepResolver};
use crate::step::RunnableStep;

pub struct DefaultBackend {
    test_case_id: Uuid,
    test_case_name: String,
    step_ids: HashSet<Uuid>,
    test_case_properties: IndexMap<String, String>,
    registry: Arc<DataTypeRegistry>,
    resolver: Arc<StepResolver>,
    set_up: Vec<HookHandler>,
    tear_down: Vec<HookHandler>,
    outputs: Vec<Value>,
    has_failures: bool,
}

impl DefaultBackend {
    /// Un backend solo despacha hojas de su propio caso de prueba; aceptar
    /// una ajena aplicaría el corte por fallo y las salidas de otro caso.
    fn validate_membership(&self, step: &PlanNode) -> Result<(), CrisolError> {
        if self.step_ids.contains(&step.id) {
            return Ok(());
        }
        Err(CrisolError::ForeignStep {
            step: step.name.clone(),
            test_case: self.test_case_name.clone(),
        })
    }

    /// Idioma de los datos del paso, con herencia del caso de prueba y
    /// último recurso en el idioma del propio paso.
    fn data_locale<'a>(&'a self, step: &'a PlanNode) -> &'a str {
        step.properties
            .get(DATA_FORMAT_LANGUAGE)
            .or_else(|| self.test_case_properties.get(DATA_FORMAT_LANGUAGE))
            .map(String::as_str)
            .unwrap_or(&step.language)
    }

    fn dispatch(&mut self, step: &mut PlanNode) {
        let started_at = Utc::now();
        if let Err(error) = step.execution.mark_started(started_at) {
            error!(%error, step = %step.name, "step already started");
            return;
        }
        let step_locale = step.language.clone();
        let data_locale = self.data_locale(step).to_owned();

        let resolved = self.resolver.resolve(&step.name, &step_locale, &data_locale);
        let (runnable, captured) = match resolved {
            Ok(found) => found,
            Err(error @ (CrisolError::UndefinedStep { .. } | CrisolError::AmbiguousStep { .. })) => {
                finish(step, ExecutionResult::Undefined, Some(error.to_string()), None);
                return;
            }
            Err(error) => {
                self.has_failures = true;
                finish(step, ExecutionResult::Error, Some(error.to_string()), None);
                return;
            }
        };

        if runnable.is_void() {
            finish(step, ExecutionResult::NotImplemented, None, None);
            return;
        }

        let args = match self.build_arguments(&runnable, &captured, &data_locale) {
            Ok(args) => args,
            Err(error) => {
                self.has_failures = true;
                finish(step, ExecutionResult::Error, Some(error.to_string()), None);
                return;
            }
        };

        let ctx = StepContext {
            step_locale: &step_locale,
            data_locale: &data_locale,
            outputs: &self.outputs,
        };
        match runnable.run(&args, &ctx) {
            Ok(output) => {
                self.outputs.push(output);
                finish(step, ExecutionResult::Passed, None, None);
            }
            Err(StepError::Assertion(message)) => {
                self.has_failures = true;
                finish(step, ExecutionResult::Failed, Some(message), None);
            }
            Err(StepError::Failure(message)) => {
                self.has_failures = true;
                let trace = format!("step '{}' provided by '{}'", runnable.key(), runnable.provider());
                finish(step, ExecutionResult::Error, Some(message), Some(trace));
            }
        }
    }

    fn build_arguments(
        &self,
        runnable: &RunnableStep,
        captured: &StepMatch,
        data_locale: &str,
    ) -> Result<StepArguments, CrisolError> {
        let mut args = StepArguments::new();
        for (name, type_name) in runnable.arguments() {
            let raw = captured.get(name).ok_or_else(|| CrisolError::WrongArguments {
                expected: name.clone(),
                received: captured.values().map(|(n, _)| n).collect::<Vec<_>>().join(", "),
            })?;
            let data_type =
                self.registry.get_type(type_name).ok_or_else(|| CrisolError::UnknownType {
                    definition: runnable.key().to_owned(),
                    type_name: type_name.clone(),
                    available: self.registry.sorted_type_names(),
                })?;
            args.insert(name.clone(), data_type.parse(data_locale, raw)?);
        }
        Ok(args)
    }

    fn run_hooks(hooks: &[HookHandler], stage: &str) {
        for hook in hooks {
            if let Err(failure) = hook() {
                error!(stage, %failure, "hook failed");
            }
        }
    }
}

impl Backend for DefaultBackend {
    fn run_step(&mut self, step: &mut PlanNode) -> Result<(), CrisolError> {
        match step.node_type {
            NodeType::VirtualStep => {
                self.validate_membership(step)?;
                let now = Utc::now();
                step.execution.mark_started(now)?;
                step.execution.mark_finished(now, ExecutionResult::NotImplemented)?;
                Ok(())
            }
            NodeType::Step if self.has_failures => {
                self.validate_membership(step)?;
                let now = Utc::now();
                step.execution.mark_started(now)?;
                step.execution.mark_finished(now, ExecutionResult::Skipped)?;
                debug!(step = %step.name, "skipped after previous failure");
                Ok(())
            }
            NodeType::Step => {
                self.validate_membership(step)?;
                self.dispatch(step);
                Ok(())
            }
            other => {
                debug!(node = %step.name, test_case = %self.test_case_id, "not a step");
                Err(CrisolError::NotExecutable(other.to_string()))
            }
        }
    }

    fn set_up(&mut self) {
        Self::run_hooks(&self.set_up, "set-up");
    }

    fn tear_down(&mut self) {
        Self::run_hooks(&self.tear_down, "tear-down");
    }

    fn type_registry(&self) -> &Arc<DataTypeRegistry> {
        &self.registry
    }
}

fn finish(step: &mut PlanNode, result: ExecutionResult, message: Option<String>, trace: Option<String>) {
    if let Err(error) = step.execution.mark_finished_with_error(Utc::now(), result, message, trace) {
        error!(%error, step = %step.name, "step already finished");
    }
}

/// Construye el catálogo una sola vez y produce un backend nuevo por caso.
pub struct DefaultBackendFactory {
    registry: Arc<DataTypeRegistry>,
    resolver: Arc<StepResolver>,
    set_up: Vec<HookHandler>,
    tear_down: Vec<HookHandler>,
}

impl DefaultBackendFactory {
    pub fn new(registry: Arc<DataTypeRegistry>, contributors: Vec<StepContributor>) -> Self {
        let mut steps: Vec<Arc<RunnableStep>> = Vec::new();
        let mut set_up = Vec::new();
        let mut tear_down = Vec::new();
        for contributor in contributors {
            set_up.extend(contributor.set_up);
            tear_down.extend(contributor.tear_down);
            for def in contributor.steps {
                steps.push(Arc::new(RunnableStep::from_def(&contributor.name, def)));
            }
        }
        let resolver = Arc::new(StepResolver::new(Arc::clone(&registry), steps));
        DefaultBackendFactory { registry, resolver, set_up, tear_down }
    }

    pub fn resolver(&self) -> &Arc<StepResolver> {
        &self.resolver
    }

    pub fn registry(&self) -> &Arc<DataTypeRegistry> {
        &self.registry
    }
}

impl BackendFactory for DefaultBackendFactory {
    fn create_backend(&self, test_case: &PlanNode) -> Box<dyn Backend> {
        Box::new(DefaultBackend {
            test_case_id: test_case.id,
            test_case_name: test_case.name.clone(),
            step_ids: test_case.descendants().iter().map(|node| node.id).collect(),
            test_case_properties: test_case.properties.clone(),
            registry: Arc::clone(&self.registry),
            resolver: Arc::clone(&self.resolver),
            set_up: self.set_up.clone(),
            tear_down: self.tear_down.clone(),
            outputs: Vec::new(),
            has_failures: false,
        })
    }
}
