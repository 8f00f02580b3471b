//! Fachada de alto nivel: registro de tipos, catálogo de pasos y runner
//! ensamblados en una sola pieza lista para usar.

use std::sync::Arc;

use crisol_api::backend::{BackendFactory, StepContributor};
use crisol_api::datatype::DataTypeRegistry;
use crisol_api::errors::CrisolError;
use crisol_api::event::EventObserver;
use crisol_api::plan::{ExecutionResult, PlanNode};

use crate::backend::DefaultBackendFactory;
use crate::datatypes::core_types;
use crate::resolver::{StepMatch, StepResolver};
use crate::runner::PlanRunner;
use crate::step::RunnableStep;

pub struct Engine {
    registry: Arc<DataTypeRegistry>,
    factory: Arc<DefaultBackendFactory>,
    runner: PlanRunner,
}

impl Engine {
    pub fn new(registry: DataTypeRegistry, contributors: Vec<StepContributor>) -> Self {
        let registry = Arc::new(registry);
        let factory = Arc::new(DefaultBackendFactory::new(Arc::clone(&registry), contributors));
        let runner = PlanRunner::new(Arc::clone(&factory) as Arc<dyn BackendFactory>);
        Engine { registry, factory, runner }
    }

    /// Motor con el catálogo de tipos incorporado ya registrado.
    pub fn with_core_types(contributors: Vec<StepContributor>) -> Result<Self, CrisolError> {
        let mut registry = DataTypeRegistry::new();
        registry.register_all(core_types())?;
        Ok(Engine::new(registry, contributors))
    }

    pub fn with_observer(mut self, observer: Arc<dyn EventObserver>) -> Self {
        self.runner = self.runner.with_observer(observer);
        self
    }

    pub fn registry(&self) -> &Arc<DataTypeRegistry> {
        &self.registry
    }

    pub fn resolver(&self) -> &Arc<StepResolver> {
        self.factory.resolver()
    }

    /// Resolución directa de un literal, útil para validar planes sin
    /// ejecutarlos.
    pub fn resolve(
        &self,
        literal: &str,
        step_locale: &str,
        data_locale: &str,
    ) -> Result<(Arc<RunnableStep>, StepMatch), CrisolError> {
        self.factory.resolver().resolve(literal, step_locale, data_locale)
    }

    pub fn run(&self, plan: &mut PlanNode) -> Option<ExecutionResult> {
        self.runner.run(plan)
    }

    pub fn run_parallel(&self, plan: &mut PlanNode) -> Option<ExecutionResult> {
        self.runner.run_parallel(plan)
    }
}
