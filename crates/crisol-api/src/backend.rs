//! Contratos del ejecutor por escenario y de los contribuidores de pasos.
//!
//! Los contribuidores se ensamblan explícitamente al arrancar el proceso
//! (lista estática o inyectada); el motor solo necesita la lista plana
//! resultante. Cada caso de prueba recibe un `Backend` propio y efímero.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::datatype::DataTypeRegistry;
use crate::errors::{CrisolError, StepError};
use crate::plan::PlanNode;

/// Nombre de captura reservado para el único placeholder sin nombre `{tipo}`
/// que admite una plantilla.
pub const UNNAMED_ARG: &str = "unnamed";

/// Argumentos ya parseados de una invocación, en el orden declarado.
#[derive(Debug, Clone, Default)]
pub struct StepArguments {
    values: IndexMap<String, Value>,
}

impl StepArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn int(&self, name: &str) -> Result<i64, StepError> {
        self.get(name)
            .and_then(Value::as_i64)
            .ok_or_else(|| StepError::Failure(format!("missing integer argument '{name}'")))
    }

    pub fn decimal(&self, name: &str) -> Result<f64, StepError> {
        self.get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| StepError::Failure(format!("missing decimal argument '{name}'")))
    }

    pub fn text(&self, name: &str) -> Result<&str, StepError> {
        self.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| StepError::Failure(format!("missing text argument '{name}'")))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Contexto de solo lectura entregado al cuerpo de un paso.
///
/// `outputs` es la lista ordenada de salidas de los pasos previos del mismo
/// caso de prueba; nunca cruza la frontera de una ejecución.
pub struct StepContext<'a> {
    pub step_locale: &'a str,
    pub data_locale: &'a str,
    pub outputs: &'a [Value],
}

pub type StepHandler =
    Arc<dyn Fn(&StepArguments, &StepContext<'_>) -> Result<Value, StepError> + Send + Sync>;

pub type HookHandler = Arc<dyn Fn() -> Result<(), StepError> + Send + Sync>;

/// Definición de un paso aportada por un contribuidor: la clave estable,
/// una plantilla por idioma soportado, los argumentos declarados en orden
/// de invocación y el cuerpo.
#[derive(Clone)]
pub struct StepDef {
    pub key: String,
    pub templates: Vec<(String, String)>,
    pub arguments: Vec<(String, String)>,
    pub handler: StepHandler,
    pub void: bool,
}

impl StepDef {
    pub fn new(key: impl Into<String>, handler: StepHandler) -> Self {
        StepDef {
            key: key.into(),
            templates: Vec::new(),
            arguments: Vec::new(),
            handler,
            void: false,
        }
    }

    /// Paso declarado sin implementación; nunca se ejecuta y su resultado
    /// es siempre NOT_IMPLEMENTED.
    pub fn void(key: impl Into<String>) -> Self {
        let mut def = StepDef::new(key, Arc::new(|_, _| Ok(Value::Null)));
        def.void = true;
        def
    }

    pub fn template(mut self, locale: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.push((locale.into(), template.into()));
        self
    }

    pub fn arg(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.arguments.push((name.into(), type_name.into()));
        self
    }
}

/// Un contribuidor agrupa pasos y ganchos de preparación/limpieza.
#[derive(Clone)]
pub struct StepContributor {
    pub name: String,
    pub steps: Vec<StepDef>,
    pub set_up: Vec<HookHandler>,
    pub tear_down: Vec<HookHandler>,
}

impl StepContributor {
    pub fn new(name: impl Into<String>) -> Self {
        StepContributor {
            name: name.into(),
            steps: Vec::new(),
            set_up: Vec::new(),
            tear_down: Vec::new(),
        }
    }

    pub fn step(mut self, def: StepDef) -> Self {
        self.steps.push(def);
        self
    }

    pub fn on_set_up(mut self, hook: HookHandler) -> Self {
        self.set_up.push(hook);
        self
    }

    pub fn on_tear_down(mut self, hook: HookHandler) -> Self {
        self.tear_down.push(hook);
        self
    }
}

/// Ejecutor de los pasos de un caso de prueba.
///
/// Es transitorio: se crea uno nuevo por caso para aislar el estado mutable
/// (salidas previas, fallos acumulados). El catálogo y el registro que
/// comparte con otros backends son de solo lectura.
pub trait Backend: Send {
    /// Despacha una hoja (`Step` o `VirtualStep`) y registra su resultado en
    /// el propio nodo. `Err` solo ante un uso inválido (nodo no ejecutable);
    /// las averías de ejecución quedan en el nodo, no en el retorno.
    fn run_step(&mut self, step: &mut PlanNode) -> Result<(), CrisolError>;

    /// Ganchos de preparación, una vez antes del primer paso.
    fn set_up(&mut self);

    /// Ganchos de limpieza, exactamente una vez tras el último paso.
    fn tear_down(&mut self);

    fn type_registry(&self) -> &Arc<DataTypeRegistry>;
}

pub trait BackendFactory: Send + Sync {
    fn create_backend(&self, test_case: &PlanNode) -> Box<dyn Backend>;
}
