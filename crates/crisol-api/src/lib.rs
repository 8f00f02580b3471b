//! crisol-api: modelo de datos y contratos compartidos del motor de pruebas.
//!
//! Este crate define lo que comparten el motor y sus colaboradores externos:
//! - `plan`: el árbol de nodos del plan de pruebas y sus resultados.
//! - `datatype`: tipos de dato con regex/parser por idioma y su registro.
//! - `backend`: contratos del ejecutor por escenario y de los contribuidores
//!   de pasos.
//! - `event`: eventos de ciclo de vida publicados durante una ejecución.
//! - `errors`: errores del núcleo.
//!
//! No contiene lógica de ejecución; esa vive en `crisol-core`.

pub mod backend;
pub mod datatype;
pub mod errors;
pub mod event;
pub mod plan;

pub use backend::{
    Backend, BackendFactory, HookHandler, StepArguments, StepContext, StepContributor, StepDef,
    StepHandler,
};
pub use datatype::{DataType, DataTypeRegistry, ValueType};
pub use errors::{CrisolError, StepError};
pub use event::{CollectingObserver, Event, EventKind, EventObserver};
pub use plan::{
    ExecutionResult, ExecutionState, NodeType, PlanNode, PlanNodeSnapshot, DATA_FORMAT_LANGUAGE,
};
