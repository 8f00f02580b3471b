//! Tipos de dato y su registro.
//!
//! Un `DataType` reconoce el texto capturado por un placeholder `{tipo}` y lo
//! convierte a un valor. Tanto la regex como el parser dependen del idioma de
//! los datos. Los valores se transportan borrados como `serde_json::Value`.
//!
//! El registro se construye una vez al arrancar y queda congelado; las
//! lecturas concurrentes no necesitan sincronización.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::CrisolError;

/// Clase de valor que produce un tipo al parsear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Integer,
    Decimal,
    Date,
    Time,
    DateTime,
    File,
    Url,
}

pub trait DataType: Send + Sync {
    /// Nombre único con el que se referencia en las plantillas.
    fn name(&self) -> &str;

    fn value_type(&self) -> ValueType;

    /// Fragmento de regex que reconoce el tipo en el idioma dado.
    fn regex(&self, locale: &str) -> Result<String, CrisolError>;

    /// Convierte el texto capturado a un valor.
    fn parse(&self, locale: &str, value: &str) -> Result<Value, CrisolError>;

    /// Ejemplos legibles usados al expandir sugerencias de pasos.
    fn hints(&self, locale: &str) -> Vec<String>;
}

/// Registro nombre -> tipo, en orden de registro.
pub struct DataTypeRegistry {
    id: Uuid,
    types: IndexMap<String, Arc<dyn DataType>>,
}

impl Default for DataTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DataTypeRegistry {
    pub fn new() -> Self {
        DataTypeRegistry { id: Uuid::new_v4(), types: IndexMap::new() }
    }

    /// Identidad del registro; participa en la clave de la caché de
    /// expresiones compiladas.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn register(&mut self, data_type: Arc<dyn DataType>) -> Result<(), CrisolError> {
        let name = data_type.name().to_owned();
        if self.types.contains_key(&name) {
            return Err(CrisolError::DuplicateType(name));
        }
        self.types.insert(name, data_type);
        Ok(())
    }

    pub fn register_all<I>(&mut self, types: I) -> Result<(), CrisolError>
    where
        I: IntoIterator<Item = Arc<dyn DataType>>,
    {
        for data_type in types {
            self.register(data_type)?;
        }
        Ok(())
    }

    pub fn get_type(&self, name: &str) -> Option<&Arc<dyn DataType>> {
        self.types.get(name)
    }

    /// Secuencia finita y reiniciable de los tipos que producen la clase
    /// de valor dada; cada llamada devuelve un iterador nuevo.
    pub fn types_for_value(
        &self,
        value_type: ValueType,
    ) -> impl Iterator<Item = &Arc<dyn DataType>> + '_ {
        self.types.values().filter(move |t| t.value_type() == value_type)
    }

    pub fn types(&self) -> impl Iterator<Item = &Arc<dyn DataType>> + '_ {
        self.types.values()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.types.keys().map(String::as_str)
    }

    /// Nombres registrados, ordenados y unidos por comas (para diagnósticos).
    pub fn sorted_type_names(&self) -> String {
        let mut names: Vec<&str> = self.type_names().collect();
        names.sort_unstable();
        names.join(", ")
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
