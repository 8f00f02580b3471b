//! Implementación genérica de [`DataType`] basada en proveedores por idioma.
//!
//! Regex, hints y parser se derivan del idioma bajo demanda y se memoizan,
//! de modo que cada combinación (tipo, idioma) se calcula una sola vez.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use crisol_api::datatype::{DataType, ValueType};
use crisol_api::errors::CrisolError;

pub type RegexProvider = Box<dyn Fn(&str) -> String + Send + Sync>;
pub type HintProvider = Box<dyn Fn(&str) -> Vec<String> + Send + Sync>;
pub type LocaleParser = Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;
pub type ParserProvider = Box<dyn Fn(&str) -> LocaleParser + Send + Sync>;

pub struct DataTypeBase {
    name: String,
    value_type: ValueType,
    regex_provider: RegexProvider,
    hint_provider: HintProvider,
    parser_provider: ParserProvider,
    regex_cache: DashMap<String, String>,
    hint_cache: DashMap<String, Vec<String>>,
    parser_cache: DashMap<String, LocaleParser>,
}

impl DataTypeBase {
    pub fn new(
        name: impl Into<String>,
        value_type: ValueType,
        regex_provider: RegexProvider,
        hint_provider: HintProvider,
        parser_provider: ParserProvider,
    ) -> Self {
        DataTypeBase {
            name: name.into(),
            value_type,
            regex_provider,
            hint_provider,
            parser_provider,
            regex_cache: DashMap::new(),
            hint_cache: DashMap::new(),
            parser_cache: DashMap::new(),
        }
    }
}

impl DataType for DataTypeBase {
    fn name(&self) -> &str {
        &self.name
    }

    fn value_type(&self) -> ValueType {
        self.value_type
    }

    fn regex(&self, locale: &str) -> Result<String, CrisolError> {
        let regex = self
            .regex_cache
            .entry(locale.to_owned())
            .or_insert_with(|| (self.regex_provider)(locale))
            .clone();
        Ok(regex)
    }

    fn parse(&self, locale: &str, value: &str) -> Result<Value, CrisolError> {
        let parser = self
            .parser_cache
            .entry(locale.to_owned())
            .or_insert_with(|| (self.parser_provider)(locale))
            .clone();
        parser(value).map_err(|reason| {
            debug!(type_name = %self.name, locale, value, %reason, "value rejected");
            CrisolError::TypeParse {
                type_name: self.name.clone(),
                locale: locale.to_owned(),
                value: value.to_owned(),
                hints: self.hints(locale).join(", "),
            }
        })
    }

    fn hints(&self, locale: &str) -> Vec<String> {
        self.hint_cache
            .entry(locale.to_owned())
            .or_insert_with(|| (self.hint_provider)(locale))
            .clone()
    }
}
