//! Catálogo de tipos de dato incorporados.
//!
//! `core_types()` devuelve el conjunto completo listo para registrar. Los
//! tipos numéricos varían con el idioma de los datos; el resto usa regex
//! fijas e independientes del idioma.

pub mod base;
pub mod number;

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use crisol_api::datatype::{DataType, ValueType};

use base::{DataTypeBase, LocaleParser};
use number::{decimal_type, integer_type};

/// Texto entre comillas dobles o simples, con escapes `\"` y `\'`.
pub const TEXT_REGEX: &str = r#""([^"\\]*(\\.[^"\\]*)*)"|'([^'\\]*(\\.[^'\\]*)*)'"#;
pub const WORD_REGEX: &str = r"[\w-]+";
pub const ID_REGEX: &str = r"\w+";
pub const URL_REGEX: &str = r"(https?|ftp)://[\w.-]+(:\d+)?(/[^\s]*)?";
pub const DATE_REGEX: &str = r"\d{4}-\d{2}-\d{2}";
pub const TIME_REGEX: &str = r"\d{2}:\d{2}(:\d{2})?";
pub const DATETIME_REGEX: &str = r"\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}(:\d{2})?";

/// Quita las comillas envolventes y deshace los escapes internos.
pub fn unescape_quoted(value: &str) -> String {
    let inner = if value.len() >= 2 { &value[1..value.len() - 1] } else { value };
    inner.replace("\\\"", "\"").replace("\\'", "'")
}

pub fn core_types() -> Vec<Arc<dyn DataType>> {
    vec![
        integer_type("int"),
        integer_type("integer"),
        integer_type("long"),
        decimal_type("decimal"),
        decimal_type("float"),
        decimal_type("double"),
        quoted_type("text"),
        quoted_type("string"),
        plain_type("word", ValueType::String, WORD_REGEX, "some-word"),
        plain_type("id", ValueType::String, ID_REGEX, "someId"),
        quoted_file_type(),
        plain_type("url", ValueType::Url, URL_REGEX, "https://example.org/path"),
        temporal_type("date", ValueType::Date, DATE_REGEX, "2024-05-31", parse_date),
        temporal_type("time", ValueType::Time, TIME_REGEX, "17:35:00", parse_time),
        temporal_type(
            "datetime",
            ValueType::DateTime,
            DATETIME_REGEX,
            "2024-05-31T17:35:00",
            parse_datetime,
        ),
    ]
}

fn quoted_type(name: &str) -> Arc<dyn DataType> {
    Arc::new(DataTypeBase::new(
        name,
        ValueType::String,
        Box::new(|_| TEXT_REGEX.to_owned()),
        Box::new(|_| vec!["'some text'".to_owned(), "\"some text\"".to_owned()]),
        Box::new(|_| Arc::new(|value: &str| Ok(Value::String(unescape_quoted(value))))),
    ))
}

fn quoted_file_type() -> Arc<dyn DataType> {
    Arc::new(DataTypeBase::new(
        "file",
        ValueType::File,
        Box::new(|_| TEXT_REGEX.to_owned()),
        Box::new(|_| vec!["'path/to/file'".to_owned()]),
        Box::new(|_| Arc::new(|value: &str| Ok(Value::String(unescape_quoted(value))))),
    ))
}

fn plain_type(
    name: &str,
    value_type: ValueType,
    regex: &'static str,
    hint: &'static str,
) -> Arc<dyn DataType> {
    Arc::new(DataTypeBase::new(
        name,
        value_type,
        Box::new(move |_| regex.to_owned()),
        Box::new(move |_| vec![hint.to_owned()]),
        Box::new(|_| Arc::new(|value: &str| Ok(Value::String(value.to_owned())))),
    ))
}

fn temporal_type(
    name: &str,
    value_type: ValueType,
    regex: &'static str,
    hint: &'static str,
    parser: fn(&str) -> Result<Value, String>,
) -> Arc<dyn DataType> {
    Arc::new(DataTypeBase::new(
        name,
        value_type,
        Box::new(move |_| regex.to_owned()),
        Box::new(move |_| vec![hint.to_owned()]),
        Box::new(move |_| -> LocaleParser { Arc::new(move |value: &str| parser(value)) }),
    ))
}

fn parse_date(value: &str) -> Result<Value, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| Value::String(date.to_string()))
        .map_err(|error| error.to_string())
}

fn parse_time(value: &str) -> Result<Value, String> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map(|time| Value::String(time.to_string()))
        .map_err(|error| error.to_string())
}

fn parse_datetime(value: &str) -> Result<Value, String> {
    const FORMATS: [&str; 4] =
        ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|at| Value::String(at.format("%Y-%m-%dT%H:%M:%S").to_string()))
        .ok_or_else(|| format!("'{value}' is not a valid date-time"))
}
