//! Tipos numéricos sensibles al idioma de los datos.
//!
//! El separador de miles y el decimal dependen del idioma: `1.234,56` en
//! español es `1,234.56` en inglés. Regex y parser se generan a partir de la
//! misma tabla de símbolos para que nunca diverjan.

use std::sync::Arc;

use serde_json::Value;

use crisol_api::datatype::{DataType, ValueType};

use super::base::DataTypeBase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberSymbols {
    pub grouping: char,
    pub decimal: char,
}

/// Símbolos numéricos del idioma; solo cuenta el subtag de lengua.
pub fn symbols(locale: &str) -> NumberSymbols {
    let language = locale.split(['-', '_']).next().unwrap_or(locale);
    match language {
        "es" | "de" | "it" | "pt" | "nl" | "fr" => NumberSymbols { grouping: '.', decimal: ',' },
        _ => NumberSymbols { grouping: ',', decimal: '.' },
    }
}

/// Regex de un número con agrupación de miles opcional.
pub fn numeric_regex(locale: &str, include_decimals: bool) -> String {
    let symbols = symbols(locale);
    let mut pattern = format!(r"-?\d{{1,3}}(\{}?\d{{1,3}})*", symbols.grouping);
    if include_decimals {
        pattern.push_str(&format!(r"\{}\d+?", symbols.decimal));
    }
    pattern
}

pub fn parse_integer(symbols: NumberSymbols, value: &str) -> Result<Value, String> {
    let clean: String = value.chars().filter(|c| *c != symbols.grouping).collect();
    clean
        .parse::<i64>()
        .map(Value::from)
        .map_err(|error| error.to_string())
}

pub fn parse_decimal(symbols: NumberSymbols, value: &str) -> Result<Value, String> {
    let clean: String = value
        .chars()
        .filter(|c| *c != symbols.grouping)
        .map(|c| if c == symbols.decimal { '.' } else { c })
        .collect();
    clean
        .parse::<f64>()
        .map(Value::from)
        .map_err(|error| error.to_string())
}

pub fn integer_type(name: &str) -> Arc<dyn DataType> {
    Arc::new(DataTypeBase::new(
        name,
        ValueType::Integer,
        Box::new(|locale| numeric_regex(locale, false)),
        Box::new(|locale| {
            let symbols = symbols(locale);
            vec!["-7".to_owned(), format!("12{}345", symbols.grouping)]
        }),
        Box::new(|locale| {
            let symbols = symbols(locale);
            Arc::new(move |value: &str| parse_integer(symbols, value))
        }),
    ))
}

pub fn decimal_type(name: &str) -> Arc<dyn DataType> {
    Arc::new(DataTypeBase::new(
        name,
        ValueType::Decimal,
        Box::new(|locale| numeric_regex(locale, true)),
        Box::new(|locale| {
            let symbols = symbols(locale);
            vec![
                format!("3{}14", symbols.decimal),
                format!("12{}345{}67", symbols.grouping, symbols.decimal),
            ]
        }),
        Box::new(|locale| {
            let symbols = symbols(locale);
            Arc::new(move |value: &str| parse_decimal(symbols, value))
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::matches;
    use fancy_regex::Regex;
    use serde_json::json;

    fn full_match(pattern: &str, value: &str) -> bool {
        let regex = Regex::new(&format!("^{pattern}$")).unwrap();
        matches(&regex, value)
    }

    #[test]
    fn english_integers_use_comma_grouping() {
        let regex = numeric_regex("en", false);
        assert!(full_match(&regex, "12345"));
        assert!(full_match(&regex, "12,345"));
        assert!(full_match(&regex, "-7"));
        assert!(!full_match(&regex, "12.345,67"));
    }

    #[test]
    fn spanish_decimals_use_dot_grouping_and_comma_decimal() {
        let regex = numeric_regex("es", true);
        assert!(full_match(&regex, "12.345,67"));
        assert!(full_match(&regex, "3,14"));
        assert!(!full_match(&regex, "12345"));
    }

    #[test]
    fn parse_honours_locale_symbols() {
        assert_eq!(parse_integer(symbols("en"), "12,345").unwrap(), json!(12345));
        assert_eq!(parse_integer(symbols("es"), "12.345").unwrap(), json!(12345));
        assert_eq!(parse_decimal(symbols("en"), "12,345.67").unwrap(), json!(12345.67));
        assert_eq!(parse_decimal(symbols("es"), "12.345,67").unwrap(), json!(12345.67));
    }

    #[test]
    fn integer_type_rejects_fractional_text() {
        let data_type = integer_type("int");
        assert!(data_type.parse("en", "3.14").is_err());
        assert_eq!(data_type.parse("en", "42").unwrap(), json!(42));
    }
}
