//! Compilación de plantillas de paso a expresiones regulares.
//!
//! Una plantilla escrita en lenguaje natural admite fragmentos opcionales
//! `(asi)`, alternancias `a|b|c`, comodines `*`, negaciones `(!x)` y
//! placeholders tipados `{nombre:tipo}` / `{tipo}`. La compilación aplica una
//! secuencia fija de transformaciones; el orden es contractual y cambiarlo
//! rompe la equivalencia entre plantillas.
//!
//! Los patrones compilados se memoizan por (plantilla, idioma, registro);
//! la caché es global y concurrente porque el catálogo queda congelado tras
//! el arranque.

use std::sync::Arc;

use dashmap::DashMap;
use fancy_regex::{Captures, Regex};
use once_cell::sync::Lazy;
use tracing::trace;
use uuid::Uuid;

use crisol_api::backend::UNNAMED_ARG;
use crisol_api::datatype::DataTypeRegistry;
use crisol_api::errors::CrisolError;

static ALTERNATION_GROUP: Lazy<Regex> = Lazy::new(|| lazy_regex(r"[^ |(]*(\|[^ |)]+)+"));
static UNESCAPED_WILDCARD: Lazy<Regex> = Lazy::new(|| lazy_regex(r"(?<!\\)\*"));
static OPTIONAL_GROUP: Lazy<Regex> = Lazy::new(|| lazy_regex(r"(?<!\\)\(([^!][^)]*)\)"));
static OPTIONAL_THEN_SPACE: Lazy<Regex> = Lazy::new(|| lazy_regex(r"\(\?:[^)]+\)\? "));
static NEGATION_GROUP: Lazy<Regex> = Lazy::new(|| lazy_regex(r"(?<!\\)\(!([^)]*)\)"));
static NAMED_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| lazy_regex(r"\{(\w+):(\w+-?\w+)\}"));
static UNNAMED_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| lazy_regex(r"\{(\w+-?\w+)\}"));
static DANGLING_NEGATION: Lazy<Regex> = Lazy::new(|| lazy_regex(r"\(\?!([^()]*)\)$"));

fn lazy_regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern")
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct CacheKey {
    template: String,
    locale: String,
    registry_id: Uuid,
}

static PATTERN_CACHE: Lazy<DashMap<CacheKey, Arc<Regex>>> = Lazy::new(DashMap::new);

/// Compila una plantilla para un idioma de datos, con memoización.
///
/// Entradas idénticas devuelven el mismo patrón cacheado.
pub fn compile(
    template: &str,
    registry: &DataTypeRegistry,
    locale: &str,
) -> Result<Arc<Regex>, CrisolError> {
    let key = CacheKey {
        template: template.trim().to_owned(),
        locale: locale.to_owned(),
        registry_id: registry.id(),
    };
    if let Some(cached) = PATTERN_CACHE.get(&key) {
        return Ok(Arc::clone(&cached));
    }
    let regex = compute_regex(&key.template, registry, locale)?;
    let pattern = Regex::new(&regex).map_err(|error| CrisolError::WrongStepDefinition {
        definition: key.template.clone(),
        reason: error.to_string(),
    })?;
    let pattern = Arc::new(pattern);
    PATTERN_CACHE.insert(key, Arc::clone(&pattern));
    Ok(pattern)
}

/// Texto de la regex resultante, sin compilar; visible para diagnóstico.
pub fn compute_regex(
    template: &str,
    registry: &DataTypeRegistry,
    locale: &str,
) -> Result<String, CrisolError> {
    let regex = prior_adjustments(template);
    let regex = argument_substitution(template, &regex, registry, locale)?;
    let regex = final_adjustments(&regex);
    trace!(template = %template, regex = %regex, "expression compiled");
    Ok(regex)
}

/// Casa un literal contra un patrón compilado; un error de backtracking se
/// trata como no-coincidencia.
pub fn matches(pattern: &Regex, literal: &str) -> bool {
    pattern.is_match(literal).unwrap_or(false)
}

fn prior_adjustments(source: &str) -> String {
    // a|b|c -> (a|b|c)
    let regex = ALTERNATION_GROUP.replace_all(source, |caps: &Captures| {
        format!("({})", caps.get(0).map(|m| m.as_str()).unwrap_or_default())
    });
    // (( -> ( y )) -> )
    let regex = regex.replace("((", "(").replace("))", ")");
    // * -> cualquier valor
    let regex = UNESCAPED_WILDCARD.replace_all(&regex, "(.*)");
    // (x) -> opcional, salvo negaciones
    let regex = OPTIONAL_GROUP
        .replace_all(&regex, |caps: &Captures| format!("(?:{})?", &caps[1]))
        .into_owned();
    // (?:x)? seguido de un espacio pliega el espacio dentro del opcional
    let regex = OPTIONAL_THEN_SPACE
        .replace_all(&regex, |caps: &Captures| format!("(?:{})?", &caps[0]))
        .into_owned();
    // _(?:.*)? -> (?:.*)?
    let regex = regex.replace(" (?:.*)?", "(?:.*)?");
    // (!x) -> ((?!x).)*
    NEGATION_GROUP
        .replace_all(&regex, |caps: &Captures| format!("((?!{}).)*", &caps[1]))
        .into_owned()
}

fn argument_substitution(
    template: &str,
    computing: &str,
    registry: &DataTypeRegistry,
    locale: &str,
) -> Result<String, CrisolError> {
    let mut regex = computing.to_owned();

    let unnamed = scan_groups(&UNNAMED_PLACEHOLDER, &regex)?;
    if unnamed.len() > 1 {
        return Err(CrisolError::WrongStepDefinition {
            definition: template.to_owned(),
            reason: "only one unnamed placeholder is allowed per template".into(),
        });
    }
    for type_name in unnamed {
        let data_type = lookup(registry, template, &type_name[0])?;
        let replacement = format!("(?<{UNNAMED_ARG}>{})", data_type.regex(locale)?);
        regex = regex.replace(&format!("{{{}}}", type_name[0]), &replacement);
    }

    for named in scan_groups(&NAMED_PLACEHOLDER, &regex)? {
        let (arg_name, type_name) = (&named[0], &named[1]);
        let data_type = lookup(registry, template, type_name)?;
        let replacement = format!("(?<{arg_name}>{})", data_type.regex(locale)?);
        regex = regex.replace(&format!("{{{arg_name}:{type_name}}}"), &replacement);
    }
    Ok(regex)
}

fn final_adjustments(computing: &str) -> String {
    let mut regex = computing.to_owned();
    // una plantilla puede anclar explícitamente con '$'; el anclaje lo pone
    // siempre el compilador, con tolerancia a espacios finales
    if let Some(stripped) = regex.strip_suffix(" $") {
        regex = stripped.to_owned();
    } else if let Some(stripped) = regex.strip_suffix('$') {
        regex = stripped.to_owned();
    }
    // un lookahead suelto pegado al ancla nunca consume; se completa con su
    // bucle consumidor
    let dangling = DANGLING_NEGATION.captures(&regex).ok().flatten().map(|caps| {
        let at = caps.get(0).map(|m| m.start()).unwrap_or(regex.len());
        (at, caps[1].to_owned())
    });
    if let Some((at, inner)) = dangling {
        regex.truncate(at);
        regex.push_str(&format!("((?!{inner}).)*"));
    }
    format!("^{regex}\\s*$")
}

fn scan_groups(scanner: &Regex, text: &str) -> Result<Vec<Vec<String>>, CrisolError> {
    let mut found = Vec::new();
    for caps in scanner.captures_iter(text) {
        let caps = caps.map_err(|error| CrisolError::Internal(error.to_string()))?;
        let groups: Vec<String> = (1..caps.len())
            .filter_map(|i| caps.get(i).map(|m| m.as_str().to_owned()))
            .collect();
        found.push(groups);
    }
    Ok(found)
}

fn lookup<'r>(
    registry: &'r DataTypeRegistry,
    template: &str,
    type_name: &str,
) -> Result<&'r Arc<dyn crisol_api::datatype::DataType>, CrisolError> {
    registry.get_type(type_name).ok_or_else(|| CrisolError::UnknownType {
        definition: template.to_owned(),
        type_name: type_name.to_owned(),
        available: registry.sorted_type_names(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::core_types;

    fn registry() -> DataTypeRegistry {
        let mut registry = DataTypeRegistry::new();
        registry.register_all(core_types()).unwrap();
        registry
    }

    #[test]
    fn prior_adjustments_follow_the_documented_order() {
        let source =
            "(que) el|la|lo|los|las siguiente(s) * se inserta(n) en la tabla de BBDD {word}:";
        assert_eq!(
            prior_adjustments(source),
            "(?:(?:que)? )?(?:(?:el|la|lo|los|las)? )?siguiente(?:(?:s)? )?(?:(?:.*)? )?\
             se inserta(?:(?:n)? )?en la tabla de BBDD {word}:"
        );
    }

    #[test]
    fn trailing_wildcard_folds_its_leading_space() {
        assert_eq!(
            prior_adjustments("se realiza la búsqueda *"),
            "se realiza la búsqueda(?:.*)?"
        );
    }

    #[test]
    fn negation_becomes_a_consuming_loop() {
        assert_eq!(prior_adjustments("elige (!rojo)"), "elige ((?!rojo).)*");
    }

    #[test]
    fn unnamed_placeholder_takes_the_reserved_capture_name() {
        let regex = compute_regex("inserta en {word}:", &registry(), "en").unwrap();
        assert!(regex.contains("(?<unnamed>"), "{regex}");
    }

    #[test]
    fn named_placeholder_keeps_its_own_capture_name() {
        let regex = compute_regex("given {n:int} users", &registry(), "en").unwrap();
        assert!(regex.contains("(?<n>"), "{regex}");
    }

    #[test]
    fn a_second_unnamed_placeholder_is_rejected() {
        let error = compute_regex("{word} con {text}", &registry(), "en");
        assert!(matches!(error, Err(CrisolError::WrongStepDefinition { .. })));
    }

    #[test]
    fn unknown_types_report_every_registered_name_sorted() {
        let registry = registry();
        let error = compute_regex("given {n:intt} users", &registry, "en").unwrap_err();
        let CrisolError::UnknownType { type_name, available, .. } = error else {
            panic!("expected UnknownType");
        };
        assert_eq!(type_name, "intt");
        let names: Vec<&str> = available.split(", ").collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert!(names.contains(&"int"));
        assert!(names.contains(&"text"));
    }

    #[test]
    fn compilation_is_idempotent() {
        let registry = registry();
        let first = compile("given {n:int} users", &registry, "en").unwrap();
        let second = compile("given {n:int} users", &registry, "en").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.as_str(), second.as_str());
    }

    #[test]
    fn distinct_registries_do_not_share_cache_entries() {
        let first = compile("given {n:int} users", &registry(), "en").unwrap();
        let second = compile("given {n:int} users", &registry(), "en").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.as_str(), second.as_str());
    }

    #[test]
    fn dangling_lookahead_is_completed_before_anchoring() {
        assert_eq!(final_adjustments("elige (?!rojo)"), "^elige ((?!rojo).)*\\s*$");
    }

    #[test]
    fn explicit_trailing_anchor_is_absorbed() {
        assert_eq!(final_adjustments("algo $"), "^algo\\s*$");
        assert_eq!(final_adjustments("algo"), "^algo\\s*$");
    }
}
