//! Sugerencias para pasos que no casan con ninguna plantilla.
//!
//! La similitud se puntúa por subcadenas comunes: se extrae repetidamente el
//! mayor fragmento compartido entre ambas cadenas y se acumula su longitud.
//! Es tolerante a palabras reordenadas, cosa que una distancia de edición
//! clásica penaliza en exceso.

use std::collections::HashSet;
use std::sync::Arc;

use fancy_regex::Regex;
use tracing::warn;

use crisol_api::datatype::{DataType, DataTypeRegistry};

use crate::step::RunnableStep;

const MAX_SUGGESTIONS: usize = 5;

/// Puntuación de similitud en [0, 1]; insensible a mayúsculas.
pub fn similarity(first: &str, second: &str) -> f64 {
    let first: Vec<char> = first.to_lowercase().chars().collect();
    let second: Vec<char> = second.to_lowercase().chars().collect();
    let total = first.len() + second.len();
    if total == 0 {
        return 1.0;
    }
    let mut base_stack = vec![first];
    let mut input_stack = vec![second];
    let mut matched = 0usize;
    while !base_stack.is_empty() && !input_stack.is_empty() {
        matched += largest_common_fragment(&mut base_stack, &mut input_stack);
    }
    (2 * matched) as f64 / total as f64
}

/// Ordena los candidatos de mayor a menor similitud con `text`.
pub fn closer_strings(
    text: &str,
    candidates: impl IntoIterator<Item = String>,
    limit: Option<usize>,
) -> Vec<String> {
    let mut scored: Vec<(f64, String)> = candidates
        .into_iter()
        .map(|candidate| (similarity(text, &candidate), candidate))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    let mut ranked: Vec<String> = scored.into_iter().map(|(_, candidate)| candidate).collect();
    if let Some(limit) = limit {
        ranked.truncate(limit);
    }
    ranked
}

fn largest_common_fragment(base: &mut Vec<Vec<char>>, input: &mut Vec<Vec<char>>) -> usize {
    let (Some(first), Some(second)) = (base.pop(), input.pop()) else {
        return 0;
    };
    let mut window = first.len().min(second.len());
    while window > 0 {
        let mut at = 0;
        while at + window <= first.len() {
            if let Some(found) = find_fragment(&second, &first[at..at + window]) {
                push_remainders(base, &first, at, window);
                push_remainders(input, &second, found, window);
                return window;
            }
            at += 1;
        }
        window -= 1;
    }
    0
}

fn find_fragment(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

fn push_remainders(stack: &mut Vec<Vec<char>>, source: &[char], at: usize, len: usize) {
    for fragment in [&source[..at], &source[at + len..]] {
        if !fragment.is_empty() {
            stack.push(fragment.to_vec());
        }
    }
}

pub struct StepHinter {
    registry: Arc<DataTypeRegistry>,
    steps: Vec<Arc<RunnableStep>>,
}

impl StepHinter {
    pub fn new(registry: Arc<DataTypeRegistry>, steps: Vec<Arc<RunnableStep>>) -> Self {
        StepHinter { registry, steps }
    }

    /// Plantillas disponibles en un idioma, tal cual o expandidas por tipo.
    pub fn available_steps(&self, locale: &str, include_variations: bool) -> Vec<String> {
        self.suggestions("", locale, locale, None, include_variations)
    }

    /// Candidatas ordenadas por cercanía al paso inválido. Con variaciones,
    /// cada placeholder se reemplaza por los valores de muestra de su tipo.
    pub fn suggestions(
        &self,
        invalid: &str,
        step_locale: &str,
        data_locale: &str,
        limit: Option<usize>,
        include_variations: bool,
    ) -> Vec<String> {
        let type_patterns = self.type_patterns();
        let mut hints: HashSet<String> = HashSet::new();
        for step in &self.steps {
            let Ok(template) = step.template(step_locale) else {
                continue;
            };
            if include_variations {
                expand(template, data_locale, &type_patterns, &mut hints);
            } else {
                hints.insert(template.to_owned());
            }
        }
        closer_strings(invalid, hints, limit)
    }

    /// Mensaje multilínea listo para adjuntar a un error de paso no definido.
    pub fn hint_for(&self, invalid: &str, step_locale: &str, data_locale: &str) -> String {
        let mut suggestions = self.suggestions(invalid, step_locale, data_locale, None, true);
        if suggestions.len() > MAX_SUGGESTIONS {
            suggestions =
                self.suggestions(invalid, step_locale, data_locale, Some(MAX_SUGGESTIONS), false);
        }
        let mut hint = String::from("Perhaps you mean one of the following:\n\t----------\n\t");
        for suggestion in suggestions {
            hint.push_str(&suggestion);
            hint.push_str("\n\t");
        }
        hint
    }

    fn type_patterns(&self) -> Vec<(Arc<dyn DataType>, Regex)> {
        self.registry
            .types()
            .filter_map(|data_type| {
                let pattern = format!(r"\{{[^:{{}}]*:?{}\}}", data_type.name());
                match Regex::new(&pattern) {
                    Ok(regex) => Some((Arc::clone(data_type), regex)),
                    Err(error) => {
                        warn!(type_name = data_type.name(), %error, "unusable type pattern");
                        None
                    }
                }
            })
            .collect()
    }
}

fn expand(
    template: &str,
    locale: &str,
    types: &[(Arc<dyn DataType>, Regex)],
    out: &mut HashSet<String>,
) {
    let mut expanded = false;
    for (data_type, pattern) in types {
        let Ok(Some(found)) = pattern.find(template) else {
            continue;
        };
        expanded = true;
        for hint in data_type.hints(locale) {
            let variant =
                format!("{}{}{}", &template[..found.start()], hint, &template[found.end()..]);
            expand(&variant, locale, types, out);
        }
    }
    if !expanded {
        out.insert(template.to_owned());
    }
}
