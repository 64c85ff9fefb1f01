//! Array and collection conversion: bracket stripping, comma splitting and
//! per-element conversion with contained failures.

use crate::adapter::scalar;
use crate::adapter::types::ContainerKind;
use crate::adapter::types::TypeKey;
use crate::adapter::value::Value;
use crate::adapter::AdapterError;
use std::cmp::Ordering;
use tracing::warn;

const BRACKETS: [(char, char); 3] = [('(', ')'), ('[', ']'), ('{', '}')];
const ELEMENT_SEPARATOR: char = ',';

/// Converts optional text into a scalar, `Absent` when it is missing or blank.
pub(crate) fn convert_scalar(key: TypeKey, raw: Option<&str>) -> Result<Value, AdapterError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Value::Absent),
        Some(text) => scalar::convert(key, text),
    }
}

/// Removes one pair of matching wrapping brackets, then trims again.
/// Unmatched brackets are kept.
pub(crate) fn remove_brackets(text: &str) -> &str {
    BRACKETS
        .iter()
        .find_map(|(open, close)| text.strip_prefix(*open)?.strip_suffix(*close))
        .map(str::trim)
        .unwrap_or(text)
}

/// Splits element text, keeping empty fields. Missing or blank text gives no elements.
pub(crate) fn split_elements(raw: Option<&str>) -> Vec<&str> {
    let text = match raw {
        Some(raw) => remove_brackets(raw.trim()),
        None => return Vec::new(),
    };
    if text.is_empty() {
        Vec::new()
    } else {
        text.split(ELEMENT_SEPARATOR).collect()
    }
}

/// Converts every element; a failed element is logged and becomes `fallback`.
fn convert_elements(key: TypeKey, raw: Option<&str>, fallback: &Value) -> Vec<Value> {
    split_elements(raw)
        .into_iter()
        .enumerate()
        .map(|(position, element)| match convert_scalar(key, Some(element)) {
            Ok(Value::Absent) => fallback.clone(),
            Ok(value) => value,
            Err(error) => {
                warn!(position, value = element, type_key = %key, %error, "unable to convert array element");
                fallback.clone()
            }
        })
        .collect()
}

/// Builds an array. `zero` is the element default of a primitive array, `None` for boxed arrays.
pub(crate) fn convert_array(key: TypeKey, zero: Option<Value>, raw: Option<&str>) -> Value {
    let fallback = zero.unwrap_or(Value::Absent);
    Value::Array(convert_elements(key, raw, &fallback))
}

/// Builds a collection in the given container.
///
/// Sequences keep absent elements. Sets drop them and keep the first of equal
/// elements; sorted sets are then ordered by value.
pub(crate) fn convert_collection(container: ContainerKind, key: TypeKey, raw: Option<&str>) -> Value {
    let mut elements = convert_elements(key, raw, &Value::Absent);
    if container.is_set() {
        let mut distinct: Vec<Value> = Vec::with_capacity(elements.len());
        for element in elements.into_iter().filter(|element| !element.is_absent()) {
            if !distinct.contains(&element) {
                distinct.push(element);
            }
        }
        if container == ContainerKind::SortedSet {
            distinct.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        }
        elements = distinct;
    }
    Value::Collection(container, elements)
}
