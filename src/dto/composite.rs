//! Composite expansion.
//!
//! Turns raw values of declared composite fields into child [`Dto`]s before
//! the parent is validated. A single composite takes one child; an array
//! composite takes a list (or record) of children, written back at the
//! original indexes. Children are built through their own definition, so a
//! child class that declares composites expands them in turn.
//!
//! Child validation failures are namespaced under the parent field
//! (`myDTO.name`, `items.2.name`) and merged into one aggregate error.

use std::sync::Arc;

use indexmap::IndexMap;

use super::builder::ObjectBuilder;
use super::errors::{DtoError, DtoResult, ValidationReasons};
use super::object::Dto;
use super::options::Options;
use super::value::{Record, Value};
use crate::schema::{CompositeMap, CompositeRule, Definition, Registry};

const ARRAY_MARKER: &str = "[]";

/// Resolves textual declarations, `{"myDTO": "MyTestDTO", "items[]": "ItemDTO"}`.
///
/// A class name wrapped in a one-element list also declares an array.
pub fn parse_declarations(
    raw: &IndexMap<String, Value>,
    registry: &Registry,
) -> DtoResult<CompositeMap> {
    let mut composites = CompositeMap::with_capacity(raw.len());

    for (key, declared) in raw {
        let (field, marked) = match key.strip_suffix(ARRAY_MARKER) {
            Some(base) => (base, true),
            None => (key.as_str(), false),
        };

        let (class, wrapped) = match declared {
            Value::String(class) => (class.as_str(), false),
            Value::List(items) => match items.as_slice() {
                [Value::String(class)] => (class.as_str(), true),
                _ => return Err(malformed_class(field)),
            },
            _ => return Err(malformed_class(field)),
        };

        let target = registry.require(class)?;
        let rule = if marked || wrapped {
            CompositeRule::Array(target)
        } else {
            CompositeRule::Single(target)
        };
        composites.insert(field.to_string(), rule);
    }

    Ok(composites)
}

fn malformed_class(field: &str) -> DtoError {
    let message = "A malformed DTO class was passed.";
    DtoError::invalid_with_message(message, [(field, message)].into_iter().collect())
}

/// Textual form of `composites`, as written to snapshots.
pub fn to_declarations(composites: &CompositeMap) -> IndexMap<String, Value> {
    composites
        .iter()
        .map(|(field, rule)| {
            let key = match rule {
                CompositeRule::Single(_) => field.clone(),
                CompositeRule::Array(_) => format!("{}{}", field, ARRAY_MARKER),
            };
            (key, Value::from(rule.target().name()))
        })
        .collect()
}

/// Every declared composite must be present in the input, even if null.
pub fn check_missing(input: &Record, composites: &CompositeMap) -> DtoResult<()> {
    let missing: ValidationReasons = composites
        .iter()
        .filter(|(field, _)| !input.contains_key(*field))
        .map(|(field, rule)| (field.as_str(), rule.target().name()))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }
    tracing::debug!(fields = ?missing.fields(), "missing composite inputs");
    Err(DtoError::invalid_with_message(
        "Missing critical composite input(s).",
        missing,
    ))
}

/// Replaces every composite field of `input` with its child object(s).
pub fn expand(mut input: Record, composites: &CompositeMap, options: &Options) -> DtoResult<Record> {
    let mut reasons = ValidationReasons::new();

    for (field, rule) in composites {
        let Some(slot) = input.get_mut(field) else {
            continue;
        };
        let raw = std::mem::replace(slot, Value::Null);
        let expanded = match rule {
            CompositeRule::Single(target) => {
                expand_single(field, target, raw, options, &mut reasons)?
            }
            CompositeRule::Array(target) => {
                expand_array(field, target, raw, options, &mut reasons)?
            }
        };
        *slot = expanded;
    }

    if !reasons.is_empty() {
        tracing::debug!(errors = reasons.len(), "composite expansion failed");
        return Err(DtoError::invalid(reasons));
    }
    Ok(input)
}

fn expand_single(
    field: &str,
    target: &Arc<Definition>,
    raw: Value,
    options: &Options,
    reasons: &mut ValidationReasons,
) -> DtoResult<Value> {
    match raw {
        Value::Null => Ok(Value::Null),
        Value::Dto(dto) if dto.definition().is_same_class(target) => Ok(Value::Dto(dto)),
        other => match other.to_record() {
            Some(record) => build_child(field, target, record, options, reasons),
            None => {
                let message = format!(
                    "{} could not be converted successfully because it is a(n) {}.",
                    field,
                    other.type_name()
                );
                Err(DtoError::invalid_with_message(
                    message.clone(),
                    [(field.to_string(), message)].into_iter().collect(),
                ))
            }
        },
    }
}

fn expand_array(
    field: &str,
    target: &Arc<Definition>,
    raw: Value,
    options: &Options,
    reasons: &mut ValidationReasons,
) -> DtoResult<Value> {
    let convertible = |value: &Value| {
        matches!(value, Value::Dto(_) | Value::List(_) | Value::Record(_))
    };

    let (entries, is_list): (Vec<(String, Value)>, bool) = match raw {
        Value::Null => return Ok(Value::Null),
        Value::List(items) => {
            if !items.iter().all(convertible) {
                return fallback(field, target, Value::List(items), options, reasons);
            }
            let entries = items
                .into_iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), item))
                .collect();
            (entries, true)
        }
        Value::Record(record) => {
            if !record.values().all(convertible) {
                return fallback(field, target, Value::Record(record), options, reasons);
            }
            (record.into_iter().collect(), false)
        }
        _ => {
            let message = format!("{} must be an array of {}.", field, target.name());
            return Err(DtoError::invalid_with_message(
                message.clone(),
                [(field.to_string(), message)].into_iter().collect(),
            ));
        }
    };

    let mut converted = Vec::with_capacity(entries.len());
    for (key, item) in entries {
        let path = format!("{}.{}", field, key);
        let child = expand_single(&path, target, item, options, reasons)?;
        converted.push((key, child));
    }

    if is_list {
        Ok(Value::List(converted.into_iter().map(|(_, v)| v).collect()))
    } else {
        Ok(Value::Record(converted.into_iter().collect()))
    }
}

/// A scalar element means a single record was passed where a collection
/// was expected; the whole collection becomes one child.
fn fallback(
    field: &str,
    target: &Arc<Definition>,
    collection: Value,
    options: &Options,
    reasons: &mut ValidationReasons,
) -> DtoResult<Value> {
    tracing::trace!(field, class = target.name(), "treating collection as a single record");
    let record = collection.to_record().unwrap_or_default();
    build_child(field, target, record, options, reasons)
}

fn build_child(
    path: &str,
    target: &Arc<Definition>,
    record: Record,
    options: &Options,
    reasons: &mut ValidationReasons,
) -> DtoResult<Value> {
    let result = ObjectBuilder::new(Arc::clone(target))
        .options(options.clone())
        .build(record);

    match result {
        Ok(child) => Ok(Value::Dto(Arc::new(child))),
        Err(DtoError::InvalidData {
            reasons: child_reasons,
            ..
        }) => {
            reasons.nest(path, child_reasons);
            Ok(Value::Null)
        }
        Err(other) => Err(other),
    }
}

/// Revalidation reasons of every child object held in composite fields.
pub fn cascade(data: &Record, composites: &CompositeMap) -> ValidationReasons {
    let mut reasons = ValidationReasons::new();

    for field in composites.keys() {
        match data.get(field) {
            Some(Value::Dto(child)) => reasons.nest(field, child.validation_reasons()),
            Some(Value::List(items)) => {
                for (index, item) in items.iter().enumerate() {
                    if let Value::Dto(child) = item {
                        reasons.nest(&format!("{}.{}", field, index), child.validation_reasons());
                    }
                }
            }
            Some(Value::Record(record)) => {
                for (key, item) in record {
                    if let Value::Dto(child) = item {
                        reasons.nest(&format!("{}.{}", field, key), child.validation_reasons());
                    }
                }
            }
            _ => {}
        }
    }

    reasons
}
