//! Field access helpers over document nodes.
//!
//! Converters read and write `serde_json` object maps through these helpers
//! so every structural error carries the path of the offending field. The
//! family readers (`conditions`, `modifiers`, `entries`, `number`) dispatch
//! nested nodes through the registries in the conversion context.

use serde_json::{Map, Value};

use crate::condition::LootCondition;
use crate::convert::ConversionContext;
use crate::entry::LootEntry;
use crate::error::ConvertError;
use crate::modifier::LootModifier;
use crate::number::{LootNumber, LootNumberRange};

fn expected(
    context: &ConversionContext<'_>,
    field: &str,
    what: &'static str,
) -> ConvertError {
    ConvertError::Expected {
        path: context.path().child(field),
        expected: what,
    }
}

/// Returns the named child, failing if absent.
pub fn require<'a>(
    node: &'a Map<String, Value>,
    field: &str,
    context: &ConversionContext<'_>,
) -> Result<&'a Value, ConvertError> {
    node.get(field).ok_or_else(|| ConvertError::MissingField {
        path: context.path().clone(),
        field: field.to_string(),
    })
}

/// Reads a required string field.
pub fn require_str<'a>(
    node: &'a Map<String, Value>,
    field: &str,
    context: &ConversionContext<'_>,
) -> Result<&'a str, ConvertError> {
    require(node, field, context)?
        .as_str()
        .ok_or_else(|| expected(context, field, "a string"))
}

/// Reads a required real-valued field.
pub fn require_f64(
    node: &Map<String, Value>,
    field: &str,
    context: &ConversionContext<'_>,
) -> Result<f64, ConvertError> {
    require(node, field, context)?
        .as_f64()
        .ok_or_else(|| expected(context, field, "a number"))
}

/// Reads an integer field, substituting a default when absent.
pub fn i64_or(
    node: &Map<String, Value>,
    field: &str,
    default: i64,
    context: &ConversionContext<'_>,
) -> Result<i64, ConvertError> {
    match node.get(field) {
        None => Ok(default),
        Some(value) => value
            .as_i64()
            .ok_or_else(|| expected(context, field, "an integer")),
    }
}

/// Reads a boolean field, substituting a default when absent.
pub fn bool_or(
    node: &Map<String, Value>,
    field: &str,
    default: bool,
    context: &ConversionContext<'_>,
) -> Result<bool, ConvertError> {
    match node.get(field) {
        None => Ok(default),
        Some(value) => value
            .as_bool()
            .ok_or_else(|| expected(context, field, "a boolean")),
    }
}

/// Reads an optional list of strings.
pub fn str_list_or_empty(
    node: &Map<String, Value>,
    field: &str,
    context: &ConversionContext<'_>,
) -> Result<Vec<String>, ConvertError> {
    let Some(value) = node.get(field) else {
        return Ok(Vec::new());
    };
    let items = value
        .as_array()
        .ok_or_else(|| expected(context, field, "a list"))?;
    let context = context.enter(field);
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_str().map(str::to_string).ok_or(ConvertError::Expected {
                path: context.path().index(index),
                expected: "a string",
            })
        })
        .collect()
}

fn node_list<'a>(
    node: &'a Map<String, Value>,
    field: &str,
    context: &ConversionContext<'_>,
) -> Result<Option<&'a Vec<Value>>, ConvertError> {
    match node.get(field) {
        None => Ok(None),
        Some(value) => value
            .as_array()
            .map(Some)
            .ok_or_else(|| expected(context, field, "a list")),
    }
}

/// Reads an optional list of conditions; an absent field is an empty list.
pub fn conditions(
    node: &Map<String, Value>,
    field: &str,
    context: &ConversionContext<'_>,
) -> Result<Vec<Box<dyn LootCondition>>, ConvertError> {
    let Some(items) = node_list(node, field, context)? else {
        return Ok(Vec::new());
    };
    let context = context.enter(field);
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            context
                .registries()
                .conditions()
                .deserialize(item, &context.enter_index(index))
        })
        .collect()
}

/// Reads an optional list of modifiers; an absent field is an empty list.
pub fn modifiers(
    node: &Map<String, Value>,
    field: &str,
    context: &ConversionContext<'_>,
) -> Result<Vec<Box<dyn LootModifier>>, ConvertError> {
    let Some(items) = node_list(node, field, context)? else {
        return Ok(Vec::new());
    };
    let context = context.enter(field);
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            context
                .registries()
                .modifiers()
                .deserialize(item, &context.enter_index(index))
        })
        .collect()
}

/// Reads an optional list of entries; an absent field is an empty list.
pub fn entries(
    node: &Map<String, Value>,
    field: &str,
    context: &ConversionContext<'_>,
) -> Result<Vec<Box<dyn LootEntry>>, ConvertError> {
    let Some(items) = node_list(node, field, context)? else {
        return Ok(Vec::new());
    };
    let context = context.enter(field);
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            context
                .registries()
                .entries()
                .deserialize(item, &context.enter_index(index))
        })
        .collect()
}

/// Reads a required number provider field.
pub fn number(
    node: &Map<String, Value>,
    field: &str,
    context: &ConversionContext<'_>,
) -> Result<Box<dyn LootNumber>, ConvertError> {
    let value = require(node, field, context)?;
    context
        .registries()
        .numbers()
        .deserialize(value, &context.enter(field))
}

/// Reads an optional number provider field.
pub fn opt_number(
    node: &Map<String, Value>,
    field: &str,
    context: &ConversionContext<'_>,
) -> Result<Option<Box<dyn LootNumber>>, ConvertError> {
    match node.get(field) {
        None => Ok(None),
        Some(value) => context
            .registries()
            .numbers()
            .deserialize(value, &context.enter(field))
            .map(Some),
    }
}

/// Reads a number range: either a bare node standing for both bounds at
/// once, or an object with optional `min` and `max` fields.
pub fn number_range(
    node: &Map<String, Value>,
    field: &str,
    context: &ConversionContext<'_>,
) -> Result<LootNumberRange, ConvertError> {
    let Some(value) = node.get(field) else {
        return Ok(LootNumberRange::unbounded());
    };
    let context = context.enter(field);
    let numbers = context.registries().numbers();

    if value.is_number() {
        let min = numbers.deserialize(value, &context)?;
        let max = numbers.deserialize(value, &context)?;
        return Ok(LootNumberRange::new(Some(min), Some(max)));
    }

    let Some(object) = value.as_object() else {
        return Err(ConvertError::Expected {
            path: context.path().clone(),
            expected: "a number or an object with min/max",
        });
    };
    Ok(LootNumberRange::new(
        opt_number(object, "min", &context)?,
        opt_number(object, "max", &context)?,
    ))
}

/// Writes a condition list, omitting the field when the list is empty.
pub fn put_conditions(
    node: &mut Map<String, Value>,
    field: &str,
    conditions: &[Box<dyn LootCondition>],
    context: &ConversionContext<'_>,
) -> Result<(), ConvertError> {
    if conditions.is_empty() {
        return Ok(());
    }
    let context = context.enter(field);
    let serialized = conditions
        .iter()
        .enumerate()
        .map(|(index, condition)| {
            context
                .registries()
                .conditions()
                .serialize(condition.as_ref(), &context.enter_index(index))
        })
        .collect::<Result<Vec<_>, _>>()?;
    node.insert(field.to_string(), Value::Array(serialized));
    Ok(())
}

/// Writes a modifier list, omitting the field when the list is empty.
pub fn put_modifiers(
    node: &mut Map<String, Value>,
    field: &str,
    modifiers: &[Box<dyn LootModifier>],
    context: &ConversionContext<'_>,
) -> Result<(), ConvertError> {
    if modifiers.is_empty() {
        return Ok(());
    }
    let context = context.enter(field);
    let serialized = modifiers
        .iter()
        .enumerate()
        .map(|(index, modifier)| {
            context
                .registries()
                .modifiers()
                .serialize(modifier.as_ref(), &context.enter_index(index))
        })
        .collect::<Result<Vec<_>, _>>()?;
    node.insert(field.to_string(), Value::Array(serialized));
    Ok(())
}

/// Writes an entry list, omitting the field when the list is empty.
pub fn put_entries(
    node: &mut Map<String, Value>,
    field: &str,
    entries: &[Box<dyn LootEntry>],
    context: &ConversionContext<'_>,
) -> Result<(), ConvertError> {
    if entries.is_empty() {
        return Ok(());
    }
    let context = context.enter(field);
    let serialized = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            context
                .registries()
                .entries()
                .serialize(entry.as_ref(), &context.enter_index(index))
        })
        .collect::<Result<Vec<_>, _>>()?;
    node.insert(field.to_string(), Value::Array(serialized));
    Ok(())
}

/// Writes a number provider field.
pub fn put_number(
    node: &mut Map<String, Value>,
    field: &str,
    number: &dyn LootNumber,
    context: &ConversionContext<'_>,
) -> Result<(), ConvertError> {
    let serialized = context
        .registries()
        .numbers()
        .serialize(number, &context.enter(field))?;
    node.insert(field.to_string(), serialized);
    Ok(())
}

/// Writes a number range as an object with optional `min`/`max`, omitting
/// the field entirely for an unbounded range.
pub fn put_number_range(
    node: &mut Map<String, Value>,
    field: &str,
    range: &LootNumberRange,
    context: &ConversionContext<'_>,
) -> Result<(), ConvertError> {
    if range.min().is_none() && range.max().is_none() {
        return Ok(());
    }
    let context = context.enter(field);
    let mut object = Map::new();
    if let Some(min) = range.min() {
        put_number(&mut object, "min", min, &context)?;
    }
    if let Some(max) = range.max() {
        put_number(&mut object, "max", max, &context)?;
    }
    node.insert(field.to_string(), Value::Object(object));
    Ok(())
}
