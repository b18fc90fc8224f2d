//! @ai:module:intent Fold annotation occurrences into per-kind aggregates
//! @ai:module:layer domain
//! @ai:module:public_api Aggregate, MergeAccumulator, deep_merge, overlay
//! @ai:module:depends_on annotation, error
//! @ai:module:stateless false

use crate::annotation::{AnnotationKindDefinition, Occurrence};
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::fmt;

/// @ai:intent Aggregated occurrences of one annotation kind, keyed by item key
/// @ai:invariant the variant is fixed by the kind's allow_multiple flag
/// @ai:invariant item keys keep the order in which they were first seen
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregate {
    /// Each key holds an array with one `{subtype: content}` object per occurrence.
    Multiple(Map<String, Value>),
    /// Each key holds one object with all of its occurrences deep-merged.
    Merged(Map<String, Value>),
}

impl Aggregate {
    /// @ai:intent Create the empty aggregate matching a kind's policy
    pub fn for_kind(definition: &AnnotationKindDefinition) -> Self {
        if definition.allow_multiple {
            Aggregate::Multiple(Map::new())
        } else {
            Aggregate::Merged(Map::new())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Aggregate::Multiple(items) | Aggregate::Merged(items) => items.len(),
        }
    }

    /// @ai:intent Convert into a plain nested mapping keyed by item key
    /// @ai:effects pure
    pub fn into_value(self) -> Value {
        match self {
            Aggregate::Multiple(items) | Aggregate::Merged(items) => Value::Object(items),
        }
    }
}

/// @ai:intent Accumulates occurrences of a single kind
pub struct MergeAccumulator {
    kind: String,
    aggregate: Aggregate,
}

impl MergeAccumulator {
    /// @ai:intent Start an empty accumulator for one kind
    pub fn new(definition: &AnnotationKindDefinition) -> Self {
        Self {
            kind: definition.name.clone(),
            aggregate: Aggregate::for_kind(definition),
        }
    }

    /// @ai:intent Fold one occurrence into the aggregate
    /// @ai:post multiple kinds append; merged kinds deep-merge `{subtype: content}` under the key
    /// @ai:edge_cases incompatible value shapes under a merged kind -> Error::MergeConflict
    pub fn push(&mut self, occurrence: Occurrence) -> Result<()> {
        let Occurrence {
            item_key,
            subtype,
            content,
            location,
        } = occurrence;

        let mut entry = Map::new();
        entry.insert(subtype, content.into_value());

        match &mut self.aggregate {
            Aggregate::Multiple(items) => {
                let slot = items
                    .entry(item_key)
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(entries) = slot {
                    entries.push(Value::Object(entry));
                }
            }
            Aggregate::Merged(items) => {
                let slot = items
                    .entry(item_key.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                merge_value(slot, Value::Object(entry), "").map_err(|conflict| Error::MergeConflict {
                    kind: self.kind.clone(),
                    key: item_key,
                    location,
                    message: conflict.to_string(),
                })?;
            }
        }

        Ok(())
    }

    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    pub fn finish(self) -> Aggregate {
        self.aggregate
    }
}

/// Structural shape of a JSON value for merge compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Mapping,
    Sequence,
    Scalar,
}

impl Shape {
    fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => Shape::Mapping,
            Value::Array(_) => Shape::Sequence,
            _ => Shape::Scalar,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Mapping => write!(f, "mapping"),
            Shape::Sequence => write!(f, "sequence"),
            Shape::Scalar => write!(f, "scalar"),
        }
    }
}

/// @ai:intent Describes a structural merge conflict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConflict {
    pub path: String,
    existing: Shape,
    incoming: Shape,
}

impl fmt::Display for MergeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot merge {} onto {} at '{}'",
            self.incoming, self.existing, self.path
        )
    }
}

/// @ai:intent Deep-merge `incoming` onto `target`, failing when a mapping meets a non-mapping
/// @ai:post mappings merge recursively; sequences, scalars and nulls are replaced by incoming
/// @ai:effects pure
pub fn deep_merge(target: &mut Value, incoming: Value) -> std::result::Result<(), MergeConflict> {
    merge_value(target, incoming, "")
}

fn merge_value(
    target: &mut Value,
    incoming: Value,
    path: &str,
) -> std::result::Result<(), MergeConflict> {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(entries)) => merge_object(existing, entries, path),
        (target, incoming) => {
            let (existing_shape, incoming_shape) = (Shape::of(target), Shape::of(&incoming));
            let structural = existing_shape == Shape::Mapping || incoming_shape == Shape::Mapping;
            if target.is_null() || incoming.is_null() || !structural {
                *target = incoming;
                Ok(())
            } else {
                Err(MergeConflict {
                    path: path.to_string(),
                    existing: existing_shape,
                    incoming: incoming_shape,
                })
            }
        }
    }
}

fn merge_object(
    target: &mut Map<String, Value>,
    entries: Map<String, Value>,
    path: &str,
) -> std::result::Result<(), MergeConflict> {
    for (key, value) in entries {
        let child = if path.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", path, key)
        };
        match target.get_mut(&key) {
            Some(slot) => merge_value(slot, value, &child)?,
            None => {
                target.insert(key, value);
            }
        }
    }
    Ok(())
}

/// @ai:intent Lay `incoming` over `target`: mappings merge recursively, anything else replaces
/// @ai:effects pure
pub fn overlay(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(entries)) => {
            for (key, value) in entries {
                match existing.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (target, incoming) => *target = incoming,
    }
}
