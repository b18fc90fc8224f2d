//! @ai:module:intent Define data structures for role annotations and their kinds
//! @ai:module:layer domain
//! @ai:module:public_api AnnotationKindDefinition, AnnotationKinds, Occurrence, Content, Location
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Subtype used when an annotation only carries `key: value`.
pub const DEFAULT_SUBTYPE: &str = "value";

/// @ai:intent Represents a source code location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize,
}

impl Location {
    /// @ai:intent Create a new Location
    pub fn new(file: PathBuf, line: usize) -> Self {
        Self { file, line }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// @ai:intent Describes one annotation kind and its subtype/multiplicity policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnotationKindDefinition {
    pub name: String,
    /// Allowed subtypes; empty means unrestricted.
    pub subtypes: BTreeSet<String>,
    pub allow_multiple: bool,
    pub automatic: bool,
}

impl AnnotationKindDefinition {
    /// @ai:intent Create a kind definition from borrowed parts
    pub fn new(name: &str, subtypes: &[&str], allow_multiple: bool) -> Self {
        Self {
            name: name.to_string(),
            subtypes: subtypes.iter().map(|s| s.to_string()).collect(),
            allow_multiple,
            automatic: true,
        }
    }

    /// @ai:intent Check whether a parsed subtype is accepted by this kind
    /// @ai:example (var, "description") -> true
    /// @ai:example (meta, "description") -> false
    /// @ai:effects pure
    pub fn allows_subtype(&self, subtype: &str) -> bool {
        self.subtypes.is_empty() || self.subtypes.contains(subtype)
    }
}

/// @ai:intent Immutable, ordered registry of the annotation kinds known for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationKinds {
    kinds: Vec<AnnotationKindDefinition>,
}

impl AnnotationKinds {
    /// @ai:intent Build a registry from explicit definitions, keeping their order
    pub fn new(kinds: Vec<AnnotationKindDefinition>) -> Self {
        Self { kinds }
    }

    /// @ai:intent The kinds every role is scanned for
    pub fn builtin() -> Self {
        Self::new(vec![
            AnnotationKindDefinition::new("meta", &["value"], false),
            AnnotationKindDefinition::new("todo", &["value"], true),
            AnnotationKindDefinition::new(
                "var",
                &["value", "example", "description", "type", "deprecated"],
                false,
            ),
            AnnotationKindDefinition::new("example", &[], false),
            AnnotationKindDefinition::new("tag", &["value", "description"], false),
        ])
    }

    /// @ai:intent Look up a kind by its exact name
    /// @ai:effects pure
    pub fn get(&self, name: &str) -> Option<&AnnotationKindDefinition> {
        self.kinds.iter().find(|k| k.name == name)
    }

    /// @ai:intent List kind definitions, optionally only the automatic ones
    /// @ai:effects pure
    pub fn definitions(&self, automatic_only: bool) -> Vec<&AnnotationKindDefinition> {
        self.kinds
            .iter()
            .filter(|k| !automatic_only || k.automatic)
            .collect()
    }

    /// @ai:intent List kind names, optionally only the automatic ones
    /// @ai:effects pure
    pub fn names(&self, automatic_only: bool) -> Vec<&str> {
        self.definitions(automatic_only)
            .into_iter()
            .map(|k| k.name.as_str())
            .collect()
    }
}

impl Default for AnnotationKinds {
    fn default() -> Self {
        Self::builtin()
    }
}

/// @ai:intent Payload of one annotation occurrence
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Literal text, one entry per line (single-line annotations yield one entry).
    Lines(Vec<String>),
    /// Decoded `$`-prefixed JSON.
    Json(Value),
}

impl Content {
    /// @ai:intent Convert the payload into the value stored in an aggregate
    /// @ai:effects pure
    pub fn into_value(self) -> Value {
        match self {
            Content::Lines(lines) => Value::Array(lines.into_iter().map(Value::String).collect()),
            Content::Json(value) => value,
        }
    }
}

/// @ai:intent Represents a single parsed annotation at a specific file and line
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub item_key: String,
    pub subtype: String,
    pub content: Content,
    pub location: Location,
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.item_key, self.subtype, self.location)
    }
}
