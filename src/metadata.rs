//! @ai:module:intent Extract documentation data from role YAML files (meta, defaults, task tags)
//! @ai:module:layer application
//! @ai:module:public_api RoleFile, read_yaml, parse_meta_file, parse_defaults_file, parse_task_tags
//! @ai:module:depends_on error
//! @ai:module:stateless true

use crate::error::{Error, Result};
use serde_json::{Map, Number, Value};
use std::path::Path;
use tracing::warn;

/// Task keywords whose value is a nested task list.
const NESTED_TASK_KEYS: &[&str] = &["block", "rescue", "always"];

/// @ai:intent Role file categories that carry structured documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleFile {
    Meta,
    Defaults,
    Tasks,
}

impl RoleFile {
    /// @ai:intent Classify a path relative to the role root
    /// @ai:example ("meta/main.yml") -> Some(Meta)
    /// @ai:example ("defaults/extra/net.yaml") -> Some(Defaults)
    /// @ai:example ("handlers/main.yml") -> None
    /// @ai:effects pure
    pub fn classify(relative: &Path) -> Option<Self> {
        let mut components = relative.components().map(|c| c.as_os_str().to_string_lossy());
        let top = components.next()?;
        let rest: Vec<_> = components.collect();
        if rest.is_empty() {
            return None;
        }

        match top.as_ref() {
            "meta" if rest.len() == 1 && (rest[0] == "main.yml" || rest[0] == "main.yaml") => {
                Some(RoleFile::Meta)
            }
            "defaults" => Some(RoleFile::Defaults),
            "tasks" => Some(RoleFile::Tasks),
            _ => None,
        }
    }
}

/// @ai:intent Read a YAML file into a JSON value, dropping YAML tags
/// @ai:edge_cases empty document -> Value::Null
/// @ai:effects fs:read
pub fn read_yaml(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_yaml(&content, path)
}

/// @ai:intent Parse YAML text into a JSON value
/// @ai:post `<<` merge keys are resolved into their mappings
/// @ai:effects pure
pub fn parse_yaml(content: &str, path: &Path) -> Result<Value> {
    if content.trim().is_empty() {
        return Ok(Value::Null);
    }
    let yaml_error = |e| Error::Yaml {
        path: path.to_path_buf(),
        source: e,
    };
    let mut value: serde_yaml::Value = serde_yaml::from_str(content).map_err(yaml_error)?;
    value.apply_merge().map_err(yaml_error)?;
    Ok(yaml_to_json(value))
}

/// Tagged values such as `!unsafe` or `!vault` collapse to their inner value.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(entries) => Value::Object(
            entries
                .into_iter()
                .map(|(k, v)| (yaml_key(k), yaml_to_json(v)))
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

fn value_entry(value: Value) -> Value {
    let mut entry = Map::new();
    entry.insert("value".to_string(), value);
    Value::Object(entry)
}

/// @ai:intent Turn `meta/main.yml` into `meta` entries
/// @ai:post every galaxy_info key and `dependencies` (when present) map to `{value: ...}`
/// @ai:effects pure
pub fn meta_entries(data: Value) -> Map<String, Value> {
    let mut entries = Map::new();
    let Value::Object(mut root) = data else {
        return entries;
    };

    if let Some(Value::Object(galaxy_info)) = root.remove("galaxy_info") {
        for (key, value) in galaxy_info {
            entries.insert(key, value_entry(value));
        }
    }

    match root.remove("dependencies") {
        None | Some(Value::Null) => {}
        Some(dependencies) => {
            entries.insert("dependencies".to_string(), value_entry(dependencies));
        }
    }

    entries
}

/// @ai:intent Turn a defaults file into `var` entries
/// @ai:effects pure
pub fn defaults_entries(data: Value, path: &Path) -> Map<String, Value> {
    match data {
        Value::Object(root) => root
            .into_iter()
            .map(|(key, value)| (key, value_entry(value)))
            .collect(),
        Value::Null => Map::new(),
        _ => {
            warn!("Ignoring defaults file without a mapping at top level: {}", path.display());
            Map::new()
        }
    }
}

/// @ai:intent Collect tags declared on tasks as `tag` entries
/// @ai:post tags listed in exclude_tags are omitted
/// @ai:effects pure
pub fn task_tag_entries(data: Value, exclude_tags: &[String]) -> Map<String, Value> {
    let mut tags = Vec::new();
    if let Value::Array(tasks) = &data {
        collect_task_tags(tasks, &mut tags);
    }

    let mut entries = Map::new();
    for tag in tags {
        if exclude_tags.contains(&tag) {
            continue;
        }
        entries.insert(tag.clone(), value_entry(Value::String(tag)));
    }
    entries
}

fn collect_task_tags(tasks: &[Value], tags: &mut Vec<String>) {
    for task in tasks.iter().filter_map(Value::as_object) {
        if let Some(declared) = task.get("tags") {
            flatten_tags(declared, tags);
        }
        for key in NESTED_TASK_KEYS {
            if let Some(Value::Array(nested)) = task.get(*key) {
                collect_task_tags(nested, tags);
            }
        }
    }
}

fn flatten_tags(value: &Value, tags: &mut Vec<String>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| flatten_tags(item, tags)),
        Value::String(s) => tags.push(s.clone()),
        Value::Null => {}
        other => tags.push(other.to_string()),
    }
}

/// @ai:intent Read `meta/main.yml` entries
/// @ai:effects fs:read
pub fn parse_meta_file(path: &Path) -> Result<Map<String, Value>> {
    Ok(meta_entries(read_yaml(path)?))
}

/// @ai:intent Read variable defaults
/// @ai:effects fs:read
pub fn parse_defaults_file(path: &Path) -> Result<Map<String, Value>> {
    Ok(defaults_entries(read_yaml(path)?, path))
}

/// @ai:intent Read the tags declared in a task file
/// @ai:effects fs:read
pub fn parse_task_tags(path: &Path, exclude_tags: &[String]) -> Result<Map<String, Value>> {
    Ok(task_tag_entries(read_yaml(path)?, exclude_tags))
}
