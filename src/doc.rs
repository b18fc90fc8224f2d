//! @ai:module:intent Assemble the documentation tree of a role from YAML data and annotations
//! @ai:module:layer application
//! @ai:module:public_api DocumentationParser, DocumentationTree
//! @ai:module:depends_on config, registry, metadata, scanner, merge
//! @ai:module:stateless true

use crate::config::Config;
use crate::error::Result;
use crate::merge::overlay;
use crate::metadata::{parse_defaults_file, parse_meta_file, parse_task_tags, RoleFile};
use crate::registry::FileRegistry;
use crate::scanner::AnnotationScanner;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

/// @ai:intent Documentation data for one role, keyed by annotation kind
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DocumentationTree {
    pub role_name: String,
    pub data: Map<String, Value>,
}

impl DocumentationTree {
    /// @ai:intent Get the section of one kind
    pub fn section(&self, kind: &str) -> Option<&Map<String, Value>> {
        self.data.get(kind).and_then(Value::as_object)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.data)
    }
}

/// @ai:intent Builds the documentation tree for the role described by a config
pub struct DocumentationParser<'a> {
    config: &'a Config,
    registry: &'a FileRegistry,
}

impl<'a> DocumentationParser<'a> {
    pub fn new(config: &'a Config, registry: &'a FileRegistry) -> Self {
        Self { config, registry }
    }

    /// @ai:intent Collect YAML metadata, then overlay every automatic annotation kind
    /// @ai:post every automatic kind has a section; annotations override YAML-derived values
    /// @ai:edge_cases bad YAML, bad JSON payloads and merge conflicts abort with an error
    /// @ai:effects fs:read
    pub fn parse(&self) -> Result<DocumentationTree> {
        let kinds = self.config.annotation_kinds();
        let role_name = self.config.role_name();
        let mut data = Map::new();

        for kind in kinds.names(true) {
            data.insert(kind.to_string(), Value::Object(Map::new()));
        }

        let mut name = Map::new();
        name.insert("name".to_string(), serde_json::json!({ "value": role_name }));
        merge_section(&mut data, "meta", name);

        for path in self.registry.list_files() {
            match RoleFile::classify(self.registry.relative(path)) {
                Some(RoleFile::Meta) => merge_section(&mut data, "meta", parse_meta_file(path)?),
                Some(RoleFile::Defaults) => {
                    merge_section(&mut data, "var", parse_defaults_file(path)?)
                }
                Some(RoleFile::Tasks) => merge_section(
                    &mut data,
                    "tag",
                    parse_task_tags(path, &self.config.exclude_tags)?,
                ),
                None => {}
            }
        }

        let scanner = AnnotationScanner::new(kinds, self.registry.list_files());
        for kind in kinds.names(true) {
            let aggregate = scanner.scan(kind)?;
            info!("Collected {} @{} annotation(s)", aggregate.len(), kind);
            let section = data
                .entry(kind.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            overlay(section, aggregate.into_value());
        }

        Ok(DocumentationTree { role_name, data })
    }
}

fn merge_section(data: &mut Map<String, Value>, kind: &str, entries: Map<String, Value>) {
    let section = data
        .entry(kind.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    overlay(section, Value::Object(entries));
}
