//! @ai:module:intent Format documentation trees for different formats (JSON, text)
//! @ai:module:layer infrastructure
//! @ai:module:public_api OutputFormat, format_tree, to_json
//! @ai:module:depends_on doc
//! @ai:module:stateless true

use crate::doc::DocumentationTree;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

/// @ai:intent Output format options
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

/// @ai:intent Format a documentation tree as a string
/// @ai:post JSON formats emit only the kind sections, not the role name
/// @ai:effects pure
pub fn format_tree(tree: &DocumentationTree, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(&tree.data, false),
        OutputFormat::JsonPretty => to_json(&tree.data, true),
        OutputFormat::Text => format_tree_text(tree),
    }
}

/// @ai:intent Format a documentation tree as human-readable text
/// @ai:effects pure
fn format_tree_text(tree: &DocumentationTree) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n", tree.role_name.bold()));

    for (kind, section) in &tree.data {
        let Value::Object(items) = section else {
            continue;
        };

        output.push_str(&format!("\n  @{} ({}):\n", kind, items.len()));

        for (key, item) in items {
            output.push_str(&format!("    {}\n", key.cyan()));
            match item {
                Value::Object(subtypes) => push_subtypes(&mut output, subtypes, "      "),
                Value::Array(entries) => {
                    for entry in entries {
                        match entry {
                            Value::Object(subtypes) => {
                                output.push_str("      -\n");
                                push_subtypes(&mut output, subtypes, "        ");
                            }
                            other => output.push_str(&format!("      - {}\n", render(other))),
                        }
                    }
                }
                other => output.push_str(&format!("      {}\n", render(other))),
            }
        }
    }

    output
}

fn push_subtypes(output: &mut String, subtypes: &serde_json::Map<String, Value>, indent: &str) {
    for (subtype, content) in subtypes {
        output.push_str(&format!(
            "{}{}: {}\n",
            indent,
            subtype.dimmed(),
            render(content)
        ));
    }
}

/// @ai:intent Compact single-line rendering of annotation content
/// @ai:example (["a", "b"]) -> "a b"
/// @ai:example ("MIT") -> "MIT"
/// @ai:example ({"k": 1}) -> "{\"k\":1}"
/// @ai:effects pure
fn render(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}

/// @ai:intent Format any serializable value as JSON
/// @ai:effects pure
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(value).unwrap_or_default()
    } else {
        serde_json::to_string(value).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree() -> DocumentationTree {
        let Value::Object(data) = json!({
            "meta": {"name": {"value": "demo"}},
            "todo": {"default": [{"value": ["Add tests"]}]},
            "var": {"demo_port": {"value": 8080, "description": ["Port", "number"]}},
            "example": {}
        }) else {
            unreachable!()
        };
        DocumentationTree {
            role_name: "demo".to_string(),
            data,
        }
    }

    #[test]
    fn test_render_content() {
        assert_eq!(render(&json!(["a", "b"])), "a b");
        assert_eq!(render(&json!("MIT")), "MIT");
        assert_eq!(render(&json!(8080)), "8080");
        assert_eq!(render(&json!({"k": 1})), "{\"k\":1}");
        assert_eq!(render(&json!(["a", 1])), "[\"a\",1]");
    }

    #[test]
    fn test_format_json() {
        let output = format_tree(&tree(), OutputFormat::Json);
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["var"]["demo_port"]["value"], json!(8080));
        assert!(!output.contains('\n'));
    }

    #[test]
    fn test_format_json_pretty_keeps_kind_order() {
        let output = format_tree(&tree(), OutputFormat::JsonPretty);
        let meta = output.find("\"meta\"").unwrap();
        let todo = output.find("\"todo\"").unwrap();
        let var = output.find("\"var\"").unwrap();
        assert!(meta < todo && todo < var);
    }

    #[test]
    fn test_format_text() {
        colored::control::set_override(false);
        let output = format_tree(&tree(), OutputFormat::Text);

        assert!(output.starts_with("demo\n"));
        assert!(output.contains("  @var (1):\n    demo_port\n      value: 8080\n      description: Port number\n"));
        assert!(output.contains("  @todo (1):\n    default\n      -\n        value: Add tests\n"));
        assert!(output.contains("  @example (0):\n"));
    }
}
