//! @ai:module:intent Shared string helpers for annotation parsing
//! @ai:module:layer domain
//! @ai:module:public_api split_escaped, decode_json
//! @ai:module:stateless true

use crate::annotation::Location;
use crate::error::{Error, Result};
use serde_json::Value;

/// @ai:intent Split a string on a delimiter, honoring an escape character
/// @ai:pre max_split is the maximum number of splits performed
/// @ai:post result has at most max_split + 1 parts
/// @ai:example ("a:b:c:d", ':', '\\', 2) -> ["a", "b", "c:d"]
/// @ai:example ("a\\:b:c", ':', '\\', 2) -> ["a:b", "c"]
/// @ai:edge_cases a trailing lone escape is kept; past the split limit the rest is copied verbatim
/// @ai:effects pure
pub fn split_escaped(input: &str, delimiter: char, escape: char, max_split: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut splits = 0;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if splits >= max_split {
            current.push(c);
            continue;
        }

        if c == escape {
            match chars.next() {
                Some(next) => {
                    if next != delimiter && next != escape {
                        current.push(escape);
                    }
                    current.push(next);
                }
                None => current.push(escape),
            }
        } else if c == delimiter {
            parts.push(std::mem::take(&mut current));
            splits += 1;
        } else {
            current.push(c);
        }
    }

    parts.push(current);
    parts
}

/// @ai:intent Decode an annotation JSON payload, reporting failures at the annotation location
/// @ai:effects pure
pub fn decode_json(source: &str, location: &Location) -> Result<Value> {
    serde_json::from_str(source).map_err(|e| Error::Parse {
        file: location.file.clone(),
        line: location.line,
        message: format!("failed to parse json '{}': {}", source, e),
    })
}
