//! @ai:module:intent Scan role files for the annotations of one kind
//! @ai:module:layer application
//! @ai:module:public_api AnnotationScanner, scan_reader
//! @ai:module:depends_on annotation, cursor, line_parser, merge, error
//! @ai:module:stateless true

use crate::annotation::{AnnotationKinds, Location};
use crate::cursor::LineCursor;
use crate::error::{Error, Result};
use crate::line_parser::{LineParser, ParseOutcome};
use crate::merge::{Aggregate, MergeAccumulator};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// @ai:intent Runs per-kind scans over an ordered file list
pub struct AnnotationScanner<'a> {
    kinds: &'a AnnotationKinds,
    files: &'a [PathBuf],
}

impl<'a> AnnotationScanner<'a> {
    pub fn new(kinds: &'a AnnotationKinds, files: &'a [PathBuf]) -> Self {
        Self { kinds, files }
    }

    /// @ai:intent Scan every file for one annotation kind and aggregate the occurrences
    /// @ai:pre kind_name is registered in the kind registry
    /// @ai:post files are visited in list order, each opened and closed before the next
    /// @ai:edge_cases unreadable file -> Error::FileRead; bad JSON -> Error::Parse
    /// @ai:effects fs:read
    pub fn scan(&self, kind_name: &str) -> Result<Aggregate> {
        let definition = self
            .kinds
            .get(kind_name)
            .ok_or_else(|| Error::UnknownAnnotationKind(kind_name.to_string()))?;

        info!("Finding annotations for: @{}", definition.name);

        let parser = LineParser::new(definition);
        let mut accumulator = MergeAccumulator::new(definition);

        for path in self.files {
            let file = File::open(path).map_err(|e| Error::FileRead {
                path: path.clone(),
                source: e,
            })?;
            scan_reader(&parser, BufReader::new(file), path, &mut accumulator)?;
        }

        Ok(accumulator.finish())
    }
}

/// @ai:intent Scan one source for annotations and feed accepted ones to the accumulator
/// @ai:effects io
pub fn scan_reader<R: BufRead>(
    parser: &LineParser<'_>,
    reader: R,
    path: &Path,
    accumulator: &mut MergeAccumulator,
) -> Result<()> {
    let mut cursor = LineCursor::new(reader);

    while let Some((line_number, line)) = cursor.next_line().map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })? {
        if !parser.matches(&line) {
            continue;
        }

        let location = Location::new(path.to_path_buf(), line_number);
        match parser.parse(&line, &mut cursor, location) {
            ParseOutcome::Accepted(occurrence) => {
                info!("Found @{} {}", parser.definition().name, occurrence);
                accumulator.push(occurrence)?;
            }
            ParseOutcome::Rejected(reason) => {
                debug!(
                    "Skipping @{} at {}:{}: {}",
                    parser.definition().name,
                    path.display(),
                    line_number,
                    reason
                );
            }
            ParseOutcome::Fatal(e) => return Err(e),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    const DEFAULTS: &str = r#"---
# @var demo_port: 8080
# @var demo_port: description: >
# Port the service listens on.
#
# Must be above 1024.
demo_port: 8080

# @var demo_users: $ ["alice", "bob"]
# @var demo_users: example: $>
# [
#   "carol"
# ]
demo_users: []
# @todo default: Support IPv6
"#;

    #[test]
    fn test_scan_var_annotations() {
        let dir = TempDir::new().unwrap();
        let files = vec![write_file(&dir, "defaults/main.yml", DEFAULTS)];
        let kinds = AnnotationKinds::builtin();

        let aggregate = AnnotationScanner::new(&kinds, &files).scan("var").unwrap();

        assert_eq!(
            aggregate.into_value(),
            json!({
                "demo_port": {
                    "value": ["8080"],
                    "description": ["Port the service listens on.", "\n\nMust be above 1024."]
                },
                "demo_users": {
                    "value": ["alice", "bob"],
                    "example": ["carol"]
                }
            })
        );
    }

    #[test]
    fn test_scan_multiple_kind_across_files() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            write_file(&dir, "defaults/main.yml", DEFAULTS),
            write_file(
                &dir,
                "tasks/main.yml",
                "# @todo default: Add handlers\n- name: noop\n  debug:\n",
            ),
        ];
        let kinds = AnnotationKinds::builtin();

        let aggregate = AnnotationScanner::new(&kinds, &files).scan("todo").unwrap();

        assert_eq!(
            aggregate.into_value(),
            json!({"default": [{"value": ["Support IPv6"]}, {"value": ["Add handlers"]}]})
        );
    }

    #[test]
    fn test_scan_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let files = vec![write_file(&dir, "defaults/main.yml", DEFAULTS)];
        let kinds = AnnotationKinds::builtin();
        let scanner = AnnotationScanner::new(&kinds, &files);

        for kind in kinds.names(true) {
            assert_eq!(scanner.scan(kind).unwrap(), scanner.scan(kind).unwrap());
        }
    }

    #[test]
    fn test_scan_does_not_match_longer_kind_names() {
        let dir = TempDir::new().unwrap();
        let files = vec![write_file(
            &dir,
            "tasks/main.yml",
            "# @variable foo: bar\n# @var baz: qux\n",
        )];
        let kinds = AnnotationKinds::builtin();

        let aggregate = AnnotationScanner::new(&kinds, &files).scan("var").unwrap();
        assert_eq!(aggregate.into_value(), json!({"baz": {"value": ["qux"]}}));
    }

    #[test]
    fn test_scan_continues_after_rejection() {
        let dir = TempDir::new().unwrap();
        let files = vec![write_file(
            &dir,
            "meta/main.yml",
            "# @meta author: description: ignored\n# @meta incomplete\n# @meta author: alice\n",
        )];
        let kinds = AnnotationKinds::builtin();

        let aggregate = AnnotationScanner::new(&kinds, &files).scan("meta").unwrap();
        assert_eq!(aggregate.into_value(), json!({"author": {"value": ["alice"]}}));
    }

    #[test]
    fn test_scan_resumes_after_continuation_block() {
        let dir = TempDir::new().unwrap();
        let files = vec![write_file(
            &dir,
            "tasks/main.yml",
            "# @example usage: >\n# #@tag inside: block\n# @tag outside: value\n",
        )];
        let kinds = AnnotationKinds::builtin();
        let scanner = AnnotationScanner::new(&kinds, &files);

        assert_eq!(
            scanner.scan("example").unwrap().into_value(),
            json!({"usage": {"value": ["#@tag inside: block"]}})
        );
        assert_eq!(
            scanner.scan("tag").unwrap().into_value(),
            json!({"outside": {"value": ["value"]}})
        );
    }

    #[test]
    fn test_malformed_json_aborts_with_location() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "defaults/main.yml", "---\n\n# @var foo: $not-json\n");
        let files = vec![path.clone()];
        let kinds = AnnotationKinds::builtin();

        match AnnotationScanner::new(&kinds, &files).scan("var") {
            Err(Error::Parse { file, line, .. }) => {
                assert_eq!(file, path);
                assert_eq!(line, 3);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let files = vec![dir.path().join("missing.yml")];
        let kinds = AnnotationKinds::builtin();

        let result = AnnotationScanner::new(&kinds, &files).scan("var");
        assert!(matches!(result, Err(Error::FileRead { .. })));
    }

    #[test]
    fn test_unknown_kind() {
        let kinds = AnnotationKinds::builtin();
        let result = AnnotationScanner::new(&kinds, &[]).scan("nope");
        assert!(matches!(result, Err(Error::UnknownAnnotationKind(name)) if name == "nope"));
    }
}
