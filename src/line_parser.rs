//! @ai:module:intent Turn one matched annotation line (plus continuation block) into an occurrence
//! @ai:module:layer application
//! @ai:module:public_api LineParser, ParseOutcome, Rejection
//! @ai:module:depends_on annotation, cursor, text, error
//! @ai:module:stateless true

use crate::annotation::{AnnotationKindDefinition, Content, Location, Occurrence, DEFAULT_SUBTYPE};
use crate::cursor::LineCursor;
use crate::error::{Error, Result};
use crate::text::{decode_json, split_escaped};
use regex::Regex;
use std::fmt;
use std::io::BufRead;
use std::sync::LazyLock;

/// Any annotation start, used to end a continuation block.
static ANY_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^# *@\w+").expect("valid annotation regex"));

const MULTILINE_TEXT: &str = ">";
const MULTILINE_JSON: &str = "$>";

/// @ai:intent Result of parsing one annotation start line
#[derive(Debug)]
pub enum ParseOutcome {
    Accepted(Occurrence),
    /// Not a usable occurrence; the scan continues.
    Rejected(Rejection),
    /// Aborts the whole run.
    Fatal(Error),
}

/// @ai:intent Why an annotation line was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NotAnAnnotation,
    MissingValue,
    DisallowedSubtype(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotAnAnnotation => write!(f, "line is not an annotation"),
            Rejection::MissingValue => write!(f, "annotation has no value"),
            Rejection::DisallowedSubtype(subtype) => write!(f, "subtype '{}' is not allowed", subtype),
        }
    }
}

/// One step while consuming a continuation block.
#[derive(Debug, PartialEq)]
enum Continuation {
    Stop,
    Blank,
    Text { text: String, hard_break: bool },
}

/// @ai:intent Parser for the annotations of a single kind
pub struct LineParser<'a> {
    definition: &'a AnnotationKindDefinition,
    marker: Regex,
}

impl<'a> LineParser<'a> {
    /// @ai:intent Build the parser and its start-line pattern for one kind
    /// @ai:post marker matches `# @<name> <rest>` with the name matched literally
    pub fn new(definition: &'a AnnotationKindDefinition) -> Self {
        let pattern = format!(r"^# *@{} +(.*)$", regex::escape(&definition.name));
        let marker = Regex::new(&pattern).expect("escaped kind name forms a valid regex");
        Self { definition, marker }
    }

    pub fn definition(&self) -> &AnnotationKindDefinition {
        self.definition
    }

    /// @ai:intent Check whether a raw line starts an annotation of this kind
    /// @ai:example ("  # @var foo: bar") -> true
    /// @ai:example ("# @variable foo: bar") -> false
    /// @ai:effects pure
    pub fn matches(&self, line: &str) -> bool {
        self.marker.is_match(line.trim())
    }

    /// @ai:intent Parse a matched line, consuming a continuation block from the cursor when requested
    /// @ai:pre line was read from cursor and location points at it
    /// @ai:post on return the cursor is positioned on the first line after the annotation
    /// @ai:effects io
    pub fn parse<R: BufRead>(
        &self,
        line: &str,
        cursor: &mut LineCursor<R>,
        location: Location,
    ) -> ParseOutcome {
        let remainder = match self.marker.captures(line.trim()).and_then(|c| c.get(1)) {
            Some(m) => m.as_str().trim(),
            None => return ParseOutcome::Rejected(Rejection::NotAnAnnotation),
        };

        let parts: Vec<String> = split_escaped(remainder, ':', '\\', 2)
            .into_iter()
            .map(|part| part.trim().to_string())
            .collect();

        let (item_key, subtype, raw) = match parts.as_slice() {
            [key, value] => (key, DEFAULT_SUBTYPE, value),
            [key, subtype, value] => (key, subtype.as_str(), value),
            _ => return ParseOutcome::Rejected(Rejection::MissingValue),
        };

        if !self.definition.allows_subtype(subtype) {
            return ParseOutcome::Rejected(Rejection::DisallowedSubtype(subtype.to_string()));
        }

        match read_content(raw, cursor, &location) {
            Ok(content) => ParseOutcome::Accepted(Occurrence {
                item_key: item_key.clone(),
                subtype: subtype.to_string(),
                content,
                location,
            }),
            Err(e) => ParseOutcome::Fatal(e),
        }
    }
}

/// @ai:intent Decode the value part of an annotation into its content
/// @ai:effects io
fn read_content<R: BufRead>(
    raw: &str,
    cursor: &mut LineCursor<R>,
    location: &Location,
) -> Result<Content> {
    match raw {
        MULTILINE_TEXT => Ok(Content::Lines(read_continuation(cursor, location)?)),
        MULTILINE_JSON => {
            let source: String = read_continuation(cursor, location)?
                .iter()
                .map(|line| line.trim())
                .collect();
            Ok(Content::Json(decode_json(&source, location)?))
        }
        _ => match raw.strip_prefix('$') {
            Some(json) => Ok(Content::Json(decode_json(json.trim(), location)?)),
            None => Ok(Content::Lines(vec![raw.to_string()])),
        },
    }
}

/// @ai:intent Consume the comment lines following a multi-line marker
/// @ai:post the line that ended the block is left unconsumed
/// @ai:effects io
fn read_continuation<R: BufRead>(
    cursor: &mut LineCursor<R>,
    location: &Location,
) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    let mut separator = "";

    loop {
        let step = match cursor.peek_line().map_err(|e| read_error(location, e))? {
            Some(line) => classify_continuation(line),
            None => Continuation::Stop,
        };

        match step {
            Continuation::Stop => break,
            Continuation::Blank => separator = "\n\n",
            Continuation::Text { text, hard_break } => {
                let mut entry = format!("{}{}", separator, text);
                if hard_break {
                    entry.push('\n');
                }
                lines.push(entry);
                separator = "";
            }
        }

        cursor.next_line().map_err(|e| read_error(location, e))?;
    }

    Ok(lines)
}

/// @ai:intent Decide what a candidate continuation line contributes
/// @ai:effects pure
fn classify_continuation(line: &str) -> Continuation {
    let line = line.trim_start();
    if line.trim().is_empty() || ANY_ANNOTATION.is_match(line) {
        return Continuation::Stop;
    }

    let Some(comment) = line.strip_prefix('#') else {
        return Continuation::Stop;
    };

    if comment.chars().all(|c| c == '#' || c.is_whitespace()) {
        return Continuation::Blank;
    }

    let text = comment.strip_prefix(' ').unwrap_or(comment).trim_end();
    if text.ends_with('\\') {
        Continuation::Text {
            text: text.trim_end_matches('\\').trim().to_string(),
            hard_break: true,
        }
    } else {
        Continuation::Text {
            text: text.to_string(),
            hard_break: false,
        }
    }
}

fn read_error(location: &Location, source: std::io::Error) -> Error {
    Error::FileRead {
        path: location.file.clone(),
        source,
    }
}
