//! @ai:module:intent Library for extracting documentation annotations from Ansible roles
//! @ai:module:layer infrastructure
//! @ai:module:public_api annotation, scanner, line_parser, merge, config, registry, doc, output, error
//! @ai:module:stateless true
//!
//! # ansibledoc
//!
//! Scans the YAML files of an Ansible role for comment annotations such as
//! `# @var name: description: text` or `# @meta author: $ "alice"`, and merges them
//! with role metadata and variable defaults into one documentation tree.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ansibledoc::{Config, DocumentationParser, FileRegistry, OutputFormat};
//! use std::path::Path;
//!
//! let config = Config::load(Path::new("roles/demo"), None).unwrap();
//! let registry = FileRegistry::scan(&config).unwrap();
//! let tree = DocumentationParser::new(&config, &registry).parse().unwrap();
//! println!("{}", ansibledoc::format_tree(&tree, OutputFormat::JsonPretty));
//! ```

pub mod annotation;
pub mod config;
pub mod cursor;
pub mod doc;
pub mod error;
pub mod line_parser;
pub mod merge;
pub mod metadata;
pub mod output;
pub mod registry;
pub mod scanner;
pub mod text;

pub use annotation::{
    AnnotationKindDefinition, AnnotationKinds, Content, Location, Occurrence, DEFAULT_SUBTYPE,
};
pub use config::{Config, LogLevel};
pub use doc::{DocumentationParser, DocumentationTree};
pub use error::{Error, Result};
pub use line_parser::{LineParser, ParseOutcome, Rejection};
pub use merge::{deep_merge, overlay, Aggregate, MergeAccumulator, MergeConflict};
pub use output::{format_tree, to_json, OutputFormat};
pub use registry::FileRegistry;
pub use scanner::AnnotationScanner;
pub use text::split_escaped;
