//! @ai:module:intent Define error types for annotation scanning and role documentation
//! @ai:module:layer domain
//! @ai:module:public_api Error, Result
//! @ai:module:stateless true

use crate::annotation::Location;
use std::path::PathBuf;
use thiserror::Error;

/// @ai:intent Unified error type for all ansibledoc operations
/// @ai:invariant every variant is fatal for the run; soft rejections never become an Error
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error at {file}:{line}: {message}")]
    Parse {
        file: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Failed to merge @{kind} annotation '{key}' at {location}: {message}")]
    MergeConflict {
        kind: String,
        key: String,
        location: Location,
        message: String,
    },

    #[error("Unable to read yaml file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("No Ansible role detected in {0}")]
    NotARole(PathBuf),

    #[error("Unknown annotation kind: @{0}")]
    UnknownAnnotationKind(String),
}

pub type Result<T> = std::result::Result<T, Error>;
