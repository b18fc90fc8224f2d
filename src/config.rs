//! @ai:module:intent Load run configuration for role documentation
//! @ai:module:layer infrastructure
//! @ai:module:public_api Config, RoleConfig, LoggingConfig, LogLevel, CONFIG_FILES
//! @ai:module:depends_on annotation, error
//! @ai:module:stateless true

use crate::annotation::AnnotationKinds;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

/// Config files looked up in the role directory, lowest precedence first.
pub const CONFIG_FILES: &[&str] = &[".ansibledoctor", ".ansibledoctor.yml", ".ansibledoctor.yaml"];

const ENV_PREFIX: &str = "ANSIBLE_DOCTOR_";

/// @ai:intent Main configuration for a documentation run
/// @ai:invariant annotation kinds are fixed once the config is built
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_dir: PathBuf,
    pub exclude_files: Vec<String>,
    pub exclude_tags: Vec<String>,
    pub role: RoleConfig,
    pub logging: LoggingConfig,
    /// Files the configuration was read from.
    #[serde(skip)]
    pub config_files: Vec<PathBuf>,
    #[serde(skip)]
    annotations: AnnotationKinds,
}

/// @ai:intent Role naming and detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleConfig {
    pub name: Option<String>,
    pub autodetect: bool,
}

/// @ai:intent Logging settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}

/// @ai:intent Log verbosity, ordered from most to least verbose
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    Warning,
    Error,
    Critical,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            exclude_files: Vec::new(),
            exclude_tags: Vec::new(),
            role: RoleConfig::default(),
            logging: LoggingConfig::default(),
            config_files: Vec::new(),
            annotations: AnnotationKinds::builtin(),
        }
    }
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            name: None,
            autodetect: true,
        }
    }
}

impl LogLevel {
    const ALL: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Critical,
    ];

    /// @ai:intent Move the level by `delta` steps (negative is more verbose), clamped
    /// @ai:example (Warning, -1) -> Info
    /// @ai:example (Debug, -3) -> Debug
    /// @ai:effects pure
    pub fn shift(self, delta: i32) -> Self {
        let index = Self::ALL.iter().position(|l| *l == self).unwrap_or(2) as i32;
        let max = Self::ALL.len() as i32 - 1;
        Self::ALL[(index + delta).clamp(0, max) as usize]
    }

    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "critical" => Ok(LogLevel::Critical),
            other => Err(Error::Config(format!(
                "logging.level must be one of debug, info, warning, error, critical (got '{}')",
                other
            ))),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, String> {
        value.parse().map_err(|e: Error| e.to_string())
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        };
        f.write_str(name)
    }
}

impl Config {
    /// @ai:intent Load configuration for a role directory from files and the environment
    /// @ai:pre config_file, when given, exists and is readable
    /// @ai:effects fs:read, env:read
    pub fn load(base_dir: &Path, config_file: Option<&Path>) -> Result<Self> {
        Self::load_with_env(base_dir, config_file, |key| std::env::var(key).ok())
    }

    /// @ai:intent Load configuration using a custom environment lookup
    /// @ai:post an explicit config_file replaces the default lookup instead of merging with it
    /// @ai:effects fs:read
    pub fn load_with_env<F>(base_dir: &Path, config_file: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let files: Vec<PathBuf> = match config_file {
            Some(path) => vec![path.to_path_buf()],
            None => CONFIG_FILES
                .iter()
                .map(|name| base_dir.join(name))
                .filter(|path| path.is_file())
                .collect(),
        };

        let mut merged = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());
        for path in &files {
            let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
                path: path.clone(),
                source: e,
            })?;
            if content.trim().is_empty() {
                continue;
            }
            let value: serde_yaml::Value =
                serde_yaml::from_str(&content).map_err(|e| Error::Yaml {
                    path: path.clone(),
                    source: e,
                })?;
            merge_yaml(&mut merged, value);
        }

        let mut config: Config = serde_yaml::from_value(merged)
            .map_err(|e| Error::Config(format!("invalid configuration: {}", e)))?;
        config.base_dir = base_dir.to_path_buf();
        config.config_files = files;
        config.apply_env(env)?;
        Ok(config)
    }

    /// @ai:intent Override settings from ANSIBLE_DOCTOR_* variables
    /// @ai:effects pure
    fn apply_env<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| env(&format!("{}{}", ENV_PREFIX, name));

        if let Some(name) = var("ROLE__NAME") {
            self.role.name = Some(name);
        }
        if let Some(value) = var("ROLE__AUTODETECT") {
            self.role.autodetect = parse_bool(&value)?;
        }
        if let Some(value) = var("EXCLUDE_FILES") {
            self.exclude_files = split_list(&value);
        }
        if let Some(value) = var("EXCLUDE_TAGS") {
            self.exclude_tags = split_list(&value);
        }
        if let Some(value) = var("LOGGING__LEVEL") {
            self.logging.level = value.parse()?;
        }

        Ok(())
    }

    /// @ai:intent Replace the annotation kind registry
    pub fn with_annotation_kinds(mut self, kinds: AnnotationKinds) -> Self {
        self.annotations = kinds;
        self
    }

    pub fn annotation_kinds(&self) -> &AnnotationKinds {
        &self.annotations
    }

    /// @ai:intent Make logging more (negative) or less (positive) verbose
    pub fn adjust_log_level(&mut self, delta: i32) {
        self.logging.level = self.logging.level.shift(delta);
    }

    /// @ai:intent Role name from configuration, falling back to the role directory name
    /// @ai:effects fs:read
    pub fn role_name(&self) -> String {
        if let Some(name) = &self.role.name {
            return name.clone();
        }

        let dir = std::fs::canonicalize(&self.base_dir).unwrap_or_else(|_| self.base_dir.clone());
        dir.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// @ai:intent Check whether the base directory looks like an Ansible role
    /// @ai:effects fs:read
    pub fn is_role(&self) -> bool {
        self.base_dir.join("tasks").is_dir()
    }
}

/// Later mappings win; nested mappings are merged key by key.
fn merge_yaml(target: &mut serde_yaml::Value, incoming: serde_yaml::Value) {
    match (target, incoming) {
        (_, serde_yaml::Value::Null) => {}
        (serde_yaml::Value::Mapping(existing), serde_yaml::Value::Mapping(entries)) => {
            for (key, value) in entries {
                match existing.get_mut(&key) {
                    Some(slot) => merge_yaml(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (target, incoming) => *target = incoming,
    }
}

/// @ai:intent Parse a truthy/falsy string the way the environment loader expects
/// @ai:example ("yes") -> true
/// @ai:example ("0") -> false
/// @ai:effects pure
fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        _ => Err(Error::Config(format!("\"{}\" is not a valid bool value", value))),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_files() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_with_env(dir.path(), None, no_env).unwrap();

        assert_eq!(config.base_dir, dir.path());
        assert!(config.exclude_files.is_empty());
        assert!(config.role.autodetect);
        assert_eq!(config.logging.level, LogLevel::Warning);
        assert!(config.config_files.is_empty());
        assert_eq!(config.annotation_kinds(), &AnnotationKinds::builtin());
    }

    #[test]
    fn test_config_files_merge_in_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".ansibledoctor"),
            "exclude_tags: [skip]\nrole:\n  name: first\n  autodetect: false\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(".ansibledoctor.yml"),
            "role:\n  name: second\nlogging:\n  level: DEBUG\n",
        )
        .unwrap();

        let config = Config::load_with_env(dir.path(), None, no_env).unwrap();

        assert_eq!(config.exclude_tags, vec!["skip".to_string()]);
        assert_eq!(config.role.name.as_deref(), Some("second"));
        assert!(!config.role.autodetect);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.config_files.len(), 2);
    }

    #[test]
    fn test_explicit_config_file_replaces_lookup() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".ansibledoctor.yml"), "exclude_tags: [a]\n").unwrap();
        let explicit = dir.path().join("custom.yml");
        std::fs::write(&explicit, "exclude_files: ['molecule/']\n").unwrap();

        let config = Config::load_with_env(dir.path(), Some(&explicit), no_env).unwrap();

        assert!(config.exclude_tags.is_empty());
        assert_eq!(config.exclude_files, vec!["molecule/".to_string()]);
        assert_eq!(config.config_files, vec![explicit]);
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.yml");
        let result = Config::load_with_env(dir.path(), Some(&missing), no_env);
        assert!(matches!(result, Err(Error::FileRead { .. })));
    }

    #[test]
    fn test_invalid_log_level() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".ansibledoctor.yml"), "logging:\n  level: loud\n").unwrap();
        let result = Config::load_with_env(dir.path(), None, no_env);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".ansibledoctor.yml"), "exclude_tags: [a]\n").unwrap();
        let env: HashMap<&str, &str> = [
            ("ANSIBLE_DOCTOR_ROLE__NAME", "from_env"),
            ("ANSIBLE_DOCTOR_ROLE__AUTODETECT", "off"),
            ("ANSIBLE_DOCTOR_EXCLUDE_TAGS", "b, c,"),
            ("ANSIBLE_DOCTOR_LOGGING__LEVEL", "info"),
        ]
        .into_iter()
        .collect();

        let config = Config::load_with_env(dir.path(), None, |key| {
            env.get(key).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(config.role_name(), "from_env");
        assert!(!config.role.autodetect);
        assert_eq!(config.exclude_tags, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_invalid_bool_in_environment() {
        let dir = TempDir::new().unwrap();
        let result = Config::load_with_env(dir.path(), None, |key| {
            (key == "ANSIBLE_DOCTOR_ROLE__AUTODETECT").then(|| "maybe".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_log_level_shift_clamps() {
        assert_eq!(LogLevel::Warning.shift(-1), LogLevel::Info);
        assert_eq!(LogLevel::Warning.shift(-5), LogLevel::Debug);
        assert_eq!(LogLevel::Warning.shift(4), LogLevel::Critical);
        assert_eq!(LogLevel::Critical.as_filter(), LevelFilter::ERROR);
    }

    #[test]
    fn test_role_name_and_detection() {
        let dir = TempDir::new().unwrap();
        let role_dir = dir.path().join("demo_role");
        std::fs::create_dir_all(role_dir.join("tasks")).unwrap();

        let config = Config::load_with_env(&role_dir, None, no_env).unwrap();
        assert_eq!(config.role_name(), "demo_role");
        assert!(config.is_role());

        let config = Config::load_with_env(dir.path(), None, no_env).unwrap();
        assert!(!config.is_role());
    }
}
