//! @ai:module:intent Collect the YAML files of a role that are scanned for documentation
//! @ai:module:layer infrastructure
//! @ai:module:public_api FileRegistry, YAML_EXTENSIONS
//! @ai:module:depends_on config, error
//! @ai:module:stateless true

use crate::config::Config;
use crate::error::{Error, Result};
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub const YAML_EXTENSIONS: &[&str] = &["yml", "yaml"];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// @ai:intent A compiled gitignore-style exclude entry
#[derive(Debug, Clone)]
struct ExcludePattern {
    pattern: Pattern,
    /// Patterns containing a `/` match paths relative to the role root;
    /// others match any single path component.
    anchored: bool,
}

impl ExcludePattern {
    fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim().trim_end_matches('/');
        let anchored = trimmed.contains('/');
        let pattern = Pattern::new(trimmed.trim_start_matches('/')).map_err(|e| {
            Error::InvalidPattern {
                pattern: raw.to_string(),
                source: e,
            }
        })?;
        Ok(Self { pattern, anchored })
    }

    /// @ai:intent Check a role-relative path, including all of its parent directories
    /// @ai:effects pure
    fn matches(&self, relative: &Path) -> bool {
        if self.anchored {
            relative
                .ancestors()
                .filter(|p| !p.as_os_str().is_empty())
                .any(|p| self.pattern.matches_path_with(p, MATCH_OPTIONS))
        } else {
            relative.components().any(|c| {
                self.pattern
                    .matches_with(&c.as_os_str().to_string_lossy(), MATCH_OPTIONS)
            })
        }
    }
}

/// @ai:intent Ordered list of candidate files for one role
#[derive(Debug, Clone)]
pub struct FileRegistry {
    base_dir: PathBuf,
    files: Vec<PathBuf>,
}

impl FileRegistry {
    /// @ai:intent Build the registry from the role directory and exclusions in the config
    /// @ai:effects fs:read
    pub fn scan(config: &Config) -> Result<Self> {
        Self::scan_dir(&config.base_dir, &config.exclude_files)
    }

    /// @ai:intent Walk a directory for YAML files, skipping excluded paths
    /// @ai:post files are sorted by path, so scans are deterministic
    /// @ai:edge_cases invalid glob -> Error::InvalidPattern
    /// @ai:effects fs:read
    pub fn scan_dir(base_dir: &Path, excludes: &[String]) -> Result<Self> {
        let patterns = excludes
            .iter()
            .map(|raw| ExcludePattern::new(raw))
            .collect::<Result<Vec<_>>>()?;
        let role_name = base_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        debug!("Scan for files: {}", base_dir.display());

        let mut files = Vec::new();
        for entry in WalkDir::new(base_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if !is_yaml_file(path) {
                continue;
            }

            let relative = path.strip_prefix(base_dir).unwrap_or(path);
            if patterns.iter().any(|p| p.matches(relative)) {
                debug!("Excluding file: {}", relative.display());
                continue;
            }

            debug!("Adding file to '{}': {}", role_name, relative.display());
            files.push(path.to_path_buf());
        }

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            files,
        })
    }

    pub fn list_files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// @ai:intent Path of a registered file relative to the role root
    /// @ai:effects pure
    pub fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(&self.base_dir).unwrap_or(path)
    }
}

/// Dot-files and dot-directories (`.github/`, `.ansibledoctor.yml`) are never documented.
fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// @ai:intent Check if a file has one of the YAML extensions
/// @ai:effects pure
pub fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| YAML_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn role_fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in [
            "tasks/main.yml",
            "tasks/install.yaml",
            "defaults/main.yml",
            "meta/main.yml",
            "molecule/default/converge.yml",
            "templates/config.j2",
            "README.md",
        ] {
            let path = dir.path().join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "---\n").unwrap();
        }
        dir
    }

    fn relative_files(registry: &FileRegistry) -> Vec<String> {
        registry
            .list_files()
            .iter()
            .map(|p| registry.relative(p).to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_collects_yaml_files_sorted() {
        let dir = role_fixture();
        let registry = FileRegistry::scan_dir(dir.path(), &[]).unwrap();

        assert_eq!(
            relative_files(&registry),
            vec![
                "defaults/main.yml",
                "meta/main.yml",
                "molecule/default/converge.yml",
                "tasks/install.yaml",
                "tasks/main.yml",
            ]
        );
    }

    #[test]
    fn test_excludes_directory_pattern() {
        let dir = role_fixture();
        let registry = FileRegistry::scan_dir(dir.path(), &["molecule/".to_string()]).unwrap();
        assert!(!relative_files(&registry)
            .iter()
            .any(|f| f.starts_with("molecule")));
        assert_eq!(registry.list_files().len(), 4);
    }

    #[test]
    fn test_excludes_anchored_and_wildcard_patterns() {
        let dir = role_fixture();
        let registry = FileRegistry::scan_dir(
            dir.path(),
            &["tasks/install.yaml".to_string(), "converge.*".to_string()],
        )
        .unwrap();

        assert_eq!(
            relative_files(&registry),
            vec!["defaults/main.yml", "meta/main.yml", "tasks/main.yml"]
        );
    }

    #[test]
    fn test_invalid_pattern() {
        let dir = role_fixture();
        let result = FileRegistry::scan_dir(dir.path(), &["[".to_string()]);
        assert!(matches!(result, Err(Error::InvalidPattern { .. })));
    }

    #[test]
    fn test_skips_hidden_files_and_directories() {
        let dir = role_fixture();
        for file in [".github/workflows/ci.yml", ".ansibledoctor.yml", "tasks/.hidden.yml"] {
            let path = dir.path().join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "# @todo default: CI only note\n").unwrap();
        }

        let registry = FileRegistry::scan_dir(dir.path(), &[]).unwrap();
        assert!(!relative_files(&registry).iter().any(|f| f.contains("/.") || f.starts_with('.')));
        assert_eq!(registry.list_files().len(), 5);
    }

    #[test]
    fn test_hidden_base_dir_is_still_walked() {
        let dir = TempDir::new().unwrap();
        let role = dir.path().join(".roles").join("demo");
        std::fs::create_dir_all(role.join("tasks")).unwrap();
        std::fs::write(role.join("tasks/main.yml"), "- name: noop\n").unwrap();

        let registry = FileRegistry::scan_dir(&role, &[]).unwrap();
        assert_eq!(relative_files(&registry), vec!["tasks/main.yml"]);
    }

    #[test]
    fn test_is_yaml_file() {
        assert!(is_yaml_file(Path::new("tasks/main.yml")));
        assert!(is_yaml_file(Path::new("meta/main.yaml")));
        assert!(!is_yaml_file(Path::new("templates/config.j2")));
        assert!(!is_yaml_file(Path::new("Makefile")));
    }
}
