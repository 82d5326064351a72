//! XDG-compliant path resolution for dinq.
//!
//! Provides `DinqPaths`: where the service looks for its configuration file and,
//! when the configuration does not say otherwise, its model and graph artifacts.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors from path resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(dinq::paths::no_home),
        help("Set the HOME environment variable, or pass `--config` with explicit artifact paths.")
    )]
    NoHome,

    #[error("failed to create directory: {path}")]
    #[diagnostic(
        code(dinq::paths::create_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type PathResult<T> = std::result::Result<T, PathError>;

/// Global XDG-compliant directories for dinq.
#[derive(Debug, Clone)]
pub struct DinqPaths {
    /// `$XDG_CONFIG_HOME/dinq/`
    pub config_dir: PathBuf,
    /// `$XDG_DATA_HOME/dinq/`: model weights, graph artifacts, dataset.
    pub data_dir: PathBuf,
}

impl DinqPaths {
    /// Resolve XDG directories from environment variables with standard fallbacks.
    pub fn resolve() -> PathResult<Self> {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .map_err(|_| PathError::NoHome)?;

        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".config"))
            .join("dinq");

        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".local/share"))
            .join("dinq");

        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// Paths rooted at an explicit directory (used by tests and `--data-dir`).
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
        }
    }

    /// Create the base directories. Idempotent.
    pub fn ensure_dirs(&self) -> PathResult<()> {
        for dir in [&self.config_dir, &self.data_dir] {
            std::fs::create_dir_all(dir).map_err(|e| PathError::CreateDir {
                path: dir.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Path to the service config file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Default location of an artifact inside the data directory.
    pub fn artifact(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rooted_layout() {
        let paths = DinqPaths::rooted("/tmp/dinq-test");
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/dinq-test/config/config.toml"));
        assert_eq!(
            paths.artifact("gcn_weights.json"),
            PathBuf::from("/tmp/dinq-test/data/gcn_weights.json")
        );
    }

    #[test]
    fn ensure_dirs_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = DinqPaths::rooted(dir.path());
        paths.ensure_dirs().unwrap();
        paths.ensure_dirs().unwrap();
        assert!(paths.config_dir.is_dir());
        assert!(paths.data_dir.is_dir());
    }
}
