//! Project management
//!
//! Handles project initialization and provides access to stores.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::{Config, DirectoryStore, RequestStore};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a permit project. Run 'permit init' first.")]
    NotInProject,
}

/// A permit project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let permit_dir = root.join(".permit");

        if !permit_dir.is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let permit_dir = root.join(".permit");

        fs::create_dir_all(&permit_dir).with_context(|| {
            format!("Failed to create .permit directory: {}", permit_dir.display())
        })?;

        // Create default config
        let config_path = permit_dir.join("config.toml");
        if !config_path.exists() {
            let default_config = r#"# permit configuration

# Name recorded on requests (defaults to $PERMIT_USER, then $USER)
# requester = "alice"

[tree]
# Columns of indentation per department level
indent = 2

[tui]
# Event poll interval in milliseconds
tick_rate_ms = 250
"#;
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        // Create .gitignore for .permit
        let gitignore_path = permit_dir.join(".gitignore");
        if !gitignore_path.exists() {
            let gitignore = r#"# SQLite directory (regenerated by 'permit seed')
directory.db
directory.db-wal
directory.db-shm
"#;
            fs::write(&gitignore_path, gitignore).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .permit directory path
    pub fn permit_dir(&self) -> PathBuf {
        self.root.join(".permit")
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the name recorded on new requests
    pub fn requester(&self) -> String {
        self.config.project.effective_requester()
    }

    /// Returns the request store
    pub fn request_store(&self) -> RequestStore {
        RequestStore::for_project(&self.root)
    }

    /// Opens the SQLite directory of departments, services and roles
    pub fn directory(&self) -> Result<DirectoryStore> {
        DirectoryStore::open(&self.root)
    }
}
