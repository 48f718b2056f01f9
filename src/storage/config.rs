//! Configuration handling for permit
//!
//! Configuration is stored in `.permit/config.toml` (project) and
//! `~/.config/permit/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Department tree display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Columns of indentation per depth level
    pub indent: u16,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

/// Interactive UI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Event poll interval in milliseconds
    pub tick_rate_ms: u64,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self { tick_rate_ms: 250 }
    }
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProjectConfig {
    /// Name recorded on requests (defaults to $PERMIT_USER, then $USER)
    pub requester: Option<String>,

    /// Tree settings
    pub tree: TreeConfig,

    /// TUI settings
    pub tui: TuiConfig,
}

impl ProjectConfig {
    /// Gets the effective requester name from config, environment, or defaults
    pub fn effective_requester(&self) -> String {
        self.requester
            .clone()
            .or_else(|| std::env::var("PERMIT_USER").ok())
            .or_else(|| std::env::var("USER").ok())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| "anonymous".to_string())
    }

    /// Checks values that parse but make no sense
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tree.indent == 0 || self.tree.indent > 8 {
            return Err(ConfigError::Invalid(format!(
                "tree.indent must be between 1 and 8, got {}",
                self.tree.indent
            )));
        }
        if self.tui.tick_rate_ms == 0 {
            return Err(ConfigError::Invalid(
                "tui.tick_rate_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let (project, project_root) = Self::load_project()?;

        Ok(Self {
            project,
            global,
            project_root,
        })
    }

    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            global,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "permit", "permit-cli").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Finds and loads project configuration
    fn load_project() -> Result<(ProjectConfig, Option<PathBuf>)> {
        match Self::find_project_root() {
            Some(root) => {
                let config = Self::load_project_config(&root)?;
                Ok((config, Some(root)))
            }
            None => Ok((ProjectConfig::default(), None)),
        }
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(".permit").join("config.toml");

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")?;

        config
            .validate()
            .with_context(|| format!("Invalid project config: {}", config_path.display()))?;

        Ok(config)
    }

    /// Finds the project root by looking for `.permit/` directory
    pub fn find_project_root() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            if current.join(".permit").is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = Config {
            project: ProjectConfig::default(),
            global: GlobalConfig::default(),
            project_root: None,
        };

        assert_eq!(config.project.tree.indent, 2);
        assert_eq!(config.project.tui.tick_rate_ms, 250);
        assert_eq!(config.global.default_format, OutputFormat::Text);
        assert!(config.project.validate().is_ok());
    }

    #[test]
    fn parse_project_config() {
        let toml = r#"
requester = "alice"

[tree]
indent = 4
"#;

        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.requester.as_deref(), Some("alice"));
        assert_eq!(config.tree.indent, 4);
        assert_eq!(config.tui.tick_rate_ms, 250);
        assert_eq!(config.effective_requester(), "alice");
    }

    #[test]
    fn parse_global_config() {
        let config: GlobalConfig = toml::from_str(r#"default_format = "json""#).unwrap();
        assert_eq!(config.default_format, OutputFormat::Json);
    }

    #[test]
    fn invalid_indent_is_rejected() {
        let config: ProjectConfig = toml::from_str("[tree]\nindent = 0\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_project_config_from_disk() {
        let dir = TempDir::new().unwrap();
        let permit_dir = dir.path().join(".permit");
        fs::create_dir_all(&permit_dir).unwrap();
        fs::write(permit_dir.join("config.toml"), "requester = \"bob\"\n").unwrap();

        let config = Config::for_project(dir.path()).unwrap();
        assert_eq!(config.project.requester.as_deref(), Some("bob"));
        assert_eq!(config.project_root.as_deref(), Some(dir.path()));
    }

    #[test]
    fn broken_project_config_fails() {
        let dir = TempDir::new().unwrap();
        let permit_dir = dir.path().join(".permit");
        fs::create_dir_all(&permit_dir).unwrap();
        fs::write(permit_dir.join("config.toml"), "[tree\n").unwrap();

        assert!(Config::for_project(dir.path()).is_err());
    }
}
