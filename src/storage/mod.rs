//! # Storage Layer
//!
//! Persistence layer for permit.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Departments, services, roles | SQLite | `.permit/directory.db` |
//! | Requests | JSONL (one JSON per line) | `.permit/requests.jsonl` |
//! | Config | TOML | `.permit/config.toml` |
//!
//! ## Concurrency Safety
//!
//! - [`RequestStore`] uses file locking (`fs2`) for concurrent access
//! - [`DirectoryStore`] runs SQLite in WAL mode; seeding is one transaction
//!
//! ## Project Structure
//!
//! ```text
//! .permit/
//! ├── directory.db          # Department tree + catalog (regenerated by seed)
//! ├── requests.jsonl        # Submitted permission requests
//! ├── config.toml           # Project configuration
//! └── .gitignore            # Ignores the database
//! ```
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for accessing a permit project
//! - [`DirectoryStore`] - Departments, services and roles
//! - [`RequestStore`] - Read/append requests as JSONL
//! - [`Config`] - Project and global configuration

mod jsonl;
mod directory;
mod config;
mod project;
mod seed;

pub use jsonl::RequestStore;
pub use directory::DirectoryStore;
pub use config::{Config, ConfigError, GlobalConfig, OutputFormat as DefaultFormat, ProjectConfig};
pub use project::{Project, ProjectError};
pub use seed::{seed, SeedPlan, SeedReport};
