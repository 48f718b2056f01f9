//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project management | `init`, `seed` |
//! | Directory | Departments and catalog | `dept tree`, `dept show`, `services`, `roles` |
//! | Request | Filing requests | `request submit`, `request list` |
//! | Interactive | Request form | `tui` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default, or the global `default_format`) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output:
//! ```bash
//! permit --verbose dept tree
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod catalog;
mod department;
mod request;
pub mod tui;

pub use app::{Cli, Commands, run};
pub use output::{Output, OutputFormat};
