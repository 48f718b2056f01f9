//! Interactive request form
//!
//! Terminal UI for filing a permission request: pick a service and a role,
//! pick a department from the collapsible tree, submit. Built on ratatui.

mod app;
mod event;
pub mod selector;
mod ui;
mod utils;
mod views;

use std::panic::{self, AssertUnwindSafe};

use anyhow::{anyhow, Result};

use super::Output;
use crate::storage::Project;
use app::App;
use event::EventHandler;

/// Launch the TUI
pub fn run(output: &Output, project: &Project) -> Result<()> {
    output.verbose_ctx("tui", "Initializing TUI application");

    // Load state before touching the terminal so errors print normally
    let mut app = App::new(project)?;
    output.verbose_ctx(
        "tui",
        &format!(
            "Loaded {} departments, {} services, {} roles",
            app.forest().len(),
            app.form().services().len(),
            app.form().roles().len()
        ),
    );

    let mut terminal = ui::init_terminal()?;
    let event_handler = EventHandler::new(project.config().project.tui.tick_rate_ms);

    // Run the main loop with panic safety
    // This ensures terminal is restored even if the app panics
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        app.run(&mut terminal, event_handler)
    }));

    // Always restore terminal, even on panic
    let restore_result = ui::restore_terminal();

    match result {
        Ok(inner_result) => {
            restore_result?;
            inner_result
        }
        Err(panic_payload) => {
            let _ = restore_result;
            if let Some(s) = panic_payload.downcast_ref::<&str>() {
                Err(anyhow!("TUI panicked: {}", s))
            } else if let Some(s) = panic_payload.downcast_ref::<String>() {
                Err(anyhow!("TUI panicked: {}", s))
            } else {
                Err(anyhow!("TUI panicked with unknown error"))
            }
        }
    }
}
