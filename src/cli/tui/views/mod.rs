//! Views for the TUI

pub mod form;
