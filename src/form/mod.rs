//! Permission request form
//!
//! [`RequestForm`] holds the caller-owned state (service, role, selected
//! department, busy flag, feedback) and drives a [`RequestSubmitter`].

mod state;
mod submitter;

pub use state::{FormMessage, RequestForm, SubmitTicket};
pub use submitter::{LocalSubmitter, RequestSubmitter, SubmitError, SubmitOutcome};
