//! permit - file permission requests against a department directory
//!
//! Employees pick a service, a role and their department from a collapsible
//! department tree, then submit a request that is recorded for approval.

pub mod domain;
pub mod storage;
pub mod form;
pub mod cli;

pub use domain::{DepartmentId, Forest, Node, PermissionRequest, RequestStatus};
pub use form::{RequestForm, RequestSubmitter};
