//! Domain models for permit
//!
//! Contains the core business logic without any I/O concerns.

mod id;
mod department;
mod catalog;
mod request;

pub use id::{DepartmentId, IdError, RequestId, RoleId, ServiceId};
pub use department::{Department, Forest, Node, Preorder, TreeError};
pub use catalog::{lookup_role, lookup_service, Role, Service};
pub use request::{PermissionRequest, RequestStatus};
