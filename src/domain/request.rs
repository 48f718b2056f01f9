//! Permission request domain model
//!
//! Requests are created pending here; approval and denial happen elsewhere
//! and are only read back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{DepartmentId, RequestId, RoleId, ServiceId};

/// Request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    /// Returns true while the request awaits a decision
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestStatus::Pending)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A request for a role on a service, tied to a department
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRequest {
    pub id: RequestId,
    pub requester: String,
    pub service_id: ServiceId,
    pub role_id: RoleId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<DepartmentId>,
    #[serde(default)]
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PermissionRequest {
    /// Creates a new pending request
    pub fn new(
        requester: impl Into<String>,
        service_id: ServiceId,
        role_id: RoleId,
        department_id: Option<DepartmentId>,
    ) -> Self {
        let requester = requester.into();
        let now = Utc::now();
        let seed = format!("{}:{}:{}", requester, service_id, role_id);

        Self {
            id: RequestId::generate(&seed, now),
            requester,
            service_id,
            role_id,
            department_id,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if this request blocks a new one for the same service
    pub fn is_pending_for(&self, requester: &str, service_id: &ServiceId) -> bool {
        self.status.is_pending() && self.requester == requester && &self.service_id == service_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_request(requester: &str, service: &str) -> PermissionRequest {
        PermissionRequest::new(
            requester,
            service.parse().unwrap(),
            "r-1".parse().unwrap(),
            Some("d-1".parse().unwrap()),
        )
    }

    #[test]
    fn new_request_is_pending() {
        let req = make_request("alice", "s-1");
        assert_eq!(req.status, RequestStatus::Pending);
        assert!(req.id.as_str().starts_with("q-"));
        assert_eq!(req.created_at, req.updated_at);
    }

    #[test]
    fn pending_for_matches_requester_and_service() {
        let mut req = make_request("alice", "s-1");
        let s1: ServiceId = "s-1".parse().unwrap();
        let s2: ServiceId = "s-2".parse().unwrap();

        assert!(req.is_pending_for("alice", &s1));
        assert!(!req.is_pending_for("bob", &s1));
        assert!(!req.is_pending_for("alice", &s2));

        req.status = RequestStatus::Approved;
        assert!(!req.is_pending_for("alice", &s1));
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&RequestStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
        let back: RequestStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(back, RequestStatus::Rejected);
    }

    #[test]
    fn department_is_optional_in_json() {
        let mut req = make_request("alice", "s-1");
        req.department_id = None;
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("department_id"));

        let back: PermissionRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.department_id, None);
    }
}
