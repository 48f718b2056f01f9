//! Request submission
//!
//! The form talks to a [`RequestSubmitter`] and only distinguishes three
//! results: accepted, rejected with a message, or a failure to complete.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{DepartmentId, PermissionRequest, RequestId, RoleId, ServiceId};
use crate::storage::{DirectoryStore, RequestStore};

/// Result of a submission that completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Request recorded
    Accepted { request_id: RequestId },
    /// Request refused; the message is shown to the user verbatim
    Rejected(String),
}

/// Submission did not complete
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Submission worker stopped before reporting a result")]
    Disconnected,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Submits permission requests
pub trait RequestSubmitter {
    fn submit(
        &self,
        service_id: &ServiceId,
        role_id: &RoleId,
        department_id: Option<&DepartmentId>,
    ) -> Result<SubmitOutcome, SubmitError>;
}

/// Submitter that records requests in the project's JSONL store
#[derive(Debug, Clone)]
pub struct LocalSubmitter {
    root: PathBuf,
    requester: String,
}

impl LocalSubmitter {
    pub fn new(root: impl Into<PathBuf>, requester: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            requester: requester.into(),
        }
    }

    /// Returns the name recorded on requests
    pub fn requester(&self) -> &str {
        &self.requester
    }
}

impl RequestSubmitter for LocalSubmitter {
    fn submit(
        &self,
        service_id: &ServiceId,
        role_id: &RoleId,
        department_id: Option<&DepartmentId>,
    ) -> Result<SubmitOutcome, SubmitError> {
        let directory = DirectoryStore::open(&self.root)?;

        let services = directory.list_services()?;
        let Some(service) = services.iter().find(|s| &s.id == service_id) else {
            return Ok(SubmitOutcome::Rejected(format!("Unknown service: {}", service_id)));
        };

        if !directory.list_roles()?.iter().any(|r| &r.id == role_id) {
            return Ok(SubmitOutcome::Rejected(format!("Unknown role: {}", role_id)));
        }

        let Some(dept) = department_id else {
            return Ok(SubmitOutcome::Rejected("Select a department first".to_string()));
        };
        if !directory.load_forest()?.contains(dept) {
            return Ok(SubmitOutcome::Rejected(format!("Unknown department: {}", dept)));
        }

        let store = RequestStore::for_project(&self.root);
        let already_pending = store
            .read_all()?
            .values()
            .any(|r| r.is_pending_for(&self.requester, service_id));
        if already_pending {
            return Ok(SubmitOutcome::Rejected(format!(
                "A request for {} is already pending",
                service.name
            )));
        }

        let request = PermissionRequest::new(
            self.requester.clone(),
            service_id.clone(),
            role_id.clone(),
            department_id.cloned(),
        );
        store.append(&request)?;

        Ok(SubmitOutcome::Accepted {
            request_id: request.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Department, Role, Service};
    use crate::storage::{seed, Project, SeedPlan};
    use tempfile::TempDir;

    fn seeded_project() -> (TempDir, Vec<Service>, Vec<Role>, DepartmentId) {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();
        let mut directory = project.directory().unwrap();
        seed(&mut directory, &SeedPlan::default()).unwrap();

        let services = directory.list_services().unwrap();
        let roles = directory.list_roles().unwrap();
        let dept: Department = directory.list_departments().unwrap().remove(2);
        (dir, services, roles, dept.id)
    }

    #[test]
    fn accepts_and_records_request() {
        let (dir, services, roles, dept) = seeded_project();
        let submitter = LocalSubmitter::new(dir.path(), "alice");

        let outcome = submitter
            .submit(&services[0].id, &roles[0].id, Some(&dept))
            .unwrap();
        let SubmitOutcome::Accepted { request_id } = outcome else {
            panic!("Expected acceptance, got {:?}", outcome);
        };

        let stored = RequestStore::for_project(dir.path()).read_all().unwrap();
        let request = stored.get(&request_id).unwrap();
        assert_eq!(request.requester, "alice");
        assert_eq!(request.department_id.as_ref(), Some(&dept));
    }

    #[test]
    fn rejects_second_pending_request_for_same_service() {
        let (dir, services, roles, dept) = seeded_project();
        let submitter = LocalSubmitter::new(dir.path(), "alice");

        submitter.submit(&services[0].id, &roles[0].id, Some(&dept)).unwrap();
        let outcome = submitter
            .submit(&services[0].id, &roles[1].id, Some(&dept))
            .unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::Rejected(format!("A request for {} is already pending", services[0].name))
        );

        // Another requester is unaffected
        let bob = LocalSubmitter::new(dir.path(), "bob");
        assert!(matches!(
            bob.submit(&services[0].id, &roles[0].id, Some(&dept)).unwrap(),
            SubmitOutcome::Accepted { .. }
        ));
    }

    #[test]
    fn rejects_unknown_references() {
        let (dir, services, roles, dept) = seeded_project();
        let submitter = LocalSubmitter::new(dir.path(), "alice");

        let bogus_service: ServiceId = "s-nope".parse().unwrap();
        assert!(matches!(
            submitter.submit(&bogus_service, &roles[0].id, Some(&dept)).unwrap(),
            SubmitOutcome::Rejected(msg) if msg.contains("Unknown service")
        ));

        let bogus_role: RoleId = "r-nope".parse().unwrap();
        assert!(matches!(
            submitter.submit(&services[0].id, &bogus_role, Some(&dept)).unwrap(),
            SubmitOutcome::Rejected(msg) if msg.contains("Unknown role")
        ));

        let bogus_dept: DepartmentId = "d-nope".parse().unwrap();
        assert!(matches!(
            submitter.submit(&services[0].id, &roles[0].id, Some(&bogus_dept)).unwrap(),
            SubmitOutcome::Rejected(msg) if msg.contains("Unknown department")
        ));
    }

    #[test]
    fn rejects_missing_department() {
        let (dir, services, roles, _) = seeded_project();
        let submitter = LocalSubmitter::new(dir.path(), "alice");

        assert_eq!(
            submitter.submit(&services[0].id, &roles[0].id, None).unwrap(),
            SubmitOutcome::Rejected("Select a department first".to_string())
        );
        assert!(RequestStore::for_project(dir.path()).read_all().unwrap().is_empty());
    }
}
