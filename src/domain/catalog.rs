//! Services and roles a request can ask for

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::id::{RoleId, ServiceId};

/// A service employees can request access to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Service {
    /// Creates a service with a freshly generated ID
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: ServiceId::generate(&name, Utc::now()),
            name,
            description: description.into(),
        }
    }
}

/// A role (permission level) within a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

impl Role {
    /// Creates a role with a freshly generated ID
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: RoleId::generate(&name, Utc::now()),
            name,
        }
    }
}

/// Finds a service by exact ID, then by case-insensitive name
pub fn lookup_service<'a>(services: &'a [Service], key: &str) -> Option<&'a Service> {
    services
        .iter()
        .find(|s| s.id.as_str() == key)
        .or_else(|| services.iter().find(|s| s.name.eq_ignore_ascii_case(key)))
}

/// Finds a role by exact ID, then by case-insensitive name
pub fn lookup_role<'a>(roles: &'a [Role], key: &str) -> Option<&'a Role> {
    roles
        .iter()
        .find(|r| r.id.as_str() == key)
        .or_else(|| roles.iter().find(|r| r.name.eq_ignore_ascii_case(key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_service_has_prefixed_id() {
        let service = Service::new("Inventory Management System", "Access");
        assert!(service.id.as_str().starts_with("s-"));
        assert_eq!(service.name, "Inventory Management System");
    }

    #[test]
    fn lookup_by_id_or_name() {
        let services = vec![
            Service::new("Inventory Management System", ""),
            Service::new("HR Evaluation System", ""),
        ];
        let hr_id = services[1].id.to_string();

        assert_eq!(lookup_service(&services, &hr_id).unwrap().name, "HR Evaluation System");
        assert_eq!(
            lookup_service(&services, "inventory management system").unwrap().id,
            services[0].id
        );
        assert!(lookup_service(&services, "Payroll").is_none());

        let roles = vec![Role::new("General"), Role::new("Manager")];
        assert_eq!(lookup_role(&roles, "manager").unwrap().name, "Manager");
        assert!(lookup_role(&roles, "Owner").is_none());
    }
}
