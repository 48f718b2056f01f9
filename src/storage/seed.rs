//! Directory seeding
//!
//! Rebuilds the department hierarchy (business unit → department → section)
//! and inserts the default services and roles when missing.

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

use super::DirectoryStore;
use crate::domain::{Department, DepartmentId};

/// What to seed
#[derive(Debug, Clone)]
pub struct SeedPlan {
    pub business_units: Vec<String>,
    pub departments_per_unit: usize,
    pub sections_per_department: usize,
    pub services: Vec<String>,
    pub roles: Vec<String>,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            business_units: [
                "Sales Division",
                "Engineering Division",
                "Administration Division",
                "Manufacturing Division",
                "International Division",
            ]
            .map(String::from)
            .to_vec(),
            departments_per_unit: 3,
            sections_per_department: 7,
            services: [
                "Inventory Management System",
                "HR Evaluation System",
                "Expense Reimbursement System",
            ]
            .map(String::from)
            .to_vec(),
            roles: ["General", "Manager", "System Administrator"]
                .map(String::from)
                .to_vec(),
        }
    }
}

/// Counts produced by a seeding run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub departments: usize,
    pub services_created: usize,
    pub roles_created: usize,
}

impl SeedPlan {
    /// Builds the flat department records, parents before children
    pub fn departments(&self) -> Vec<Department> {
        let now = Utc::now();
        let mut records = Vec::new();

        for unit_name in &self.business_units {
            let unit_id = DepartmentId::generate(unit_name, now);
            records.push(Department::root(unit_id.clone(), unit_name.as_str()));

            for i in 1..=self.departments_per_unit {
                let dept_name = format!("{} Dept {}", unit_name, i);
                let dept_id = DepartmentId::generate(&dept_name, now);
                records.push(Department::child(
                    dept_id.clone(),
                    dept_name.as_str(),
                    unit_id.clone(),
                ));

                for j in 1..=self.sections_per_department {
                    let section_name = format!("{} Section {}", dept_name, j);
                    let section_id = DepartmentId::generate(&section_name, now);
                    records.push(Department::child(section_id, section_name, dept_id.clone()));
                }
            }
        }

        records
    }
}

/// Replaces all departments and upserts services and roles
pub fn seed(store: &mut DirectoryStore, plan: &SeedPlan) -> Result<SeedReport> {
    let departments = store.replace_departments(&plan.departments())?;

    let mut services_created = 0;
    for name in &plan.services {
        let (_, created) = store.upsert_service(name, &format!("Access to {}", name))?;
        if created {
            services_created += 1;
        }
    }

    let mut roles_created = 0;
    for name in &plan.roles {
        let (_, created) = store.upsert_role(name)?;
        if created {
            roles_created += 1;
        }
    }

    Ok(SeedReport {
        departments,
        services_created,
        roles_created,
    })
}
