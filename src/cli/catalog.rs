//! Service and role listings

use anyhow::Result;

use super::output::Output;
use crate::storage::Project;

pub fn services(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let services = project.directory()?.list_services()?;

    let requester = project.requester();
    let pending = project.request_store().pending_service_ids(&requester)?;
    output.verbose_ctx(
        "services",
        &format!("{} pending for requester '{}'", pending.len(), requester),
    );

    if output.is_json() {
        let items: Vec<_> = services
            .iter()
            .map(|s| {
                serde_json::json!({
                    "id": s.id.to_string(),
                    "name": s.name,
                    "description": s.description,
                    "pending": pending.contains(&s.id),
                })
            })
            .collect();
        output.data(&items);
    } else if services.is_empty() {
        println!("No services found. Run 'permit seed' to create some.");
    } else {
        println!("{:<12} {:<32} DESCRIPTION", "ID", "NAME");
        println!("{}", "-".repeat(70));
        for service in &services {
            let name = if pending.contains(&service.id) {
                format!("{} (pending)", service.name)
            } else {
                service.name.clone()
            };
            println!("{:<12} {:<32} {}", service.id, name, service.description);
        }
    }

    Ok(())
}

pub fn roles(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let roles = project.directory()?.list_roles()?;

    if output.is_json() {
        output.data(&roles);
    } else if roles.is_empty() {
        println!("No roles found. Run 'permit seed' to create some.");
    } else {
        println!("{:<12} NAME", "ID");
        println!("{}", "-".repeat(40));
        for role in &roles {
            println!("{:<12} {}", role.id, role.name);
        }
    }

    Ok(())
}
