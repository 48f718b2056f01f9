//! Permission request CLI commands

use anyhow::{anyhow, Context, Result};
use clap::Subcommand;

use super::output::Output;
use crate::domain::{lookup_role, lookup_service, DepartmentId};
use crate::form::{LocalSubmitter, RequestSubmitter, SubmitOutcome};
use crate::storage::Project;

#[derive(Subcommand)]
pub enum RequestCommands {
    /// Submit a permission request
    Submit {
        /// Service ID or name
        #[arg(long, short)]
        service: String,

        /// Role ID or name
        #[arg(long, short)]
        role: String,

        /// Department ID
        #[arg(long, short)]
        department: String,
    },

    /// List submitted requests
    List {
        /// Only show requests awaiting a decision
        #[arg(long)]
        pending: bool,
    },
}

pub fn run(cmd: RequestCommands, output: &Output) -> Result<()> {
    match cmd {
        RequestCommands::Submit {
            service,
            role,
            department,
        } => submit(output, &service, &role, &department),
        RequestCommands::List { pending } => list(output, pending),
    }
}

fn submit(output: &Output, service_key: &str, role_key: &str, department: &str) -> Result<()> {
    let project = Project::open_current()?;
    let directory = project.directory()?;

    let services = directory.list_services()?;
    let service = lookup_service(&services, service_key)
        .ok_or_else(|| anyhow!("Unknown service: {}", service_key))?;
    let roles = directory.list_roles()?;
    let role =
        lookup_role(&roles, role_key).ok_or_else(|| anyhow!("Unknown role: {}", role_key))?;
    let department_id: DepartmentId = department.parse()?;

    let requester = project.requester();
    output.verbose_ctx(
        "request",
        &format!(
            "Submitting {} / {} for '{}' (department: {})",
            service.id, role.id, requester, department_id
        ),
    );

    let submitter = LocalSubmitter::new(project.root(), requester);
    let outcome = submitter
        .submit(&service.id, &role.id, Some(&department_id))
        .context("An error occurred while submitting the request.")?;

    match outcome {
        SubmitOutcome::Accepted { request_id } => {
            if output.is_json() {
                output.data(&serde_json::json!({
                    "id": request_id.to_string(),
                    "requester": submitter.requester(),
                    "service": service.name,
                    "role": role.name,
                    "department_id": department_id.to_string(),
                    "status": "pending",
                }));
            } else {
                output.success(&format!(
                    "Request submitted: {} ({} as {})",
                    request_id, service.name, role.name
                ));
            }
            Ok(())
        }
        SubmitOutcome::Rejected(message) => Err(anyhow!(message)),
    }
}

fn list(output: &Output, pending_only: bool) -> Result<()> {
    let project = Project::open_current()?;
    let directory = project.directory()?;
    let services = directory.list_services()?;
    let roles = directory.list_roles()?;
    let forest = directory.load_forest()?;

    let requests: Vec<_> = project
        .request_store()
        .read_sorted()?
        .into_iter()
        .filter(|r| !pending_only || r.status.is_pending())
        .collect();
    output.verbose_ctx("request", &format!("Listing {} request(s)", requests.len()));

    let service_name = |id: &str| {
        lookup_service(&services, id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| id.to_string())
    };
    let role_name = |id: &str| {
        lookup_role(&roles, id)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| id.to_string())
    };
    let department_name = |id: Option<&DepartmentId>| {
        id.map(|id| {
            forest
                .resolve_name(id)
                .map(str::to_string)
                .unwrap_or_else(|| id.to_string())
        })
    };

    if output.is_json() {
        let items: Vec<_> = requests
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.id.to_string(),
                    "requester": r.requester,
                    "service_id": r.service_id.to_string(),
                    "service": service_name(r.service_id.as_str()),
                    "role_id": r.role_id.to_string(),
                    "role": role_name(r.role_id.as_str()),
                    "department_id": r.department_id.as_ref().map(|d| d.to_string()),
                    "department": department_name(r.department_id.as_ref()),
                    "status": r.status,
                    "created_at": r.created_at,
                })
            })
            .collect();
        output.data(&items);
    } else if requests.is_empty() {
        println!("No requests found.");
    } else {
        println!(
            "{:<12} {:<10} {:<12} {:<30} {:<22} DEPARTMENT",
            "ID", "STATUS", "REQUESTER", "SERVICE", "ROLE"
        );
        println!("{}", "-".repeat(110));
        for r in &requests {
            println!(
                "{:<12} {:<10} {:<12} {:<30} {:<22} {}",
                r.id,
                r.status,
                r.requester,
                service_name(r.service_id.as_str()),
                role_name(r.role_id.as_str()),
                department_name(r.department_id.as_ref()).unwrap_or_else(|| "-".to_string())
            );
        }
        println!();
        println!("{} request(s)", requests.len());
    }

    Ok(())
}
