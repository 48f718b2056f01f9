//! Department CLI commands

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::Subcommand;

use super::output::Output;
use super::tui::selector::TreeSelector;
use crate::domain::{Department, DepartmentId};
use crate::storage::Project;

#[derive(Subcommand)]
pub enum DeptCommands {
    /// Print the department hierarchy
    Tree {
        /// Show every level instead of top-level units only
        #[arg(long, short = 'a')]
        expand_all: bool,
    },

    /// Show a department with its path and direct children
    Show {
        /// Department ID
        id: String,
    },

    /// Add a department
    Add {
        /// Department name
        name: String,

        /// Parent department ID (omit for a top-level unit)
        #[arg(long, short)]
        parent: Option<String>,
    },
}

pub fn run(cmd: DeptCommands, output: &Output) -> Result<()> {
    match cmd {
        DeptCommands::Tree { expand_all } => tree(output, expand_all),
        DeptCommands::Show { id } => show(output, &id),
        DeptCommands::Add { name, parent } => add(output, &name, parent.as_deref()),
    }
}

fn tree(output: &Output, expand_all: bool) -> Result<()> {
    let project = Project::open_current()?;
    let forest = project.directory()?.load_forest()?;
    output.verbose_ctx("dept", &format!("Loaded {} departments", forest.len()));

    let mut selector = TreeSelector::new(project.config().project.tree.indent);
    if expand_all {
        selector.expand_all(&forest);
    }
    let rows = selector.rows(&forest, None);

    if output.is_json() {
        let items: Vec<_> = rows
            .iter()
            .map(|row| {
                serde_json::json!({
                    "id": row.id().to_string(),
                    "name": row.node.name,
                    "depth": row.depth,
                    "has_children": row.node.has_children(),
                })
            })
            .collect();
        output.data(&items);
    } else if rows.is_empty() {
        println!("No departments found. Run 'permit seed' to create some.");
    } else {
        for row in &rows {
            println!("{}  [{}]", row.text(), row.id());
        }
        println!();
        println!("{} of {} department(s) shown", rows.len(), forest.len());
    }

    Ok(())
}

fn show(output: &Output, id_str: &str) -> Result<()> {
    let project = Project::open_current()?;
    let forest = project.directory()?.load_forest()?;

    let id: DepartmentId = id_str.parse()?;
    let node = forest
        .find_node(&id)
        .ok_or_else(|| anyhow!("Department not found: {}", id))?;
    let path = forest.breadcrumb(&id).unwrap_or_else(|| node.name.clone());

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": node.id.to_string(),
            "name": node.name,
            "path": path,
            "children": node.children.iter().map(|child| serde_json::json!({
                "id": child.id.to_string(),
                "name": child.name,
                "has_children": child.has_children(),
            })).collect::<Vec<_>>(),
        }));
    } else {
        println!("Department: {}", node.id);
        println!("Name: {}", node.name);
        println!("Path: {}", path);

        if !node.children.is_empty() {
            println!("\nChildren ({}):", node.children.len());
            for child in &node.children {
                let marker = if child.has_children() { "+" } else { " " };
                println!("  {} {:<12} {}", marker, child.id, child.name);
            }
        }
    }

    Ok(())
}

fn add(output: &Output, name: &str, parent: Option<&str>) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("Department name cannot be empty"));
    }

    let project = Project::open_current()?;
    let directory = project.directory()?;
    let forest = directory.load_forest()?;

    let parent_id = match parent {
        Some(p) => {
            let id: DepartmentId = p.parse()?;
            if !forest.contains(&id) {
                return Err(anyhow!("Parent department not found: {}", id));
            }
            Some(id)
        }
        None => None,
    };

    let id = DepartmentId::generate(name, Utc::now());
    let dept = match parent_id {
        Some(parent_id) => Department::child(id, name, parent_id),
        None => Department::root(id, name),
    };
    directory.insert_department(&dept)?;
    output.verbose_ctx("dept", &format!("Inserted {} under {:?}", dept.id, dept.parent_id));

    if output.is_json() {
        output.data(&dept);
    } else {
        output.success(&format!("Created department: {} ({})", dept.id, dept.name));
    }

    Ok(())
}
