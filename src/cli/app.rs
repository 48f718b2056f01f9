//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{catalog, department, request, tui};
use crate::storage::{seed, Config, Project, SeedPlan};

#[derive(Parser)]
#[command(name = "permit")]
#[command(author, version, about = "File permission requests against a department directory")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new permit project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Rebuild the department hierarchy and add default services and roles
    Seed,

    /// Browse departments
    #[command(subcommand)]
    Dept(department::DeptCommands),

    /// List services that can be requested
    Services,

    /// List roles that can be requested
    Roles,

    /// File and list permission requests
    #[command(subcommand)]
    Request(request::RequestCommands),

    /// Open the interactive request form
    Tui,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = match cli.format {
        Some(format) => format,
        None => configured_format(),
    };
    let output = Output::new(format, cli.verbose);

    output.verbose("permit starting");

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing project at: {}", path));
            let project = Project::init(&path)?;
            output.verbose_ctx(
                "init",
                &format!("Created .permit directory at: {}", project.permit_dir().display()),
            );
            output.success(&format!(
                "Initialized permit project at {}",
                project.root().display()
            ));
        }

        Commands::Seed => run_seed(&output)?,

        Commands::Dept(cmd) => department::run(cmd, &output)?,

        Commands::Services => catalog::services(&output)?,
        Commands::Roles => catalog::roles(&output)?,

        Commands::Request(cmd) => request::run(cmd, &output)?,

        Commands::Tui => {
            let project = Project::open_current()?;
            tui::run(&output, &project)?
        }
    }

    output.verbose("Command completed successfully");
    Ok(())
}

/// Output format from the global config; text when unset or unreadable
fn configured_format() -> OutputFormat {
    Config::load()
        .map(|config| config.global.default_format.into())
        .unwrap_or_default()
}

fn run_seed(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let mut directory = project.directory()?;
    output.verbose_ctx("seed", &format!("Seeding {}", directory.path().display()));

    let report = seed(&mut directory, &SeedPlan::default())?;
    output.verbose_ctx(
        "seed",
        &format!(
            "{} departments, {} new services, {} new roles",
            report.departments, report.services_created, report.roles_created
        ),
    );

    if output.is_json() {
        output.data(&report);
    } else {
        output.success(&format!(
            "Seeded {} departments ({} services and {} roles added)",
            report.departments, report.services_created, report.roles_created
        ));
    }

    Ok(())
}
