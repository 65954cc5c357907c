//! Project subcommands: list, new, import, open, rebind, remove.

use std::path::PathBuf;

use clap::Subcommand;
use console::style;
use dialoguer::Confirm;

use hangar::project::{self, Project};

use super::load_manager;
use crate::error::CliError;

/// Project subcommands.
///
/// Projects are addressed by the index shown in `hangar projects list`.
#[derive(Debug, Subcommand)]
pub enum ProjectCommands {
    /// List registered projects
    List,

    /// Create a new project bound to an engine version
    New {
        /// Project name; also the directory name under the default
        /// project location
        name: String,

        /// Create the project at this path instead of the default
        /// location
        #[arg(long)]
        path: Option<PathBuf>,

        /// Engine version to bind to; defaults to the newest known
        /// version
        #[arg(long)]
        engine: Option<String>,
    },

    /// Register an existing project directory
    Import {
        /// Project root directory containing project.godot
        path: PathBuf,
    },

    /// Launch the editor for a project
    Open {
        /// Project index from `hangar projects list`
        index: usize,
    },

    /// Bind a project to a different engine version
    Rebind {
        /// Project index from `hangar projects list`
        index: usize,

        /// Engine version to bind to
        version: String,

        /// Skip the not-installed warning prompt
        #[arg(long)]
        yes: bool,
    },

    /// Remove a project from the list (files are kept on disk)
    Remove {
        /// Project index from `hangar projects list`
        index: usize,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

/// Run a projects subcommand.
pub fn run(command: ProjectCommands) -> Result<(), CliError> {
    match command {
        ProjectCommands::List => run_list(),
        ProjectCommands::New { name, path, engine } => run_new(&name, path, engine),
        ProjectCommands::Import { path } => run_import(path),
        ProjectCommands::Open { index } => run_open(index),
        ProjectCommands::Rebind {
            index,
            version,
            yes,
        } => run_rebind(index, &version, yes),
        ProjectCommands::Remove { index, yes } => run_remove(index, yes),
    }
}

/// List projects with their engine bindings.
fn run_list() -> Result<(), CliError> {
    let manager = load_manager()?;
    let store = manager.store().lock();

    if store.projects().is_empty() {
        println!("No projects registered. Use 'hangar projects new' or 'hangar projects import'.");
        return Ok(());
    }

    println!("Projects");
    println!("========");

    for (index, project) in store.projects().iter().enumerate() {
        let binding = if store.is_installed(&project.engine_version) {
            project.engine_version.clone()
        } else {
            format!("{} (not installed)", project.engine_version)
        };
        println!(
            "{index:>3}  {:<24} {:<24} opened {}  {}",
            project.name,
            binding,
            project.last_opened,
            project.root.display()
        );
    }

    Ok(())
}

/// Scaffold and register a new project.
fn run_new(name: &str, path: Option<PathBuf>, engine: Option<String>) -> Result<(), CliError> {
    let manager = load_manager()?;

    let version = match engine {
        Some(version) => {
            if manager.catalog().lookup(&version).is_none() {
                return Err(CliError::Config(format!("unknown engine version {version}")));
            }
            version
        }
        // Catalog is ordered newest first.
        None => match manager.catalog().releases().first() {
            Some(release) => release.version.clone(),
            None => return Err(CliError::Config("the engine catalog is empty".to_string())),
        },
    };

    let root = match path {
        Some(path) => path,
        None => manager
            .store()
            .lock()
            .settings()
            .default_project_dir
            .join(name),
    };

    if root.join(project::PROJECT_DESCRIPTOR).exists() {
        return Err(CliError::Config(format!(
            "{} already contains a project",
            root.display()
        )));
    }

    let created = project::scaffold(name, &root, &version)?;
    let index = manager.store().lock().add_project(created)?;

    println!(
        "Created project {} at {} (engine {version}, index {index})",
        style(name).green(),
        root.display()
    );

    if !manager.store().lock().is_installed(&version) {
        println!(
            "{} engine {version} is not installed; run 'hangar engines install {version}'",
            style("note:").yellow()
        );
    }

    Ok(())
}

/// Import an existing project directory.
fn run_import(path: PathBuf) -> Result<(), CliError> {
    let manager = load_manager()?;

    let imported = Project::import(path)?;
    let name = imported.name.clone();
    let version = imported.engine_version.clone();
    let index = manager.store().lock().add_project(imported)?;

    println!("Imported {} (engine {version}, index {index})", style(&name).green());
    Ok(())
}

/// Resolve and launch a project's editor.
fn run_open(index: usize) -> Result<(), CliError> {
    let manager = load_manager()?;
    manager.open_project(index)?;

    println!("Editor launched.");
    Ok(())
}

/// Change a project's engine binding, warning when the target version
/// is not installed.
fn run_rebind(index: usize, version: &str, yes: bool) -> Result<(), CliError> {
    let manager = load_manager()?;

    let installed = manager.store().lock().is_installed(version);
    if !installed && !yes {
        println!(
            "{} engine {version} is not installed; the project will not open until it is",
            style("warning:").yellow()
        );
        let confirmed = Confirm::new()
            .with_prompt("Bind anyway?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    manager.store().lock().rebind(index, version)?;
    println!("Project {index} bound to engine {version}.");
    Ok(())
}

/// Remove a project from the registry after confirmation.
fn run_remove(index: usize, yes: bool) -> Result<(), CliError> {
    let manager = load_manager()?;

    let name = {
        let store = manager.store().lock();
        match store.project(index) {
            Some(project) => project.name.clone(),
            None => return Err(CliError::Config(format!("no project at index {index}"))),
        }
    };

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove '{name}' from the list? Project files are kept."
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let removed = manager.store().lock().remove_project(index)?;
    println!(
        "Removed {} from the list; files at {} were not touched.",
        removed.name,
        removed.root.display()
    );
    Ok(())
}
