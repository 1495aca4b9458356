use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use slipway_model::PersistentModelStore;
use slipway_sync::{
    GradleClasspathContainer, NewProjectHandler, ScheduleOutcome, SynchronizationJobManager,
    SynchronizationRequest, SynchronizeBuildOperation,
};
use slipway_tooling::{BuildConfiguration, ModelProvider, SnapshotConnector};
use slipway_workspace::{LocalWorkspace, Workspace};

/// Store location inside the workspace, one properties file per project.
const STORE_REL_PATH: &str = ".metadata/.plugins/slipway.core/project-preferences";

#[derive(Parser)]
#[command(name = "slipway", version, about = "Synchronize Gradle builds into a workspace")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Synchronize a Gradle build into the workspace
    Sync(SyncArgs),
    /// Show the persisted synchronization state of every known project
    Status(StatusArgs),
    /// Remove Gradle ownership markers from a project directory
    Uncouple(UncoupleArgs),
    /// Resolve the Gradle classpath container for a project
    Classpath(ClasspathArgs),
}

#[derive(Args)]
struct SyncArgs {
    /// Root directory of the Gradle build
    build_root: PathBuf,
    /// Workspace root (defaults to the parent of the build root)
    #[arg(long)]
    workspace: Option<PathBuf>,
    /// Only update already-imported projects, never import new ones
    #[arg(long)]
    no_import: bool,
}

#[derive(Args)]
struct StatusArgs {
    /// Workspace root
    #[arg(long, default_value = ".")]
    workspace: PathBuf,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct UncoupleArgs {
    /// Directory of the project to uncouple
    project_dir: PathBuf,
    /// Workspace root
    #[arg(long, default_value = ".")]
    workspace: PathBuf,
}

#[derive(Args)]
struct ClasspathArgs {
    /// Workspace project name
    project: String,
    /// Workspace root
    #[arg(long, default_value = ".")]
    workspace: PathBuf,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Sync(args) => sync(args),
        Command::Status(args) => status(args),
        Command::Uncouple(args) => uncouple(args),
        Command::Classpath(args) => classpath(args),
    }
}

fn store_for(workspace_root: &std::path::Path) -> PersistentModelStore {
    PersistentModelStore::new(workspace_root.join(STORE_REL_PATH))
}

fn sync(args: SyncArgs) -> Result<()> {
    let build_root = args
        .build_root
        .canonicalize()
        .with_context(|| format!("build root {} not found", args.build_root.display()))?;
    let workspace_root = match args.workspace {
        Some(path) => path,
        None => build_root
            .parent()
            .context("build root has no parent directory to use as workspace")?
            .to_path_buf(),
    };

    let workspace = Arc::new(LocalWorkspace::new(&workspace_root));
    let store = store_for(&workspace_root);
    let provider = Arc::new(ModelProvider::new(Arc::new(SnapshotConnector::new(
        &build_root,
    ))));
    let handler = if args.no_import {
        NewProjectHandler::NoOp
    } else {
        NewProjectHandler::ImportAndMerge
    };

    let manager = SynchronizationJobManager::new();
    let request = SynchronizationRequest::new(
        BTreeSet::from([build_root.clone()]),
        handler,
    );
    let config = BuildConfiguration::new(build_root);
    let outcome = manager.schedule(request, move |token| {
        SynchronizeBuildOperation::new(workspace.as_ref(), &store, provider.as_ref(), config)
            .with_new_project_handler(handler)
            .run(token)
    });
    let handle = match outcome {
        ScheduleOutcome::Scheduled(handle) => handle,
        ScheduleOutcome::Coalesced => bail!("a covering synchronization is already running"),
    };

    let result = handle.join()?;
    for problem in &result.problems {
        eprintln!("{problem}");
    }
    if result.has_errors() {
        bail!("synchronization finished with errors");
    }
    Ok(())
}

fn status(args: StatusArgs) -> Result<()> {
    let store = store_for(&args.workspace);
    let dir = args.workspace.join(STORE_REL_PATH);
    let mut entries = Vec::new();
    if dir.is_dir() {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let Some(name) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(".prefs"))
            else {
                continue;
            };
            if let Some(model) = store.load(name) {
                entries.push(model);
            }
        }
    }

    if args.json {
        let report: Vec<_> = entries
            .iter()
            .map(|m| {
                serde_json::json!({
                    "project": m.project,
                    "gradleVersion": m.gradle_version.as_str(),
                    "classpathEntries": m.classpath.len(),
                    "managedNatures": m.managed_natures,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if entries.is_empty() {
        println!("no synchronized projects");
    } else {
        for model in &entries {
            println!(
                "{}  gradle {}  {} classpath entries",
                model.project,
                model.gradle_version.as_str(),
                model.classpath.len()
            );
        }
    }
    Ok(())
}

fn uncouple(args: UncoupleArgs) -> Result<()> {
    let project_dir = args
        .project_dir
        .canonicalize()
        .with_context(|| format!("project directory {} not found", args.project_dir.display()))?;
    slipway_tooling::delete_project_configuration(&project_dir)?;

    let store = store_for(&args.workspace);
    let workspace = LocalWorkspace::new(&args.workspace);
    let name = match workspace.find_project_at(&project_dir) {
        Some(info) => info.name,
        None => project_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("project directory has no name")?,
    };
    store.delete(&name)?;
    println!("uncoupled {name}");
    Ok(())
}

fn classpath(args: ClasspathArgs) -> Result<()> {
    let container = GradleClasspathContainer::new(store_for(&args.workspace));
    let entries = container.resolve(&args.project);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("no classpath entries for {}", args.project);
    } else {
        for entry in &entries {
            println!("{}", entry.path);
        }
    }
    Ok(())
}
