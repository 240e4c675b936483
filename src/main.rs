use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use worklane::cli::{Cli, Commands, Display};
use worklane::config::{LaneConfig, WorkspacePaths};
use worklane::domain::{Feature, FeaturePriority, Project, Session};
use worklane::engine::{ExecutionEngine, LogSink};
use worklane::error::{LaneError, Result};
use worklane::{AgentRoster, PmAgent, RecordStore};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Display::new().print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("worklane=debug")
    } else {
        EnvFilter::new("worklane=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let display = Display::new();
    let paths = WorkspacePaths::new(std::env::current_dir()?);

    match cli.command {
        Commands::Init => cmd_init(&display, &paths).await,
        Commands::NewProject {
            name,
            path,
            description,
        } => {
            let workspace = open_workspace(&paths).await?;
            let project_path = path.unwrap_or_else(|| paths.root.clone());
            let mut project = Project::new(name, project_path);
            if let Some(description) = description {
                project = project.with_description(description);
            }
            workspace.store.insert_project(&project)?;
            display.print_success(&format!("Created project: {}", project.id));
            Ok(())
        }
        Commands::Projects => {
            let workspace = open_workspace(&paths).await?;
            display.print_header("Projects");
            display.print_projects_table(&workspace.store.list_projects()?);
            Ok(())
        }
        Commands::NewFeature {
            project_id,
            title,
            description,
            priority,
        } => {
            let workspace = open_workspace(&paths).await?;
            if workspace.store.get_project(&project_id)?.is_none() {
                return Err(LaneError::ProjectNotFound(project_id));
            }
            let mut feature = Feature::new(project_id, title)
                .with_priority(priority.unwrap_or(FeaturePriority::Medium));
            if let Some(description) = description {
                feature = feature.with_description(description);
            }
            workspace.store.insert_feature(&feature)?;
            display.print_success(&format!("Created feature: {}", feature.id));
            Ok(())
        }
        Commands::Features { project_id } => {
            let workspace = open_workspace(&paths).await?;
            display.print_header("Features");
            display.print_features_table(&workspace.store.list_features(&project_id)?);
            Ok(())
        }
        Commands::NewSession { feature_id } => {
            let workspace = open_workspace(&paths).await?;
            if workspace.store.get_feature(&feature_id)?.is_none() {
                return Err(LaneError::FeatureNotFound(feature_id));
            }
            let session = Session::new(feature_id);
            workspace.store.insert_session(&session)?;
            display.print_success(&format!("Opened session: {}", session.id));
            Ok(())
        }
        Commands::Chat {
            session_id,
            feature_id,
            message,
        } => cmd_chat(&display, &paths, &session_id, &feature_id, &message).await,
        Commands::Drain {
            session_id,
            feature_id,
        } => cmd_drain(&display, &paths, &session_id, &feature_id).await,
        Commands::Queue => {
            let workspace = open_workspace(&paths).await?;
            display.print_queue_status(&workspace.engine.queue_status()?);
            Ok(())
        }
        Commands::ClearQueue => {
            let workspace = open_workspace(&paths).await?;
            let cancelled = workspace.engine.clear_queue()?;
            display.print_success(&format!("Discarded {} pending step(s)", cancelled));
            Ok(())
        }
        Commands::Tasks { feature_id } => {
            let workspace = open_workspace(&paths).await?;
            display.print_header("Tasks");
            display.print_tasks_table(&workspace.store.list_tasks(&feature_id)?);
            Ok(())
        }
    }
}

/// One shared engine per process, built once and passed around explicitly.
struct Workspace {
    store: Arc<RecordStore>,
    engine: ExecutionEngine,
}

async fn open_workspace(paths: &WorkspacePaths) -> Result<Workspace> {
    if !paths.is_initialized() {
        return Err(LaneError::NotInitialized);
    }

    let config = LaneConfig::load(&paths.lane_dir).await?;
    let store = Arc::new(RecordStore::open(paths.db_path(&config))?);
    let pm = PmAgent::new().with_prd_threshold(config.engine.prd_threshold_chars);
    let engine = ExecutionEngine::new(
        store.clone(),
        Arc::new(AgentRoster::new(pm)),
        Arc::new(LogSink),
    );

    Ok(Workspace { store, engine })
}

async fn cmd_init(display: &Display, paths: &WorkspacePaths) -> Result<()> {
    if paths.is_initialized() {
        display.print_warning("worklane is already initialized in this directory.");
        return Ok(());
    }

    paths.ensure_dirs().await?;
    let config = LaneConfig::default();
    config.save(&paths.lane_dir).await?;

    // Open once so the database and schema exist up front.
    RecordStore::open(paths.db_path(&config))?;

    display.print_success("Initialized worklane.");
    display.print_info(&format!(
        "Configuration: {}",
        paths.lane_dir.join("config.toml").display()
    ));
    display.print_info(&format!(
        "Database: {}",
        paths.db_path(&config).display()
    ));
    Ok(())
}

async fn cmd_chat(
    display: &Display,
    paths: &WorkspacePaths,
    session_id: &str,
    feature_id: &str,
    message: &str,
) -> Result<()> {
    let workspace = open_workspace(paths).await?;

    let result = workspace
        .engine
        .execute_user_message(session_id, feature_id, message)
        .await?;

    if !result.success {
        display.print_error(result.error.as_deref().unwrap_or("Execution failed"));
        return Ok(());
    }

    display.print_agent_reply(&result.output);

    if !result.next_steps.is_empty() {
        display.print_info(&format!("Queued {} step(s)", result.next_steps.len()));
        drain_with_spinner(display, &workspace, session_id, feature_id).await?;
    }

    Ok(())
}

async fn cmd_drain(
    display: &Display,
    paths: &WorkspacePaths,
    session_id: &str,
    feature_id: &str,
) -> Result<()> {
    let workspace = open_workspace(paths).await?;
    let status = workspace.engine.queue_status()?;

    if status.pending == 0 {
        display.print_info("Queue is empty.");
        return Ok(());
    }

    display.print_info(&format!("Resuming {} pending step(s)", status.pending));
    drain_with_spinner(display, &workspace, session_id, feature_id).await
}

async fn drain_with_spinner(
    display: &Display,
    workspace: &Workspace,
    session_id: &str,
    feature_id: &str,
) -> Result<()> {
    let context = workspace.engine.resolve_context(session_id, feature_id)?;

    let spinner = display.create_spinner("Running queued steps...");
    let result = workspace.engine.process_queue(&context).await;
    spinner.finish_and_clear();
    result?;

    display.print_success("Queue drained.");
    display.print_tasks_table(&workspace.store.list_tasks(feature_id)?);
    Ok(())
}
