use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use drydock::fleet_config::{DEFAULT_PROJECTS_DIR, DEFAULT_RUNTIME_SOCKET, FleetConfig};
use drydock::lifecycle::Scheduler;
use drydock::registry;
use drydock::server::{self, AppState};

#[derive(Parser)]
#[command(name = "drydock")]
#[command(version, about = "Dashboard service for a local project fleet")]
pub struct Cli {
    /// Raise the default log filter to debug
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Root directory scanned for projects
    #[arg(long, default_value = DEFAULT_PROJECTS_DIR, global = true)]
    pub projects_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the scheduler and the JSON API
    Serve {
        /// Port to serve on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Scheduler poll interval in seconds
        #[arg(long, default_value = "1")]
        interval_secs: u64,

        /// Container runtime control socket
        #[arg(long, default_value = DEFAULT_RUNTIME_SOCKET)]
        runtime_socket: PathBuf,
    },
    /// Print the discovered project registry
    List,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "drydock=debug" } else { "drydock=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Serve {
            port,
            interval_secs,
            runtime_socket,
        } => {
            let config = FleetConfig {
                projects_dir: cli.projects_dir,
                runtime_socket,
                poll_interval: Duration::from_secs(interval_secs.max(1)),
                port,
            };
            cmd_serve(config).await
        }
        Commands::List => cmd_list(&cli.projects_dir),
    }
}

async fn cmd_serve(config: FleetConfig) -> Result<()> {
    let state = Arc::new(AppState::new(config.clone()));
    tracing::info!(
        root = %config.projects_dir.display(),
        count = state.projects.ids().await.len(),
        "registry loaded"
    );

    // Scheduler and server share the project set; the watch channel gives
    // the scheduler a clean exit once the server returns.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let scheduler = Scheduler::new(state.projects.clone(), config.poll_interval);
    let scheduler_task = tokio::spawn(scheduler.run(shutdown_rx));

    let result = server::serve(state).await;

    let _ = shutdown_tx.send(true);
    let _ = scheduler_task.await;
    result
}

fn cmd_list(projects_dir: &std::path::Path) -> Result<()> {
    let projects = registry::load(projects_dir);
    if projects.is_empty() {
        println!("No projects under {}", projects_dir.display());
        return Ok(());
    }
    for project in projects {
        let build = match &project.build_command {
            Some(cmd) => cmd.as_str(),
            None => "(undefined)",
        };
        println!(
            "{}  engine={}  image={}\n    {}",
            console::style(&project.id).bold(),
            project.engine,
            project.image_name,
            console::style(build).dim()
        );
    }
    Ok(())
}
