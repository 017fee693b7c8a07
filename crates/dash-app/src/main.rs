//! `dashctl`: drive the dashboard engine from the command line

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dash_backend::{Catalog, InMemoryBackend};
use dash_core::{Command, EngineSettings};
use dash_model::Dashboard;
use tracing::info;

mod replay;

#[derive(Parser)]
#[command(name = "dashctl")]
#[command(about = "Replay dashboard commands against a dashboard document")]
struct Cli {
    /// Log engine internals (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a JSON array of commands and print one event per line
    Replay {
        /// Dashboard JSON document
        #[arg(long)]
        dashboard: PathBuf,
        /// JSON array of commands
        #[arg(long)]
        commands: PathBuf,
        /// Backend catalog with insights, display forms and dashboards
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Engine settings
        #[arg(long)]
        config: Option<PathBuf>,
        /// Where to write the resulting dashboard
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the outline of a dashboard document
    Inspect {
        #[arg(long)]
        dashboard: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {} from {}", what, path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {} from {}", what, path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Replay {
            dashboard,
            commands,
            catalog,
            config,
            out,
        } => {
            let settings = match config {
                Some(path) => EngineSettings::load(&path)
                    .with_context(|| format!("loading settings from {}", path.display()))?,
                None => EngineSettings::default(),
            };
            let backend = match catalog {
                Some(path) => InMemoryBackend::from_catalog(read_json::<Catalog>(&path, "catalog")?),
                None => InMemoryBackend::new(),
            };
            let dashboard: Dashboard = read_json(&dashboard, "dashboard")?;
            let commands: Vec<Command> = read_json(&commands, "commands")?;

            let report = replay::replay(dashboard, commands, backend, settings).await?;
            for event in &report.events {
                println!("{}", serde_json::to_string(event)?);
            }
            info!(
                "{} events, {} failed, {} cancelled",
                report.events.len(),
                report.failed,
                report.cancelled
            );

            if let Some(path) = out {
                fs::write(&path, serde_json::to_string_pretty(&report.dashboard)?)
                    .with_context(|| format!("writing dashboard to {}", path.display()))?;
                info!("Wrote dashboard to {}", path.display());
            }
        }
        Commands::Inspect { dashboard } => {
            let dashboard: Dashboard = read_json(&dashboard, "dashboard")?;
            println!("{}", replay::outline(&dashboard));
        }
    }

    Ok(())
}
