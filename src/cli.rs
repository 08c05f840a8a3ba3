use std::path::{Path, PathBuf};

mod add;
mod delete;
mod list;
mod predict;
mod show;
mod status;
mod terminal;

use add::Add;
use anyhow::Context;
use civiclog::{Config, FileBackend, LoadState, Notice, RequestStore, ServiceRequest};
use clap::ArgAction;
use delete::Delete;
use list::List;
use predict::Predict;
use show::Show;
use status::SetStatus;
use terminal::Colorize;
use tracing::instrument;
use uuid::Uuid;

/// Name of the per-workspace metadata directory.
const WORKSPACE_DIR: &str = ".civiclog";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global=true)]
    verbose: u8,

    /// The path to the root of the civiclog workspace
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::List(List::default()))
            .run(&self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Initialize a new civiclog workspace
    Init,

    /// Log a new service request
    Add(Add),

    /// List service requests, newest first (default)
    List(List),

    /// Show one service request in full
    Show(Show),

    /// Change the status of a service request
    Status(SetStatus),

    /// Delete a service request
    Delete(Delete),

    /// Ask the AI for a likely status, without logging anything
    Predict(Predict),
}

impl Command {
    fn run(self, root: &Path) -> anyhow::Result<()> {
        match self {
            Self::Init => Init::run(root)?,
            Self::Add(command) => command.run(root)?,
            Self::List(command) => command.run(root)?,
            Self::Show(command) => command.run(root)?,
            Self::Status(command) => command.run(root)?,
            Self::Delete(command) => command.run(root)?,
            Self::Predict(command) => command.run(root)?,
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Init {}

impl Init {
    #[instrument]
    fn run(root: &Path) -> anyhow::Result<()> {
        let dir = root.join(WORKSPACE_DIR);
        if dir.join("config.toml").exists() {
            anyhow::bail!(
                "Workspace already initialized (found existing {WORKSPACE_DIR}/config.toml)"
            );
        }

        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {WORKSPACE_DIR} directory"))?;

        let config = Config::default();
        config
            .save(&config_path(root))
            .context("Failed to create config.toml")?;

        println!("Initialized civiclog workspace in {}", root.display());
        println!("  Created: {WORKSPACE_DIR}/config.toml");
        println!();
        println!("Next steps:");
        println!("  civiclog add \"Pothole on Main St near 1st Ave\" --category pothole-repair");
        Ok(())
    }
}

fn config_path(root: &Path) -> PathBuf {
    root.join(WORKSPACE_DIR).join("config.toml")
}

/// Loads the workspace configuration, using defaults if there is none.
fn load_config(root: &Path) -> Config {
    Config::load_or_default(&config_path(root))
}

/// Opens and loads the request store for the workspace at `root`.
fn open_store(root: &Path) -> anyhow::Result<RequestStore<FileBackend>> {
    let config = load_config(root);
    let mut store = RequestStore::new(FileBackend::new(config.storage_dir(root)));

    if let LoadState::Failed(reason) = store.load() {
        anyhow::bail!("Failed to read stored requests: {reason}");
    }
    Ok(store)
}

/// Resolves a full UUID or a unique id prefix to a request id.
///
/// An empty id is refused rather than treated as a prefix of every id.
fn resolve_id(store: &RequestStore<FileBackend>, input: &str) -> anyhow::Result<Uuid> {
    let input = input.trim();
    if input.is_empty() {
        anyhow::bail!("Request id must not be empty");
    }

    if let Ok(id) = Uuid::parse_str(input) {
        return Ok(id);
    }

    match store.find_by_prefix(input).as_slice() {
        [] => anyhow::bail!("No request matches id '{input}'"),
        [request] => Ok(request.id),
        matches => anyhow::bail!(
            "Id '{input}' is ambiguous, it matches {} requests",
            matches.len()
        ),
    }
}

/// The first block of a request id, used where space is tight.
fn short_id(request: &ServiceRequest) -> String {
    request.id.simple().to_string()[..8].to_string()
}

/// Prints queued store notices once, failing if a save was lost.
fn flush_notices(store: &mut RequestStore<FileBackend>) -> anyhow::Result<()> {
    let mut save_failed = false;
    for notice in store.take_notices() {
        match notice {
            Notice::SaveFailed(reason) => {
                save_failed = true;
                eprintln!(
                    "{}",
                    format!("⚠️  Error saving data: your changes could not be saved ({reason})")
                        .warning()
                );
            }
            Notice::Deleted(id) => {
                println!("{}", format!("✅ Request {id} deleted").success());
            }
        }
    }

    if save_failed {
        anyhow::bail!("Changes were not saved");
    }
    Ok(())
}
