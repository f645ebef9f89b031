//! CLI command definitions and dispatch.

pub mod node;
pub mod queue;
pub mod scan;
pub mod thumbs;
pub mod user;

use clap::{Parser, Subcommand};
use tracing::debug;

use homevault_core::config::AppConfig;
use homevault_core::error::AppError;
use homevault_worker::Runtime;

use crate::output::OutputFormat;

/// HomeVault: personal file storage node tree
#[derive(Debug, Parser)]
#[command(name = "homevault", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment; loads `config/default.toml` then
    /// `config/<env>.toml`
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// User management
    User(user::UserArgs),
    /// Browse and change a user's node tree
    Node(node::NodeArgs),
    /// Reconcile the catalog with the filesystem
    Scan(scan::ScanArgs),
    /// Thumbnail maintenance
    Thumbs(thumbs::ThumbsArgs),
    /// Processing queue inspection
    Queue(queue::QueueArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let runtime = connect(&self.env).await?;
        let result = match &self.command {
            Commands::User(args) => user::execute(args, &runtime, self.format).await,
            Commands::Node(args) => node::execute(args, &runtime, self.format).await,
            Commands::Scan(args) => scan::execute(args, &runtime, self.format).await,
            Commands::Thumbs(args) => thumbs::execute(args, &runtime).await,
            Commands::Queue(args) => queue::execute(args, &runtime, self.format).await,
        };
        runtime.db.close().await;
        result
    }
}

/// Helper: load configuration and open the catalog.
///
/// The CLI runs no processor; requests it enqueues stay in the durable
/// queue until the server drains them.
async fn connect(env: &str) -> Result<Runtime, AppError> {
    let config = AppConfig::load(env)?;
    debug!(env, database = %config.database.url, "Opening catalog");
    let (runtime, _signals) = Runtime::connect(config).await?;
    Ok(runtime)
}
