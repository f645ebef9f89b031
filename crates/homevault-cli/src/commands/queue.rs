//! Processing queue CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use homevault_core::error::AppError;
use homevault_entity::processing::ProcessingRequest;
use homevault_worker::Runtime;

use crate::output::{self, OutputFormat};

/// Arguments for queue commands
#[derive(Debug, Args)]
pub struct QueueArgs {
    /// Queue subcommand
    #[command(subcommand)]
    pub command: QueueCommand,
}

/// Queue subcommands
#[derive(Debug, Subcommand)]
pub enum QueueCommand {
    /// Show the pending backlog
    Status {
        /// How many of the oldest requests to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },
}

/// Pending request row
#[derive(Debug, Serialize, Tabled)]
struct RequestRow {
    id: i64,
    node_id: i64,
    source_path: String,
    delete_source: bool,
    created_at: String,
}

impl From<&ProcessingRequest> for RequestRow {
    fn from(request: &ProcessingRequest) -> Self {
        Self {
            id: request.id.get(),
            node_id: request.node_id.get(),
            source_path: request.source_path.clone(),
            delete_source: request.delete_source,
            created_at: request.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Execute queue commands
pub async fn execute(args: &QueueArgs, runtime: &Runtime, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        QueueCommand::Status { limit } => {
            let pending = runtime.queue.pending_count().await?;
            let oldest = runtime.queue.pending(*limit).await?;
            let rows: Vec<RequestRow> = oldest.iter().map(RequestRow::from).collect();
            if format == OutputFormat::Table {
                output::print_kv("Pending requests", &pending.to_string());
            }
            output::print_list(&rows, format);
        }
    }

    Ok(())
}
