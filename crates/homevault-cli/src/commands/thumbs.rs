//! Thumbnail maintenance CLI commands.

use clap::{Args, Subcommand};

use homevault_core::error::AppError;
use homevault_worker::Runtime;
use homevault_worker::jobs::regenerate_thumbnails;

use crate::output;

/// Arguments for thumbnail commands
#[derive(Debug, Args)]
pub struct ThumbsArgs {
    /// Thumbnail subcommand
    #[command(subcommand)]
    pub command: ThumbsCommand,
}

/// Thumbnail subcommands
#[derive(Debug, Subcommand)]
pub enum ThumbsCommand {
    /// Enqueue thumbnailable files for processing again
    Regenerate {
        /// Only files that have no thumbnail yet
        #[arg(long)]
        missing: bool,
    },
}

/// Execute thumbnail commands
pub async fn execute(args: &ThumbsArgs, runtime: &Runtime) -> Result<(), AppError> {
    match &args.command {
        ThumbsCommand::Regenerate { missing } => {
            let enqueued =
                regenerate_thumbnails(&runtime.db, &runtime.queue, &runtime.layout, *missing).await?;
            output::print_success(&format!(
                "Enqueued {enqueued} file(s); the server processes them on its next wake-up or start"
            ));
        }
    }

    Ok(())
}
