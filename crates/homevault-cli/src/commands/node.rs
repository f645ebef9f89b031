//! Node tree CLI commands, acting as a named user.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use homevault_core::config::IngestMode;
use homevault_core::error::AppError;
use homevault_entity::node::{Node, NodeWithExtras};
use homevault_service::Actor;
use homevault_service::node::path;
use homevault_worker::Runtime;

use crate::output::{self, OutputFormat};

/// Arguments for node commands
#[derive(Debug, Args)]
pub struct NodeArgs {
    /// User whose tree is addressed
    #[arg(short, long)]
    pub user: String,

    /// Node subcommand
    #[command(subcommand)]
    pub command: NodeCommand,
}

/// Node subcommands. Paths are logical, relative to the user's root.
#[derive(Debug, Subcommand)]
pub enum NodeCommand {
    /// List a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Show the node a path resolves to
    Resolve { path: String },
    /// Create a directory
    Mkdir { path: String },
    /// Import a local file into a directory
    Import {
        /// Local file to import
        source: PathBuf,
        /// Destination directory
        #[arg(default_value = "/")]
        dest: String,
        /// Name in the catalog; defaults to the source file name
        #[arg(short, long)]
        name: Option<String>,
        /// Copy the bytes regardless of the configured ingest mode
        #[arg(long)]
        copy: bool,
        /// Remove the source once processed
        #[arg(long = "move")]
        move_source: bool,
    },
    /// Rename a node in place
    Rename { path: String, new_name: String },
    /// Move a node into another directory
    Mv { path: String, dest: String },
    /// Copy a node, recursively for directories
    Cp {
        path: String,
        dest: String,
        /// Name of the copy; defaults to the source name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Delete a node
    Rm {
        path: String,
        /// Delete non-empty directories with everything beneath them
        #[arg(short, long)]
        recursive: bool,
    },
    /// Find nodes whose names contain every term
    Search { text: String },
}

/// Node display row for table output
#[derive(Debug, Serialize, Tabled)]
struct NodeRow {
    id: i64,
    name: String,
    #[tabled(rename = "type")]
    node_type: String,
    mime_type: String,
    size: i64,
    length: String,
    modified: String,
    thumb: bool,
    progress: String,
}

impl From<&Node> for NodeRow {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.get(),
            name: node.name.clone(),
            node_type: node.node_type.to_string(),
            mime_type: node.mime_type.clone(),
            size: node.size,
            length: node.length.map(|l| format!("{l:.1}s")).unwrap_or_default(),
            modified: node.modified_on.format("%Y-%m-%d %H:%M").to_string(),
            thumb: node.has_custom_thumb,
            progress: String::new(),
        }
    }
}

impl From<&NodeWithExtras> for NodeRow {
    fn from(item: &NodeWithExtras) -> Self {
        let mut row = Self::from(&item.node);
        if let Some(progress) = &item.progress {
            row.progress = format!("{:.1}s", progress.progress);
        }
        row
    }
}

/// Execute node commands
pub async fn execute(args: &NodeArgs, runtime: &Runtime, format: OutputFormat) -> Result<(), AppError> {
    let user = runtime.users.by_name(&args.user).await?;
    let (user, root) = runtime.users.ensure_root(user.id).await?;
    let actor = Actor::for_user(&user);
    let nodes = &runtime.nodes;

    match &args.command {
        NodeCommand::Ls { path } => {
            let dir = lookup(runtime, &actor, &root, path).await?;
            let listing = nodes.list_dir(&actor, dir.id).await?;
            match format {
                OutputFormat::Json => output::print_item(&listing, format),
                OutputFormat::Table => {
                    output::print_kv("Directory", &listing.path);
                    let rows: Vec<NodeRow> = listing.children.iter().map(NodeRow::from).collect();
                    output::print_list(&rows, format);
                }
            }
        }
        NodeCommand::Resolve { path } => {
            let node = lookup(runtime, &actor, &root, path).await?;
            output::print_list(&[NodeRow::from(&node)], format);
        }
        NodeCommand::Mkdir { path: target } => {
            let (parent, name) = path::split_parent(target)
                .ok_or_else(|| AppError::bad_request("The root directory already exists"))?;
            let parent = lookup(runtime, &actor, &root, &parent).await?;
            let dir = nodes.make_dir(&actor, parent.id, name).await?;
            output::print_success(&format!("Created directory {} (id {})", path::normalize(target), dir.id));
        }
        NodeCommand::Import {
            source,
            dest,
            name,
            copy,
            move_source,
        } => {
            let name = match name {
                Some(name) => name.clone(),
                None => source
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AppError::bad_request(format!("Cannot name '{}', pass --name", source.display()))
                    })?,
            };
            let mode = if *copy {
                IngestMode::Copy
            } else {
                runtime.config.storage.ingest_mode
            };
            let dir = lookup(runtime, &actor, &root, dest).await?;
            let node = nodes
                .create_file(&actor, dir.id, &name, source, mode, *move_source)
                .await?;
            output::print_success(&format!(
                "Imported '{}' as node {} ({}, {} bytes); processing queued",
                name, node.id, node.mime_type, node.size
            ));
        }
        NodeCommand::Rename { path, new_name } => {
            let node = lookup(runtime, &actor, &root, path).await?;
            let renamed = nodes.rename(&actor, node.id, new_name).await?;
            output::print_success(&format!("Renamed node {} to '{}'", renamed.id, renamed.name));
        }
        NodeCommand::Mv { path, dest } => {
            let node = lookup(runtime, &actor, &root, path).await?;
            let dest = lookup(runtime, &actor, &root, dest).await?;
            let moved = nodes.move_node(&actor, node.id, dest.id).await?;
            let now = nodes.logical_path(&actor, moved.id).await?;
            output::print_success(&format!("Moved node {} to {}", moved.id, now));
        }
        NodeCommand::Cp { path, dest, name } => {
            let node = lookup(runtime, &actor, &root, path).await?;
            let dest = lookup(runtime, &actor, &root, dest).await?;
            let new_name = name.clone().unwrap_or_else(|| node.name.clone());
            let created = nodes.copy(&actor, node.id, dest.id, &new_name).await?;
            output::print_success(&format!("Copied {} node(s)", created.len()));
        }
        NodeCommand::Rm { path, recursive } => {
            let node = lookup(runtime, &actor, &root, path).await?;
            let deleted = nodes.delete(&actor, node.id, *recursive).await?;
            let rows: Vec<NodeRow> = deleted.iter().map(NodeRow::from).collect();
            output::print_list(&rows, format);
            output::print_success(&format!("Deleted {} node(s)", deleted.len()));
        }
        NodeCommand::Search { text } => {
            let found = nodes.search(&actor, text).await?;
            let rows: Vec<NodeRow> = found.iter().map(NodeRow::from).collect();
            output::print_list(&rows, format);
        }
    }

    Ok(())
}

async fn lookup(runtime: &Runtime, actor: &Actor, root: &Node, logical: &str) -> Result<Node, AppError> {
    runtime
        .nodes
        .resolve(actor, root.id, logical)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No node at '{}'", path::normalize(logical))))
}
