//! User management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use homevault_core::error::AppError;
use homevault_entity::user::User;
use homevault_worker::Runtime;

use crate::output::{self, OutputFormat};

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create a user and its root directory
    Add {
        /// Login name, also the home directory name
        name: String,
        /// Grant administrator rights
        #[arg(long)]
        admin: bool,
    },
    /// List all users
    List,
}

/// User display row for table output
#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    id: i64,
    name: String,
    admin: bool,
    root_id: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.get(),
            name: user.name.clone(),
            admin: user.admin,
            root_id: user.root_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }
}

/// Execute user commands
pub async fn execute(args: &UserArgs, runtime: &Runtime, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        UserCommand::Add { name, admin } => {
            let (user, root) = runtime.users.create(name, *admin).await?;
            output::print_success(&format!(
                "User '{}' created (id {}, root {})",
                user.name, user.id, root.id
            ));
            output::print_kv(
                "Home directory",
                &runtime.layout.home_dir(&user.name).display().to_string(),
            );
        }
        UserCommand::List => {
            let users = runtime.users.list().await?;
            let rows: Vec<UserRow> = users.iter().map(UserRow::from).collect();
            output::print_list(&rows, format);
        }
    }

    Ok(())
}
