//! Bitbox admin CLI - Migrations and admin directory management.
//!
//! # Usage
//!
//! ```bash
//! # Run admin database migrations
//! bitbox-admin migrate
//!
//! # Register an admin
//! bitbox-admin admin create -e admin@example.com -n "Admin Name" -r manager
//!
//! # Promote an admin
//! bitbox-admin admin role 2b0e8f4c-4a53-4a8e-9d0b-6d5c3f1e2a10 admin
//!
//! # Print role change events as they are published
//! bitbox-admin watch
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin` - Create, inspect, update and delete admins
//! - `watch` - Listen for role change events
//!
//! Results are printed to stdout as JSON. Logs go to stderr.
//!
//! # Exit Codes
//!
//! - `0` - Success
//! - `1` - Infrastructure or configuration failure
//! - `2` - Rejected request (invalid input, unknown admin, duplicate email)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use bitbox_admin::telemetry::init_tracing;
use bitbox_admin_core::{AdminId, AuthorityType, Email};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "bitbox-admin")]
#[command(author, version, about = "Bitbox admin directory tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run admin database migrations
    Migrate,
    /// Manage admins
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Print role change events published on the configured channel
    Watch,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Register a new admin
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: Email,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Initial authority (general, trainee, teacher, manager, admin)
        #[arg(short = 'r', long = "role", default_value = "general")]
        authority: AuthorityType,

        /// Use this ID instead of generating one
        #[arg(long)]
        id: Option<AdminId>,

        /// Profile image URL
        #[arg(long = "profile-image")]
        profile_image_url: Option<String>,
    },
    /// Show an admin, including deleted ones
    Get {
        /// Admin ID
        id: AdminId,
    },
    /// List active admins
    List,
    /// Update an admin's profile
    Update {
        /// Admin ID
        id: AdminId,

        /// New display name
        #[arg(short, long)]
        name: Option<String>,

        /// New profile image URL
        #[arg(long = "profile-image")]
        profile_image_url: Option<String>,
    },
    /// Change an admin's authority
    Role {
        /// Admin ID
        id: AdminId,

        /// New authority (general, trainee, teacher, manager, admin)
        authority: AuthorityType,
    },
    /// Soft-delete an admin
    Delete {
        /// Admin ID
        id: AdminId,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing("bitbox_admin=info");

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            if e.is_rejection() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Admin { action } => {
            let directory = commands::admin::connect().await?;
            match action {
                AdminAction::Create {
                    email,
                    name,
                    authority,
                    id,
                    profile_image_url,
                } => {
                    let input = bitbox_admin::models::NewAdmin {
                        id,
                        email,
                        name,
                        profile_image_url,
                        authority,
                    };
                    commands::admin::create(&directory, input).await
                }
                AdminAction::Get { id } => commands::admin::get(&directory, id).await,
                AdminAction::List => commands::admin::list(&directory).await,
                AdminAction::Update {
                    id,
                    name,
                    profile_image_url,
                } => {
                    let patch = bitbox_admin::models::AdminPatch {
                        name,
                        profile_image_url,
                    };
                    commands::admin::update(&directory, id, patch).await
                }
                AdminAction::Role { id, authority } => {
                    commands::admin::role(&directory, id, authority).await
                }
                AdminAction::Delete { id } => commands::admin::delete(&directory, id).await,
            }
        }
        Commands::Watch => commands::watch::run().await,
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_role_change() {
        let id = AdminId::generate();
        let cli = Cli::try_parse_from(["bitbox-admin", "admin", "role", &id.to_string(), "ADMIN"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Admin {
                action: AdminAction::Role { id: parsed, authority: AuthorityType::Admin }
            }) if parsed == id
        ));
    }

    #[test]
    fn test_rejects_invalid_email() {
        let cli = Cli::try_parse_from([
            "bitbox-admin",
            "admin",
            "create",
            "-e",
            "not-an-email",
            "-n",
            "Kim",
        ]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_create_defaults_to_general() {
        let cli = Cli::try_parse_from([
            "bitbox-admin",
            "admin",
            "create",
            "-e",
            "a@x.com",
            "-n",
            "Kim",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Admin {
                action: AdminAction::Create {
                    authority: AuthorityType::General,
                    id: None,
                    ..
                }
            })
        ));
    }
}
