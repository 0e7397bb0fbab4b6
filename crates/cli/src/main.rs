//! Hardware Store CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! hs-cli migrate
//!
//! # Load the demo catalog (safe to re-run)
//! hs-cli seed
//! hs-cli seed --file my-catalog.yaml
//!
//! # Create an admin account
//! hs-cli admin create -e admin@example.com -n "Admin Name"
//!
//! # Make an existing customer an admin
//! hs-cli admin promote -e jane@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string (read from `.env` too)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "hs-cli")]
#[command(author, version, about = "Hardware Store CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Upsert the demo categories and products
    Seed {
        /// Catalog YAML file (defaults to the bundled demo catalog)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Password; a random one is generated and printed when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Give an existing account the admin role
    Promote {
        /// Email address of the account
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::catalog(file.as_deref()).await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
            } => {
                commands::admin::create_user(&email, &name, password).await?;
            }
            AdminAction::Promote { email } => {
                commands::admin::promote(&email).await?;
            }
        },
    }
    Ok(())
}
