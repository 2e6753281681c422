//! Paw Market CLI - migrations, account roles and catalog seeding.
//!
//! # Usage
//!
//! ```bash
//! # Apply schema migrations and create the session table
//! pm-cli migrate
//!
//! # Give an existing account back-office access
//! pm-cli user promote -e linh@pawmarket.vn -r staff
//!
//! # Load categories, brands, products, shipping methods and coupons
//! pm-cli seed catalog -f seed/catalog.yaml
//! ```
//!
//! The database URL comes from `--database-url`, `DATABASE_URL` or a `.env`
//! file, in that order.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;

mod commands;

#[derive(Parser)]
#[command(name = "pm-cli")]
#[command(author, version, about = "Paw Market CLI tools")]
struct Cli {
    /// `PostgreSQL` connection string
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Load reference data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Change an account's role
    Promote {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// New role (`customer`, `staff`, `admin`)
        #[arg(short, long, default_value = "staff")]
        role: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Seed the catalog from a YAML file
    Catalog {
        /// Path to the YAML file
        #[arg(short, long)]
        file: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Before parsing so `.env` can supply DATABASE_URL
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = cli
        .database_url
        .map(SecretString::from)
        .ok_or("DATABASE_URL not set (pass --database-url or set it in .env)")?;

    match cli.command {
        Commands::Migrate => commands::migrate::run(&database_url).await?,
        Commands::User { action } => match action {
            UserAction::Promote { email, role } => {
                commands::user::promote(&database_url, &email, &role).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => {
                commands::seed::catalog(&database_url, &file).await?;
            }
        },
    }
    Ok(())
}
