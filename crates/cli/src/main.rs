//! nexdoor CLI - Sign in and manage leads from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password from -p or NEXDOOR_PASSWORD)
//! nd-cli login -e agent@example.com
//!
//! # Show the confirmed lead list
//! nd-cli leads list
//!
//! # Add one lead
//! nd-cli leads add --name "Ada Lovelace" --phone 555-0100 --interest High
//!
//! # Import a CSV file
//! nd-cli leads import march.csv
//!
//! # Sign out
//! nd-cli logout
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` / `whoami` - Session management
//! - `leads list` / `leads add` / `leads import` - Lead management
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Log filter (default: `nexdoor_leads=info,nexdoor_cli=info`)
//! - `NEXDOOR_LOG_FORMAT` - Set to `json` for structured logs
//! - See [`nexdoor_leads::config`] for the service settings

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::leads::NewLead;

#[derive(Parser)]
#[command(name = "nd-cli")]
#[command(author, version, about = "nexdoor lead tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in to the lead service
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password (falls back to `NEXDOOR_PASSWORD`)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Manage leads
    Leads {
        #[command(subcommand)]
        action: LeadsAction,
    },
}

#[derive(Subcommand)]
enum LeadsAction {
    /// List your leads
    List,
    /// Add a single lead
    Add(NewLead),
    /// Import leads from a CSV file
    Import {
        /// Path to the CSV file
        file: PathBuf,
    },
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "nexdoor_leads=info,nexdoor_cli=info".into());

    // Logs go to stderr; stdout is reserved for command output
    let json = std::env::var("NEXDOOR_LOG_FORMAT")
        .is_ok_and(|format| format.eq_ignore_ascii_case("json"));
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

#[tokio::main]
async fn main() {
    // Load .env before reading the log settings
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Login { email, password } => {
            commands::session::login(&email, password).await?;
        }
        Commands::Logout => commands::session::logout()?,
        Commands::Whoami => commands::session::whoami()?,
        Commands::Leads { action } => match action {
            LeadsAction::List => commands::leads::list().await?,
            LeadsAction::Add(lead) => commands::leads::add(lead).await?,
            LeadsAction::Import { file } => commands::leads::import(&file).await?,
        },
    }
    Ok(())
}
