//! Propal CLI - user account administration

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{login, logs, profile, signup, status};

/// Propal - manage user accounts in the local record store
#[derive(Parser)]
#[command(name = "propal", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new user
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        /// Password (prompted for if omitted)
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// Output the response envelope as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check an email/password pair
    Login {
        #[arg(long)]
        email: String,
        /// Password (PROPAL_PASSWORD or prompt if omitted)
        #[arg(long)]
        password: Option<String>,
        /// Output the response envelope as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change a user's email and/or password
    UpdateProfile {
        /// User id
        #[arg(long)]
        id: String,
        /// New email (unchanged if omitted)
        #[arg(long)]
        email: Option<String>,
        /// New password (unchanged if omitted)
        #[arg(long, conflicts_with = "prompt_password")]
        password: Option<String>,
        /// Prompt for a new password
        #[arg(long)]
        prompt_password: bool,
        /// Output the response envelope as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show record store status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Signup { username, email, password, phone, json } => {
            signup::run(username, email, password, phone, json)
        }
        Commands::Login { email, password, json } => login::run(email, password, json),
        Commands::UpdateProfile { id, email, password, prompt_password, json } => {
            profile::run(&id, email, password, prompt_password, json)
        }
        Commands::Status { json } => status::run(json),
        Commands::Logs { command } => logs::run(command),
    }
}
