//! CLI command implementations

pub mod login;
pub mod logs;
pub mod profile;
pub mod signup;
pub mod status;

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::Password;
use propal_core::domain::result::Result as CoreResult;
use propal_core::{EntryPoint, OperationResult, PropalContext, UserProfile};

use crate::output;

/// Get the propal data directory from environment or default
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = env::var("PROPAL_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".propal"))
}

/// Build the propal context for the data directory and record the command
pub fn get_context(command: &str) -> Result<PropalContext> {
    let data_dir = get_data_dir()?;

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    let ctx = PropalContext::new(&data_dir, EntryPoint::Cli)
        .context("Failed to initialize propal context")?;

    // Logging should never break the command
    if let Some(logger) = &ctx.logging_service {
        let _ = logger.log_command(command);
    }
    Ok(ctx)
}

/// Get password from the flag, PROPAL_PASSWORD env var, or prompt
pub fn password_or_prompt(password_flag: Option<String>, prompt: &str) -> Result<String> {
    if let Some(p) = password_flag {
        return Ok(p);
    }

    if let Ok(p) = env::var("PROPAL_PASSWORD") {
        return Ok(p);
    }

    let p = Password::new().with_prompt(prompt).interact()?;
    Ok(p)
}

/// Prompt for a new password twice
pub fn new_password_with_confirm(prompt: &str) -> Result<String> {
    let p = Password::new()
        .with_prompt(prompt)
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;
    Ok(p)
}

/// Print the outcome of an account operation
///
/// With `json` the response envelope is printed as-is; that is the contract
/// the session client consumes. Either way a failed operation makes the
/// command fail.
pub fn respond(result: CoreResult<UserProfile>, json: bool, success_msg: &str) -> Result<()> {
    let response = OperationResult::from(result);

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else if let Some(profile) = &response.data {
        output::success(success_msg);
        println!("{}", output::profile_table(profile));
    }

    match (response.success, response.error, response.error_kind) {
        (true, _, _) => Ok(()),
        (false, error, kind) => {
            let message = error.unwrap_or_else(|| "Operation failed".to_string());
            match kind {
                Some(kind) if kind.is_retryable() => {
                    anyhow::bail!("{} {}", message, "(retry)".dimmed())
                }
                _ => anyhow::bail!(message),
            }
        }
    }
}
