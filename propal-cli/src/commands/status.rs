//! Status command - show record store summary

use anyhow::Result;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use super::get_context;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context("status")?;
    let status = ctx.status_service.get_status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "User Store Status".bold());
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec!["Store", status.location.as_str()]);
    table.add_row(vec![
        "Initialized",
        if status.initialized { "yes" } else { "no" },
    ]);
    table.add_row(vec!["Users", &status.total_users.to_string()]);
    table.add_row(vec![
        "Lock timeout",
        &format!("{} ms", ctx.config.lock_timeout.as_millis()),
    ]);

    println!("{}", table);

    if status.legacy_credentials > 0 {
        println!();
        println!(
            "{}",
            format!(
                "{} user(s) still have plain-text passwords; they are hashed on next login.",
                status.legacy_credentials
            )
            .yellow()
        );
    }
    if status.duplicate_emails > 0 {
        println!(
            "{}",
            format!(
                "{} email address(es) are registered more than once.",
                status.duplicate_emails
            )
            .red()
        );
    }

    Ok(())
}
