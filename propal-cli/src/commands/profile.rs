//! Update-profile command - change a user's email and/or password

use anyhow::{Context, Result};
use propal_core::ProfileUpdate;
use uuid::Uuid;

use super::{get_context, new_password_with_confirm, respond};

pub fn run(
    id: &str,
    email: Option<String>,
    password: Option<String>,
    prompt_password: bool,
    json: bool,
) -> Result<()> {
    let id = Uuid::parse_str(id).with_context(|| format!("Invalid user id: {}", id))?;

    let password = match password {
        Some(p) => Some(p),
        None if prompt_password => Some(new_password_with_confirm("New password")?),
        None => None,
    };

    let mut update = ProfileUpdate::default();
    if let Some(email) = email {
        update = update.email(email);
    }
    if let Some(password) = password {
        update = update.password(password);
    }

    let ctx = get_context("update-profile")?;
    respond(
        ctx.account_service.update_profile(id, update),
        json,
        "Profile updated",
    )
}
