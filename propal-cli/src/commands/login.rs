//! Login command - check an email/password pair

use anyhow::Result;

use super::{get_context, password_or_prompt, respond};

pub fn run(email: String, password: Option<String>, json: bool) -> Result<()> {
    let password = password_or_prompt(password, "Password")?;

    let ctx = get_context("login")?;
    respond(
        ctx.account_service.authenticate(&email, &password),
        json,
        "Signed in",
    )
}
