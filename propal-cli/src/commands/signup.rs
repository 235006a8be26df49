//! Signup command - register a new user

use anyhow::Result;
use propal_core::NewAccount;

use super::{get_context, new_password_with_confirm, respond};

pub fn run(
    username: String,
    email: String,
    password: Option<String>,
    phone: Option<String>,
    json: bool,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => new_password_with_confirm("Password")?,
    };

    let ctx = get_context("signup")?;
    let mut account = NewAccount::new(username, email, password);
    if let Some(phone) = phone.filter(|p| !p.is_empty()) {
        account = account.with_phone(phone);
    }

    respond(ctx.account_service.create(account), json, "Account created")
}
