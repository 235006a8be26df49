//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use propal_core::UserProfile;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Render a sanitized profile as a key/value table
pub fn profile_table(profile: &UserProfile) -> Table {
    let mut table = create_table();
    table.add_row(vec!["ID".to_string(), profile.id.to_string()]);
    table.add_row(vec!["Username".to_string(), profile.username.clone()]);
    table.add_row(vec!["Email".to_string(), profile.email.clone()]);
    table.add_row(vec![
        "Phone".to_string(),
        profile.phone.clone().unwrap_or_else(|| "-".to_string()),
    ]);
    table
}
