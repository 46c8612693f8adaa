//! `creatorflow settings`: integration credentials and theme.

use creatorflow_core::state::AppState;

use crate::SettingsCommands;

pub fn run_settings_command(command: SettingsCommands, state: &mut AppState) {
    match command {
        SettingsCommands::Notion { key, db } => {
            state.save_settings(&key, &db);
            println!("Notion settings saved.");
        }
        SettingsCommands::Theme { theme } => {
            state.set_theme(theme);
            println!("Theme set to {theme}.");
        }
        SettingsCommands::Show => {
            let settings = state.settings();
            println!("theme       = {}", state.theme());
            println!("notion.key  = {}", mask(&settings.notion_key));
            println!("notion.db   = {}", settings.notion_db);
        }
    }
}

/// Show only the last four characters of a secret.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.is_empty() {
        return "(unset)".to_owned();
    }
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("****{tail}")
}
