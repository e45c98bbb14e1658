//! Configuration commands for managing Q-Vault settings.
//!
//! - `config show`: Display current configuration
//! - `config get`: Read a single value
//! - `config set`: Set a configuration value

use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use crate::config::{Config, TOKEN_ENV};
use crate::error::Result;

const SECRET_KEYS: &[&str] = &["auth.token"];

/// Mask a sensitive value by showing only the first 2 and last 2 characters
fn mask_sensitive_value(value: &str) -> String {
    let char_count = value.chars().count();
    if char_count > 4 {
        let first: String = value.chars().take(2).collect();
        let last: String = value.chars().skip(char_count - 2).collect();
        format!("{first}...{last}")
    } else {
        "****".to_string()
    }
}

/// Show current configuration
pub fn cmd_config_show(output_json: bool) -> Result<()> {
    let config = Config::load()?;
    let token_configured = config.token().is_some();
    let download_dir = config.download_dir();

    let json_output = json!({
        "base_url": config.base_url(),
        "auth": {
            "token_configured": token_configured,
        },
        "page_size": config.page_size,
        "debounce_ms": config.debounce_ms,
        "request_timeout": config.request_timeout,
        "download_dir": download_dir.to_string_lossy(),
        "config_file": Config::config_path().to_string_lossy(),
    });

    let mut text_output = String::new();
    text_output.push_str(&format!("{}\n\n", "Configuration:".cyan().bold()));
    text_output.push_str(&format!("{}: {}\n", "base_url".cyan(), config.base_url()));

    // Auth status (don't show the token)
    let token_status = if token_configured {
        "configured".green().to_string()
    } else {
        format!("{} (set auth.token or {TOKEN_ENV})", "not configured".dimmed())
    };
    text_output.push_str(&format!("{}:\n", "auth".cyan()));
    text_output.push_str(&format!("  token: {token_status}\n"));
    text_output.push('\n');

    text_output.push_str(&format!("{}: {}\n", "page_size".cyan(), config.page_size));
    text_output.push_str(&format!("{}: {}\n", "debounce_ms".cyan(), config.debounce_ms));
    text_output.push_str(&format!(
        "{}: {}s\n",
        "request_timeout".cyan(),
        config.request_timeout
    ));
    text_output.push_str(&format!(
        "{}: {}\n",
        "download_dir".cyan(),
        download_dir.display()
    ));

    text_output.push('\n');
    text_output.push_str(&format!(
        "{}",
        format!("Config file: {}", Config::config_path().display()).dimmed()
    ));

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output_json)
}

/// Set a configuration value
pub fn cmd_config_set(key: &str, value: &str, output_json: bool) -> Result<()> {
    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;

    let secret = SECRET_KEYS.contains(&key);
    let (json_output, text_output) = if secret {
        (
            json!({
                "action": "config_set",
                "key": key,
                "success": true,
            }),
            format!("Set {}", key.cyan()),
        )
    } else {
        let stored = config.get(key)?.unwrap_or_default();
        (
            json!({
                "action": "config_set",
                "key": key,
                "value": stored,
                "success": true,
            }),
            format!("Set {} to {}", key.cyan(), stored),
        )
    };

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output_json)
}

/// Get a specific configuration value
pub fn cmd_config_get(key: &str, output_json: bool) -> Result<()> {
    let config = Config::load()?;
    let value = config.get(key)?;

    let (json_output, text_output) = match value {
        Some(value) if SECRET_KEYS.contains(&key) => {
            let masked = mask_sensitive_value(&value);
            (
                json!({
                    "key": key,
                    "value": masked,
                    "configured": true,
                    "masked": true,
                }),
                format!("{masked} (masked - showing first 2 and last 2 characters)"),
            )
        }
        Some(value) => (
            json!({
                "key": key,
                "value": value,
                "configured": true,
            }),
            value,
        ),
        None => (
            json!({
                "key": key,
                "value": null,
                "configured": false,
            }),
            "not configured".dimmed().to_string(),
        ),
    };

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output_json)
}
