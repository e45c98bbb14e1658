use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, Portal};
use crate::auth::AuthGate;
use crate::error::Result;

/// Show who the configured token belongs to
pub async fn cmd_whoami(output_json: bool) -> Result<()> {
    let portal = Portal::load()?;
    let auth = portal.auth().await?;

    let Some(user) = auth.current_user() else {
        return CommandOutput::new(json!({ "signed_in": false, "user": null }))
            .with_text("Not signed in".dimmed().to_string())
            .print(output_json);
    };

    let mut text = format!("{} {}", "Signed in as".green(), user.email.bold());
    if let Some(name) = &user.name {
        text.push_str(&format!(" ({name})"));
    }
    if user.is_admin() {
        text.push_str(&format!(" {}", "[admin]".magenta()));
    }

    CommandOutput::new(json!({ "signed_in": true, "user": user }))
        .with_text(text)
        .print(output_json)
}
