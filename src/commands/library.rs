//! Favorites and catalog administration listings.

use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, Portal, settle};
use crate::auth::AuthGate;
use crate::display::format_paper_table;
use crate::error::{QvaultError, Result};
use crate::remote::PaperSummary;
use crate::session::{ActionOutcome, ViewKind};

fn listing_text(papers: &[PaperSummary], empty: &str) -> String {
    if papers.is_empty() {
        empty.dimmed().to_string()
    } else {
        format!(
            "{}\n{}",
            format_paper_table(papers),
            format!("{} papers", papers.len()).dimmed()
        )
    }
}

/// List the signed-in user's favorites, optionally filtered locally
pub async fn cmd_favorites(filter: Option<&str>, output_json: bool) -> Result<()> {
    let portal = Portal::load()?;
    let auth = portal.auth().await?;
    if !auth.is_authenticated() {
        auth.open_login_prompt();
        return Err(QvaultError::Auth("favorites need a signed-in user".to_string()));
    }

    let session = portal.mount(portal.options(ViewKind::Favorites), auth, None, None);
    settle(&session).await?;
    if let Some(filter) = filter {
        session.set_term(filter);
    }
    let papers = session.papers();
    session.dispose();

    CommandOutput::new(json!({ "papers": papers }))
        .with_text(listing_text(&papers, "No favorites yet"))
        .print(output_json)
}

/// List the catalog, optionally deleting one paper first
pub async fn cmd_manage(
    filter: Option<&str>,
    delete: Option<&str>,
    output_json: bool,
) -> Result<()> {
    let portal = Portal::load()?;
    let auth = portal.auth().await?;
    let session = portal.mount(portal.options(ViewKind::Manage), auth, None, None);
    settle(&session).await?;

    let mut deleted = None;
    if let Some(id) = delete {
        match session.delete(id).await? {
            ActionOutcome::LoginRequired => {
                session.dispose();
                return Err(QvaultError::Auth(
                    "deleting papers needs a signed-in admin".to_string(),
                ));
            }
            ActionOutcome::Completed(report) => deleted = Some(report.paper_id),
        }
    }

    if let Some(filter) = filter {
        session.set_term(filter);
    }
    let papers = session.papers();
    session.dispose();

    let mut text = String::new();
    if let Some(id) = &deleted {
        text.push_str(&format!("Deleted {}\n\n", id.cyan()));
    }
    text.push_str(&listing_text(&papers, "No papers match"));

    CommandOutput::new(json!({
        "deleted": deleted,
        "papers": papers,
    }))
    .with_text(text)
    .print(output_json)
}
