//! Single-paper actions: view, download, favorite.

use std::path::PathBuf;
use std::sync::Arc;

use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, Portal};
use crate::error::{QvaultError, Result};
use crate::opener::{ClipboardOpener, NoopOpener, Opener, SystemOpener};
use crate::session::{ActionOutcome, ActionReport, SearchSession, ViewKind};

/// What `view` does with the paper link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    Open,
    Clipboard,
    Print,
}

impl LinkMode {
    fn opener(self) -> Arc<dyn Opener> {
        match self {
            LinkMode::Open => Arc::new(SystemOpener),
            LinkMode::Clipboard => Arc::new(ClipboardOpener),
            LinkMode::Print => Arc::new(NoopOpener),
        }
    }
}

fn completed(outcome: ActionOutcome, action: &str) -> Result<ActionReport> {
    match outcome {
        ActionOutcome::Completed(report) => Ok(report),
        ActionOutcome::LoginRequired => Err(QvaultError::Auth(format!(
            "{action} needs a signed-in user"
        ))),
    }
}

async fn mount(
    portal: &Portal,
    opener: Option<Arc<dyn Opener>>,
    download_dir: Option<PathBuf>,
) -> Result<SearchSession<crate::remote::HttpCatalog>> {
    let auth = portal.auth().await?;
    let mut options = portal.options(ViewKind::Search);
    if let Some(dir) = download_dir {
        options.download_dir = dir;
    }
    Ok(portal.mount(options, auth, opener, None))
}

/// Open a paper for reading
pub async fn cmd_view(id: &str, mode: LinkMode, output_json: bool) -> Result<()> {
    let portal = Portal::load()?;
    let session = mount(&portal, Some(mode.opener()), None).await?;
    let report = completed(session.view(id).await?, "viewing a paper")?;
    session.dispose();

    let link = report.link.clone().unwrap_or_default();
    let text = match mode {
        LinkMode::Open => format!("Opened {}", id.cyan()),
        LinkMode::Clipboard => format!("Copied link for {} to the clipboard", id.cyan()),
        LinkMode::Print => link.clone(),
    };

    CommandOutput::new(json!({
        "action": "view",
        "id": id,
        "url": link,
    }))
    .with_text(text)
    .print(output_json)
}

/// Download a paper into `out` (or the configured download directory)
pub async fn cmd_download(id: &str, out: Option<PathBuf>, output_json: bool) -> Result<()> {
    let portal = Portal::load()?;
    let session = mount(&portal, None, out).await?;
    let report = completed(session.download(id).await?, "downloading a paper")?;
    session.dispose();

    let path = report
        .saved_to
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    CommandOutput::new(json!({
        "action": "download",
        "id": id,
        "path": path,
    }))
    .with_text(format!("Saved {} to {}", id.cyan(), path.green()))
    .print(output_json)
}

/// Toggle a paper in the signed-in user's favorites
pub async fn cmd_favorite(id: &str, output_json: bool) -> Result<()> {
    let portal = Portal::load()?;
    let session = mount(&portal, None, None).await?;
    let report = completed(session.toggle_favorite(id).await?, "favoriting a paper")?;
    session.dispose();

    let is_favorite = report.is_favorite.unwrap_or_default();
    let text = if is_favorite {
        format!("Added {} to favorites", id.cyan())
    } else {
        format!("Removed {} from favorites", id.cyan())
    };

    CommandOutput::new(json!({
        "action": "favorite",
        "id": id,
        "is_favorite": is_favorite,
    }))
    .with_text(text)
    .print(output_json)
}
