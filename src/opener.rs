//! Hand-off of paper links to something that can display them.

use std::process::{Command, Stdio};

use clipboard_rs::Clipboard;

use crate::error::{QvaultError, Result};

/// Opens a short-lived paper link outside the session
pub trait Opener: Send + Sync {
    fn open(&self, url: &str) -> Result<()>;
}

/// Opens links with the platform's default handler (browser / PDF viewer).
pub struct SystemOpener;

impl Opener for SystemOpener {
    fn open(&self, url: &str) -> Result<()> {
        let mut command = if cfg!(target_os = "macos") {
            Command::new("open")
        } else if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", ""]);
            c
        } else {
            Command::new("xdg-open")
        };

        command
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|e| QvaultError::Other(format!("failed to open link: {e}")))
    }
}

/// Puts links on the system clipboard instead of opening them.
pub struct ClipboardOpener;

impl Opener for ClipboardOpener {
    fn open(&self, url: &str) -> Result<()> {
        clipboard_rs::ClipboardContext::new()
            .and_then(|ctx| ctx.set_text(url.to_string()))
            .map_err(|e| QvaultError::Other(format!("failed to copy link: {e}")))
    }
}

/// Discards links. Used when the caller only wants the URL printed.
pub struct NoopOpener;

impl Opener for NoopOpener {
    fn open(&self, _url: &str) -> Result<()> {
        Ok(())
    }
}
