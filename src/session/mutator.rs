//! Authenticated actions on listed papers, applied to the local list in place.
//!
//! Nothing here refetches. A successful remote call is mirrored onto the
//! matching entry (if it is still listed) and the view re-renders from that.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{QvaultError, Result};
use crate::remote::{CatalogClient, PaperSummary, with_timeout};

use super::{RetryAction, SearchSession, SessionError, ViewKind};

/// What an action did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionReport {
    pub paper_id: String,
    /// The listed entry after the change, when the paper is listed
    pub updated: Option<PaperSummary>,
    /// Direct link handed to the opener
    pub link: Option<String>,
    pub saved_to: Option<PathBuf>,
    pub is_favorite: Option<bool>,
    /// Whether the entry left the list
    pub removed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    Completed(ActionReport),
    /// No user was signed in; a login prompt was raised instead
    LoginRequired,
}

impl ActionOutcome {
    pub fn report(&self) -> Option<&ActionReport> {
        match self {
            ActionOutcome::Completed(report) => Some(report),
            ActionOutcome::LoginRequired => None,
        }
    }
}

const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// File name for a downloaded paper: its title, or the id when the title is
/// unusable, with a `.pdf` extension.
pub(super) fn pdf_file_name(title: &str, paper_id: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if RESERVED.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    let cleaned = cleaned.trim().trim_matches('.');
    let stem = if cleaned.is_empty() { paper_id } else { cleaned };
    format!("{stem}.pdf")
}

async fn save_file(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(name);
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

impl<C: CatalogClient + 'static> SearchSession<C> {
    fn require_user(&self) -> bool {
        if self.inner.auth.is_authenticated() {
            return true;
        }
        tracing::debug!("action needs a signed-in user, prompting for login");
        self.inner.auth.open_login_prompt();
        false
    }

    fn record_failure(&self, action: RetryAction, error: &QvaultError) {
        let failure = SessionError::new(action, error);
        tracing::warn!(error = %failure, "paper action failed");
        let mut state = self.inner.state.lock();
        if state.disposed {
            return;
        }
        // A failed fetch keeps its slot until retried; the caller already
        // has this action's error
        let fetch_pending = matches!(
            state.last_error,
            Some(SessionError {
                action: RetryAction::Fetch { .. },
                ..
            })
        );
        if fetch_pending {
            tracing::debug!("keeping pending fetch failure for retry");
            return;
        }
        state.last_error = Some(failure);
        drop(state);
        self.inner.notify();
    }

    /// Apply `change` to the listed entry with `paper_id`
    fn apply(
        &self,
        paper_id: &str,
        change: impl FnOnce(&mut PaperSummary),
    ) -> Option<PaperSummary> {
        let mut state = self.inner.state.lock();
        if state.disposed {
            return None;
        }
        let updated = state.paper_mut(paper_id).map(|paper| {
            change(paper);
            paper.clone()
        });
        drop(state);
        self.inner.notify();
        updated
    }

    fn listed_title(&self, paper_id: &str) -> Option<String> {
        let state = self.inner.state.lock();
        state
            .papers
            .iter()
            .find(|p| p.id == paper_id)
            .map(|p| p.title.clone())
    }

    /// Open a paper inline.
    ///
    /// The local view count goes up once a link was obtained, whether or not
    /// the opener managed to show it. It is a display counter; the next full
    /// fetch brings the server's figure.
    pub async fn view(&self, paper_id: &str) -> Result<ActionOutcome> {
        if !self.require_user() {
            return Ok(ActionOutcome::LoginRequired);
        }
        let timeout = self.inner.options.request_timeout;
        let link = match with_timeout(timeout, self.inner.client.access_link(paper_id, true)).await
        {
            Ok(link) => link,
            Err(e) => {
                self.record_failure(
                    RetryAction::View {
                        paper_id: paper_id.to_string(),
                    },
                    &e,
                );
                return Err(e);
            }
        };

        if let Err(e) = self.inner.opener.open(&link.url) {
            tracing::warn!(paper_id, error = %e, "could not open paper link");
        }
        let updated = self.apply(paper_id, |paper| paper.views += 1);

        Ok(ActionOutcome::Completed(ActionReport {
            paper_id: paper_id.to_string(),
            updated,
            link: Some(link.url),
            ..Default::default()
        }))
    }

    /// Save a paper as `<title>.pdf` in the download directory. The local
    /// download count only moves once the file is written.
    pub async fn download(&self, paper_id: &str) -> Result<ActionOutcome> {
        if !self.require_user() {
            return Ok(ActionOutcome::LoginRequired);
        }
        let action = RetryAction::Download {
            paper_id: paper_id.to_string(),
        };
        let timeout = self.inner.options.request_timeout;
        let client = self.inner.client.as_ref();

        let fetched = with_timeout(timeout, async {
            let link = client.access_link(paper_id, false).await?;
            let bytes = client.fetch_file(&link.url).await?;
            Ok((link, bytes))
        })
        .await;
        let (link, bytes) = match fetched {
            Ok(fetched) => fetched,
            Err(e) => {
                self.record_failure(action, &e);
                return Err(e);
            }
        };

        let title = self.listed_title(paper_id).unwrap_or_default();
        let name = pdf_file_name(&title, paper_id);
        let saved = match save_file(&self.inner.options.download_dir, &name, &bytes).await {
            Ok(path) => path,
            Err(e) => {
                self.record_failure(action, &e);
                return Err(e);
            }
        };
        tracing::debug!(paper_id, path = %saved.display(), "saved paper");

        let updated = self.apply(paper_id, |paper| paper.downloads += 1);
        Ok(ActionOutcome::Completed(ActionReport {
            paper_id: paper_id.to_string(),
            updated,
            link: Some(link.url),
            saved_to: Some(saved),
            ..Default::default()
        }))
    }

    /// Flip the favorite flag on the server and mirror the answer locally.
    ///
    /// The count moves by one only when the flag actually changed, and never
    /// below zero. In the favorites view an unfavorited paper leaves the list.
    pub async fn toggle_favorite(&self, paper_id: &str) -> Result<ActionOutcome> {
        if !self.require_user() {
            return Ok(ActionOutcome::LoginRequired);
        }
        let timeout = self.inner.options.request_timeout;
        let toggle = match with_timeout(timeout, self.inner.client.toggle_favorite(paper_id)).await
        {
            Ok(toggle) => toggle,
            Err(e) => {
                self.record_failure(
                    RetryAction::ToggleFavorite {
                        paper_id: paper_id.to_string(),
                    },
                    &e,
                );
                return Err(e);
            }
        };
        let now = toggle.is_favorite;

        let updated = self.apply(paper_id, |paper| {
            if paper.is_favorite != now {
                paper.favorites_count = if now {
                    paper.favorites_count + 1
                } else {
                    paper.favorites_count.saturating_sub(1)
                };
            }
            paper.is_favorite = now;
        });

        let removed = !now && self.inner.options.view == ViewKind::Favorites && self.remove(paper_id);

        Ok(ActionOutcome::Completed(ActionReport {
            paper_id: paper_id.to_string(),
            updated,
            is_favorite: Some(now),
            removed,
            ..Default::default()
        }))
    }

    /// Delete a paper from the catalog and drop it from the list.
    pub async fn delete(&self, paper_id: &str) -> Result<ActionOutcome> {
        if !self.require_user() {
            return Ok(ActionOutcome::LoginRequired);
        }
        let timeout = self.inner.options.request_timeout;
        if let Err(e) = with_timeout(timeout, self.inner.client.delete_paper(paper_id)).await {
            self.record_failure(
                RetryAction::Delete {
                    paper_id: paper_id.to_string(),
                },
                &e,
            );
            return Err(e);
        }

        let removed = self.remove(paper_id);
        Ok(ActionOutcome::Completed(ActionReport {
            paper_id: paper_id.to_string(),
            removed,
            ..Default::default()
        }))
    }

    fn remove(&self, paper_id: &str) -> bool {
        let mut state = self.inner.state.lock();
        if state.disposed {
            return false;
        }
        let before = state.papers.len();
        state.papers.retain(|p| p.id != paper_id);
        let removed = state.papers.len() != before;
        if removed {
            state.retarget_scroll();
        }
        drop(state);
        self.inner.notify();
        removed
    }
}
