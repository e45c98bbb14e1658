mod auth;
mod config;
mod library;
mod paper;
mod requests;
mod search;

pub use auth::cmd_whoami;
pub use config::{cmd_config_get, cmd_config_set, cmd_config_show};
pub use library::{cmd_favorites, cmd_manage};
pub use paper::{LinkMode, cmd_download, cmd_favorite, cmd_view};
pub use requests::{cmd_request, cmd_requests};
pub use search::{cmd_open, cmd_search, cmd_share};

use std::sync::Arc;

use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;

use crate::auth::UserSlot;
use crate::config::Config;
use crate::error::Result;
use crate::opener::{NoopOpener, Opener};
use crate::remote::{CatalogClient, HttpCatalog};
use crate::requests::RequestDesk;
use crate::session::{MemoryLocation, SearchSession, SessionOptions, ViewKind};

/// Output of a command in both machine and human form
pub struct CommandOutput {
    json: Value,
    text: Option<String>,
}

impl CommandOutput {
    pub fn new(json: Value) -> Self {
        Self { json, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Print as pretty JSON when `output_json` is set, otherwise as text
    /// (falling back to JSON when no text form was given).
    pub fn print(self, output_json: bool) -> Result<()> {
        match self.text {
            Some(text) if !output_json => println!("{text}"),
            _ => print_json(&self.json)?,
        }
        Ok(())
    }
}

pub fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Everything a command needs to talk to the portal
pub(crate) struct Portal {
    pub config: Config,
    pub catalog: Arc<HttpCatalog>,
}

impl Portal {
    pub fn load() -> Result<Self> {
        let config = Config::load()?;
        let catalog = Arc::new(HttpCatalog::from_config(&config)?);
        Ok(Self { config, catalog })
    }

    /// Resolve the signed-in user from the configured token.
    pub async fn auth(&self) -> Result<Arc<UserSlot>> {
        let user = if self.catalog.has_token() {
            self.catalog.current_user().await?
        } else {
            None
        };
        if user.is_none() {
            tracing::debug!("no signed-in user");
        }
        Ok(Arc::new(UserSlot::new(user).with_prompt_hook(|| {
            eprintln!(
                "{} set a token with `qvault config set auth.token <TOKEN>` or QVAULT_TOKEN",
                "Sign in required:".yellow().bold()
            );
        })))
    }

    pub async fn request_desk(&self) -> Result<RequestDesk<HttpCatalog>> {
        let auth = self.auth().await?;
        Ok(RequestDesk::new(Arc::clone(&self.catalog), auth)
            .with_timeout(self.config.request_timeout()))
    }

    pub fn options(&self, view: ViewKind) -> SessionOptions {
        SessionOptions::from_config(&self.config, view)
    }

    /// Mount a session for `view`. A location is only read by the search view.
    pub fn mount(
        &self,
        options: SessionOptions,
        auth: Arc<UserSlot>,
        opener: Option<Arc<dyn Opener>>,
        location: Option<MemoryLocation>,
    ) -> SearchSession<HttpCatalog> {
        let mut builder = SearchSession::builder(Arc::clone(&self.catalog))
            .options(options)
            .auth(auth)
            .opener(opener.unwrap_or_else(|| Arc::new(NoopOpener)));
        if let Some(location) = location {
            builder = builder.location(location);
        }
        builder.mount()
    }
}

/// Wait for a session to settle and surface any recorded fetch failure.
pub(crate) async fn settle<C: CatalogClient + 'static>(session: &SearchSession<C>) -> Result<()> {
    session.idle().await;
    match session.last_error() {
        Some(err) => Err(crate::error::QvaultError::Other(err.to_string())),
        None => Ok(()),
    }
}
