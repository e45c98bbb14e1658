//! Q-Vault REST catalog client over reqwest.
//!
//! # Security Note - Logging
//!
//! The bearer token is attached as a header value marked sensitive, so
//! reqwest and hyper render it as `Sensitive` rather than the token itself
//! if request logging is enabled (e.g. `QVAULT_LOG=reqwest=debug`).

use std::time::Duration;

use reqwest::header::{self, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretBox};
use url::Url;

use crate::config::Config;
use crate::error::{QvaultError, Result};

use super::error::ApiError;
use super::{
    AccessLink, AuthCheck, CatalogClient, FavoriteToggle, PaperQuery, PaperRequest,
    PaperRequestForm, PaperSummary, RequestStatus, StatusUpdate, User,
};

/// Catalog client for a Q-Vault backend
pub struct HttpCatalog {
    client: Client,
    base: Url,
    token: Option<SecretBox<String>>,
}

impl HttpCatalog {
    /// Create a client from configuration
    ///
    /// Configures the HTTP client with a 10s connect timeout and the
    /// configured request timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.base_url(), config.token(), config.request_timeout())
    }

    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(QvaultError::Config(format!(
                "base_url '{base_url}' cannot be used as an API root"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base,
            token: token.map(|t| SecretBox::new(Box::new(t))),
        })
    }

    /// Whether requests will carry credentials
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Join path segments onto the API root, escaping each segment
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| QvaultError::Config(format!("base_url '{}' has no path", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let Some(token) = &self.token else {
            return Ok(request);
        };
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|_| {
                QvaultError::Config("token contains characters not allowed in a header".to_string())
            })?;
        value.set_sensitive(true);
        Ok(request.header(header::AUTHORIZATION, value))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.authorize(request)?.send().await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await.into());
        }
        Ok(response)
    }
}

impl CatalogClient for HttpCatalog {
    async fn list_papers(&self, query: &PaperQuery) -> Result<Vec<PaperSummary>> {
        let url = self.endpoint(&["papers"])?;
        let response = self.send(self.client.get(url).query(query)).await?;
        Ok(response.json().await?)
    }

    async fn list_favorites(&self) -> Result<Vec<PaperSummary>> {
        let url = self.endpoint(&["papers", "favorites"])?;
        let response = self.send(self.client.get(url)).await?;
        Ok(response.json().await?)
    }

    async fn access_link(&self, paper_id: &str, inline: bool) -> Result<AccessLink> {
        let mut url = self.endpoint(&["papers", "download", paper_id])?;
        if inline {
            url.query_pairs_mut().append_pair("inline", "true");
        }
        let response = self.send(self.client.get(url)).await?;
        Ok(response.json().await?)
    }

    async fn fetch_file(&self, url: &str) -> Result<Vec<u8>> {
        // Direct storage links are pre-signed: no credentials attached
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await.into());
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn toggle_favorite(&self, paper_id: &str) -> Result<FavoriteToggle> {
        let url = self.endpoint(&["papers", "favorite", paper_id])?;
        let response = self.send(self.client.post(url)).await?;
        Ok(response.json().await?)
    }

    async fn delete_paper(&self, paper_id: &str) -> Result<()> {
        let url = self.endpoint(&["papers", paper_id])?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>> {
        let url = self.endpoint(&["auth", "check"])?;
        let response = self.authorize(self.client.get(url))?.send().await?;
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status if status.is_success() => Ok(response.json::<AuthCheck>().await?.user),
            _ => Err(ApiError::from_response(response).await.into()),
        }
    }

    async fn submit_request(&self, form: &PaperRequestForm) -> Result<()> {
        let url = self.endpoint(&["papers", "requests"])?;
        self.send(self.client.post(url).json(form)).await?;
        Ok(())
    }

    async fn list_requests(&self) -> Result<Vec<PaperRequest>> {
        let url = self.endpoint(&["papers", "requests"])?;
        let response = self.send(self.client.get(url)).await?;
        Ok(response.json().await?)
    }

    async fn set_request_status(
        &self,
        request_id: &str,
        status: RequestStatus,
    ) -> Result<RequestStatus> {
        let url = self.endpoint(&["papers", "requests", request_id, "status"])?;
        let response = self
            .send(self.client.patch(url).json(&StatusUpdate { status }))
            .await?;
        Ok(response.json::<StatusUpdate>().await?.status)
    }
}
