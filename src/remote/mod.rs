//! Remote catalog access.
//!
//! This module defines the `CatalogClient` seam the session controller talks
//! to, and the reqwest-backed `HttpCatalog` that implements it against the
//! Q-Vault REST API.

pub mod error;
pub mod http;

use std::future::Future;
use std::time::Duration;

pub use qvault_schema::{
    AccessLink, AuthCheck, FavoriteToggle, PaperQuery, PaperRequest, PaperRequestForm,
    PaperSummary, RequestStatus, StatusUpdate, User,
};

use crate::error::{QvaultError, Result};

pub use http::HttpCatalog;

/// Common interface for catalog backends
pub trait CatalogClient: Send + Sync {
    /// `GET /papers` with the given query parameters
    fn list_papers(
        &self,
        query: &PaperQuery,
    ) -> impl Future<Output = Result<Vec<PaperSummary>>> + Send;

    /// `GET /papers/favorites` for the signed-in user
    fn list_favorites(&self) -> impl Future<Output = Result<Vec<PaperSummary>>> + Send;

    /// `GET /papers/download/{id}`, with `inline=true` for in-browser viewing
    fn access_link(
        &self,
        paper_id: &str,
        inline: bool,
    ) -> impl Future<Output = Result<AccessLink>> + Send;

    /// Retrieve the binary content behind a direct link
    fn fetch_file(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// `POST /papers/favorite/{id}`
    fn toggle_favorite(&self, paper_id: &str)
    -> impl Future<Output = Result<FavoriteToggle>> + Send;

    /// `DELETE /papers/{id}`
    fn delete_paper(&self, paper_id: &str) -> impl Future<Output = Result<()>> + Send;

    /// `GET /auth/check`
    fn current_user(&self) -> impl Future<Output = Result<Option<User>>> + Send;

    /// `POST /papers/requests`
    fn submit_request(&self, form: &PaperRequestForm) -> impl Future<Output = Result<()>> + Send;

    /// `GET /papers/requests`, every request regardless of status
    fn list_requests(&self) -> impl Future<Output = Result<Vec<PaperRequest>>> + Send;

    /// `PATCH /papers/requests/{id}/status`, answering with the stored status
    fn set_request_status(
        &self,
        request_id: &str,
        status: RequestStatus,
    ) -> impl Future<Output = Result<RequestStatus>> + Send;
}

/// Run a catalog call with an upper bound on its duration.
pub async fn with_timeout<T, F>(timeout: Duration, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(QvaultError::Timeout {
            seconds: timeout.as_secs(),
        }),
    }
}
