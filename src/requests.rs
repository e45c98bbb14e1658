//! Paper requests.
//!
//! Students ask for papers the catalog is missing; admins list those requests
//! and mark them fulfilled, rejected or pending again. `RequestDesk` keeps the
//! loaded list and applies status changes once the server confirms them.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::AuthGate;
use crate::error::{QvaultError, Result};
use crate::remote::{CatalogClient, PaperRequest, PaperRequestForm, RequestStatus, with_timeout};
use crate::session::DEFAULT_REQUEST_TIMEOUT;

/// Result of an authenticated request operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome<T> {
    Done(T),
    /// Nobody is signed in; the login prompt was raised and nothing was sent
    LoginRequired,
}

impl<T> RequestOutcome<T> {
    pub fn done(self) -> Option<T> {
        match self {
            RequestOutcome::Done(value) => Some(value),
            RequestOutcome::LoginRequired => None,
        }
    }
}

/// Trim every field and check that course name and code are present.
pub fn validate_form(form: &PaperRequestForm) -> Result<PaperRequestForm> {
    let form = PaperRequestForm {
        course_name: form.course_name.trim().to_string(),
        course_code: form.course_code.trim().to_string(),
        semester: form.semester.trim().to_string(),
        exam_type: form.exam_type.trim().to_string(),
        year: form.year.trim().to_string(),
    };
    if form.course_name.is_empty() {
        return Err(QvaultError::InvalidInput(
            "course name is required".to_string(),
        ));
    }
    if form.course_code.is_empty() {
        return Err(QvaultError::InvalidInput(
            "course code is required".to_string(),
        ));
    }
    Ok(form)
}

pub struct RequestDesk<C> {
    client: Arc<C>,
    auth: Arc<dyn AuthGate>,
    timeout: Duration,
    requests: Vec<PaperRequest>,
}

impl<C: CatalogClient> RequestDesk<C> {
    pub fn new(client: Arc<C>, auth: Arc<dyn AuthGate>) -> Self {
        Self {
            client,
            auth,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            requests: Vec::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn require_user(&self) -> bool {
        if self.auth.is_authenticated() {
            return true;
        }
        tracing::debug!("paper requests need a signed-in user, prompting for login");
        self.auth.open_login_prompt();
        false
    }

    /// Send a request for a missing paper. Returns the form as sent.
    pub async fn submit(
        &self,
        form: &PaperRequestForm,
    ) -> Result<RequestOutcome<PaperRequestForm>> {
        let form = validate_form(form)?;
        if !self.require_user() {
            return Ok(RequestOutcome::LoginRequired);
        }
        if let Err(e) = with_timeout(self.timeout, self.client.submit_request(&form)).await {
            tracing::warn!(course_code = %form.course_code, error = %e, "failed to submit paper request");
            return Err(e);
        }
        Ok(RequestOutcome::Done(form))
    }

    /// Replace the loaded list with every request on the server.
    /// Returns how many were loaded.
    pub async fn load(&mut self) -> Result<RequestOutcome<usize>> {
        if !self.require_user() {
            return Ok(RequestOutcome::LoginRequired);
        }
        let requests = match with_timeout(self.timeout, self.client.list_requests()).await {
            Ok(requests) => requests,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load paper requests");
                return Err(e);
            }
        };
        self.requests = requests;
        Ok(RequestOutcome::Done(self.requests.len()))
    }

    /// Loaded requests, optionally only those in `status`
    pub fn requests(&self, status: Option<RequestStatus>) -> Vec<PaperRequest> {
        self.requests
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect()
    }

    /// Change the status of a request. The local entry takes the status the
    /// server answers with, and is left alone when the call fails.
    pub async fn set_status(
        &mut self,
        request_id: &str,
        status: RequestStatus,
    ) -> Result<RequestOutcome<RequestStatus>> {
        if !self.require_user() {
            return Ok(RequestOutcome::LoginRequired);
        }
        let stored = match with_timeout(
            self.timeout,
            self.client.set_request_status(request_id, status),
        )
        .await
        {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(request_id, error = %e, "failed to update paper request");
                return Err(e);
            }
        };
        if let Some(request) = self.requests.iter_mut().find(|r| r.id == request_id) {
            request.status = stored;
        }
        Ok(RequestOutcome::Done(stored))
    }
}
