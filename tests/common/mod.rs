#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::process::{Command, Output};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;

use qvault::error::{QvaultError, Result};
use qvault::remote::{
    AccessLink, CatalogClient, FavoriteToggle, PaperQuery, PaperRequest, PaperRequestForm,
    PaperSummary, RequestStatus, User,
};
use qvault::session::{MemoryLocation, SearchSession, SessionOptions, ViewKind};
use qvault::{Opener, UserSlot};

// ============================================================================
// Binary helpers
// ============================================================================

pub fn qvault_binary() -> &'static str {
    env!("CARGO_BIN_EXE_qvault")
}

/// Runs the qvault binary against an isolated config file
pub struct QvaultTest {
    pub temp_dir: TempDir,
}

impl QvaultTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        QvaultTest { temp_dir }
    }

    pub fn config_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("config.yaml")
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(qvault_binary())
            .args(args)
            .current_dir(self.temp_dir.path())
            .env("QVAULT_CONFIG", self.config_path())
            .env_remove("QVAULT_TOKEN")
            .env_remove("QVAULT_BASE_URL")
            .env("NO_COLOR", "1")
            .output()
            .expect("Failed to execute qvault command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Command {:?} should have failed\nstdout: {}",
            args,
            String::from_utf8_lossy(&output.stdout)
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    pub fn write_config(&self, yaml: &str) {
        std::fs::write(self.config_path(), yaml).expect("Failed to write config");
    }
}

// ============================================================================
// Fake catalog
// ============================================================================

/// A request the fake catalog received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(PaperQuery),
    Favorites,
    AccessLink { id: String, inline: bool },
    FetchFile(String),
    ToggleFavorite(String),
    Delete(String),
    CurrentUser,
    SubmitRequest(PaperRequestForm),
    ListRequests,
    SetRequestStatus { id: String, status: RequestStatus },
}

#[derive(Default)]
struct FakeState {
    papers: Vec<PaperSummary>,
    favorites: Vec<PaperSummary>,
    favorite_flags: HashMap<String, bool>,
    deleted: HashSet<String>,
    requests: Vec<PaperRequest>,
    calls: Vec<Call>,
    delay: Duration,
    page_delays: HashMap<u32, Duration>,
    failing_lists: usize,
    failing_actions: bool,
}

/// In-memory catalog with the backend's paging and filtering rules.
/// Clones share state, so a test keeps one to inspect what the session did.
#[derive(Clone, Default)]
pub struct FakeCatalog {
    state: Arc<Mutex<FakeState>>,
}

pub const PAGE_SIZE: usize = 20;

impl FakeCatalog {
    pub fn with_papers(papers: Vec<PaperSummary>) -> Self {
        let fake = Self::default();
        {
            let mut state = fake.state.lock();
            state.favorite_flags = papers.iter().map(|p| (p.id.clone(), p.is_favorite)).collect();
            state.papers = papers;
        }
        fake
    }

    pub fn set_favorites(&self, favorites: Vec<PaperSummary>) {
        let mut state = self.state.lock();
        for paper in &favorites {
            state.favorite_flags.insert(paper.id.clone(), true);
        }
        state.favorites = favorites;
    }

    /// Delay every request by `delay`
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().delay = delay;
    }

    /// Delay list requests for `page` by `delay`
    pub fn set_page_delay(&self, page: u32, delay: Duration) {
        self.state.lock().page_delays.insert(page, delay);
    }

    /// Fail the next `count` list requests with a 503
    pub fn fail_next_lists(&self, count: usize) {
        self.state.lock().failing_lists = count;
    }

    /// Fail every paper action with a 500
    pub fn fail_actions(&self, fail: bool) {
        self.state.lock().failing_actions = fail;
    }

    /// Requests as the backend stores them
    pub fn stored_requests(&self) -> Vec<PaperRequest> {
        self.state.lock().requests.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Queries of every `GET /papers` received, in order
    pub fn list_queries(&self) -> Vec<PaperQuery> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::List(query) => Some(query),
                _ => None,
            })
            .collect()
    }

    /// Every call that is not a listing
    pub fn action_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| {
                !matches!(
                    call,
                    Call::List(_) | Call::Favorites | Call::CurrentUser | Call::ListRequests
                )
            })
            .collect()
    }

    fn record(&self, call: Call) -> Duration {
        let mut state = self.state.lock();
        let delay = match &call {
            Call::List(query) => state
                .page_delays
                .get(&query.page.unwrap_or(1))
                .copied()
                .unwrap_or(state.delay),
            _ => state.delay,
        };
        state.calls.push(call);
        delay
    }

    fn action_result(&self) -> Result<()> {
        if self.state.lock().failing_actions {
            return Err(QvaultError::Api {
                status: 500,
                message: "Internal Server Error".to_string(),
            });
        }
        Ok(())
    }
}

fn matches_query(paper: &PaperSummary, query: &PaperQuery) -> bool {
    if let Some(q) = &query.q {
        let needle = q.to_lowercase();
        let hit = paper.title.to_lowercase().contains(&needle)
            || paper.course_code.to_lowercase().contains(&needle)
            || paper.course.to_lowercase().contains(&needle);
        if !hit {
            return false;
        }
    }
    let same = |wanted: &Option<String>, actual: &str| wanted.as_deref().is_none_or(|w| w == actual);
    same(&query.year, &paper.year)
        && same(&query.semester, &paper.semester)
        && same(&query.exam_type, &paper.exam_type)
}

impl CatalogClient for FakeCatalog {
    async fn list_papers(&self, query: &PaperQuery) -> Result<Vec<PaperSummary>> {
        let delay = self.record(Call::List(query.clone()));
        tokio::time::sleep(delay).await;

        let mut state = self.state.lock();
        if state.failing_lists > 0 {
            state.failing_lists -= 1;
            return Err(QvaultError::Api {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }
        let page = query.page.unwrap_or(1) as usize;
        let hits: Vec<PaperSummary> = state
            .papers
            .iter()
            .filter(|p| !state.deleted.contains(&p.id) && matches_query(p, query))
            .cloned()
            .collect();
        Ok(hits
            .into_iter()
            .skip((page - 1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect())
    }

    async fn list_favorites(&self) -> Result<Vec<PaperSummary>> {
        let delay = self.record(Call::Favorites);
        tokio::time::sleep(delay).await;
        Ok(self.state.lock().favorites.clone())
    }

    async fn access_link(&self, paper_id: &str, inline: bool) -> Result<AccessLink> {
        let delay = self.record(Call::AccessLink {
            id: paper_id.to_string(),
            inline,
        });
        tokio::time::sleep(delay).await;
        self.action_result()?;
        Ok(AccessLink {
            url: format!("https://files.example.edu/{paper_id}.pdf?sig=abc"),
        })
    }

    async fn fetch_file(&self, url: &str) -> Result<Vec<u8>> {
        let delay = self.record(Call::FetchFile(url.to_string()));
        tokio::time::sleep(delay).await;
        self.action_result()?;
        Ok(b"%PDF-1.4 fake".to_vec())
    }

    async fn toggle_favorite(&self, paper_id: &str) -> Result<FavoriteToggle> {
        let delay = self.record(Call::ToggleFavorite(paper_id.to_string()));
        tokio::time::sleep(delay).await;
        self.action_result()?;
        let mut state = self.state.lock();
        let flag = state.favorite_flags.entry(paper_id.to_string()).or_default();
        *flag = !*flag;
        Ok(FavoriteToggle { is_favorite: *flag })
    }

    async fn delete_paper(&self, paper_id: &str) -> Result<()> {
        let delay = self.record(Call::Delete(paper_id.to_string()));
        tokio::time::sleep(delay).await;
        self.action_result()?;
        self.state.lock().deleted.insert(paper_id.to_string());
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>> {
        self.record(Call::CurrentUser);
        Ok(Some(student()))
    }

    async fn submit_request(&self, form: &PaperRequestForm) -> Result<()> {
        let delay = self.record(Call::SubmitRequest(form.clone()));
        tokio::time::sleep(delay).await;
        self.action_result()?;
        let mut state = self.state.lock();
        let id = format!("r-{}", state.requests.len() + 1);
        state.requests.push(PaperRequest {
            id,
            course_name: form.course_name.clone(),
            course_code: form.course_code.clone(),
            semester: form.semester.clone(),
            exam_type: form.exam_type.clone(),
            year: form.year.clone(),
            requested_by: student().id,
            status: RequestStatus::Pending,
        });
        Ok(())
    }

    async fn list_requests(&self) -> Result<Vec<PaperRequest>> {
        let delay = self.record(Call::ListRequests);
        tokio::time::sleep(delay).await;
        Ok(self.state.lock().requests.clone())
    }

    async fn set_request_status(
        &self,
        request_id: &str,
        status: RequestStatus,
    ) -> Result<RequestStatus> {
        let delay = self.record(Call::SetRequestStatus {
            id: request_id.to_string(),
            status,
        });
        tokio::time::sleep(delay).await;
        self.action_result()?;
        let mut state = self.state.lock();
        let Some(request) = state.requests.iter_mut().find(|r| r.id == request_id) else {
            return Err(QvaultError::Api {
                status: 404,
                message: "Request not found".to_string(),
            });
        };
        request.status = status;
        Ok(status)
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// `count` papers for course `code`, with ids `<code>-1` .. `<code>-<count>`
pub fn papers(code: &str, count: usize) -> Vec<PaperSummary> {
    (1..=count)
        .map(|i| PaperSummary {
            id: format!("{code}-{i}"),
            title: format!("{code} Paper {i}"),
            course_code: code.to_string(),
            course: format!("Course {code}"),
            year: "2024".to_string(),
            semester: "1".to_string(),
            exam_type: "Final".to_string(),
            ..Default::default()
        })
        .collect()
}

pub fn student() -> User {
    User {
        id: "u-1".to_string(),
        email: "student@example.edu".to_string(),
        name: Some("Test Student".to_string()),
        role: Some("student".to_string()),
    }
}

pub fn signed_in() -> Arc<UserSlot> {
    Arc::new(UserSlot::new(Some(student())))
}

pub fn anonymous() -> Arc<UserSlot> {
    Arc::new(UserSlot::anonymous())
}

/// Opener that remembers every link and can be told to fail
#[derive(Default)]
pub struct RecordingOpener {
    pub opened: Mutex<Vec<String>>,
    pub fail: bool,
}

impl Opener for RecordingOpener {
    fn open(&self, url: &str) -> Result<()> {
        self.opened.lock().push(url.to_string());
        if self.fail {
            return Err(QvaultError::Other("no viewer available".to_string()));
        }
        Ok(())
    }
}

pub fn options(view: ViewKind) -> SessionOptions {
    SessionOptions {
        view,
        page_size: PAGE_SIZE,
        ..Default::default()
    }
}

/// Mount a search session over `fake` starting from `location`
pub fn mount_search(
    fake: &FakeCatalog,
    location: &MemoryLocation,
    auth: Arc<UserSlot>,
) -> SearchSession<FakeCatalog> {
    SearchSession::builder(Arc::new(fake.clone()))
        .location(location.clone())
        .auth(auth)
        .options(options(ViewKind::Search))
        .mount()
}

pub fn mount_view(
    fake: &FakeCatalog,
    view: ViewKind,
    auth: Arc<UserSlot>,
    download_dir: Option<&Path>,
) -> SearchSession<FakeCatalog> {
    let mut options = options(view);
    if let Some(dir) = download_dir {
        options.download_dir = dir.to_path_buf();
    }
    SearchSession::builder(Arc::new(fake.clone()))
        .auth(auth)
        .options(options)
        .mount()
}

pub fn ids(papers: &[PaperSummary]) -> Vec<String> {
    papers.iter().map(|p| p.id.clone()).collect()
}
