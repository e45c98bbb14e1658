//! Search-and-browse session controller.
//!
//! A `SearchSession` is created once per view mount and owns everything the
//! view needs: the query being edited, the debounced commit timer, the
//! paginated result list, the infinite-scroll sentinel and the share link.
//!
//! All state sits behind a single mutex that is never held across an
//! `.await`. Network calls run on spawned tasks and report back through
//! `finish_fetch`, which drops any result whose generation tag is no longer
//! current. Every state change bumps a revision counter that renderers (and
//! `idle()`) can watch.

mod debounce;
mod fetcher;
mod mutator;
mod query;
mod scroll;
mod url_sync;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;

use crate::auth::{AuthGate, UserSlot};
use crate::config::Config;
use crate::error::QvaultError;
use crate::opener::{NoopOpener, Opener};
use crate::remote::{CatalogClient, PaperSummary};

pub use debounce::{DEFAULT_DEBOUNCE_MS, Debouncer};
pub use fetcher::merge_page;
pub use mutator::{ActionOutcome, ActionReport};
pub use query::{FilterKey, Filters, QueryState, SearchIntent};
pub use scroll::ScrollObserver;
pub use url_sync::{
    Location, MemoryLocation, UrlSynchronizer, clear_tracked, parse_link, read_intent,
    share_query, write_intent,
};

/// Fixed page size of the catalog backend
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Default upper bound on a single catalog request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Which portal view a session drives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    /// Paginated catalog search with share links
    #[default]
    Search,
    /// The signed-in user's favorites, loaded in one go
    Favorites,
    /// Admin catalog listing with local filtering and deletion
    Manage,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub view: ViewKind,
    pub page_size: usize,
    pub debounce: Duration,
    pub request_timeout: Duration,
    pub download_dir: PathBuf,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            view: ViewKind::Search,
            page_size: DEFAULT_PAGE_SIZE,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            download_dir: PathBuf::from("."),
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &Config, view: ViewKind) -> Self {
        Self {
            view,
            page_size: config.page_size,
            debounce: config.debounce(),
            request_timeout: config.request_timeout(),
            download_dir: config.download_dir(),
        }
    }

    pub fn view(mut self, view: ViewKind) -> Self {
        self.view = view;
        self
    }
}

/// What a recorded failure was doing, so it can be retried
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetryAction {
    Fetch { page: u32 },
    View { paper_id: String },
    Download { paper_id: String },
    ToggleFavorite { paper_id: String },
    Delete { paper_id: String },
}

impl std::fmt::Display for RetryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryAction::Fetch { page } => write!(f, "loading page {page}"),
            RetryAction::View { paper_id } => write!(f, "opening {paper_id}"),
            RetryAction::Download { paper_id } => write!(f, "downloading {paper_id}"),
            RetryAction::ToggleFavorite { paper_id } => write!(f, "updating favorite {paper_id}"),
            RetryAction::Delete { paper_id } => write!(f, "deleting {paper_id}"),
        }
    }
}

/// The most recent failure, kept for display and retry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionError {
    pub action: RetryAction,
    pub message: String,
    pub transient: bool,
}

impl SessionError {
    fn new(action: RetryAction, error: &QvaultError) -> Self {
        Self {
            action,
            message: error.to_string(),
            transient: error.is_transient(),
        }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed {}: {}", self.action, self.message)
    }
}

/// Point-in-time copy of what a renderer needs
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub view: ViewKind,
    pub term: String,
    pub filters: Filters,
    pub page: u32,
    pub has_more: bool,
    pub loading: bool,
    pub active: bool,
    pub papers: Vec<PaperSummary>,
    pub last_error: Option<SessionError>,
    pub query_string: String,
}

struct SessionState {
    query: QueryState,
    /// Intent of the current result list; appends reuse it
    committed: Option<SearchIntent>,
    papers: Vec<PaperSummary>,
    active: bool,
    last_error: Option<SessionError>,
    generation: u64,
    debouncer: Debouncer,
    scroll: ScrollObserver,
    url: UrlSynchronizer,
    disposed: bool,
}

impl SessionState {
    fn retarget_scroll(&mut self) {
        let loading = self.query.is_loading();
        let last = self.papers.last().map(|p| p.id.clone());
        self.scroll.retarget(last.as_deref(), loading);
    }

    fn paper_mut(&mut self, paper_id: &str) -> Option<&mut PaperSummary> {
        self.papers.iter_mut().find(|p| p.id == paper_id)
    }
}

struct Inner<C> {
    client: Arc<C>,
    auth: Arc<dyn AuthGate>,
    opener: Arc<dyn Opener>,
    options: SessionOptions,
    state: Mutex<SessionState>,
    revision: watch::Sender<u64>,
}

impl<C> Inner<C> {
    fn notify(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

/// Builder for a mounted session
pub struct SessionBuilder<C> {
    client: Arc<C>,
    location: Option<UrlSynchronizer>,
    auth: Option<Arc<dyn AuthGate>>,
    opener: Option<Arc<dyn Opener>>,
    options: SessionOptions,
}

impl<C: CatalogClient + 'static> SessionBuilder<C> {
    /// Location the search view reads on mount and keeps in sync
    pub fn location(mut self, location: impl Location + 'static) -> Self {
        self.location = Some(UrlSynchronizer::new(location));
        self
    }

    pub fn auth(mut self, auth: Arc<dyn AuthGate>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn opener(mut self, opener: Arc<dyn Opener>) -> Self {
        self.opener = Some(opener);
        self
    }

    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Create the session and run its mount-time load.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(self) -> SearchSession<C> {
        let (revision, _) = watch::channel(0);
        let state = SessionState {
            query: QueryState::default(),
            committed: None,
            papers: Vec::new(),
            active: false,
            last_error: None,
            generation: 0,
            debouncer: Debouncer::new(self.options.debounce),
            scroll: ScrollObserver::default(),
            url: self.location.unwrap_or_default(),
            disposed: false,
        };
        let session = SearchSession {
            inner: Arc::new(Inner {
                client: self.client,
                auth: self.auth.unwrap_or_else(|| Arc::new(UserSlot::anonymous())),
                opener: self.opener.unwrap_or_else(|| Arc::new(NoopOpener)),
                options: self.options,
                state: Mutex::new(state),
                revision,
            }),
        };
        session.on_mount();
        session
    }
}

/// One mounted search, favorites or manage view
pub struct SearchSession<C> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for SearchSession<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: CatalogClient + 'static> SearchSession<C> {
    pub fn builder(client: Arc<C>) -> SessionBuilder<C> {
        SessionBuilder {
            client,
            location: None,
            auth: None,
            opener: None,
            options: SessionOptions::default(),
        }
    }

    /// Which view variant this session drives
    pub fn view_kind(&self) -> ViewKind {
        self.inner.options.view
    }

    pub fn options(&self) -> &SessionOptions {
        &self.inner.options
    }

    fn on_mount(&self) {
        let mut state = self.inner.state.lock();
        match self.inner.options.view {
            ViewKind::Search => {
                let (term, filters) = state.url.restore();
                state.query = QueryState::new(&term, filters);
                if state.query.is_active() {
                    tracing::debug!(term = %term, "restoring search from location");
                    let intent = state.query.commit();
                    state.active = true;
                    state.committed = Some(intent.clone());
                    self.start_fetch(&mut state, fetcher::PageRequest::Search(intent));
                }
            }
            ViewKind::Favorites | ViewKind::Manage => {
                state.active = true;
                self.load_listing(&mut state);
            }
        }
        drop(state);
        self.inner.notify();
    }

    /// Update the search term. In the search view a change is committed after
    /// the quiet period; clearing the term (with no filters set) takes effect
    /// at once. The other views filter their loaded list locally.
    pub fn set_term(&self, term: &str) {
        let mut state = self.inner.state.lock();
        if state.disposed || !state.query.set_term(term) {
            return;
        }
        if self.inner.options.view == ViewKind::Search {
            self.input_changed(&mut state);
        }
        drop(state);
        self.inner.notify();
    }

    pub fn set_filter(&self, key: FilterKey, value: &str) {
        let mut state = self.inner.state.lock();
        if state.disposed || !state.query.set_filter(key, value) {
            return;
        }
        if self.inner.options.view == ViewKind::Search {
            self.input_changed(&mut state);
        }
        drop(state);
        self.inner.notify();
    }

    fn input_changed(&self, state: &mut SessionState) {
        if !state.query.is_active() {
            self.go_inactive(state);
            return;
        }
        let intent = state.query.intent();
        if state
            .committed
            .as_ref()
            .is_some_and(|committed| committed.same_search(&intent))
        {
            // Back to what is already shown, e.g. only whitespace changed
            state.debouncer.cancel();
            state.query.mark_clean();
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        state.debouncer.schedule(move |ticket| async move {
            if let Some(inner) = weak.upgrade() {
                SearchSession { inner }.debounce_fired(ticket);
            }
        });
    }

    fn debounce_fired(&self, ticket: u64) {
        let mut state = self.inner.state.lock();
        if state.disposed || !state.debouncer.finish(ticket) {
            return;
        }
        tracing::debug!("committing debounced search");
        self.commit(&mut state);
        drop(state);
        self.inner.notify();
    }

    /// Commit the current input now, skipping the quiet period.
    /// Does nothing when no term or filter is set.
    pub fn submit(&self) {
        let mut state = self.inner.state.lock();
        if state.disposed || self.inner.options.view != ViewKind::Search {
            return;
        }
        state.debouncer.cancel();
        if !state.query.is_active() {
            return;
        }
        self.commit(&mut state);
        drop(state);
        self.inner.notify();
    }

    /// Reset term and filters. The search view also drops its results and
    /// share parameters, even while a fetch is in flight.
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        if state.disposed {
            return;
        }
        if self.inner.options.view == ViewKind::Search {
            state.query.clear();
            self.go_inactive(&mut state);
        } else {
            state.query.set_term("");
        }
        drop(state);
        self.inner.notify();
    }

    fn go_inactive(&self, state: &mut SessionState) {
        state.debouncer.cancel();
        state.generation += 1;
        state.query.commit();
        state.query.set_loading(false);
        state.papers.clear();
        state.committed = None;
        state.active = false;
        state.last_error = None;
        state.url.clear();
        state.scroll.reset();
    }

    /// Request the next page of results. Returns whether a fetch was issued.
    pub fn next_page(&self) -> bool {
        let mut state = self.inner.state.lock();
        if state.disposed || !state.active || self.inner.options.view != ViewKind::Search {
            return false;
        }
        let Some(mut intent) = state.committed.clone() else {
            return false;
        };
        let Some(page) = state.query.next_page() else {
            return false;
        };
        intent.page = page;
        self.start_fetch(&mut state, fetcher::PageRequest::Search(intent));
        drop(state);
        self.inner.notify();
        true
    }

    /// Report that the rendered item `paper_id` scrolled into view.
    /// Returns whether this triggered a fetch of the next page.
    pub fn item_visible(&self, paper_id: &str) -> bool {
        let mut state = self.inner.state.lock();
        if !state.scroll.observe(paper_id) {
            return false;
        }
        if !state.query.has_more() || state.query.is_loading() {
            return false;
        }
        drop(state);
        self.next_page()
    }

    /// Element the infinite-scroll trigger is attached to
    pub fn scroll_target(&self) -> Option<String> {
        self.inner.state.lock().scroll.target().map(str::to_string)
    }

    /// Re-issue a failed fetch. Failed actions are retried by calling them
    /// again. Returns whether a fetch was issued.
    pub fn retry(&self) -> bool {
        let mut state = self.inner.state.lock();
        if state.disposed || state.query.is_loading() {
            return false;
        }
        let page = match &state.last_error {
            Some(SessionError {
                action: RetryAction::Fetch { page },
                ..
            }) => *page,
            _ => return false,
        };
        state.last_error = None;
        match self.inner.options.view {
            ViewKind::Search => {
                let Some(mut intent) = state.committed.clone() else {
                    return false;
                };
                if page > 1 {
                    let Some(next) = state.query.next_page() else {
                        return false;
                    };
                    intent.page = next;
                } else {
                    state.generation += 1;
                    state.papers.clear();
                }
                self.start_fetch(&mut state, fetcher::PageRequest::Search(intent));
            }
            ViewKind::Favorites | ViewKind::Manage => self.load_listing(&mut state),
        }
        drop(state);
        self.inner.notify();
        true
    }

    /// Tear the session down. Pending timers are cancelled and in-flight
    /// results are ignored when they arrive.
    pub fn dispose(&self) {
        let mut state = self.inner.state.lock();
        if state.disposed {
            return;
        }
        state.disposed = true;
        state.debouncer.cancel();
        state.generation += 1;
        state.query.set_loading(false);
        state.scroll.detach();
        drop(state);
        self.inner.notify();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state.lock().disposed
    }

    /// Wait until no fetch is in flight and no commit is pending.
    pub async fn idle(&self) {
        let mut revisions = self.inner.revision.subscribe();
        loop {
            let _ = revisions.borrow_and_update();
            {
                let state = self.inner.state.lock();
                if state.disposed || (!state.query.is_loading() && !state.debouncer.is_pending())
                {
                    return;
                }
            }
            if revisions.changed().await.is_err() {
                return;
            }
        }
    }

    /// Receiver that ticks on every state change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    pub fn query(&self) -> QueryState {
        self.inner.state.lock().query.clone()
    }

    /// Papers as the view shows them. Favorites and manage views apply the
    /// term as a local filter.
    pub fn papers(&self) -> Vec<PaperSummary> {
        let state = self.inner.state.lock();
        self.visible(&state)
    }

    fn visible(&self, state: &SessionState) -> Vec<PaperSummary> {
        match self.inner.options.view {
            ViewKind::Search => state.papers.clone(),
            ViewKind::Favorites | ViewKind::Manage => {
                local_filter(&state.papers, state.query.term())
            }
        }
    }

    pub fn last_error(&self) -> Option<SessionError> {
        self.inner.state.lock().last_error.clone()
    }

    /// Current location query string
    pub fn query_string(&self) -> String {
        self.inner.state.lock().url.current()
    }

    /// Canonical share query string for the committed search
    pub fn share_query(&self) -> Option<String> {
        let state = self.inner.state.lock();
        state.committed.as_ref().map(share_query)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.state.lock();
        SessionSnapshot {
            view: self.inner.options.view,
            term: state.query.term().to_string(),
            filters: state.query.filters().clone(),
            page: state.query.page(),
            has_more: state.query.has_more(),
            loading: state.query.is_loading(),
            active: state.active,
            papers: self.visible(&state),
            last_error: state.last_error.clone(),
            query_string: state.url.current(),
        }
    }
}

/// Case-insensitive substring match over title, course and course code
pub fn local_filter(papers: &[PaperSummary], term: &str) -> Vec<PaperSummary> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return papers.to_vec();
    }
    papers
        .iter()
        .filter(|p| {
            p.title.to_lowercase().contains(&needle)
                || p.course.to_lowercase().contains(&needle)
                || p.course_code.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}
