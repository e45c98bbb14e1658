//! Paginated fetching and result-list reconciliation.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::remote::{CatalogClient, PaperQuery, PaperSummary, with_timeout};

use super::{RetryAction, SearchIntent, SearchSession, SessionError, SessionState, ViewKind};

/// One catalog request issued by a session
#[derive(Debug, Clone)]
pub(super) enum PageRequest {
    /// A page of search results for a committed intent
    Search(SearchIntent),
    /// The signed-in user's favorites
    Favorites,
    /// The unfiltered catalog, as listed by the manage view
    Catalog,
}

impl PageRequest {
    fn page(&self) -> u32 {
        match self {
            PageRequest::Search(intent) => intent.page,
            PageRequest::Favorites | PageRequest::Catalog => 1,
        }
    }

    async fn run<C: CatalogClient>(&self, client: &C) -> Result<Vec<PaperSummary>> {
        match self {
            PageRequest::Search(intent) => client.list_papers(&intent.to_query()).await,
            PageRequest::Favorites => client.list_favorites().await,
            PageRequest::Catalog => client.list_papers(&PaperQuery::default()).await,
        }
    }
}

/// Merge `incoming` into `list`, keeping ids unique.
///
/// A record whose id is already present refreshes the descriptive fields of
/// the existing entry. Counters never go backwards and the local favorite
/// flag wins, so a late page cannot undo a mutation made in the meantime.
pub fn merge_page(list: &mut Vec<PaperSummary>, incoming: Vec<PaperSummary>) {
    let mut index: HashMap<String, usize> = list
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id.clone(), i))
        .collect();

    for paper in incoming {
        match index.get(&paper.id) {
            Some(&i) => {
                let existing = &mut list[i];
                existing.title = paper.title;
                existing.course_code = paper.course_code;
                existing.course = paper.course;
                existing.year = paper.year;
                existing.semester = paper.semester;
                existing.exam_type = paper.exam_type;
                existing.downloads = existing.downloads.max(paper.downloads);
                existing.views = existing.views.max(paper.views);
                existing.favorites_count = existing.favorites_count.max(paper.favorites_count);
            }
            None => {
                index.insert(paper.id.clone(), list.len());
                list.push(paper);
            }
        }
    }
}

impl<C: CatalogClient + 'static> SearchSession<C> {
    /// Reset to page 1 of the current input and fetch it.
    pub(super) fn commit(&self, state: &mut SessionState) {
        if !state.query.is_active() {
            self.go_inactive(state);
            return;
        }
        let intent = state.query.commit();
        state.generation += 1;
        state.papers.clear();
        state.active = true;
        state.last_error = None;
        state.url.write(&intent);
        state.committed = Some(intent.clone());
        self.start_fetch(state, PageRequest::Search(intent));
    }

    /// Load the whole list for the favorites and manage views.
    pub(super) fn load_listing(&self, state: &mut SessionState) {
        let request = match self.inner.options.view {
            ViewKind::Favorites => PageRequest::Favorites,
            ViewKind::Manage => PageRequest::Catalog,
            ViewKind::Search => return,
        };
        state.generation += 1;
        self.start_fetch(state, request);
    }

    pub(super) fn start_fetch(&self, state: &mut SessionState, request: PageRequest) {
        let generation = state.generation;
        state.query.set_loading(true);
        state.retarget_scroll();

        tracing::debug!(generation, page = request.page(), "fetching papers");
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let timeout = inner.options.request_timeout;
            let result = with_timeout(timeout, request.run(inner.client.as_ref())).await;
            SearchSession { inner }.finish_fetch(generation, request, result);
        });
    }

    fn finish_fetch(
        &self,
        generation: u64,
        request: PageRequest,
        result: Result<Vec<PaperSummary>>,
    ) {
        let mut state = self.inner.state.lock();
        if state.disposed || state.generation != generation {
            tracing::debug!(
                generation,
                current = state.generation,
                "dropping stale fetch result"
            );
            return;
        }
        state.query.set_loading(false);

        match result {
            Ok(papers) => {
                let count = papers.len();
                match &request {
                    PageRequest::Search(intent) => {
                        if intent.page <= 1 {
                            state.papers.clear();
                        }
                        merge_page(&mut state.papers, papers);
                        state
                            .query
                            .set_has_more(count == self.inner.options.page_size);
                    }
                    PageRequest::Favorites | PageRequest::Catalog => {
                        state.papers.clear();
                        merge_page(&mut state.papers, papers);
                        state.query.set_has_more(false);
                    }
                }
                state.last_error = None;
                state.retarget_scroll();
            }
            Err(e) => {
                let page = request.page();
                tracing::warn!(page, error = %e, "failed to fetch papers");
                state.query.rewind_page(page);
                state.last_error = Some(SessionError::new(RetryAction::Fetch { page }, &e));
                // The trigger stays unarmed until a retry brings new results
                state.scroll.reset();
            }
        }
        drop(state);
        self.inner.notify();
    }
}
