mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    Call, FakeCatalog, RecordingOpener, anonymous, ids, mount_search, mount_view, options, papers,
    signed_in,
};
use qvault::remote::{PaperQuery, PaperSummary};
use qvault::session::{
    ActionOutcome, FilterKey, Location, MemoryLocation, RetryAction, SearchSession, ViewKind,
};
use tokio::time::{Instant, sleep};

const DEBOUNCE: Duration = Duration::from_millis(400);

async fn search(session: &SearchSession<FakeCatalog>, term: &str) {
    session.set_term(term);
    session.submit();
    session.idle().await;
}

// ============================================================================
// Debounce
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_typing_burst_issues_one_fetch_for_last_term() {
    let fake = FakeCatalog::with_papers(papers("CS", 5));
    let location = MemoryLocation::default();
    let session = mount_search(&fake, &location, signed_in());

    session.set_term("C");
    sleep(Duration::from_millis(100)).await;
    session.set_term("CS");
    sleep(Duration::from_millis(100)).await;
    session.set_term("CS1");
    session.idle().await;

    let queries = fake.list_queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].q.as_deref(), Some("CS1"));
    assert_eq!(queries[0].page, Some(1));
    assert_eq!(location.query(), "q=CS1");
}

#[tokio::test(start_paused = true)]
async fn test_no_fetch_before_quiet_period() {
    let fake = FakeCatalog::with_papers(papers("CS", 5));
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());

    session.set_term("CS");
    sleep(DEBOUNCE - Duration::from_millis(1)).await;
    assert!(fake.list_queries().is_empty());
    assert!(session.query().is_dirty());

    sleep(Duration::from_millis(2)).await;
    assert_eq!(fake.list_queries().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_term_and_filter_changes_share_one_window() {
    let fake = FakeCatalog::with_papers(papers("CS", 5));
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());

    session.set_term("CS");
    sleep(Duration::from_millis(300)).await;
    session.set_filter(FilterKey::Year, "2024");
    sleep(Duration::from_millis(300)).await;
    session.set_filter(FilterKey::ExamType, "Final");
    session.idle().await;

    let queries = fake.list_queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].q.as_deref(), Some("CS"));
    assert_eq!(queries[0].year.as_deref(), Some("2024"));
    assert_eq!(queries[0].exam_type.as_deref(), Some("Final"));
    assert_eq!(queries[0].semester, None);
}

#[tokio::test(start_paused = true)]
async fn test_submit_bypasses_debounce() {
    let fake = FakeCatalog::with_papers(papers("CS", 5));
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());

    let start = Instant::now();
    session.set_term("CS");
    session.submit();
    session.idle().await;

    assert!(start.elapsed() < DEBOUNCE);
    assert_eq!(session.papers().len(), 5);

    // The cancelled timer never fires a second fetch
    sleep(Duration::from_secs(1)).await;
    assert_eq!(fake.list_queries().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_submit_with_inactive_intent_is_noop() {
    let fake = FakeCatalog::with_papers(papers("CS", 5));
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());

    session.set_term("   ");
    session.submit();
    sleep(Duration::from_secs(1)).await;

    assert!(fake.list_queries().is_empty());
    assert!(!session.snapshot().active);
}

#[tokio::test(start_paused = true)]
async fn test_whitespace_edit_does_not_refetch() {
    let fake = FakeCatalog::with_papers(papers("CS", 5));
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());
    search(&session, "CS").await;

    session.set_term("CS ");
    assert!(!session.query().is_dirty());
    sleep(Duration::from_secs(1)).await;

    assert_eq!(fake.list_queries().len(), 1);
    assert_eq!(session.query().term(), "CS ");
    assert_eq!(session.papers().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_returning_to_shown_search_cancels_pending_commit() {
    let fake = FakeCatalog::with_papers(papers("CS", 5));
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());
    search(&session, "CS").await;

    session.set_term("CSX");
    sleep(Duration::from_millis(100)).await;
    session.set_term(" CS");
    session.idle().await;
    sleep(Duration::from_secs(1)).await;

    assert_eq!(fake.list_queries().len(), 1);
    assert_eq!(session.papers().len(), 5);
}

// ============================================================================
// Pagination and infinite scroll
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_twenty_plus_seven_scroll_scenario() {
    let fake = FakeCatalog::with_papers(papers("CS", 27));
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());

    session.set_term("CS");
    session.idle().await;

    let snapshot = session.snapshot();
    assert_eq!(snapshot.papers.len(), 20);
    assert!(snapshot.has_more);
    assert_eq!(session.scroll_target().as_deref(), Some("CS-20"));

    assert!(session.item_visible("CS-20"));
    session.idle().await;

    let snapshot = session.snapshot();
    assert_eq!(snapshot.papers.len(), 27);
    assert_eq!(snapshot.page, 2);
    assert!(!snapshot.has_more);
    assert_eq!(fake.list_queries().len(), 2);
    assert_eq!(fake.list_queries()[1].page, Some(2));

    // The new last item is observed, but there is nothing left to load
    assert_eq!(session.scroll_target().as_deref(), Some("CS-27"));
    assert!(!session.item_visible("CS-27"));
    assert!(!session.next_page());
    sleep(Duration::from_secs(5)).await;
    assert_eq!(fake.list_queries().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_exactly_full_last_page_fetches_one_empty_page() {
    let fake = FakeCatalog::with_papers(papers("CS", 40));
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());
    search(&session, "CS").await;

    assert!(session.next_page());
    session.idle().await;
    assert_eq!(session.papers().len(), 40);
    assert!(session.query().has_more());

    assert!(session.next_page());
    session.idle().await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.papers.len(), 40);
    assert!(!snapshot.has_more);
    assert!(snapshot.last_error.is_none());
    assert!(!session.next_page());
}

#[tokio::test(start_paused = true)]
async fn test_scroll_trigger_fires_once_per_last_item() {
    let fake = FakeCatalog::with_papers(papers("CS", 60));
    fake.set_page_delay(2, Duration::from_millis(200));
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());
    search(&session, "CS").await;

    assert!(session.item_visible("CS-20"));
    // In flight: the sentinel is detached and repeated reports are ignored
    assert_eq!(session.scroll_target(), None);
    assert!(!session.item_visible("CS-20"));
    assert!(!session.next_page());

    session.idle().await;
    assert_eq!(fake.list_queries().len(), 2);
    assert!(!session.item_visible("CS-20"));
    assert!(session.item_visible("CS-40"));
}

#[tokio::test(start_paused = true)]
async fn test_changing_term_discards_list_before_new_results() {
    let fake = FakeCatalog::with_papers([papers("CS", 27), papers("MATH", 3)].concat());
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());
    search(&session, "CS").await;
    assert!(session.next_page());
    session.idle().await;
    assert_eq!(session.query().page(), 2);

    fake.set_delay(Duration::from_secs(1));
    session.set_term("MATH");
    sleep(DEBOUNCE + Duration::from_millis(1)).await;

    let snapshot = session.snapshot();
    assert!(snapshot.loading);
    assert!(snapshot.papers.is_empty());
    assert_eq!(snapshot.page, 1);

    session.idle().await;
    assert_eq!(ids(&session.papers()), ["MATH-1", "MATH-2", "MATH-3"]);
    assert_eq!(fake.list_queries().last().and_then(|q| q.page), Some(1));
}

// ============================================================================
// Stale responses
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_stale_append_after_reset_is_dropped() {
    let fake = FakeCatalog::with_papers([papers("CS", 30), papers("MATH", 3)].concat());
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());
    search(&session, "CS").await;

    // Page 2 of CS is slow and lands after the MATH reset completed
    fake.set_page_delay(2, Duration::from_secs(2));
    assert!(session.next_page());
    search(&session, "MATH").await;
    assert_eq!(ids(&session.papers()), ["MATH-1", "MATH-2", "MATH-3"]);

    sleep(Duration::from_secs(3)).await;
    assert_eq!(ids(&session.papers()), ["MATH-1", "MATH-2", "MATH-3"]);
    assert!(!session.query().is_loading());
}

#[tokio::test(start_paused = true)]
async fn test_stale_append_before_slow_reset_is_dropped() {
    let fake = FakeCatalog::with_papers([papers("CS", 30), papers("MATH", 3)].concat());
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());
    search(&session, "CS").await;

    // The old page 2 arrives first, while the new page 1 is still loading
    fake.set_page_delay(2, Duration::from_millis(100));
    fake.set_page_delay(1, Duration::from_millis(500));
    assert!(session.next_page());
    session.set_term("MATH");
    session.submit();

    sleep(Duration::from_millis(200)).await;
    let snapshot = session.snapshot();
    assert!(snapshot.papers.is_empty());
    assert!(snapshot.loading);

    session.idle().await;
    assert_eq!(ids(&session.papers()), ["MATH-1", "MATH-2", "MATH-3"]);
}

#[tokio::test(start_paused = true)]
async fn test_clear_during_fetch_leaves_empty_list_and_url() {
    let fake = FakeCatalog::with_papers(papers("CS", 5));
    fake.set_delay(Duration::from_secs(1));
    let location = MemoryLocation::new("tab=recent");
    let session = mount_search(&fake, &location, signed_in());

    session.set_term("CS");
    session.set_filter(FilterKey::Year, "2024");
    session.submit();
    assert_eq!(location.query(), "tab=recent&q=CS&year=2024");
    assert!(session.query().is_loading());

    session.clear();
    assert_eq!(location.query(), "tab=recent");
    assert!(!session.query().is_loading());

    sleep(Duration::from_secs(2)).await;
    let snapshot = session.snapshot();
    assert!(snapshot.papers.is_empty());
    assert!(!snapshot.active);
    assert_eq!(snapshot.term, "");
    assert_eq!(location.query(), "tab=recent");
}

#[tokio::test(start_paused = true)]
async fn test_dispose_ignores_pending_work() {
    let fake = FakeCatalog::with_papers(papers("CS", 5));
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());

    session.set_term("CS");
    session.dispose();
    sleep(Duration::from_secs(1)).await;
    assert!(fake.list_queries().is_empty());

    // A disposed session no longer reacts to input
    session.set_term("MATH");
    session.submit();
    sleep(Duration::from_secs(1)).await;
    assert!(fake.list_queries().is_empty());
    assert!(session.is_disposed());
}

#[tokio::test(start_paused = true)]
async fn test_dispose_drops_in_flight_results() {
    let fake = FakeCatalog::with_papers(papers("CS", 5));
    fake.set_delay(Duration::from_millis(500));
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());

    session.set_term("CS");
    session.submit();
    session.dispose();
    sleep(Duration::from_secs(1)).await;

    assert_eq!(fake.list_queries().len(), 1);
    assert!(session.papers().is_empty());
}

// ============================================================================
// URL synchronization
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_mount_from_shared_link_fetches_immediately() {
    let fake = FakeCatalog::with_papers(papers("CS", 5));
    let location = MemoryLocation::from_link("https://vault.example.edu/search?q=CS&year=2024").unwrap();

    let start = Instant::now();
    let session = mount_search(&fake, &location, signed_in());
    assert!(session.query().is_loading());
    session.idle().await;

    assert!(start.elapsed() < DEBOUNCE);
    let queries = fake.list_queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].q.as_deref(), Some("CS"));
    assert_eq!(queries[0].year.as_deref(), Some("2024"));
    assert_eq!(queries[0].page, Some(1));

    let snapshot = session.snapshot();
    assert_eq!(snapshot.term, "CS");
    assert_eq!(snapshot.filters.year, "2024");
    assert_eq!(snapshot.papers.len(), 5);
    assert_eq!(location.query(), "q=CS&year=2024");
}

#[tokio::test(start_paused = true)]
async fn test_mount_without_link_is_inactive() {
    let fake = FakeCatalog::with_papers(papers("CS", 5));
    let session = mount_search(&fake, &MemoryLocation::new("tab=recent"), signed_in());

    sleep(Duration::from_secs(1)).await;
    let snapshot = session.snapshot();
    assert!(!snapshot.active);
    assert!(!snapshot.loading);
    assert!(snapshot.papers.is_empty());
    assert!(fake.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_url_never_carries_empty_params() {
    let fake = FakeCatalog::with_papers(papers("CS", 5));
    let location = MemoryLocation::default();
    let session = mount_search(&fake, &location, signed_in());

    session.set_term("CS");
    session.set_filter(FilterKey::Year, "2024");
    session.set_filter(FilterKey::Semester, "1");
    session.idle().await;
    assert_eq!(location.query(), "q=CS&year=2024&semester=1");

    session.set_filter(FilterKey::Year, "");
    session.idle().await;
    assert_eq!(location.query(), "q=CS&semester=1");
    assert_eq!(session.share_query().as_deref(), Some("q=CS&semester=1"));

    session.set_term("");
    session.set_filter(FilterKey::Semester, "");
    // Going inactive takes effect at once, without waiting for the timer
    assert_eq!(location.query(), "");
    assert!(session.papers().is_empty());
    assert!(!session.snapshot().active);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(fake.list_queries().len(), 2);
}

// ============================================================================
// Failures and retry
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_failed_first_page_can_be_retried() {
    let fake = FakeCatalog::with_papers(papers("CS", 25));
    fake.fail_next_lists(1);
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());
    search(&session, "CS").await;

    let snapshot = session.snapshot();
    assert!(snapshot.papers.is_empty());
    assert!(!snapshot.loading);
    let error = snapshot.last_error.expect("fetch failure is recorded");
    assert_eq!(error.action, RetryAction::Fetch { page: 1 });
    assert!(error.transient);

    // No automatic retry
    sleep(Duration::from_secs(5)).await;
    assert_eq!(fake.list_queries().len(), 1);

    assert!(session.retry());
    session.idle().await;
    assert_eq!(session.papers().len(), 20);
    assert!(session.last_error().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_failed_append_keeps_list_and_retries_same_page() {
    let fake = FakeCatalog::with_papers(papers("CS", 25));
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());
    search(&session, "CS").await;

    fake.fail_next_lists(1);
    assert!(session.item_visible("CS-20"));
    session.idle().await;

    let snapshot = session.snapshot();
    assert_eq!(snapshot.papers.len(), 20);
    assert_eq!(snapshot.page, 1);
    assert_eq!(
        snapshot.last_error.map(|e| e.action),
        Some(RetryAction::Fetch { page: 2 })
    );
    // The trigger stays unarmed after a failure
    assert!(!session.item_visible("CS-20"));

    assert!(session.retry());
    session.idle().await;
    assert_eq!(session.papers().len(), 25);
    assert_eq!(fake.list_queries().last().and_then(|q| q.page), Some(2));
}

#[tokio::test(start_paused = true)]
async fn test_slow_request_times_out() {
    let fake = FakeCatalog::with_papers(papers("CS", 5));
    fake.set_delay(Duration::from_secs(60));
    let mut opts = options(ViewKind::Search);
    opts.request_timeout = Duration::from_secs(5);
    let session = SearchSession::builder(Arc::new(fake.clone()))
        .options(opts)
        .auth(signed_in())
        .mount();

    search(&session, "CS").await;
    let error = session.last_error().expect("timeout is recorded");
    assert!(error.transient);
    assert!(error.message.contains("timed out"));
    assert!(session.papers().is_empty());
}

// ============================================================================
// Optimistic mutations
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_toggle_favorite_twice_restores_state() {
    let mut catalog = papers("CS", 3);
    catalog[0].favorites_count = 5;
    let fake = FakeCatalog::with_papers(catalog);
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());
    search(&session, "CS").await;
    let before = session.papers()[0].clone();

    let outcome = session.toggle_favorite("CS-1").await.unwrap();
    let report = outcome.report().expect("signed in");
    assert_eq!(report.is_favorite, Some(true));
    let after = &session.papers()[0];
    assert!(after.is_favorite);
    assert_eq!(after.favorites_count, 6);

    session.toggle_favorite("CS-1").await.unwrap();
    assert_eq!(session.papers()[0], before);

    // Only the toggled entry changed, and nothing was refetched
    assert_eq!(fake.list_queries().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unfavorite_never_goes_below_zero() {
    let mut catalog = papers("CS", 1);
    catalog[0].is_favorite = true;
    catalog[0].favorites_count = 0;
    let fake = FakeCatalog::with_papers(catalog);
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());
    search(&session, "CS").await;

    session.toggle_favorite("CS-1").await.unwrap();
    let paper = &session.papers()[0];
    assert!(!paper.is_favorite);
    assert_eq!(paper.favorites_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_unauthenticated_download_prompts_without_network() {
    let fake = FakeCatalog::with_papers(papers("CS", 3));
    let auth = anonymous();
    let session = mount_search(&fake, &MemoryLocation::default(), Arc::clone(&auth));
    search(&session, "CS").await;

    let outcome = session.download("CS-1").await.unwrap();
    assert_eq!(outcome, ActionOutcome::LoginRequired);
    assert_eq!(auth.prompt_count(), 1);
    assert!(fake.action_calls().is_empty());
    assert_eq!(session.papers()[0].downloads, 0);

    assert_eq!(session.view("CS-1").await.unwrap(), ActionOutcome::LoginRequired);
    assert_eq!(session.toggle_favorite("CS-1").await.unwrap(), ActionOutcome::LoginRequired);
    assert_eq!(auth.prompt_count(), 3);
    assert!(fake.action_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_download_saves_pdf_and_counts_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeCatalog::with_papers(papers("CS", 3));
    let mut opts = options(ViewKind::Search);
    opts.download_dir = dir.path().join("papers");
    let session = SearchSession::builder(Arc::new(fake.clone()))
        .options(opts)
        .auth(signed_in())
        .mount();
    search(&session, "CS").await;

    let outcome = session.download("CS-2").await.unwrap();
    let report = outcome.report().expect("signed in");
    let saved = report.saved_to.clone().expect("file saved");
    assert_eq!(saved, dir.path().join("papers").join("CS Paper 2.pdf"));
    assert_eq!(std::fs::read(&saved).unwrap(), b"%PDF-1.4 fake");
    assert_eq!(session.papers()[1].downloads, 1);

    assert_eq!(
        fake.action_calls(),
        vec![
            Call::AccessLink {
                id: "CS-2".to_string(),
                inline: false
            },
            Call::FetchFile("https://files.example.edu/CS-2.pdf?sig=abc".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_download_leaves_counter_and_records_error() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeCatalog::with_papers(papers("CS", 3));
    let session = mount_view(&fake, ViewKind::Search, signed_in(), Some(dir.path()));
    search(&session, "CS").await;

    fake.fail_actions(true);
    assert!(session.download("CS-1").await.is_err());
    assert_eq!(session.papers()[0].downloads, 0);
    assert_eq!(
        session.last_error().map(|e| e.action),
        Some(RetryAction::Download {
            paper_id: "CS-1".to_string()
        })
    );
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_view_counts_even_when_open_fails() {
    let fake = FakeCatalog::with_papers(papers("CS", 2));
    let opener = Arc::new(RecordingOpener {
        fail: true,
        ..Default::default()
    });
    let session = SearchSession::builder(Arc::new(fake.clone()))
        .options(options(ViewKind::Search))
        .auth(signed_in())
        .opener(opener.clone())
        .mount();
    search(&session, "CS").await;

    let outcome = session.view("CS-2").await.unwrap();
    assert!(outcome.report().is_some());
    assert_eq!(session.papers()[1].views, 1);
    assert_eq!(
        opener.opened.lock().clone(),
        vec!["https://files.example.edu/CS-2.pdf?sig=abc".to_string()]
    );
    assert_eq!(
        fake.action_calls(),
        vec![Call::AccessLink {
            id: "CS-2".to_string(),
            inline: true
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_view_link_leaves_counter() {
    let fake = FakeCatalog::with_papers(papers("CS", 2));
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());
    search(&session, "CS").await;

    fake.fail_actions(true);
    assert!(session.view("CS-1").await.is_err());
    assert_eq!(session.papers()[0].views, 0);
}

#[tokio::test(start_paused = true)]
async fn test_append_does_not_overwrite_local_mutation() {
    let mut catalog = papers("CS", 25);
    // The backend shifted while paging: CS-3 comes back on page 2, stale
    let mut stale = catalog[2].clone();
    stale.title = "CS Paper 3 (revised)".to_string();
    stale.views = 7;
    catalog.insert(20, stale);
    let fake = FakeCatalog::with_papers(catalog);
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());
    search(&session, "CS").await;

    fake.set_page_delay(2, Duration::from_millis(300));
    assert!(session.next_page());
    session.toggle_favorite("CS-3").await.unwrap();
    session.idle().await;

    let papers: Vec<PaperSummary> = session.papers();
    assert_eq!(papers.len(), 25);
    assert_eq!(papers.iter().filter(|p| p.id == "CS-3").count(), 1);

    let merged = &papers[2];
    assert_eq!(merged.id, "CS-3");
    assert!(merged.is_favorite);
    assert_eq!(merged.favorites_count, 1);
    assert_eq!(merged.views, 7);
    assert_eq!(merged.title, "CS Paper 3 (revised)");
    assert_eq!(papers[20].id, "CS-21");
}

#[tokio::test(start_paused = true)]
async fn test_failed_action_keeps_failed_append_retryable() {
    let fake = FakeCatalog::with_papers(papers("CS", 25));
    let session = mount_search(&fake, &MemoryLocation::default(), signed_in());
    search(&session, "CS").await;

    fake.fail_next_lists(1);
    assert!(session.item_visible("CS-20"));
    session.idle().await;
    assert_eq!(
        session.last_error().map(|e| e.action),
        Some(RetryAction::Fetch { page: 2 })
    );

    fake.fail_actions(true);
    assert!(session.toggle_favorite("CS-1").await.is_err());
    assert_eq!(
        session.last_error().map(|e| e.action),
        Some(RetryAction::Fetch { page: 2 })
    );

    fake.fail_actions(false);
    assert!(session.retry());
    session.idle().await;
    assert_eq!(session.papers().len(), 25);
    assert!(session.last_error().is_none());
    assert!(!session.query().has_more());
}

// ============================================================================
// Favorites and manage views
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_favorites_view_filters_locally_and_drops_unfavorited() {
    let fake = FakeCatalog::with_papers(papers("CS", 3));
    let mut favorites = papers("CS", 3);
    for paper in &mut favorites {
        paper.is_favorite = true;
        paper.favorites_count = 1;
    }
    favorites[2].title = "Operating Systems".to_string();
    fake.set_favorites(favorites);

    let session = mount_view(&fake, ViewKind::Favorites, signed_in(), None);
    assert_eq!(session.view_kind(), ViewKind::Favorites);
    session.idle().await;
    assert_eq!(session.papers().len(), 3);
    assert!(!session.query().has_more());
    assert_eq!(fake.calls(), vec![Call::Favorites]);

    session.set_term("operating");
    assert_eq!(ids(&session.papers()), ["CS-3"]);
    session.clear();
    assert_eq!(session.papers().len(), 3);

    let outcome = session.toggle_favorite("CS-1").await.unwrap();
    assert!(outcome.report().map(|r| r.removed).unwrap_or_default());
    assert_eq!(ids(&session.papers()), ["CS-2", "CS-3"]);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(fake.calls().iter().filter(|c| **c == Call::Favorites).count(), 1);
    assert!(fake.list_queries().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_manage_view_lists_filters_and_deletes() {
    let fake = FakeCatalog::with_papers([papers("CS", 3), papers("MATH", 2)].concat());
    let session = mount_view(&fake, ViewKind::Manage, signed_in(), None);
    session.idle().await;

    assert_eq!(session.papers().len(), 5);
    assert_eq!(fake.list_queries(), vec![PaperQuery::default()]);

    session.set_term("math");
    assert_eq!(ids(&session.papers()), ["MATH-1", "MATH-2"]);

    let outcome = session.delete("MATH-1").await.unwrap();
    assert!(outcome.report().map(|r| r.removed).unwrap_or_default());
    assert_eq!(ids(&session.papers()), ["MATH-2"]);
    assert_eq!(fake.action_calls(), vec![Call::Delete("MATH-1".to_string())]);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(fake.list_queries().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_manage_view_delete_requires_sign_in() {
    let fake = FakeCatalog::with_papers(papers("CS", 2));
    let auth = anonymous();
    let session = mount_view(&fake, ViewKind::Manage, Arc::clone(&auth), None);
    session.idle().await;

    assert_eq!(session.delete("CS-1").await.unwrap(), ActionOutcome::LoginRequired);
    assert_eq!(auth.prompt_count(), 1);
    assert_eq!(session.papers().len(), 2);
    assert!(fake.action_calls().is_empty());
}
