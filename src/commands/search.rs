//! Catalog search commands.
//!
//! - `search`: run a search from terms and filters
//! - `open`: reproduce a shared search link
//! - `share`: print the share link for a search

use owo_colors::OwoColorize;
use serde_json::json;
use url::Url;

use super::{CommandOutput, Portal, settle};
use crate::display::format_paper_table;
use crate::error::{QvaultError, Result};
use crate::session::{Filters, MemoryLocation, SearchIntent, ViewKind, share_query};

fn intent(term: &str, filters: Filters) -> SearchIntent {
    SearchIntent {
        term: term.trim().to_string(),
        filters,
        page: 1,
    }
}

/// Search the catalog by term and filters
pub async fn cmd_search(term: &str, filters: Filters, pages: u32, output_json: bool) -> Result<()> {
    let query = share_query(&intent(term, filters));
    if query.is_empty() {
        return Err(QvaultError::InvalidInput(
            "give a search term or at least one of --year, --semester, --exam-type".to_string(),
        ));
    }
    run_search(MemoryLocation::new(&query), pages, output_json).await
}

/// Load the results a share link points at
pub async fn cmd_open(link: &str, pages: u32, output_json: bool) -> Result<()> {
    let location = MemoryLocation::from_link(link)?;
    run_search(location, pages, output_json).await
}

async fn run_search(location: MemoryLocation, pages: u32, output_json: bool) -> Result<()> {
    let portal = Portal::load()?;
    let auth = portal.auth().await?;
    let session = portal.mount(portal.options(ViewKind::Search), auth, None, Some(location));

    if !session.query().is_active() {
        return Err(QvaultError::InvalidInput(
            "link has no search term or filters".to_string(),
        ));
    }

    settle(&session).await?;
    for _ in 1..pages {
        if !session.next_page() {
            break;
        }
        settle(&session).await?;
    }

    let snapshot = session.snapshot();
    session.dispose();

    let text = if snapshot.papers.is_empty() {
        "No papers found".dimmed().to_string()
    } else {
        let more = if snapshot.has_more {
            format!(" (more available, use --pages {})", snapshot.page + 1)
        } else {
            String::new()
        };
        format!(
            "{}\n{}{}",
            format_paper_table(&snapshot.papers),
            format!("{} papers", snapshot.papers.len()).dimmed(),
            more.dimmed()
        )
    };

    CommandOutput::new(json!({
        "query": snapshot.query_string,
        "page": snapshot.page,
        "has_more": snapshot.has_more,
        "papers": snapshot.papers,
    }))
    .with_text(text)
    .print(output_json)
}

/// Render the share link for a search
pub fn share_link(term: &str, filters: Filters, base: Option<&str>) -> Result<String> {
    let query = share_query(&intent(term, filters));
    let Some(base) = base else {
        return Ok(if query.is_empty() {
            String::new()
        } else {
            format!("?{query}")
        });
    };
    let mut url =
        Url::parse(base).map_err(|e| QvaultError::InvalidLink(base.to_string(), e.to_string()))?;
    url.set_query((!query.is_empty()).then_some(query.as_str()));
    Ok(url.to_string())
}

/// Print the share link for a search without running it
pub fn cmd_share(term: &str, filters: Filters, base: Option<&str>) -> Result<()> {
    let link = share_link(term, filters, base)?;
    println!("{link}");
    Ok(())
}
