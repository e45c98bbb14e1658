//! Two-way mapping between the search intent and a shareable query string.
//!
//! Tracked parameters are `q`, `year`, `semester` and `exam_type`. An empty
//! value is never written: a parameter absent from the query string means
//! "unset". Parameters the session does not own are left where they are.

use std::sync::Arc;

use parking_lot::Mutex;
use url::{Url, form_urlencoded};

use crate::error::{QvaultError, Result};

use super::query::{FilterKey, Filters, SearchIntent};

const TERM_PARAM: &str = "q";

/// Somewhere the current query string lives (a browser address bar, a link).
pub trait Location: Send {
    /// The query string without a leading `?`
    fn query(&self) -> String;

    /// Replace the query string in place, without adding a history entry
    fn replace_query(&mut self, query: String);
}

/// In-process location. Clones share the same underlying query string.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocation {
    query: Arc<Mutex<String>>,
}

impl MemoryLocation {
    pub fn new(query: &str) -> Self {
        Self {
            query: Arc::new(Mutex::new(query.trim_start_matches('?').to_string())),
        }
    }

    /// Build from a shared link, a `?q=...` fragment, or a bare query string.
    pub fn from_link(link: &str) -> Result<Self> {
        Ok(Self::new(&parse_link(link)?))
    }
}

impl Location for MemoryLocation {
    fn query(&self) -> String {
        self.query.lock().clone()
    }

    fn replace_query(&mut self, query: String) {
        *self.query.lock() = query;
    }
}

fn is_tracked(name: &str) -> bool {
    name == TERM_PARAM || FilterKey::ALL.iter().any(|k| k.param() == name)
}

/// Extract the query string from whatever the user pasted.
pub fn parse_link(link: &str) -> Result<String> {
    let link = link.trim();
    if link.contains("://") {
        let url = Url::parse(link)
            .map_err(|e| QvaultError::InvalidLink(link.to_string(), e.to_string()))?;
        return Ok(url.query().unwrap_or_default().to_string());
    }
    let query = match link.split_once('?') {
        Some((_, query)) => query,
        None => link,
    };
    Ok(query.split('#').next().unwrap_or_default().to_string())
}

/// Read term and filters from a query string. Unknown parameters are ignored.
pub fn read_intent(query: &str) -> (String, Filters) {
    let mut term = String::new();
    let mut filters = Filters::default();
    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        if name == TERM_PARAM {
            term = value.trim().to_string();
            continue;
        }
        if let Some(key) = FilterKey::ALL.into_iter().find(|k| k.param() == name) {
            filters.set(key, &value);
        }
    }
    (term, filters)
}

fn untracked_pairs(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes())
        .filter(|(name, _)| !is_tracked(name))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect()
}

/// Rewrite `existing` so that it carries exactly the non-empty fields of
/// `intent`, keeping untracked parameters in front.
pub fn write_intent(existing: &str, intent: &SearchIntent) -> String {
    let mut out = form_urlencoded::Serializer::new(String::new());
    for (name, value) in untracked_pairs(existing) {
        out.append_pair(&name, &value);
    }
    let term = intent.term.trim();
    if !term.is_empty() {
        out.append_pair(TERM_PARAM, term);
    }
    for (key, value) in intent.filters.active() {
        out.append_pair(key.param(), value);
    }
    out.finish()
}

/// Drop every tracked parameter from `existing`.
pub fn clear_tracked(existing: &str) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(untracked_pairs(existing))
        .finish()
}

/// Canonical query string for sharing an intent
pub fn share_query(intent: &SearchIntent) -> String {
    write_intent("", intent)
}

/// Keeps a `Location` in step with the committed search intent.
pub struct UrlSynchronizer {
    location: Box<dyn Location>,
}

impl UrlSynchronizer {
    pub fn new(location: impl Location + 'static) -> Self {
        Self {
            location: Box::new(location),
        }
    }

    /// Term and filters encoded in the location right now
    pub fn restore(&self) -> (String, Filters) {
        read_intent(&self.location.query())
    }

    pub fn write(&mut self, intent: &SearchIntent) {
        let query = write_intent(&self.location.query(), intent);
        self.location.replace_query(query);
    }

    pub fn clear(&mut self) {
        let query = clear_tracked(&self.location.query());
        self.location.replace_query(query);
    }

    pub fn current(&self) -> String {
        self.location.query()
    }
}

impl Default for UrlSynchronizer {
    fn default() -> Self {
        Self::new(MemoryLocation::default())
    }
}
