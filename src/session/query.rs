//! Search intent: the term, structured filters and pagination cursor.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::QvaultError;
use crate::remote::PaperQuery;

/// Structured filters a search can be narrowed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
    Year,
    Semester,
    ExamType,
}

impl FilterKey {
    pub const ALL: [FilterKey; 3] = [FilterKey::Year, FilterKey::Semester, FilterKey::ExamType];

    /// Name used in share links and catalog requests
    pub fn param(self) -> &'static str {
        match self {
            FilterKey::Year => "year",
            FilterKey::Semester => "semester",
            FilterKey::ExamType => "exam_type",
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.param())
    }
}

impl FromStr for FilterKey {
    type Err = QvaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "year" => Ok(FilterKey::Year),
            "semester" | "sem" => Ok(FilterKey::Semester),
            "exam_type" | "examtype" | "type" => Ok(FilterKey::ExamType),
            _ => Err(QvaultError::InvalidInput(format!(
                "unknown filter '{s}', expected year, semester or exam_type"
            ))),
        }
    }
}

/// Filter values. An empty string means "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Filters {
    pub year: String,
    pub semester: String,
    pub exam_type: String,
}

impl Filters {
    pub fn get(&self, key: FilterKey) -> &str {
        match key {
            FilterKey::Year => &self.year,
            FilterKey::Semester => &self.semester,
            FilterKey::ExamType => &self.exam_type,
        }
    }

    /// Set a filter, returning whether the stored value changed
    pub fn set(&mut self, key: FilterKey, value: &str) -> bool {
        let value = value.trim();
        let slot = match key {
            FilterKey::Year => &mut self.year,
            FilterKey::Semester => &mut self.semester,
            FilterKey::ExamType => &mut self.exam_type,
        };
        if slot == value {
            return false;
        }
        *slot = value.to_string();
        true
    }

    pub fn is_empty(&self) -> bool {
        FilterKey::ALL.iter().all(|k| self.get(*k).is_empty())
    }

    /// Non-empty filters, in canonical order
    pub fn active(&self) -> impl Iterator<Item = (FilterKey, &str)> {
        FilterKey::ALL
            .into_iter()
            .map(|k| (k, self.get(k)))
            .filter(|(_, v)| !v.is_empty())
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// The tuple that fully determines one catalog request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchIntent {
    pub term: String,
    pub filters: Filters,
    pub page: u32,
}

impl SearchIntent {
    /// Same term and filters, whatever the page
    pub fn same_search(&self, other: &SearchIntent) -> bool {
        self.term == other.term && self.filters == other.filters
    }

    pub fn to_query(&self) -> PaperQuery {
        PaperQuery {
            q: non_empty(&self.term),
            year: non_empty(&self.filters.year),
            semester: non_empty(&self.filters.semester),
            exam_type: non_empty(&self.filters.exam_type),
            page: Some(self.page),
        }
    }
}

/// Authoritative in-memory search state for one session.
#[derive(Debug, Clone)]
pub struct QueryState {
    term: String,
    filters: Filters,
    page: u32,
    has_more: bool,
    loading: bool,
    dirty: bool,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            term: String::new(),
            filters: Filters::default(),
            page: 1,
            has_more: true,
            loading: false,
            dirty: false,
        }
    }
}

impl QueryState {
    pub fn new(term: &str, filters: Filters) -> Self {
        Self {
            term: term.to_string(),
            filters,
            ..Default::default()
        }
    }

    /// Raw term as typed
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether a change is waiting to be committed
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// A search is active when the trimmed term or any filter is non-empty
    pub fn is_active(&self) -> bool {
        !self.term.trim().is_empty() || !self.filters.is_empty()
    }

    /// Returns whether the term changed. Never fetches.
    pub fn set_term(&mut self, term: &str) -> bool {
        if self.term == term {
            return false;
        }
        self.term = term.to_string();
        self.dirty = true;
        true
    }

    /// Returns whether the filter changed. Never fetches.
    pub fn set_filter(&mut self, key: FilterKey, value: &str) -> bool {
        let changed = self.filters.set(key, value);
        self.dirty |= changed;
        changed
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Drop the pending-change flag without touching the page cursor.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Commit pending input: back to page 1 with a fresh cursor.
    pub fn commit(&mut self) -> SearchIntent {
        self.dirty = false;
        self.page = 1;
        self.has_more = true;
        self.intent()
    }

    /// Advance to the next page if there is one and nothing is in flight.
    pub fn next_page(&mut self) -> Option<u32> {
        if !self.has_more || self.loading {
            return None;
        }
        self.page += 1;
        Some(self.page)
    }

    /// Undo a page advance whose fetch failed.
    pub fn rewind_page(&mut self, failed_page: u32) {
        if failed_page > 1 && self.page == failed_page {
            self.page -= 1;
        }
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_has_more(&mut self, has_more: bool) {
        self.has_more = has_more;
    }

    /// Current intent with the term trimmed
    pub fn intent(&self) -> SearchIntent {
        SearchIntent {
            term: self.term.trim().to_string(),
            filters: self.filters.clone(),
            page: self.page,
        }
    }
}
