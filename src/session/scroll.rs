//! Infinite-scroll sentinel: tracks the last rendered result.

/// Observes the last element of the result list and reports when it first
/// becomes visible.
#[derive(Debug, Default)]
pub struct ScrollObserver {
    target: Option<String>,
    fired: bool,
    detached: bool,
}

impl ScrollObserver {
    /// Point the observer at the current last element.
    ///
    /// Nothing is observed while a fetch is in flight. A new last element, or
    /// the end of a fetch, arms the observer again.
    pub fn retarget(&mut self, last_id: Option<&str>, loading: bool) {
        if self.detached {
            return;
        }
        if loading {
            self.target = None;
            self.fired = false;
            return;
        }
        let same = self.target.as_deref() == last_id;
        if !same || self.target.is_none() {
            self.target = last_id.map(str::to_string);
            self.fired = false;
        }
    }

    /// Report that the element `id` became visible. Returns true exactly once
    /// per attachment, when `id` is the observed element.
    pub fn observe(&mut self, id: &str) -> bool {
        if self.detached || self.fired {
            return false;
        }
        match &self.target {
            Some(target) if target == id => {
                self.fired = true;
                true
            }
            _ => false,
        }
    }

    /// The observed element, if attached
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn is_attached(&self) -> bool {
        !self.detached && self.target.is_some()
    }

    /// Stop observing for good.
    pub fn detach(&mut self) {
        self.detached = true;
        self.target = None;
    }

    /// Drop the current target without detaching (the list was emptied).
    pub fn reset(&mut self) {
        self.target = None;
        self.fired = false;
    }
}
