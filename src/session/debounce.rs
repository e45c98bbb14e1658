//! Quiet-period timer for committing search input.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Default quiet period before a term or filter change is committed
pub const DEFAULT_DEBOUNCE_MS: u64 = 400;

/// Holds at most one pending timer.
///
/// Each schedule hands out a ticket. A timer that already woke up when it was
/// superseded is told apart by its ticket no longer being current, since
/// aborting a task that is past its sleep does not stop it.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
    ticket: u64,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_DEBOUNCE_MS))
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            ticket: 0,
        }
    }

    /// Cancel any pending timer and start a new one. `fire` receives the ticket
    /// of this schedule once the quiet period has elapsed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(&mut self, fire: F) -> u64
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let ticket = self.ticket;
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fire(ticket).await;
        }));
        ticket
    }

    /// Abort the pending timer, if any, and invalidate its ticket.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.ticket += 1;
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.pending.is_some() && self.ticket == ticket
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Called by the timer that fired so the debouncer goes idle.
    /// Returns false when `ticket` was superseded in the meantime.
    pub fn finish(&mut self, ticket: u64) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.pending = None;
        true
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
