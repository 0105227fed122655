//! Trailing-edge debounce for scenario edits.
//!
//! The clock is passed in, so the state machine is tested without sleeping.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    pending_since: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending_since: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Records an edit at `now`, restarting the quiet period.
    pub fn note_edit(
        &mut self,
        now: Instant,
    ) {
        self.pending_since = Some(now);
    }

    /// Returns `true` exactly once per burst of edits, after `quiet` has
    /// passed since the last one.
    pub fn poll(
        &mut self,
        now: Instant,
    ) -> bool {
        match self.pending_since {
            Some(last_edit) if now.saturating_duration_since(last_edit) >= self.quiet => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }

    /// Drops a pending edit without firing.
    pub fn cancel(&mut self) {
        self.pending_since = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }
}
