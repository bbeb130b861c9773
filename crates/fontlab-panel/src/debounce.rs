#![forbid(unsafe_code)]

//! Trailing-edge debounce for settings saves.
//!
//! The editor has no timer of its own: callers feed it the current time and
//! [`SaveDebouncer::poll`] reports when the quiet period has elapsed.

use std::time::Duration;

use web_time::Instant;

/// Default quiet period before a save, in milliseconds.
pub const DEFAULT_SAVE_DELAY_MS: u64 = 300;

/// Deadline tracker for a single pending save.
#[derive(Debug, Clone)]
pub struct SaveDebouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Default for SaveDebouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_SAVE_DELAY_MS))
    }
}

impl SaveDebouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// The quiet period.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Request a save `delay` after `now`. A pending request is pushed back.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Drop the pending request, if any.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left until the pending save is due.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// `true` once when the deadline has passed; the request is consumed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
