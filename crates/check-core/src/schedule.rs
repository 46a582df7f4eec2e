//! Check scheduling: debounce after edits, deferred starts, start-on-demand.
//!
//! The scheduler owns the timing state of one session: when the document last
//! changed, when the current check cycle started, and whether a deferred
//! start is pending. It makes decisions only — actually invoking producers is
//! the session's job — and every method takes the current time explicitly, so
//! the debounce logic is testable without sleeping.
//!
//! The deferred start is a single-slot pending flag: requesting a deferred
//! start while one is already pending is a no-op, and the host drains the
//! slot at a well-defined point (the end of its current operation).

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Scheduling tunables for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Quiet time after the last edit before a check cycle starts.
    pub quiescence: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            quiescence: Duration::from_millis(500),
        }
    }
}

/// Timing state machine for one session.
#[derive(Debug, Clone)]
pub struct CheckScheduler {
    config: ScheduleConfig,
    last_change: Option<Instant>,
    check_start: Option<Instant>,
    deferred: bool,
}

impl CheckScheduler {
    /// Create a scheduler with the given tunables.
    pub fn new(config: ScheduleConfig) -> Self {
        Self {
            config,
            last_change: None,
            check_start: None,
            deferred: false,
        }
    }

    /// The scheduling tunables.
    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Record an edit at `now`; restarts the quiescence window.
    pub fn note_change(&mut self, now: Instant) {
        self.last_change = Some(now);
    }

    /// Record that a check cycle started at `now`.
    pub fn note_start(&mut self, now: Instant) {
        self.check_start = Some(now);
    }

    /// Queue a deferred start. Returns `false` when one was already pending.
    pub fn defer(&mut self) -> bool {
        let newly_queued = !self.deferred;
        self.deferred = true;
        newly_queued
    }

    /// Take the deferred flag, clearing it.
    pub fn take_deferred(&mut self) -> bool {
        std::mem::take(&mut self.deferred)
    }

    /// Periodic-timer check: returns `true` when the document has been quiet
    /// for the configured window since the last edit.
    ///
    /// Firing clears the last-change timestamp so the same edit burst cannot
    /// trigger twice.
    pub fn due(&mut self, now: Instant) -> bool {
        match self.last_change {
            Some(changed) if now.duration_since(changed) >= self.config.quiescence => {
                self.last_change = None;
                true
            }
            _ => false,
        }
    }

    /// When the document last changed, if an edit is still pending a check.
    pub fn last_change(&self) -> Option<Instant> {
        self.last_change
    }

    /// When the current (or most recent) check cycle started.
    pub fn check_start(&self) -> Option<Instant> {
        self.check_start
    }

    /// Drop all timing state (mode disable).
    pub fn reset(&mut self) {
        self.last_change = None;
        self.check_start = None;
        self.deferred = false;
    }
}
