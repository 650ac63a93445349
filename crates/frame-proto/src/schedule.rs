//! Refresh scheduling and the failure/backoff state machine.
//!
//! ```text
//!            due                 success
//!   Idle ──────────▶ AwaitingRefresh ──────────▶ Idle
//!    ▲                    │ failure (≤ ceiling)
//!    │                    ▼
//!    │   due          Backoff ◀──────────────┐
//!    │ ◀─ (via AwaitingRefresh)              │ reconnected
//!    │                    │ failure (> ceiling)
//!    │                    ▼                  │
//!    └──── tap ─────  Reconnecting ──────────┘
//! ```
//!
//! Every transition takes the current `Instant` so the machine can be driven
//! by tokio's paused clock in tests.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::config::PollingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// Waiting for the next deadline.
    Idle,
    /// Deadline passed, a refresh is in flight.
    AwaitingRefresh,
    /// A refresh failed; the next attempt waits for an extended deadline.
    Backoff,
    /// Too many consecutive failures; the link is being re-established.
    Reconnecting,
}

/// What the caller must do after a failed refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Wait this much longer than usual before the next attempt.
    Backoff(Duration),
    /// Re-establish the network link, then call [`RefreshScheduler::reconnected`].
    Reconnect,
}

#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    pub interval: Duration,
    pub retry_ceiling: u8,
    pub short_backoff: Duration,
    pub extended_backoff: Duration,
}

impl RefreshPolicy {
    pub fn from_config(polling: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_secs(polling.refresh_interval_secs),
            retry_ceiling: polling.retry_ceiling,
            short_backoff: Duration::from_secs(polling.short_backoff_secs),
            extended_backoff: Duration::from_secs(polling.extended_backoff_secs),
        }
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self::from_config(&PollingConfig::default())
    }
}

#[derive(Debug)]
pub struct RefreshScheduler {
    policy: RefreshPolicy,
    state: RefreshState,
    next_due: Instant,
    error_count: u8,
}

impl RefreshScheduler {
    /// The first scheduled refresh is one interval after `now`.
    pub fn new(policy: RefreshPolicy, now: Instant) -> Self {
        let next_due = now + policy.interval;
        Self {
            policy,
            state: RefreshState::Idle,
            next_due,
            error_count: 0,
        }
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    pub fn error_count(&self) -> u8 {
        self.error_count
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    pub fn policy(&self) -> &RefreshPolicy {
        &self.policy
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.state {
            RefreshState::Idle | RefreshState::Backoff => now >= self.next_due,
            RefreshState::AwaitingRefresh | RefreshState::Reconnecting => false,
        }
    }

    pub fn begin_refresh(&mut self) {
        self.state = RefreshState::AwaitingRefresh;
    }

    pub fn record_success(&mut self, now: Instant) {
        if self.error_count > 0 {
            debug!("[schedule] recovered after {} failures", self.error_count);
        }
        self.error_count = 0;
        self.state = RefreshState::Idle;
        self.next_due = now + self.policy.interval;
    }

    pub fn record_failure(&mut self, now: Instant) -> FailureAction {
        self.error_count = self.error_count.saturating_add(1);
        if self.error_count > self.policy.retry_ceiling {
            debug!("[schedule] {} consecutive failures, reconnecting", self.error_count);
            self.state = RefreshState::Reconnecting;
            FailureAction::Reconnect
        } else {
            self.state = RefreshState::Backoff;
            self.next_due = now + self.policy.interval + self.policy.short_backoff;
            debug!(
                "[schedule] failure {} of {}, backing off {:?}",
                self.error_count, self.policy.retry_ceiling, self.policy.short_backoff
            );
            FailureAction::Backoff(self.policy.short_backoff)
        }
    }

    /// Count a failure without escalating. Past the ceiling the reconnect is
    /// left to the next scheduled refresh, which sees the count and reconnects.
    pub fn defer_failure(&mut self, now: Instant) {
        self.error_count = self.error_count.saturating_add(1);
        self.state = RefreshState::Backoff;
        self.next_due = now + self.policy.interval + self.policy.short_backoff;
        debug!(
            "[schedule] failure {} of {} counted, escalation deferred",
            self.error_count, self.policy.retry_ceiling
        );
    }

    /// The link was re-established (successfully or not); start counting
    /// failures afresh after an extended pause.
    pub fn reconnected(&mut self, now: Instant) {
        self.error_count = 0;
        self.state = RefreshState::Backoff;
        self.next_due = now + self.policy.interval + self.policy.extended_backoff;
    }

    /// Restart the countdown from `now` without touching the failure count.
    /// Used after a tap and after an offline (clock) redraw.
    pub fn rearm(&mut self, now: Instant) {
        self.state = RefreshState::Idle;
        self.next_due = now + self.policy.interval;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RefreshPolicy {
        RefreshPolicy {
            interval: Duration::from_secs(30),
            retry_ceiling: 3,
            short_backoff: Duration::from_secs(5),
            extended_backoff: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_due_after_interval() {
        let t0 = Instant::now();
        let s = RefreshScheduler::new(policy(), t0);
        assert!(!s.is_due(t0));
        assert!(!s.is_due(t0 + Duration::from_secs(29)));
        assert!(s.is_due(t0 + Duration::from_secs(30)));
    }

    #[test]
    fn test_not_due_while_in_flight() {
        let t0 = Instant::now();
        let mut s = RefreshScheduler::new(policy(), t0);
        s.begin_refresh();
        assert_eq!(s.state(), RefreshState::AwaitingRefresh);
        assert!(!s.is_due(t0 + Duration::from_secs(300)));
    }

    #[test]
    fn test_failures_back_off_then_reconnect() {
        let t0 = Instant::now();
        let mut s = RefreshScheduler::new(policy(), t0);

        for n in 1..=3u8 {
            s.begin_refresh();
            assert_eq!(s.record_failure(t0), FailureAction::Backoff(Duration::from_secs(5)));
            assert_eq!(s.error_count(), n);
            assert_eq!(s.state(), RefreshState::Backoff);
            assert!(!s.is_due(t0 + Duration::from_secs(34)));
            assert!(s.is_due(t0 + Duration::from_secs(35)));
        }

        s.begin_refresh();
        assert_eq!(s.record_failure(t0), FailureAction::Reconnect);
        assert_eq!(s.state(), RefreshState::Reconnecting);
        assert!(!s.is_due(t0 + Duration::from_secs(3600)));

        s.reconnected(t0);
        assert_eq!(s.error_count(), 0);
        assert_eq!(s.state(), RefreshState::Backoff);
        assert!(!s.is_due(t0 + Duration::from_secs(89)));
        assert!(s.is_due(t0 + Duration::from_secs(90)));
    }

    #[test]
    fn test_success_resets_errors() {
        let t0 = Instant::now();
        let mut s = RefreshScheduler::new(policy(), t0);
        s.begin_refresh();
        s.record_failure(t0);
        s.begin_refresh();
        s.record_success(t0 + Duration::from_secs(40));
        assert_eq!(s.error_count(), 0);
        assert_eq!(s.state(), RefreshState::Idle);
        assert_eq!(s.next_due(), t0 + Duration::from_secs(70));
    }

    #[test]
    fn test_rearm_keeps_error_count() {
        let t0 = Instant::now();
        let mut s = RefreshScheduler::new(policy(), t0);
        s.begin_refresh();
        s.record_failure(t0);
        s.rearm(t0 + Duration::from_secs(2));
        assert_eq!(s.error_count(), 1);
        assert_eq!(s.state(), RefreshState::Idle);
        assert_eq!(s.next_due(), t0 + Duration::from_secs(32));
    }

    #[test]
    fn test_deferred_failure_never_reconnects() {
        let t0 = Instant::now();
        let mut s = RefreshScheduler::new(policy(), t0);
        for _ in 0..5 {
            s.begin_refresh();
            s.defer_failure(t0);
            assert_eq!(s.state(), RefreshState::Backoff);
        }
        assert_eq!(s.error_count(), 5);
        assert!(s.is_due(t0 + Duration::from_secs(35)));

        // The next scheduled failure escalates.
        s.begin_refresh();
        assert_eq!(s.record_failure(t0), FailureAction::Reconnect);
    }

    #[test]
    fn test_error_count_saturates() {
        let t0 = Instant::now();
        let mut s = RefreshScheduler::new(
            RefreshPolicy {
                retry_ceiling: u8::MAX,
                ..policy()
            },
            t0,
        );
        for _ in 0..300 {
            s.record_failure(t0);
        }
        assert_eq!(s.error_count(), u8::MAX);
    }
}
