//! The reconnect seam: re-establish connectivity after sustained failures.

use chrono::TimeDelta;

/// Result of a reconnect attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reassociation {
    /// Whether the remote service became reachable again.
    pub reachable: bool,
    /// Fresh network-time correction for the local clock, if time sync worked.
    pub clock_correction: Option<TimeDelta>,
}

#[allow(async_fn_in_trait)]
pub trait Link {
    /// Re-establish the network link and re-sync time. Best effort; callers
    /// keep running whatever the outcome.
    async fn reassociate(&mut self) -> Reassociation;
}
