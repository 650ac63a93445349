use chrono::{DateTime, FixedOffset, TimeDelta, Utc};

/// Wall clock shown on the clock screen: system UTC, nudged by the last
/// network-time correction, shifted into the configured zone.
#[derive(Debug, Clone)]
pub struct LocalClock {
    offset: FixedOffset,
    correction: TimeDelta,
    source: fn() -> DateTime<Utc>,
}

impl LocalClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self::with_source(offset, Utc::now)
    }

    /// Use a custom UTC source (fixed instants in tests).
    pub fn with_source(offset: FixedOffset, source: fn() -> DateTime<Utc>) -> Self {
        Self {
            offset,
            correction: TimeDelta::zero(),
            source,
        }
    }

    /// Replace the correction with a fresh network-time measurement.
    pub fn apply_correction(&mut self, correction: TimeDelta) {
        self.correction = correction;
    }

    pub fn correction(&self) -> TimeDelta {
        self.correction
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        ((self.source)() + self.correction).with_timezone(&self.offset)
    }
}

/// `("HH:MM", "Mon 05 Jan 2026")` for the clock screen.
pub fn clock_strings(now: &DateTime<FixedOffset>) -> (String, String) {
    (
        now.format("%H:%M").to_string(),
        now.format("%a %d %b %Y").to_string(),
    )
}
