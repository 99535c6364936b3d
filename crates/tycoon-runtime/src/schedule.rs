//! Wall-clock interval gates and clock sources.

use chrono::{DateTime, Duration, Utc};

/// Whether at least `interval_secs` have passed between `last` and `now`.
/// A clock that moved backwards never fires.
pub fn interval_elapsed(last: DateTime<Utc>, now: DateTime<Utc>, interval_secs: u64) -> bool {
    let elapsed = (now - last).num_seconds();
    elapsed >= 0 && elapsed as u64 >= interval_secs
}

/// Fires when `now - last >= interval`, then restarts from `now`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntervalGate {
    interval_secs: u64,
    last: DateTime<Utc>,
}

impl IntervalGate {
    pub fn new(interval_secs: u64, start: DateTime<Utc>) -> Self {
        Self {
            interval_secs,
            last: start,
        }
    }

    pub fn last(&self) -> DateTime<Utc> {
        self.last
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        interval_elapsed(self.last, now, self.interval_secs)
    }

    /// Returns true and restarts the gate if it is due.
    pub fn try_fire(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.last = now;
        true
    }
}

/// Source of the current time for hosts driving [`crate::Economy::tick`].
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Clone, Copy, Debug)]
pub struct ManualClock {
    now: DateTime<Utc>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: start }
    }

    pub fn advance_secs(&mut self, secs: i64) -> DateTime<Utc> {
        self.now += Duration::seconds(secs);
        self.now
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn gate_fires_on_boundary_and_restarts() {
        let mut clock = ManualClock::new(t0());
        let mut gate = IntervalGate::new(450, clock.now());
        assert!(!gate.try_fire(clock.advance_secs(449)));
        assert!(gate.try_fire(clock.advance_secs(1)));
        assert_eq!(gate.last(), clock.now());
        assert!(!gate.try_fire(clock.advance_secs(10)));
    }

    #[test]
    fn backwards_clock_never_fires() {
        assert!(!interval_elapsed(t0(), t0() - Duration::seconds(900), 0));
        assert!(interval_elapsed(t0(), t0(), 0));
    }
}
