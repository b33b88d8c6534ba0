//! Countdown for expiring promotional notices.
//!
//! Each tracked id moves through `registered -> ticking -> expired`. One
//! shared ticker serves every tracked id. It is started by the first
//! registration and stopped as soon as nothing is tracked, so it never runs
//! idle.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::debug;

use crate::host::Ticker;

/// Result of [`Countdown::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Registered,
    AlreadyTracked,
    /// Expiry is further away than the horizon; not tracked yet.
    OutsideHorizon,
    /// Expiry has already been reached.
    Expired,
}

/// What one tick produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tick {
    /// Remaining-time text per still-running id.
    pub updates: Vec<(u64, String)>,
    /// Ids that reached zero on this tick. They are no longer tracked.
    pub expired: Vec<u64>,
}

#[derive(Debug, Clone)]
pub struct Countdown {
    /// id -> expiry (unix seconds).
    tracked: BTreeMap<u64, i64>,
    horizon_secs: i64,
    period: Duration,
    running: bool,
}

impl Countdown {
    #[must_use]
    pub const fn new(horizon_secs: i64, period: Duration) -> Self {
        Self {
            tracked: BTreeMap::new(),
            horizon_secs,
            period,
            running: false,
        }
    }

    #[must_use]
    pub fn is_tracked(&self, id: u64) -> bool {
        self.tracked.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Start tracking `id` if its expiry falls within the horizon.
    pub fn register(
        &mut self,
        id: u64,
        expiry: i64,
        now: i64,
        ticker: &mut dyn Ticker,
    ) -> Registration {
        if self.tracked.contains_key(&id) {
            return Registration::AlreadyTracked;
        }

        let remaining = expiry - now;
        if remaining <= 0 {
            return Registration::Expired;
        }
        if remaining > self.horizon_secs {
            return Registration::OutsideHorizon;
        }

        self.tracked.insert(id, expiry);
        debug!(id, remaining, "countdown registered");
        self.ensure_running(ticker);
        Registration::Registered
    }

    /// Stop tracking `id`. Returns whether it was tracked.
    pub fn unregister(&mut self, id: u64, ticker: &mut dyn Ticker) -> bool {
        let removed = self.tracked.remove(&id).is_some();
        self.stop_if_idle(ticker);
        removed
    }

    /// Recompute remaining time for every tracked id.
    pub fn tick(&mut self, now: i64, ticker: &mut dyn Ticker) -> Tick {
        let mut tick = Tick::default();

        for (&id, &expiry) in &self.tracked {
            let remaining = expiry - now;
            if remaining <= 0 {
                tick.expired.push(id);
            } else {
                tick.updates.push((id, format_remaining(remaining)));
            }
        }

        for id in &tick.expired {
            self.tracked.remove(id);
            debug!(id, "countdown expired");
        }

        self.stop_if_idle(ticker);
        tick
    }

    fn ensure_running(&mut self, ticker: &mut dyn Ticker) {
        if !self.running {
            ticker.start(self.period);
            self.running = true;
        }
    }

    fn stop_if_idle(&mut self, ticker: &mut dyn Ticker) {
        if self.running && self.tracked.is_empty() {
            ticker.stop();
            self.running = false;
        }
    }
}

/// `HH:MM:SS` for a positive number of seconds.
#[must_use]
pub fn format_remaining(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ManualTicker;

    fn countdown() -> Countdown {
        Countdown::new(3600, Duration::from_secs(1))
    }

    #[test]
    fn first_registration_starts_ticker() {
        let handle = ManualTicker::default();
        let mut ticker = handle.clone();
        let mut cd = countdown();

        assert_eq!(cd.register(1, 1_010, 1_000, &mut ticker), Registration::Registered);
        assert_eq!(cd.register(2, 1_020, 1_000, &mut ticker), Registration::Registered);
        assert_eq!(cd.register(1, 1_010, 1_000, &mut ticker), Registration::AlreadyTracked);
        assert!(handle.is_running());
        assert_eq!(handle.starts(), 1);
    }

    #[test]
    fn horizon_and_past_expiry_are_not_tracked() {
        let handle = ManualTicker::default();
        let mut ticker = handle.clone();
        let mut cd = countdown();

        assert_eq!(cd.register(1, 1_000 + 3_601, 1_000, &mut ticker), Registration::OutsideHorizon);
        assert_eq!(cd.register(2, 1_000, 1_000, &mut ticker), Registration::Expired);
        assert_eq!(cd.register(3, 1_000 + 3_600, 1_000, &mut ticker), Registration::Registered);
        assert_eq!(cd.len(), 1);
    }

    #[test]
    fn tick_updates_and_expires() {
        let handle = ManualTicker::default();
        let mut ticker = handle.clone();
        let mut cd = countdown();
        cd.register(1, 102, 100, &mut ticker);
        cd.register(2, 200, 100, &mut ticker);

        let first = cd.tick(101, &mut ticker);
        assert_eq!(
            first.updates,
            vec![(1, "00:00:01".to_string()), (2, "00:01:39".to_string())]
        );
        assert!(first.expired.is_empty());

        let second = cd.tick(102, &mut ticker);
        assert_eq!(second.expired, vec![1]);
        assert!(!cd.is_tracked(1));
        assert!(handle.is_running());

        let last = cd.tick(200, &mut ticker);
        assert_eq!(last.expired, vec![2]);
        assert!(cd.is_empty());
        assert!(!handle.is_running());
        assert!(!cd.is_running());
    }

    #[test]
    fn unregister_last_stops_ticker() {
        let handle = ManualTicker::default();
        let mut ticker = handle.clone();
        let mut cd = countdown();
        cd.register(1, 150, 100, &mut ticker);
        assert!(cd.unregister(1, &mut ticker));
        assert!(!cd.unregister(1, &mut ticker));
        assert!(!handle.is_running());
        assert_eq!(handle.stops(), 1);

        cd.register(2, 150, 100, &mut ticker);
        assert_eq!(handle.starts(), 2);
    }

    #[test]
    fn remaining_text_format() {
        assert_eq!(format_remaining(0), "00:00:00");
        assert_eq!(format_remaining(59), "00:00:59");
        assert_eq!(format_remaining(3_600), "01:00:00");
        assert_eq!(format_remaining(3_661), "01:01:01");
    }
}
